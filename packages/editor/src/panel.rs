//! Property panel view.
//!
//! Mirrors the selected element as reported by the sandbox and collects
//! the user's changes per ordinal. Nothing here touches the source: the
//! pending set is handed to the patch engine on "save changes".

use crate::patch::{px, PropertyChanges};
use livecanvas_evaluator::{EditableElement, Geometry, SandboxMessage};
use livecanvas_parser::TagIndex;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PanelSelection {
    pub element_id: String,
    pub ordinal: usize,
    pub tag: String,
    pub geometry: Geometry,
    pub style: BTreeMap<String, String>,
    pub content: Option<String>,
    pub binding: Option<String>,
    pub src: Option<String>,
}

impl From<&EditableElement> for PanelSelection {
    fn from(element: &EditableElement) -> Self {
        Self {
            element_id: element.element_id.clone(),
            ordinal: element.ordinal_index,
            tag: element.tag.clone(),
            geometry: element.geometry,
            style: element.style.clone(),
            content: element.content.clone(),
            binding: element.data_binding_key.clone(),
            src: element.src.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PropertyPanel {
    selection: Option<PanelSelection>,
    pending: BTreeMap<usize, PropertyChanges>,
    /// Addressable element count of the source the selection came from
    element_count: Option<usize>,
}

impl PropertyPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&PanelSelection> {
        self.selection.as_ref()
    }

    /// Update the view from a sandbox event; `true` if anything changed
    pub fn apply_event(&mut self, message: &SandboxMessage) -> bool {
        match message {
            SandboxMessage::Mounted { elements, .. } => {
                self.element_count = Some(elements.len());
                false
            }
            SandboxMessage::ElementSelected(element) => {
                self.selection = Some(PanelSelection::from(element));
                true
            }
            SandboxMessage::ElementMoved {
                element_id,
                left,
                top,
            } => self.update_geometry(element_id, |g| {
                g.left = *left;
                g.top = *top;
            }),
            SandboxMessage::ElementResized {
                element_id,
                left,
                top,
                width,
                height,
            } => self.update_geometry(element_id, |g| {
                *g = Geometry::new(*left, *top, *width, *height);
            }),
            SandboxMessage::SelectionCleared => self.selection.take().is_some(),
            SandboxMessage::Diagnostic { .. } => false,
        }
    }

    fn update_geometry(&mut self, element_id: &str, update: impl FnOnce(&mut Geometry)) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        if selection.element_id != element_id {
            tracing::debug!(element_id, "geometry event for unselected element");
            return false;
        }

        let before = selection.geometry;
        update(&mut selection.geometry);
        let g = selection.geometry;

        let mut changes = PropertyChanges::new();
        if g.left != before.left || g.top != before.top {
            changes = changes.position(g.left, g.top);
        }
        if g.width != before.width {
            changes = changes.style("width", px(g.width));
        }
        if g.height != before.height {
            changes = changes.style("height", px(g.height));
        }
        for (key, value) in &changes.style {
            selection.style.insert(key.clone(), value.clone());
        }

        let ordinal = selection.ordinal;
        self.stage(ordinal, changes);
        true
    }

    /// Stage a style value for the selected element
    pub fn set_style(&mut self, key: &str, value: &str) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        selection.style.insert(key.to_string(), value.to_string());
        let ordinal = selection.ordinal;
        self.stage(ordinal, PropertyChanges::new().style(key, value));
        true
    }

    pub fn set_src(&mut self, src: &str) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        selection.src = Some(src.to_string());
        let ordinal = selection.ordinal;
        self.stage(ordinal, PropertyChanges::new().src(src));
        true
    }

    /// Stage literal text for the selected element
    pub fn set_text(&mut self, text: &str) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        selection.content = Some(text.to_string());
        let ordinal = selection.ordinal;
        self.stage(ordinal, PropertyChanges::new().text(text));
        true
    }

    pub fn stage(&mut self, ordinal: usize, changes: PropertyChanges) {
        if changes.is_empty() {
            return;
        }
        self.pending.entry(ordinal).or_default().merge(changes);
    }

    pub fn pending(&self) -> &BTreeMap<usize, PropertyChanges> {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn take_pending(&mut self) -> BTreeMap<usize, PropertyChanges> {
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.selection = None;
        self.pending.clear();
        self.element_count = None;
    }

    /// Re-check the cached selection against a replaced source.
    ///
    /// The selection and any pending changes are dropped when the element
    /// count changed or the tag at the cached ordinal is different, since
    /// ordinals after an inserted or removed element no longer point at
    /// the same element. Returns `true` if the selection was dropped.
    pub fn revalidate(&mut self, source: &str) -> bool {
        let index = TagIndex::build(source);
        let count_changed = self.element_count.is_some_and(|n| n != index.len());
        self.element_count = Some(index.len());

        let stale = match &self.selection {
            Some(selection) => {
                count_changed
                    || index
                        .open(selection.ordinal)
                        .map_or(true, |open| open.name != selection.tag)
            }
            None => false,
        };

        if stale || count_changed {
            if stale {
                tracing::info!("source structure changed; dropping stale selection");
            }
            self.selection = None;
            self.pending.clear();
        }
        stale
    }
}
