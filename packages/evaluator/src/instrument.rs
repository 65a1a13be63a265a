//! Editing instrumentation attached to a rendered document.
//!
//! Every addressable element becomes an [`EditableElement`]. Pointer input
//! is turned into selection, drag and resize gestures; each gesture step
//! produces the outbound [`SandboxMessage`] the host consumes.

use crate::message::SandboxMessage;
use crate::vdom::{Geometry, VNode, VirtualDomDocument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Side of the square hit area around each resize handle
pub const HANDLE_SIZE: f64 = 8.0;

/// Resize never shrinks an element below this width or height
pub const MIN_SIZE: f64 = 10.0;

/// Per-render handle on an element the user can select
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditableElement {
    pub element_id: String,
    pub ordinal_index: usize,
    pub tag: String,
    #[serde(flatten)]
    pub geometry: Geometry,
    /// Page-space offset of `geometry`
    #[serde(skip)]
    pub origin: (f64, f64),
    pub style: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_binding_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl EditableElement {
    fn from_node(node: &VNode) -> Option<Self> {
        let VNode::Element {
            tag,
            ordinal: Some(ordinal),
            element_id: Some(element_id),
            attributes,
            styles,
            geometry,
            origin,
            binding,
            ..
        } = node
        else {
            return None;
        };

        let text = node.own_text();
        Some(Self {
            element_id: element_id.clone(),
            ordinal_index: *ordinal,
            tag: tag.clone(),
            geometry: *geometry,
            origin: *origin,
            style: styles.clone(),
            content: (binding.is_none() && !text.is_empty()).then_some(text),
            data_binding_key: binding.clone(),
            src: attributes.get("src").cloned(),
        })
    }

    /// Box in page coordinates
    pub fn page_box(&self) -> Geometry {
        self.geometry.translate(self.origin.0, self.origin.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::N,
        ResizeHandle::Ne,
        ResizeHandle::E,
        ResizeHandle::Se,
        ResizeHandle::S,
        ResizeHandle::Sw,
        ResizeHandle::W,
        ResizeHandle::Nw,
    ];

    fn moves_west(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::Nw | ResizeHandle::Sw)
    }

    fn moves_east(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::Ne | ResizeHandle::Se)
    }

    fn moves_north(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::Ne | ResizeHandle::Nw)
    }

    fn moves_south(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::Se | ResizeHandle::Sw)
    }

    /// Handle centre for a box
    pub fn anchor(self, g: &Geometry) -> (f64, f64) {
        let x = if self.moves_west() {
            g.left
        } else if self.moves_east() {
            g.right()
        } else {
            g.left + g.width / 2.0
        };
        let y = if self.moves_north() {
            g.top
        } else if self.moves_south() {
            g.bottom()
        } else {
            g.top + g.height / 2.0
        };
        (x, y)
    }

    /// Box after dragging this handle by (dx, dy) from `start`.
    /// The opposite edge stays fixed.
    pub fn apply(self, start: &Geometry, dx: f64, dy: f64) -> Geometry {
        let mut g = *start;
        if self.moves_west() {
            g.width = (start.width - dx).max(MIN_SIZE);
            g.left = start.right() - g.width;
        }
        if self.moves_east() {
            g.width = (start.width + dx).max(MIN_SIZE);
        }
        if self.moves_north() {
            g.height = (start.height - dy).max(MIN_SIZE);
            g.top = start.bottom() - g.height;
        }
        if self.moves_south() {
            g.height = (start.height + dy).max(MIN_SIZE);
        }
        g
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Drag {
        index: usize,
        from: (f64, f64),
        start: Geometry,
    },
    Resize {
        index: usize,
        handle: ResizeHandle,
        from: (f64, f64),
        start: Geometry,
    },
}

#[derive(Debug, Default)]
pub struct Instrumentation {
    elements: Vec<EditableElement>,
    selected: Option<usize>,
    gesture: Option<Gesture>,
}

impl Instrumentation {
    /// Collect editable elements in traversal order
    pub fn attach(doc: &VirtualDomDocument) -> Self {
        let elements: Vec<EditableElement> = doc
            .elements()
            .into_iter()
            .filter_map(EditableElement::from_node)
            .collect();
        tracing::debug!(count = elements.len(), "instrumented elements");
        Self {
            elements,
            ..Default::default()
        }
    }

    pub fn elements(&self) -> &[EditableElement] {
        &self.elements
    }

    pub fn selected(&self) -> Option<&EditableElement> {
        self.selected.and_then(|i| self.elements.get(i))
    }

    /// Select by element id, replacing any previous selection
    pub fn select(&mut self, element_id: &str) -> Option<SandboxMessage> {
        let index = self.elements.iter().position(|e| e.element_id == element_id)?;
        self.selected = Some(index);
        self.gesture = None;
        Some(SandboxMessage::ElementSelected(self.elements[index].clone()))
    }

    pub fn clear_selection(&mut self) -> Option<SandboxMessage> {
        self.gesture = None;
        self.selected.take().map(|_| SandboxMessage::SelectionCleared)
    }

    /// Deepest element whose box contains the point
    pub fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        self.elements
            .iter()
            .rposition(|e| e.page_box().contains(x, y))
    }

    /// Resize handle of the selected element under the point
    pub fn handle_at(&self, x: f64, y: f64) -> Option<ResizeHandle> {
        let page_box = self.selected()?.page_box();
        let half = HANDLE_SIZE / 2.0;
        ResizeHandle::ALL.into_iter().find(|handle| {
            let (hx, hy) = handle.anchor(&page_box);
            (x - hx).abs() <= half && (y - hy).abs() <= half
        })
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<SandboxMessage> {
        if let (Some(index), Some(handle)) = (self.selected, self.handle_at(x, y)) {
            self.gesture = Some(Gesture::Resize {
                index,
                handle,
                from: (x, y),
                start: self.elements[index].geometry,
            });
            return None;
        }

        match self.hit_test(x, y) {
            Some(index) => {
                self.selected = Some(index);
                self.gesture = Some(Gesture::Drag {
                    index,
                    from: (x, y),
                    start: self.elements[index].geometry,
                });
                Some(SandboxMessage::ElementSelected(self.elements[index].clone()))
            }
            None => self.clear_selection(),
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<SandboxMessage> {
        match self.gesture.clone()? {
            Gesture::Drag { index, from, start } => {
                let element = self.elements.get_mut(index)?;
                element.geometry = start.translate(x - from.0, y - from.1);
                Some(SandboxMessage::ElementMoved {
                    element_id: element.element_id.clone(),
                    left: element.geometry.left,
                    top: element.geometry.top,
                })
            }
            Gesture::Resize {
                index,
                handle,
                from,
                start,
            } => {
                let element = self.elements.get_mut(index)?;
                element.geometry = handle.apply(&start, x - from.0, y - from.1);
                Some(SandboxMessage::ElementResized {
                    element_id: element.element_id.clone(),
                    left: element.geometry.left,
                    top: element.geometry.top,
                    width: element.geometry.width,
                    height: element.geometry.height,
                })
            }
        }
    }

    /// End the current gesture; `true` if one was active
    pub fn pointer_up(&mut self) -> bool {
        self.gesture.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Evaluator;
    use serde_json::json;

    const SOURCE: &str = r#"function Slide({ data }) {
  return (
    <div style={{ width: '400px', height: '300px' }}>
      <h1 style={{ left: '50px', top: '80px', width: '100px', height: '40px' }}>{data.title}</h1>
      <p style={{ left: '0px', top: '200px', width: '200px', height: '50px' }}>Plain</p>
    </div>
  );
}"#;

    fn instrumented() -> Instrumentation {
        let doc = Evaluator::new("page").evaluate(SOURCE, &json!({ "title": "Hi" })).unwrap();
        Instrumentation::attach(&doc)
    }

    #[test]
    fn test_attach_collects_content_or_binding() {
        let inst = instrumented();
        assert_eq!(inst.elements().len(), 3);
        let h1 = &inst.elements()[1];
        assert_eq!(h1.data_binding_key.as_deref(), Some("title"));
        assert_eq!(h1.content, None);
        let p = &inst.elements()[2];
        assert_eq!(p.content.as_deref(), Some("Plain"));
        assert_eq!(p.data_binding_key, None);
    }

    #[test]
    fn test_hit_test_picks_deepest() {
        let inst = instrumented();
        assert_eq!(inst.hit_test(60.0, 90.0), Some(1));
        assert_eq!(inst.hit_test(300.0, 10.0), Some(0));
        assert_eq!(inst.hit_test(900.0, 900.0), None);
    }

    #[test]
    fn test_selection_is_exclusive() {
        let mut inst = instrumented();
        let msg = inst.pointer_down(60.0, 90.0).unwrap();
        assert!(matches!(msg, SandboxMessage::ElementSelected(ref e) if e.ordinal_index == 1));
        inst.pointer_up();
        inst.pointer_down(10.0, 210.0);
        assert_eq!(inst.selected().unwrap().ordinal_index, 2);
        assert_eq!(inst.clear_selection(), Some(SandboxMessage::SelectionCleared));
        assert!(inst.selected().is_none());
    }

    #[test]
    fn test_drag_reports_new_position() {
        let mut inst = instrumented();
        inst.pointer_down(60.0, 90.0);
        let msg = inst.pointer_move(80.0, 100.0).unwrap();
        match msg {
            SandboxMessage::ElementMoved { left, top, .. } => {
                assert_eq!((left, top), (70.0, 90.0));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(inst.pointer_up());
        assert!(inst.pointer_move(200.0, 200.0).is_none());
    }

    #[test]
    fn test_resize_from_corner_handle() {
        let mut inst = instrumented();
        inst.pointer_down(60.0, 90.0);
        inst.pointer_up();
        // south-east handle of the h1 at (150, 120)
        assert_eq!(inst.handle_at(150.0, 120.0), Some(ResizeHandle::Se));
        assert!(inst.pointer_down(150.0, 120.0).is_none());
        let msg = inst.pointer_move(170.0, 130.0).unwrap();
        assert!(matches!(
            msg,
            SandboxMessage::ElementResized { width, height, .. } if width == 120.0 && height == 50.0
        ));
    }

    #[test]
    fn test_resize_respects_minimum() {
        let start = Geometry::new(10.0, 10.0, 40.0, 40.0);
        let g = ResizeHandle::Nw.apply(&start, 100.0, 100.0);
        assert_eq!(g, Geometry::new(40.0, 40.0, MIN_SIZE, MIN_SIZE));
        let g = ResizeHandle::E.apply(&start, -100.0, 0.0);
        assert_eq!(g.width, MIN_SIZE);
        assert_eq!(g.left, 10.0);
    }

    #[test]
    fn test_select_by_id() {
        let mut inst = instrumented();
        let id = inst.elements()[2].element_id.clone();
        assert!(inst.select(&id).is_some());
        assert!(inst.select("nope").is_none());
        assert_eq!(inst.selected().unwrap().element_id, id);
    }
}
