//! # Pages and Documents
//!
//! A document is an ordered sequence of pages. Each page owns one
//! component source and its data context, plus the remote identifiers the
//! persistence gateway needs.
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Edit (dirty) → Save (clean)
//!          ↓
//!    navigate away → unsaved edits are discarded
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parse a data context string. Invalid JSON and non-object values
/// degrade to `{}` so rendering proceeds with fallbacks.
pub fn parse_data_context(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            tracing::warn!(kind = %json_kind(&other), "data context is not an object; using {{}}");
            empty_data()
        }
        Err(err) => {
            tracing::warn!(error = %err, "data context is not valid JSON; using {{}}");
            empty_data()
        }
    }
}

pub fn empty_data() -> Value {
    Value::Object(Default::default())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_id: Option<String>,
    pub source: String,
    pub data: Value,
    /// Last saved (or loaded) state
    #[serde(skip)]
    saved: Option<(String, Value)>,
}

impl Page {
    pub fn new(id: impl Into<String>, source: impl Into<String>, data: Value) -> Self {
        let source = source.into();
        Self {
            id: id.into(),
            component_id: None,
            slide_id: None,
            saved: Some((source.clone(), data.clone())),
            source,
            data,
        }
    }

    pub fn with_remote_ids(mut self, component_id: Option<String>, slide_id: Option<String>) -> Self {
        self.component_id = component_id;
        self.slide_id = slide_id;
        self
    }

    /// Page whose data arrives as a JSON string
    pub fn from_data_text(id: impl Into<String>, source: impl Into<String>, data: &str) -> Self {
        Self::new(id, source, parse_data_context(data))
    }

    /// Unsaved changes are present
    pub fn is_dirty(&self) -> bool {
        self.source_changed() || self.data_changed()
    }

    pub fn source_changed(&self) -> bool {
        self.saved.as_ref().map_or(true, |(source, _)| *source != self.source)
    }

    pub fn data_changed(&self) -> bool {
        self.saved.as_ref().map_or(true, |(_, data)| *data != self.data)
    }

    /// Current state becomes the saved baseline
    pub fn mark_saved(&mut self) {
        self.saved = Some((self.source.clone(), self.data.clone()));
    }

    /// Drop unsaved edits; returns `true` if there were any
    pub fn discard_changes(&mut self) -> bool {
        if !self.is_dirty() {
            return false;
        }
        if let Some((source, data)) = &self.saved {
            self.source = source.clone();
            self.data = data.clone();
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pages: Vec<Page>,
    current: usize,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages, current: 0 }
    }

    pub fn push(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Page> {
        self.pages.get(self.current)
    }

    pub fn current_mut(&mut self) -> Option<&mut Page> {
        self.pages.get_mut(self.current)
    }

    /// Move to `index`; `false` when out of range
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.pages.len() {
            return false;
        }
        self.current = index;
        true
    }

    pub fn next(&mut self) -> bool {
        self.select(self.current + 1)
    }

    pub fn prev(&mut self) -> bool {
        match self.current.checked_sub(1) {
            Some(index) => self.select(index),
            None => false,
        }
    }

    pub fn any_dirty(&self) -> bool {
        self.pages.iter().any(Page::is_dirty)
    }
}
