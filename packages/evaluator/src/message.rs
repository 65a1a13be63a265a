//! Messages crossing the sandbox boundary.
//!
//! Both directions are JSON objects discriminated by a `type` field in
//! SCREAMING_SNAKE_CASE (`{"type":"ELEMENT_SELECTED", ...}`), with
//! camelCase payload fields.

use crate::instrument::EditableElement;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Host → sandbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostMessage {
    /// Render `source` against `data`, replacing whatever is mounted
    Mount { source: String, data: Value },
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    #[serde(rename_all = "camelCase")]
    Select { element_id: String },
    ClearSelection,
    Shutdown,
}

/// Sandbox → host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SandboxMessage {
    #[serde(rename_all = "camelCase")]
    Mounted {
        component: String,
        elements: Vec<EditableElement>,
    },
    /// Evaluation failed; the diagnostic overlay is showing
    Diagnostic { message: String, stack: Vec<String> },
    ElementSelected(EditableElement),
    #[serde(rename_all = "camelCase")]
    ElementMoved {
        element_id: String,
        left: f64,
        top: f64,
    },
    #[serde(rename_all = "camelCase")]
    ElementResized {
        element_id: String,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    },
    SelectionCleared,
}

/// Discriminant of [`SandboxMessage`], used to key handler tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Mounted,
    Diagnostic,
    ElementSelected,
    ElementMoved,
    ElementResized,
    SelectionCleared,
}

impl SandboxMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            SandboxMessage::Mounted { .. } => MessageKind::Mounted,
            SandboxMessage::Diagnostic { .. } => MessageKind::Diagnostic,
            SandboxMessage::ElementSelected(_) => MessageKind::ElementSelected,
            SandboxMessage::ElementMoved { .. } => MessageKind::ElementMoved,
            SandboxMessage::ElementResized { .. } => MessageKind::ElementResized,
            SandboxMessage::SelectionCleared => MessageKind::SelectionCleared,
        }
    }

    /// Element the message is about, if any
    pub fn element_id(&self) -> Option<&str> {
        match self {
            SandboxMessage::ElementSelected(element) => Some(&element.element_id),
            SandboxMessage::ElementMoved { element_id, .. }
            | SandboxMessage::ElementResized { element_id, .. } => Some(element_id),
            _ => None,
        }
    }
}
