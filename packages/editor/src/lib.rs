//! # LiveCanvas Editor
//!
//! Keeps component source, data context and the rendered view in sync.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ sandbox events (select / move / resize)     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditSession                         │
//! │  - PropertyPanel stages changes per element │
//! │  - bindings route bound text to the data    │
//! │  - patch rewrites one element in the source │
//! │  - HistoryManager snapshots (source, data)  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ evaluator: re-render                        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Source text is the source of truth**: the rendered view is derived
//! 2. **Edit one element, keep every other byte**: no reparse/reprint cycle
//! 3. **Bound text lives in the data**: `{data.title}` edits never touch source
//! 4. **History is debounced**: one snapshot per burst of changes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use livecanvas_editor::{EditSession, Page, PropertyChanges, SessionConfig};
//!
//! let page = Page::new("slide-1", source, data);
//! let mut session = EditSession::for_page(page, SessionConfig::default())?;
//!
//! // stage a move from the sandbox, then write it into the source
//! session.panel_mut().stage(1, PropertyChanges::new().position(50.0, 80.0));
//! session.save_changes(Instant::now())?;
//!
//! session.undo();
//! ```

pub mod bindings;
pub mod document;
pub mod errors;
pub mod history;
pub mod mode;
pub mod panel;
pub mod patch;
pub mod session;

pub use bindings::{apply_text_edit, extract_bindings, resolve_display, Binding, BindingTable};
pub use document::{parse_data_context, Document, Page};
pub use errors::{EditorError, EditorResult};
pub use history::{Debouncer, HistoryManager, Snapshot};
pub use mode::EditorMode;
pub use panel::{PanelSelection, PropertyPanel};
pub use patch::{patch, patch_with_data, px, DataEdit, PatchError, PatchOutcome, PropertyChanges};
pub use session::{EditSession, SaveReport, SessionConfig};
