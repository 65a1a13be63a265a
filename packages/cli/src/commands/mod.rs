pub mod bindings;
pub mod edit;
pub mod patch;
pub mod render;
pub mod save;

pub use bindings::{bindings, BindingsArgs};
pub use edit::{edit, EditArgs};
pub use patch::{patch, PatchArgs};
pub use render::{render, RenderArgs};
pub use save::{save, SaveArgs};

use anyhow::{Context, Result};
use livecanvas_editor::parse_data_context;
use serde_json::Value;
use std::path::Path;

pub(crate) fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))
}

/// Data context from a JSON file; missing path means `{}`
pub(crate) fn read_data(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) => Ok(parse_data_context(&read_source(path)?)),
        None => Ok(parse_data_context("{}")),
    }
}

pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
