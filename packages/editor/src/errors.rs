//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] livecanvas_parser::ParseError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] livecanvas_evaluator::EvalError),

    #[error("Document has no pages")]
    NoPage,

    #[error("Page {index} is out of range ({len} pages)")]
    PageOutOfRange { index: usize, len: usize },

    #[error("Element '{0}' does not belong to the current page")]
    UnknownElement(String),

    #[error("Nothing selected")]
    NoSelection,
}

pub type EditorResult<T> = Result<T, EditorError>;
