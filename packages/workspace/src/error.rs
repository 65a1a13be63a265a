use livecanvas_editor::EditorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures talking to the persistence or generation service
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {path} returned {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No session token; set {0}")]
    MissingCredential(String),

    #[error("Page {0} has no component id")]
    MissingComponentId(String),

    #[error(transparent)]
    Editor(#[from] EditorError),
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("An AI request is already in flight")]
    Busy,

    #[error("Request text is empty")]
    EmptyRequest,

    #[error("Proposal was generated for page {expected}; page {current} is open")]
    PageChanged { expected: String, current: String },

    #[error("Generation failed: {0}")]
    Generation(#[from] GatewayError),

    #[error(transparent)]
    Editor(#[from] EditorError),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
