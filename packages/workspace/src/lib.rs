//! # LiveCanvas Workspace
//!
//! Service-facing side of the editor: loading and saving pages through the
//! persistence gateway, and AI edit requests through the generation
//! service.
//!
//! Both services sit behind traits (`PersistenceGateway`,
//! `GenerationService`, `SessionStore`); [`HttpGateway`] is the HTTP
//! implementation of the first two.

pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod generation;
pub mod orchestrator;

pub use config::{Config, API_BASE_URL_ENV, DEFAULT_CONFIG_NAME};
pub use credentials::{EnvSessionStore, SessionStore, StaticSessionStore};
pub use error::{ConfigError, GatewayError, GatewayResult, OrchestratorError};
pub use gateway::{open_page, save_page, HttpGateway, PageRecord, PersistenceGateway, SaveSummary};
pub use generation::{
    CodeEditRequest, CodeEditResponse, DataEditRequest, DataEditResponse, GenerationService,
};
pub use orchestrator::{
    EditMode, EditTarget, Orchestrator, Proposal, Role, Transcript, TranscriptEntry,
};
