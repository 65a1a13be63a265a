//! # AI Edit Orchestrator
//!
//! Sends natural-language edit requests to the generation service and
//! applies the result to an [`EditSession`].
//!
//! ## Design
//!
//! - Two modes. Code mode replaces the source wholesale and never touches
//!   data; data mode replaces the data context and never touches source
//! - One request in flight per orchestrator; a second send while one is
//!   pending is rejected with [`OrchestratorError::Busy`]
//! - A failed call adds an error entry to the transcript and returns
//!   before anything is applied
//! - A proposal remembers the page it was generated for and is refused
//!   once the session has moved to another page
//! - Generation does not persist. Saving is a separate call on the
//!   gateway (`save_page`)
//!
//! ## Example
//!
//! ```rust,ignore
//! let orchestrator = Orchestrator::new(Arc::new(gateway));
//! let proposal = orchestrator
//!     .request(EditMode::Code, &session, "make the title red", None)
//!     .await?;
//! orchestrator.apply(proposal, &mut session, Instant::now())?;
//! ```

use crate::error::OrchestratorError;
use crate::generation::{CodeEditRequest, DataEditRequest, GenerationService};
use chrono::{DateTime, Utc};
use livecanvas_editor::{EditSession, Page};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    Code,
    Data,
}

impl std::fmt::Display for EditMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditMode::Code => f.write_str("code"),
            EditMode::Data => f.write_str("data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub mode: EditMode,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Conversation log shown next to the editor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn push(&mut self, role: Role, mode: EditMode, content: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            role,
            mode,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a request is about: one page's component and its current state
#[derive(Debug, Clone, PartialEq)]
pub struct EditTarget {
    pub page_id: String,
    pub component_id: String,
    pub source: String,
    pub data: Value,
}

impl EditTarget {
    /// The page's remote component id, or the page id for local pages
    pub fn of(page: &Page) -> Self {
        Self {
            page_id: page.id.clone(),
            component_id: page.component_id.clone().unwrap_or_else(|| page.id.clone()),
            source: page.source.clone(),
            data: page.data.clone(),
        }
    }
}

/// A generated change, not yet applied
#[derive(Debug, Clone, PartialEq)]
pub enum Proposal {
    Code {
        page_id: String,
        source: String,
        summary: String,
    },
    Data {
        page_id: String,
        data: Value,
        summary: String,
    },
}

impl Proposal {
    pub fn mode(&self) -> EditMode {
        match self {
            Proposal::Code { .. } => EditMode::Code,
            Proposal::Data { .. } => EditMode::Data,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            Proposal::Code { summary, .. } | Proposal::Data { summary, .. } => summary,
        }
    }

    /// Page the proposal was generated from
    pub fn page_id(&self) -> &str {
        match self {
            Proposal::Code { page_id, .. } | Proposal::Data { page_id, .. } => page_id,
        }
    }

    /// Replace the side of the session this proposal was generated for.
    /// Fails without touching the session when another page is current.
    pub fn apply(self, session: &mut EditSession, now: Instant) -> Result<(), OrchestratorError> {
        let current = &session.page()?.id;
        if current != self.page_id() {
            return Err(OrchestratorError::PageChanged {
                expected: self.page_id().to_string(),
                current: current.clone(),
            });
        }
        match self {
            Proposal::Code { source, .. } => session.replace_source(source, now)?,
            Proposal::Data { data, .. } => session.replace_data(data, now)?,
        }
        Ok(())
    }
}

/// Held while a request is outstanding; dropping it frees the slot
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Orchestrator {
    service: Arc<dyn GenerationService>,
    in_flight: AtomicBool,
    transcript: Mutex<Transcript>,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            service,
            in_flight: AtomicBool::new(false),
            transcript: Mutex::new(Transcript::default()),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn transcript_mut(&self) -> MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the transcript
    pub fn transcript(&self) -> Transcript {
        self.transcript_mut().clone()
    }

    pub fn clear_transcript(&self) {
        self.transcript_mut().clear();
    }

    /// Ask the service for an edit of the session's current page.
    ///
    /// Nothing in the session changes here; apply the returned
    /// [`Proposal`] to take it.
    pub async fn request(
        &self,
        mode: EditMode,
        session: &EditSession,
        prompt: &str,
        attachment: Option<String>,
    ) -> Result<Proposal, OrchestratorError> {
        let target = EditTarget::of(session.page()?);
        self.send(mode, target, prompt, attachment).await
    }

    /// Request an edit from explicit inputs
    pub async fn send(
        &self,
        mode: EditMode,
        target: EditTarget,
        prompt: &str,
        attachment: Option<String>,
    ) -> Result<Proposal, OrchestratorError> {
        let EditTarget {
            page_id,
            component_id,
            source,
            data,
        } = target;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(OrchestratorError::EmptyRequest);
        }
        let Some(_slot) = InFlight::acquire(&self.in_flight) else {
            tracing::warn!(%mode, "AI request rejected; another is in flight");
            return Err(OrchestratorError::Busy);
        };

        self.transcript_mut().push(Role::User, mode, prompt);
        tracing::info!(%mode, %component_id, "AI edit requested");

        let result = match mode {
            EditMode::Code => self
                .service
                .edit_code(CodeEditRequest {
                    component_id,
                    current_source: source,
                    natural_language_request: prompt.to_string(),
                    attachment,
                    preserve_functionality: true,
                })
                .await
                .map(|reply| Proposal::Code {
                    page_id,
                    source: reply.modified_source,
                    summary: reply.summary,
                }),
            EditMode::Data => self
                .service
                .edit_data(DataEditRequest {
                    component_id,
                    current_source: source,
                    current_data_schema: data.to_string(),
                    natural_language_request: prompt.to_string(),
                    allow_key_changes: true,
                })
                .await
                .and_then(|reply| {
                    Ok(Proposal::Data {
                        page_id,
                        data: crate::gateway::data_object(reply.modified_data)?,
                        summary: reply.summary,
                    })
                }),
        };

        match result {
            Ok(proposal) => {
                self.transcript_mut()
                    .push(Role::Assistant, mode, proposal.summary());
                tracing::info!(%mode, "AI edit received");
                Ok(proposal)
            }
            Err(err) => {
                tracing::error!(%mode, error = %err, "AI edit failed");
                self.transcript_mut().push(Role::Error, mode, err.to_string());
                Err(err.into())
            }
        }
    }

    /// Apply a proposal to the session. A refusal is added to the
    /// transcript so it does not read as a completed edit.
    pub fn apply(
        &self,
        proposal: Proposal,
        session: &mut EditSession,
        now: Instant,
    ) -> Result<(), OrchestratorError> {
        let mode = proposal.mode();
        proposal.apply(session, now).inspect_err(|err| {
            tracing::warn!(%mode, error = %err, "AI edit not applied");
            self.transcript_mut().push(Role::Error, mode, err.to_string());
        })
    }

    /// Request and apply in one step. On failure the session is untouched.
    pub async fn edit(
        &self,
        mode: EditMode,
        session: &mut EditSession,
        prompt: &str,
        attachment: Option<String>,
        now: Instant,
    ) -> Result<String, OrchestratorError> {
        let proposal = self.request(mode, session, prompt, attachment).await?;
        let summary = proposal.summary().to_string();
        self.apply(proposal, session, now)?;
        Ok(summary)
    }
}
