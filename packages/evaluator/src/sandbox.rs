//! Isolated render realm.
//!
//! The sandbox runs as its own tokio task and shares no state with the
//! host: both directions carry serialized JSON strings over channels. A
//! failing or panicking evaluation is contained inside the task and
//! surfaces as a `DIAGNOSTIC` message; the host keeps running.
//!
//! After a mount the task yields once before instrumenting, so the
//! element list is always taken from the committed render.

use crate::evaluator::{Evaluator, Viewport};
use crate::instrument::Instrumentation;
use crate::message::{HostMessage, SandboxMessage};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Sandbox task has stopped")]
    Closed,

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Host-side handle to a running sandbox task
pub struct SandboxHandle {
    outbox: mpsc::Sender<String>,
    inbox: mpsc::Receiver<String>,
    task: JoinHandle<()>,
}

impl SandboxHandle {
    /// Start a sandbox for one page. Must be called inside a tokio runtime.
    pub fn spawn(page_id: &str, viewport: Viewport) -> Self {
        let (host_tx, host_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

        let realm = Realm {
            evaluator: Evaluator::new(page_id).with_viewport(viewport),
            instrumentation: Instrumentation::default(),
            events: event_tx,
        };
        let task = tokio::spawn(realm.run(host_rx));

        Self {
            outbox: host_tx,
            inbox: event_rx,
            task,
        }
    }

    pub async fn send(&self, message: &HostMessage) -> Result<(), SandboxError> {
        let raw = serde_json::to_string(message)?;
        self.send_raw(raw).await
    }

    /// Send an already serialized message
    pub async fn send_raw(&self, raw: String) -> Result<(), SandboxError> {
        self.outbox.send(raw).await.map_err(|_| SandboxError::Closed)
    }

    pub async fn mount(&self, source: &str, data: &Value) -> Result<(), SandboxError> {
        self.send(&HostMessage::Mount {
            source: source.to_string(),
            data: data.clone(),
        })
        .await
    }

    pub async fn pointer_down(&self, x: f64, y: f64) -> Result<(), SandboxError> {
        self.send(&HostMessage::PointerDown { x, y }).await
    }

    pub async fn pointer_move(&self, x: f64, y: f64) -> Result<(), SandboxError> {
        self.send(&HostMessage::PointerMove { x, y }).await
    }

    pub async fn pointer_up(&self) -> Result<(), SandboxError> {
        self.send(&HostMessage::PointerUp).await
    }

    pub async fn select(&self, element_id: &str) -> Result<(), SandboxError> {
        self.send(&HostMessage::Select {
            element_id: element_id.to_string(),
        })
        .await
    }

    /// Next raw event string, `None` once the sandbox has stopped
    pub async fn recv_raw(&mut self) -> Option<String> {
        self.inbox.recv().await
    }

    /// Next decodable event; undecodable payloads are logged and skipped
    pub async fn recv(&mut self) -> Option<SandboxMessage> {
        while let Some(raw) = self.inbox.recv().await {
            match serde_json::from_str(&raw) {
                Ok(message) => return Some(message),
                Err(err) => tracing::warn!(error = %err, "dropping undecodable sandbox event"),
            }
        }
        None
    }

    /// Raw event stream; the sandbox keeps running until the stream is dropped
    pub fn into_stream(self) -> ReceiverStream<String> {
        ReceiverStream::new(self.inbox)
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(self) {
        let _ = self.send(&HostMessage::Shutdown).await;
        drop(self.outbox);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "sandbox task ended abnormally");
        }
    }
}

struct Realm {
    evaluator: Evaluator,
    instrumentation: Instrumentation,
    events: mpsc::Sender<String>,
}

impl Realm {
    async fn run(mut self, mut host: mpsc::Receiver<String>) {
        while let Some(raw) = host.recv().await {
            let message: HostMessage = match serde_json::from_str(&raw) {
                Ok(message) => message,
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring malformed host message");
                    continue;
                }
            };

            match message {
                HostMessage::Shutdown => break,
                HostMessage::Mount { source, data } => {
                    if !self.mount(&source, &data).await {
                        break;
                    }
                }
                other => {
                    let outcome =
                        panic::catch_unwind(AssertUnwindSafe(|| self.handle_pointer(other)));
                    let reply = match outcome {
                        Ok(reply) => reply,
                        Err(_) => {
                            tracing::error!("sandbox input handler panicked");
                            self.instrumentation = Instrumentation::default();
                            None
                        }
                    };
                    if let Some(reply) = reply {
                        if !self.emit(&reply).await {
                            break;
                        }
                    }
                }
            }
        }
        tracing::debug!("sandbox stopped");
    }

    /// Render and instrument. Returns `false` once the host is gone.
    async fn mount(&mut self, source: &str, data: &Value) -> bool {
        let doc = self.evaluator.render(source, data);

        // let the render commit before instrumenting
        tokio::task::yield_now().await;

        if let Some((message, stack)) = doc.diagnostic_detail() {
            self.instrumentation = Instrumentation::default();
            return self
                .emit(&SandboxMessage::Diagnostic {
                    message: message.to_string(),
                    stack: stack.to_vec(),
                })
                .await;
        }

        self.instrumentation = Instrumentation::attach(&doc);
        self.emit(&SandboxMessage::Mounted {
            component: doc.component.clone(),
            elements: self.instrumentation.elements().to_vec(),
        })
        .await
    }

    fn handle_pointer(&mut self, message: HostMessage) -> Option<SandboxMessage> {
        match message {
            HostMessage::PointerDown { x, y } => self.instrumentation.pointer_down(x, y),
            HostMessage::PointerMove { x, y } => self.instrumentation.pointer_move(x, y),
            HostMessage::PointerUp => {
                self.instrumentation.pointer_up();
                None
            }
            HostMessage::Select { element_id } => self.instrumentation.select(&element_id),
            HostMessage::ClearSelection => self.instrumentation.clear_selection(),
            HostMessage::Mount { .. } | HostMessage::Shutdown => None,
        }
    }

    async fn emit(&self, message: &SandboxMessage) -> bool {
        match serde_json::to_string(message) {
            Ok(raw) => self.events.send(raw).await.is_ok(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode sandbox event");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SOURCE: &str = r#"export default function Slide({ data }) {
  return (
    <div style={{ width: '400px', height: '300px' }}>
      <h1 style={{ left: '50px', top: '80px', width: '100px', height: '40px' }}>{data.title}</h1>
    </div>
  );
}"#;

    #[tokio::test]
    async fn test_mount_then_select() {
        let mut sandbox = SandboxHandle::spawn("slide-1", Viewport::default());
        sandbox.mount(SOURCE, &json!({ "title": "Hi" })).await.unwrap();

        match sandbox.recv().await.unwrap() {
            SandboxMessage::Mounted { component, elements } => {
                assert_eq!(component, "Slide");
                assert_eq!(elements.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }

        sandbox.pointer_down(60.0, 90.0).await.unwrap();
        match sandbox.recv().await.unwrap() {
            SandboxMessage::ElementSelected(element) => {
                assert_eq!(element.ordinal_index, 1);
                assert_eq!(element.data_binding_key.as_deref(), Some("title"));
            }
            other => panic!("unexpected {:?}", other),
        }
        sandbox.shutdown().await;
    }

    #[tokio::test]
    async fn test_failure_is_contained() {
        let mut sandbox = SandboxHandle::spawn("slide-1", Viewport::default());
        sandbox
            .mount("function Broken() { return <div><p>x</p>; }", &json!({}))
            .await
            .unwrap();
        assert!(matches!(
            sandbox.recv().await.unwrap(),
            SandboxMessage::Diagnostic { .. }
        ));

        // the realm survives and accepts the next mount
        sandbox.mount(SOURCE, &json!({})).await.unwrap();
        assert!(matches!(
            sandbox.recv().await.unwrap(),
            SandboxMessage::Mounted { .. }
        ));
        sandbox.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_host_message_is_ignored() {
        let mut sandbox = SandboxHandle::spawn("p", Viewport::default());
        sandbox.send_raw("not json".to_string()).await.unwrap();
        sandbox.mount(SOURCE, &json!({})).await.unwrap();
        let raw = sandbox.recv_raw().await.unwrap();
        assert!(raw.contains("\"type\":\"MOUNTED\""));
        sandbox.shutdown().await;
    }
}
