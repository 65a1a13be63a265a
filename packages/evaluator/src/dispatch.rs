//! Host-side routing of sandbox events.
//!
//! Handlers register against a [`MessageKind`]; an incoming message runs
//! every handler registered for its kind, in registration order. Messages
//! with no handler are dropped with a debug log.

use crate::message::{MessageKind, SandboxMessage};
use std::collections::HashMap;

type Handler<S> = Box<dyn FnMut(&mut S, &SandboxMessage) + Send>;

pub struct Dispatcher<S> {
    handlers: HashMap<MessageKind, Vec<Handler<S>>>,
}

impl<S> Default for Dispatcher<S> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<S> Dispatcher<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, kind: MessageKind, handler: F) -> Self
    where
        F: FnMut(&mut S, &SandboxMessage) + Send + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
        self
    }

    /// Run the handlers for `message`; returns how many ran
    pub fn dispatch(&mut self, state: &mut S, message: &SandboxMessage) -> usize {
        match self.handlers.get_mut(&message.kind()) {
            Some(handlers) => {
                for handler in handlers.iter_mut() {
                    handler(state, message);
                }
                handlers.len()
            }
            None => {
                tracing::debug!(kind = ?message.kind(), "no handler for sandbox event");
                0
            }
        }
    }

    /// Decode a raw event and dispatch it
    pub fn dispatch_raw(&mut self, state: &mut S, raw: &str) -> Result<usize, serde_json::Error> {
        let message: SandboxMessage = serde_json::from_str(raw)?;
        Ok(self.dispatch(state, &message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Seen {
        moved: Vec<(f64, f64)>,
        cleared: usize,
    }

    #[test]
    fn test_routes_by_kind() {
        let mut dispatcher = Dispatcher::<Seen>::new()
            .on(MessageKind::ElementMoved, |seen, msg| {
                if let SandboxMessage::ElementMoved { left, top, .. } = msg {
                    seen.moved.push((*left, *top));
                }
            })
            .on(MessageKind::SelectionCleared, |seen, _| seen.cleared += 1);

        let mut seen = Seen::default();
        let raw = r#"{"type":"ELEMENT_MOVED","elementId":"a-1","left":5.0,"top":6.0}"#;
        assert_eq!(dispatcher.dispatch_raw(&mut seen, raw).unwrap(), 1);
        assert_eq!(dispatcher.dispatch(&mut seen, &SandboxMessage::SelectionCleared), 1);
        assert_eq!(seen.moved, vec![(5.0, 6.0)]);
        assert_eq!(seen.cleared, 1);

        let unhandled = SandboxMessage::Diagnostic {
            message: "x".into(),
            stack: vec![],
        };
        assert_eq!(dispatcher.dispatch(&mut seen, &unhandled), 0);
        assert!(dispatcher.dispatch_raw(&mut seen, "{}").is_err());
    }
}
