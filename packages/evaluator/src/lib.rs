//! # LiveCanvas Evaluator
//!
//! Sandboxed rendering of component source.
//!
//! ```text
//! HostMessage (JSON) ──► sandbox task ──► Evaluator ──► VirtualDomDocument
//!                                     └─► Instrumentation ──► SandboxMessage (JSON)
//! ```
//!
//! The [`Evaluator`] is pure: same source, data and viewport give the same
//! document. [`SandboxHandle`] runs it in an isolated task so a failing
//! component shows a diagnostic overlay instead of taking the host down.

pub mod dispatch;
pub mod evaluator;
pub mod instrument;
pub mod message;
pub mod sandbox;
pub mod vdom;

pub use dispatch::Dispatcher;
pub use evaluator::{EvalError, EvalResult, Evaluator, Viewport};
pub use instrument::{EditableElement, Instrumentation, ResizeHandle};
pub use message::{HostMessage, MessageKind, SandboxMessage};
pub use sandbox::{SandboxError, SandboxHandle};
pub use vdom::{Geometry, VNode, VirtualDomDocument};
