//! Editor mode state machine.
//!
//! ```text
//!   Idle ──load──► Loading ──done──► Idle
//!   Idle ──edit──► Editing ──commit──► Idle
//!   Idle/Editing ──undo/redo──► Replaying ──done──► Idle
//! ```
//!
//! History commits are only taken in `Idle` and `Editing`, so loading a
//! page or replaying a snapshot is never recorded as a new edit.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EditorMode {
    #[default]
    Idle,
    Loading,
    Replaying,
    /// A user change is waiting for its history commit
    Editing,
}

impl EditorMode {
    pub fn records_history(self) -> bool {
        matches!(self, EditorMode::Idle | EditorMode::Editing)
    }

    pub fn is_busy(self) -> bool {
        matches!(self, EditorMode::Loading | EditorMode::Replaying)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_and_replay_suppress_history() {
        assert!(EditorMode::Idle.records_history());
        assert!(EditorMode::Editing.records_history());
        assert!(!EditorMode::Loading.records_history());
        assert!(!EditorMode::Replaying.records_history());
        assert!(EditorMode::Replaying.is_busy());
    }
}
