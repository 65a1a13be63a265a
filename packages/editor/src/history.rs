//! # Undo/Redo History
//!
//! Snapshot log over `(source, data)` pairs.
//!
//! ## Design
//!
//! - One ordered log plus a current index; undo/redo move the index and
//!   hand back the full snapshot to restore (replace, never merge)
//! - Committing while the index is behind the end discards the entries
//!   after it before appending
//! - The log holds at most `capacity` entries; the oldest is evicted first
//! - Commits are coalesced by a [`Debouncer`]: a snapshot is taken only
//!   after the quiet period has passed since the last change
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = HistoryManager::new();
//! history.reset(Snapshot::now(source, data));
//! history.commit(Snapshot::now(edited, data));
//! let previous = history.undo().cloned();
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const DEFAULT_CAPACITY: usize = 50;
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub source: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    pub fn now(source: impl Into<String>, data: Value) -> Self {
        Self {
            source: source.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// Same editor state, ignoring when it was taken
    pub fn same_state(&self, other: &Snapshot) -> bool {
        self.source == other.source && self.data == other.data
    }
}

#[derive(Debug)]
pub struct HistoryManager {
    entries: VecDeque<Snapshot>,
    index: usize,
    capacity: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            index: 0,
            capacity,
        }
    }

    /// Start a fresh log at `snapshot` (page load)
    pub fn reset(&mut self, snapshot: Snapshot) {
        self.entries.clear();
        self.entries.push_back(snapshot);
        self.index = 0;
    }

    /// Append a snapshot. Returns `false` when it matches the current entry.
    pub fn commit(&mut self, snapshot: Snapshot) -> bool {
        if self.current().is_some_and(|c| c.same_state(&snapshot)) {
            return false;
        }

        // branch discard
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }

        self.entries.push_back(snapshot);
        self.index = self.entries.len() - 1;
        tracing::debug!(index = self.index, len = self.entries.len(), "history commit");
        true
    }

    /// Step back; the returned snapshot replaces the current state
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }
}

/// Quiet-period coalescing of change notifications.
///
/// Time is passed in so callers (and tests) control the clock.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    last_change: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            last_change: None,
        }
    }

    /// Record a change at `now`, restarting the quiet period
    pub fn touch(&mut self, now: Instant) {
        self.last_change = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_change.is_some()
    }

    /// `true` once, when the quiet period has elapsed since the last change
    pub fn take_ready(&mut self, now: Instant) -> bool {
        match self.last_change {
            Some(at) if now.saturating_duration_since(at) >= self.quiet => {
                self.last_change = None;
                true
            }
            _ => false,
        }
    }

    /// Clear a pending change; `true` if one was pending
    pub fn cancel(&mut self) -> bool {
        self.last_change.take().is_some()
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(n: usize) -> Snapshot {
        Snapshot::now(format!("<div>{}</div>", n), json!({ "n": n }))
    }

    #[test]
    fn test_undo_redo_restores_exact_states() {
        let mut history = HistoryManager::new();
        history.reset(state(0));
        history.commit(state(1));
        history.commit(state(2));
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);

        assert!(history.undo().unwrap().same_state(&state(1)));
        assert!(history.redo().unwrap().same_state(&state(2)));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_bounded_at_start() {
        let mut history = HistoryManager::new();
        history.reset(state(0));
        assert!(history.undo().is_none());
        assert!(!history.can_undo());
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn test_commit_after_undo_discards_branch() {
        let mut history = HistoryManager::new();
        history.reset(state(0));
        history.commit(state(1));
        history.commit(state(2));
        history.undo();
        history.undo();
        history.commit(state(9));
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert!(history.current().unwrap().same_state(&state(9)));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = HistoryManager::new();
        history.reset(state(0));
        for n in 1..=51 {
            history.commit(state(n));
            assert!(history.len() <= DEFAULT_CAPACITY);
        }
        assert_eq!(history.len(), DEFAULT_CAPACITY);
        assert_eq!(history.index(), DEFAULT_CAPACITY - 1);
        assert!(history.entries().next().unwrap().same_state(&state(2)));
    }

    #[test]
    fn test_duplicate_commit_is_ignored() {
        let mut history = HistoryManager::new();
        history.reset(state(0));
        assert!(!history.commit(state(0)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_debouncer_waits_for_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        assert!(!debouncer.take_ready(start));

        debouncer.touch(start);
        debouncer.touch(start + Duration::from_millis(300));
        assert!(!debouncer.take_ready(start + Duration::from_millis(700)));
        assert!(debouncer.take_ready(start + Duration::from_millis(800)));
        assert!(!debouncer.take_ready(start + Duration::from_millis(900)));
    }
}
