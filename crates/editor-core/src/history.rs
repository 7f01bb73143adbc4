//! Snapshot-based undo/redo history.
//!
//! A linear, bounded log: an ordered list of snapshots plus a cursor index
//! pointing at the entry that corresponds to the current state. Every store
//! mutation pushes a structural copy of the pre-mutation state; undo and
//! redo walk the cursor.

use serde::{Deserialize, Serialize};

use cutline_project_model::{ClipId, CompositingSettings, Track};

/// Maximum number of history entries. The oldest entry is evicted once the
/// log grows past this, shifting the cursor down so relative position is
/// preserved.
pub const HISTORY_CAP: usize = 50;

/// A structural copy of the full editable state, captured immediately
/// before a mutation is applied.
///
/// Snapshots own their data (no shared references), so later live mutation
/// cannot retroactively alter history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub tracks: Vec<Track>,
    pub selected: Option<ClipId>,
    pub compositing: CompositingSettings,
    pub visible_overlays: usize,
}

/// Bounded linear undo/redo log.
#[derive(Debug, Default)]
pub struct History {
    snapshots: Vec<EditorSnapshot>,
    /// Index of the entry the session is currently "at".
    cursor: usize,
    /// True between a push and the next undo/redo: the live state has moved
    /// past `snapshots[cursor]` and is not yet recorded in the log. While
    /// set, the cursor is always at the tail.
    live_ahead: bool,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pre-mutation state. Discards any redo branch beyond the
    /// cursor, appends, and advances the cursor to the new tail.
    pub fn push(&mut self, pre_mutation: EditorSnapshot) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push(pre_mutation);
        self.cursor = self.snapshots.len() - 1;
        self.live_ahead = true;
        self.enforce_cap();

        tracing::debug!(depth = self.snapshots.len(), cursor = self.cursor, "History push");
    }

    /// Step back one entry. Returns the snapshot to restore, or `None` when
    /// there is nothing to undo (silent boundary no-op).
    ///
    /// `current` is the live state; on the first undo after a mutation it is
    /// appended to the log so `redo` can return to it.
    pub fn undo(&mut self, current: EditorSnapshot) -> Option<EditorSnapshot> {
        if self.snapshots.is_empty() {
            return None;
        }

        if self.live_ahead {
            // The live state is one step past the tail; record it so the
            // redo branch can reach it again.
            let restore = self.snapshots[self.cursor].clone();
            self.snapshots.push(current);
            self.live_ahead = false;
            self.enforce_cap();
            tracing::debug!(cursor = self.cursor, "Undo");
            return Some(restore);
        }

        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        tracing::debug!(cursor = self.cursor, "Undo");
        Some(self.snapshots[self.cursor].clone())
    }

    /// Step forward one entry. Returns the snapshot to restore, or `None`
    /// when there is nothing to redo (silent boundary no-op).
    pub fn redo(&mut self) -> Option<EditorSnapshot> {
        if self.live_ahead || self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        tracing::debug!(cursor = self.cursor, "Redo");
        Some(self.snapshots[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty() && (self.live_ahead || self.cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        !self.live_ahead && self.cursor + 1 < self.snapshots.len()
    }

    /// Number of entries currently in the log.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = 0;
        self.live_ahead = false;
    }

    fn enforce_cap(&mut self) {
        while self.snapshots.len() > HISTORY_CAP {
            self.snapshots.remove(0);
            // Relative position is preserved; the cursor can only be at 0
            // here if the evicted entry was the cursor itself, which the
            // live_ahead invariant (cursor at tail) rules out.
            self.cursor = self.cursor.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_project_model::Track;

    fn snap(tag: usize) -> EditorSnapshot {
        EditorSnapshot {
            tracks: Track::session_tracks(),
            selected: Some(cutline_project_model::ClipId(tag as u64)),
            compositing: CompositingSettings::default(),
            visible_overlays: tag % 5,
        }
    }

    #[test]
    fn test_new_history_is_empty() {
        let h = History::new();
        assert!(!h.can_undo());
        assert!(!h.can_redo());
        assert_eq!(h.len(), 0);
    }

    #[test]
    fn test_undo_empty_is_noop() {
        let mut h = History::new();
        assert!(h.undo(snap(0)).is_none());
    }

    #[test]
    fn test_redo_empty_is_noop() {
        let mut h = History::new();
        assert!(h.redo().is_none());
    }

    #[test]
    fn test_undo_restores_pre_mutation_state() {
        let mut h = History::new();
        // Mutation: state 0 -> state 1
        h.push(snap(0));
        let restored = h.undo(snap(1)).unwrap();
        assert_eq!(restored, snap(0));
    }

    #[test]
    fn test_redo_after_undo_restores_post_mutation_state() {
        let mut h = History::new();
        h.push(snap(0));
        h.undo(snap(1)).unwrap();

        let restored = h.redo().unwrap();
        assert_eq!(restored, snap(1));
        assert!(!h.can_redo());
    }

    #[test]
    fn test_multiple_undo_redo_cycle() {
        let mut h = History::new();
        h.push(snap(0)); // mutation -> 1
        h.push(snap(1)); // mutation -> 2
        h.push(snap(2)); // mutation -> 3

        assert_eq!(h.undo(snap(3)).unwrap(), snap(2));
        assert_eq!(h.undo(snap(3)).unwrap(), snap(1));
        assert_eq!(h.undo(snap(3)).unwrap(), snap(0));
        assert!(h.undo(snap(3)).is_none());

        assert_eq!(h.redo().unwrap(), snap(1));
        assert_eq!(h.redo().unwrap(), snap(2));
        assert_eq!(h.redo().unwrap(), snap(3));
        assert!(h.redo().is_none());
    }

    #[test]
    fn test_push_discards_redo_branch() {
        let mut h = History::new();
        h.push(snap(0));
        h.push(snap(1));
        h.undo(snap(2)).unwrap();
        assert!(h.can_redo());

        h.push(snap(10)); // new branch
        assert!(!h.can_redo());
        assert!(h.redo().is_none());
    }

    #[test]
    fn test_cap_is_enforced() {
        let mut h = History::new();
        for i in 0..200 {
            h.push(snap(i));
            assert!(h.len() <= HISTORY_CAP);
        }
        assert_eq!(h.len(), HISTORY_CAP);
    }

    #[test]
    fn test_undo_still_works_after_eviction() {
        let mut h = History::new();
        for i in 0..(HISTORY_CAP + 20) {
            h.push(snap(i));
        }
        // The oldest entries were evicted but the most recent pre-mutation
        // state must still be restorable.
        let restored = h.undo(snap(999)).unwrap();
        assert_eq!(restored, snap(HISTORY_CAP + 19));
        assert!(h.len() <= HISTORY_CAP);
    }

    #[test]
    fn test_clear() {
        let mut h = History::new();
        h.push(snap(0));
        h.clear();
        assert!(!h.can_undo());
        assert!(h.is_empty());
    }
}
