//! The editor store: single source of truth for the editing session.
//!
//! All timeline mutations go through the operations defined here. Each
//! operation validates first, then pushes a history snapshot, then
//! mutates, so a rejected operation is a clean no-op that never pollutes
//! history and never leaves the model structurally invalid. Track orders
//! are re-densified to `0..n-1` before an operation returns, so no
//! observer ever sees gaps.

use cutline_project_model::{
    Clip, ClipDescriptor, ClipId, CompositingSettings, PipPlacement, PipSample, Project, Track,
    TrackId, TrackKind, MIN_CLIP_DURATION, OVERLAY_TRACK_COUNT,
};

use crate::history::{EditorSnapshot, History};

/// A rejected timeline operation. The store state is unchanged whenever one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("unknown clip {0}")]
    UnknownClip(ClipId),

    #[error("unknown track {0}")]
    UnknownTrack(TrackId),

    #[error("invalid trim [{start}, {end}] for a {duration}s source")]
    InvalidTrim { start: f64, end: f64, duration: f64 },

    #[error("split point {t} outside clip interval ({start}, {end})")]
    SplitOutOfBounds { t: f64, start: f64, end: f64 },

    #[error("index {index} out of range for a track of {len} clips")]
    IndexOutOfRange { index: usize, len: usize },
}

/// The authoritative editing state: fixed track set, selection, compositing
/// settings, and visible overlay count, plus the undo history and the clip
/// id allocator.
#[derive(Debug)]
pub struct EditorStore {
    tracks: Vec<Track>,
    selected: Option<ClipId>,
    compositing: CompositingSettings,
    visible_overlays: usize,
    history: History,
    next_clip_id: u64,
}

impl Default for EditorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorStore {
    /// Create a store with the fixed session track set and empty history.
    pub fn new() -> Self {
        Self {
            tracks: Track::session_tracks(),
            selected: None,
            compositing: CompositingSettings::default(),
            visible_overlays: 1,
            history: History::new(),
            next_clip_id: 1,
        }
    }

    /// Build a store from a loaded project. The id allocator resumes past
    /// the largest persisted clip id.
    pub fn from_project(project: &Project) -> Self {
        let next_clip_id = project
            .tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .map(|c| c.id.0)
            .max()
            .map(|m| m + 1)
            .unwrap_or(1);

        Self {
            tracks: project.tracks.clone(),
            selected: project.selected,
            compositing: project.compositing.clone(),
            visible_overlays: project.visible_overlays,
            history: History::new(),
            next_clip_id,
        }
    }

    /// Copy the editable state back onto a project for persistence.
    pub fn apply_to_project(&self, project: &mut Project) {
        project.tracks = self.tracks.clone();
        project.selected = self.selected;
        project.compositing = self.compositing.clone();
        project.visible_overlays = self.visible_overlays;
    }

    // --- Queries ---

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// The main track. The track set is fixed at construction, so this
    /// always resolves.
    pub fn main_track(&self) -> &Track {
        self.tracks
            .iter()
            .find(|t| t.kind == TrackKind::Main)
            .unwrap_or(&self.tracks[0])
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Look up a clip anywhere in the store.
    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.tracks.iter().find_map(|t| t.clip(id))
    }

    /// The track holding a given clip.
    pub fn find_clip_track(&self, id: ClipId) -> Option<TrackId> {
        self.tracks
            .iter()
            .find(|t| t.clip(id).is_some())
            .map(|t| t.id)
    }

    /// Total timeline duration: sum of trimmed durations on the main track.
    pub fn total_duration(&self) -> f64 {
        self.main_track().total_duration()
    }

    pub fn selected(&self) -> Option<ClipId> {
        self.selected
    }

    pub fn compositing(&self) -> &CompositingSettings {
        &self.compositing
    }

    /// Sample the instantaneous overlay placement at sequence time `t`.
    /// Both the live preview and the export pipeline read through here.
    pub fn pip_sample(&self, t: f64) -> PipSample {
        self.compositing.sample(t)
    }

    pub fn visible_overlays(&self) -> usize {
        self.visible_overlays
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // --- Timeline operations ---

    /// Append clips built from descriptors to a track, assigning
    /// `order = max(existing) + 1 + i` in input order. Selects the first
    /// appended clip when nothing is selected. Returns the new ids.
    ///
    /// Descriptors with a non-positive duration are skipped with a warning
    /// so the trim invariant can never be violated on entry.
    pub fn add_clips(
        &mut self,
        descriptors: Vec<ClipDescriptor>,
        track_id: TrackId,
    ) -> Result<Vec<ClipId>, EditError> {
        if self.track(track_id).is_none() {
            return Err(EditError::UnknownTrack(track_id));
        }
        let usable: Vec<ClipDescriptor> = descriptors
            .into_iter()
            .filter(|d| {
                if d.duration <= 0.0 {
                    tracing::warn!(source = ?d.source, "Skipping zero-duration clip descriptor");
                    false
                } else {
                    true
                }
            })
            .collect();
        if usable.is_empty() {
            return Ok(Vec::new());
        }

        self.push_history();

        let track = self.track_mut(track_id);
        let base_order = track.next_order();
        let mut ids = Vec::with_capacity(usable.len());
        for (i, desc) in usable.into_iter().enumerate() {
            let id = ClipId(self.next_clip_id);
            self.next_clip_id += 1;

            let track = self.track_mut(track_id);
            track.clips.push(Clip {
                id,
                source: desc.source,
                name: desc.name,
                duration: desc.duration,
                start: 0.0,
                end: desc.duration,
                order: base_order + i as u32,
                track: track_id,
                width: desc.width,
                height: desc.height,
            });
            ids.push(id);
        }

        if self.selected.is_none() {
            self.selected = ids.first().copied();
        }

        tracing::debug!(track = %track_id, count = ids.len(), "Clips added");
        Ok(ids)
    }

    /// Adjust a clip's trim points. Rejected unless
    /// `0 <= start`, `start + MIN_CLIP_DURATION <= end`, and
    /// `end <= duration`. Never partially applies.
    pub fn set_trim(&mut self, id: ClipId, start: f64, end: f64) -> Result<(), EditError> {
        let clip = self.clip(id).ok_or(EditError::UnknownClip(id))?;
        let duration = clip.duration;
        if !(0.0 <= start && start + MIN_CLIP_DURATION <= end && end <= duration) {
            return Err(EditError::InvalidTrim {
                start,
                end,
                duration,
            });
        }

        self.push_history();

        if let Some(clip) = self.tracks.iter_mut().find_map(|t| t.clip_mut(id)) {
            clip.start = start;
            clip.end = end;
        }

        tracing::debug!(clip = %id, start, end, "Trim set");
        Ok(())
    }

    /// Split a clip at source-local time `t`, strictly inside its trimmed
    /// interval. The clip is replaced by two fresh-id clips whose intervals
    /// partition the original at `t`; the pair sits contiguously where the
    /// original sat and the track's orders are re-densified. The original
    /// id ceases to exist. Returns the two new ids.
    pub fn split_clip(&mut self, id: ClipId, t: f64) -> Result<(ClipId, ClipId), EditError> {
        let original = self.clip(id).cloned().ok_or(EditError::UnknownClip(id))?;
        let track_id = original.track;
        if !original.contains_split_point(t) {
            return Err(EditError::SplitOutOfBounds {
                t,
                start: original.start,
                end: original.end,
            });
        }

        self.push_history();

        let first_id = ClipId(self.next_clip_id);
        let second_id = ClipId(self.next_clip_id + 1);
        self.next_clip_id += 2;

        let track = self.track_mut(track_id);
        // Make room right of the original so the pair stays contiguous.
        for clip in track.clips.iter_mut() {
            if clip.order > original.order {
                clip.order += 1;
            }
        }
        track.clips.retain(|c| c.id != id);

        let mut first = original.clone();
        first.id = first_id;
        first.end = t;
        first.order = original.order;

        let mut second = original.clone();
        second.id = second_id;
        second.start = t;
        second.order = original.order + 1;

        track.clips.push(first);
        track.clips.push(second);
        track.redensify_orders();

        if self.selected == Some(id) {
            self.selected = Some(first_id);
        }

        tracing::debug!(clip = %id, at = t, first = %first_id, second = %second_id, "Clip split");
        Ok((first_id, second_id))
    }

    /// Move the clip at `from_index` of a track's order-sorted sequence to
    /// `to_index`, re-densifying that track only.
    pub fn reorder_clips(
        &mut self,
        from_index: usize,
        to_index: usize,
        track_id: TrackId,
    ) -> Result<(), EditError> {
        let track = self.track(track_id).ok_or(EditError::UnknownTrack(track_id))?;
        let len = track.clips.len();
        if from_index >= len {
            return Err(EditError::IndexOutOfRange {
                index: from_index,
                len,
            });
        }
        if to_index >= len {
            return Err(EditError::IndexOutOfRange {
                index: to_index,
                len,
            });
        }
        if from_index == to_index {
            return Ok(());
        }

        self.push_history();

        let track = self.track_mut(track_id);
        let mut ids: Vec<ClipId> = track.clips_in_order().iter().map(|c| c.id).collect();
        let moved = ids.remove(from_index);
        ids.insert(to_index, moved);
        for (i, clip_id) in ids.iter().enumerate() {
            if let Some(clip) = track.clip_mut(*clip_id) {
                clip.order = i as u32;
            }
        }

        tracing::debug!(track = %track_id, from_index, to_index, "Clips reordered");
        Ok(())
    }

    /// Remove a clip from whichever track holds it, re-densify that track's
    /// orders, and clear the selection if it pointed at the removed clip.
    pub fn delete_clip(&mut self, id: ClipId) -> Result<(), EditError> {
        let track_id = self.find_clip_track(id).ok_or(EditError::UnknownClip(id))?;

        self.push_history();

        let track = self.track_mut(track_id);
        track.clips.retain(|c| c.id != id);
        track.redensify_orders();

        if self.selected == Some(id) {
            self.selected = None;
        }

        tracing::debug!(clip = %id, track = %track_id, "Clip deleted");
        Ok(())
    }

    /// Move a clip to the end of another track
    /// (`order = max(existing in target) + 1`).
    pub fn move_clip_to_track(&mut self, id: ClipId, target: TrackId) -> Result<(), EditError> {
        let source_track = self.find_clip_track(id).ok_or(EditError::UnknownClip(id))?;
        if self.track(target).is_none() {
            return Err(EditError::UnknownTrack(target));
        }

        self.push_history();

        let source = self.track_mut(source_track);
        let Some(pos) = source.clips.iter().position(|c| c.id == id) else {
            return Err(EditError::UnknownClip(id));
        };
        let mut clip = source.clips.remove(pos);
        source.redensify_orders();

        let dest = self.track_mut(target);
        clip.order = dest.next_order();
        clip.track = target;
        dest.clips.push(clip);

        tracing::debug!(clip = %id, from = %source_track, to = %target, "Clip moved");
        Ok(())
    }

    // --- Selection (not snapshotted: selection-only changes are not
    // undoable edits, but selection is captured inside snapshots so undo
    // restores it alongside the structural state) ---

    pub fn select(&mut self, id: ClipId) -> Result<(), EditError> {
        if self.clip(id).is_none() {
            return Err(EditError::UnknownClip(id));
        }
        self.selected = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // --- Compositing operations ---

    /// Set the placement mode.
    pub fn set_placement(&mut self, placement: PipPlacement) {
        if self.compositing.placement == placement {
            return;
        }
        self.push_history();
        self.compositing.placement = placement;
        tracing::debug!(placement = ?self.compositing.placement, "Placement set");
    }

    /// Set the overlay size fraction, clamped to a sane range.
    pub fn set_pip_size(&mut self, size: f64) {
        let size = size.clamp(0.05, 1.0);
        if (self.compositing.size - size).abs() < f64::EPSILON {
            return;
        }
        self.push_history();
        self.compositing.size = size;
    }

    /// Capture the current interpolated placement at `t` as a keyframe
    /// (upsert by proximity), switching to keyframed mode if not there yet.
    pub fn add_keyframe_at(&mut self, t: f64) {
        let sample = self.compositing.sample(t);
        self.push_history();
        self.compositing.upsert_keyframe(t, sample);
        if self.compositing.placement != PipPlacement::Keyframed {
            self.compositing.placement = PipPlacement::Keyframed;
        }
        tracing::debug!(at = t, count = self.compositing.keyframes.len(), "Keyframe added");
    }

    /// Delete the keyframe nearest to `t` when one is in range; otherwise a
    /// no-op that leaves history untouched. Returns whether one was removed.
    pub fn remove_keyframe_near(&mut self, t: f64) -> bool {
        let in_range = self.compositing.keyframes.iter().any(|k| {
            (k.time - t).abs() < cutline_project_model::KEYFRAME_REMOVE_RANGE
        });
        if !in_range {
            return false;
        }
        self.push_history();
        let removed = self.compositing.remove_nearest(t);
        tracing::debug!(at = t, removed, "Keyframe removal");
        removed
    }

    /// Remove all keyframes. No-op (and no history entry) when already
    /// empty.
    pub fn clear_keyframes(&mut self) {
        if self.compositing.keyframes.is_empty() {
            return;
        }
        self.push_history();
        self.compositing.clear_keyframes();
    }

    /// Set how many overlay lanes are visible, clamped to the fixed track
    /// count.
    pub fn set_visible_overlays(&mut self, count: usize) {
        let count = count.min(OVERLAY_TRACK_COUNT);
        if count == self.visible_overlays {
            return;
        }
        self.push_history();
        self.visible_overlays = count;
    }

    // --- Undo / redo ---

    /// Restore the previous snapshot. Returns false when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Restore the next snapshot. Returns false when there is nothing to
    /// redo.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Structural copy of the current editable state.
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            tracks: self.tracks.clone(),
            selected: self.selected,
            compositing: self.compositing.clone(),
            visible_overlays: self.visible_overlays,
        }
    }

    fn restore(&mut self, snapshot: EditorSnapshot) {
        self.tracks = snapshot.tracks;
        self.selected = snapshot.selected;
        self.compositing = snapshot.compositing;
        self.visible_overlays = snapshot.visible_overlays;
    }

    fn push_history(&mut self) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
    }

    fn track_mut(&mut self, id: TrackId) -> &mut Track {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .expect("track ids are fixed at construction")
    }
}
