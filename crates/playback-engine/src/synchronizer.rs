//! Multi-stream playback synchronization.
//!
//! One [`PlaybackSynchronizer`] owns the main stream and the overlay
//! streams and advances a virtual playhead over the main track. Store state
//! is re-read on every tick and at every readiness event, never cached
//! across a load: the user may mutate the timeline while a stream is still
//! opening.

use std::collections::BTreeSet;

use cutline_editor_core::EditorStore;
use cutline_project_model::{ClipId, TrackId};

use crate::stream::{Lane, MediaStream, StreamEvent};

/// Guard band before a clip's trim-out at which the synchronizer advances
/// to the next clip (seconds).
pub const CLIP_END_EPSILON: f64 = 0.1;

/// Maximum tolerated difference between an overlay stream's position and
/// its lockstep target before a corrective seek is issued (seconds).
pub const DRIFT_TOLERANCE: f64 = 0.1;

/// A resume request waiting for a stream to become ready. Only honored if
/// its generation still matches the synchronizer's counter; pauses and
/// newer clip switches bump the counter, invalidating stale requests.
#[derive(Debug, Clone, Copy)]
struct PendingResume {
    generation: u64,
    resume: bool,
    /// Source-local position to seek to once ready; falls back to the
    /// current clip's trim-in when unset.
    seek_to: Option<f64>,
}

/// Keeps the main stream and up to four overlay streams in lockstep while
/// advancing the playhead across the main track's clip sequence.
pub struct PlaybackSynchronizer<S: MediaStream> {
    main: S,
    overlays: Vec<S>,

    /// Position in the main track's order-sorted clip list.
    current_clip_index: usize,
    /// Source-local position within the current main clip's stream.
    local_time: f64,
    /// Derived global playhead, published every tick.
    sequence_time: f64,
    playing: bool,

    /// Monotonically increasing counter invalidating stale pending resumes.
    resume_generation: u64,
    pending_resume: Option<PendingResume>,

    /// Clip currently loaded (or loading) on the main lane.
    main_loaded: Option<ClipId>,
    /// Main lane has a load in flight; time updates from the outgoing
    /// media are ignored until the new stream reports ready.
    main_loading: bool,
    /// Clip currently loaded (or loading) per overlay lane.
    overlay_loaded: Vec<Option<ClipId>>,

    /// Clips whose streams failed to decode. Playback continues for
    /// everything else; recovery is deleting the clip from the store.
    errored: BTreeSet<ClipId>,
}

impl<S: MediaStream> PlaybackSynchronizer<S> {
    /// Create a synchronizer owning the given streams, positioned at the
    /// start of the timeline.
    pub fn new(main: S, overlays: Vec<S>) -> Self {
        let overlay_count = overlays.len();
        Self {
            main,
            overlays,
            current_clip_index: 0,
            local_time: 0.0,
            sequence_time: 0.0,
            playing: false,
            resume_generation: 0,
            pending_resume: None,
            main_loaded: None,
            main_loading: false,
            overlay_loaded: vec![None; overlay_count],
            errored: BTreeSet::new(),
        }
    }

    // --- Queries ---

    /// The global playhead in sequence time.
    pub fn sequence_time(&self) -> f64 {
        self.sequence_time
    }

    pub fn current_clip_index(&self) -> usize {
        self.current_clip_index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Clips whose streams failed. The session continues without them;
    /// deleting the clip from the store is the recovery path.
    pub fn errored_clips(&self) -> impl Iterator<Item = ClipId> + '_ {
        self.errored.iter().copied()
    }

    pub fn main_stream(&self) -> &S {
        &self.main
    }

    pub fn overlay_stream(&self, lane: usize) -> Option<&S> {
        self.overlays.get(lane)
    }

    // --- Transport ---

    /// Start playback on the main lane and every active overlay together.
    /// If the current clip is not loaded yet, the start is deferred until
    /// its stream reports ready.
    pub fn play(&mut self, store: &EditorStore) {
        let Some((clip_id, source, start)) = self.current_main_clip(store) else {
            return;
        };

        if self.errored.contains(&clip_id) {
            tracing::warn!(clip = %clip_id, "Refusing to play errored clip");
            return;
        }

        if self.main_loaded != Some(clip_id) {
            self.main_loaded = Some(clip_id);
            self.main_loading = true;
            self.resume_generation += 1;
            self.pending_resume = Some(PendingResume {
                generation: self.resume_generation,
                resume: true,
                seek_to: Some(start),
            });
            self.main.load(&source);
            return;
        }

        self.playing = true;
        self.main.play();
        self.start_active_overlays(store);
        tracing::debug!(sequence_time = self.sequence_time, "Playback started");
    }

    /// Pause the main lane and every overlay together, and invalidate any
    /// pending resume so playback does not restart unexpectedly.
    pub fn pause(&mut self) {
        self.playing = false;
        self.resume_generation += 1;
        self.main.pause();
        for overlay in &mut self.overlays {
            overlay.pause();
        }
        tracing::debug!(sequence_time = self.sequence_time, "Playback paused");
    }

    pub fn toggle_play(&mut self, store: &EditorStore) {
        if self.playing {
            self.pause();
        } else {
            self.play(store);
        }
    }

    /// Move the playhead to a sequence time, loading the covering main clip
    /// if it differs from the one currently loaded.
    pub fn seek_to(&mut self, store: &EditorStore, t: f64) {
        let main_track = store.main_track();
        let t = t.clamp(0.0, main_track.total_duration());

        let Some((index, clip, offset)) = main_track.clip_at_time(t) else {
            // Past the last clip: park at the end of the timeline.
            self.sequence_time = main_track.total_duration();
            return;
        };
        let clip_id = clip.id;
        let source = clip.source.clone();
        let target = clip.start + offset;

        self.current_clip_index = index;
        self.sequence_time = t;
        self.local_time = target;

        if self.main_loaded != Some(clip_id) {
            let resume = self.playing;
            self.playing = false;
            self.main_loaded = Some(clip_id);
            self.main_loading = true;
            self.resume_generation += 1;
            self.pending_resume = Some(PendingResume {
                generation: self.resume_generation,
                resume,
                seek_to: Some(target),
            });
            self.main.pause();
            self.main.load(&source);
        } else if self.main.is_ready() {
            self.main.seek(target);
        }
        self.sync_overlays(store);
    }

    // --- Event handling ---

    /// Feed one stream event through the synchronizer. `store` is read
    /// fresh on every call; the only store mutation the synchronizer makes
    /// is following the selection to the clip the playhead advanced into.
    pub fn handle_event(&mut self, store: &mut EditorStore, event: StreamEvent) {
        match event {
            StreamEvent::TimeUpdate {
                lane: Lane::Main,
                position,
            } => self.tick(store, position),
            StreamEvent::TimeUpdate { .. } => {
                // Overlay positions are polled during drift correction.
            }
            StreamEvent::Ready { lane: Lane::Main } => self.on_main_ready(store),
            StreamEvent::Ready {
                lane: Lane::Overlay(n),
            } => self.on_overlay_ready(store, n),
            StreamEvent::Ended { lane: Lane::Main } => {
                if self.current_main_clip(store).is_some() {
                    self.advance_past_current(store);
                }
            }
            StreamEvent::Ended {
                lane: Lane::Overlay(_),
            } => {
                // An overlay running out of media simply goes quiet; the
                // next tick re-evaluates its activity.
            }
            StreamEvent::Failed { lane, message } => self.on_failed(lane, &message),
        }
    }

    /// Per-tick update from the main stream.
    fn tick(&mut self, store: &mut EditorStore, position: f64) {
        if self.main_loading {
            // Stale report from the outgoing media while a load is in
            // flight.
            return;
        }

        let main_track = store.main_track();
        let clips = main_track.clips_in_order();
        if clips.is_empty() {
            self.stop_all();
            self.sequence_time = 0.0;
            return;
        }
        if self.current_clip_index >= clips.len() {
            self.current_clip_index = clips.len() - 1;
        }

        let clip = clips[self.current_clip_index];
        let clip_id = clip.id;
        let clip_source = clip.source.clone();
        let clip_end = clip.end;
        let elapsed_before = main_track.cumulative_start(self.current_clip_index);

        if self.main_loaded != Some(clip_id) {
            // The clip under the playhead was replaced (split, delete,
            // reorder) since the stream was loaded.
            self.main_loaded = Some(clip_id);
            self.main_loading = true;
            self.main.load(&clip_source);
            return;
        }

        self.local_time = position;
        self.sequence_time = elapsed_before + (position - clip.start).max(0.0);

        if position >= clip_end - CLIP_END_EPSILON {
            self.advance_past_current(store);
            return;
        }

        self.sync_overlays(store);
    }

    /// Switch to the next main clip, or stop at the end of the timeline.
    fn advance_past_current(&mut self, store: &mut EditorStore) {
        let main_track = store.main_track();
        let clips = main_track.clips_in_order();
        if clips.is_empty() {
            self.stop_all();
            return;
        }

        if self.current_clip_index + 1 < clips.len() {
            let next = clips[self.current_clip_index + 1];
            let next_id = next.id;
            let next_source = next.source.clone();
            let next_start = next.start;

            let resume = self.playing;
            self.playing = false;
            self.resume_generation += 1;
            self.pending_resume = Some(PendingResume {
                generation: self.resume_generation,
                resume,
                seek_to: Some(next_start),
            });

            self.current_clip_index += 1;
            self.main_loaded = Some(next_id);
            self.main_loading = true;
            self.main.pause();
            self.main.load(&next_source);

            // Follow the playhead with the selection.
            let _ = store.select(next_id);

            tracing::debug!(clip = %next_id, resume, "Advancing to next clip");
        } else {
            let total = main_track.total_duration();
            self.stop_all();
            self.sequence_time = total;
            tracing::debug!(sequence_time = total, "Reached end of timeline");
        }
    }

    /// The main stream finished loading. Store state is re-read here; the
    /// timeline may have been mutated while the load was pending.
    fn on_main_ready(&mut self, store: &mut EditorStore) {
        self.main_loading = false;

        let Some((clip_id, source, start)) = self.current_main_clip(store) else {
            self.main_loaded = None;
            self.main.release();
            self.stop_all();
            return;
        };

        if self.main_loaded != Some(clip_id) {
            // The clip under the playhead changed during the load; open the
            // one that is actually there now.
            self.main_loaded = Some(clip_id);
            self.main_loading = true;
            self.main.load(&source);
            return;
        }

        let pending = self.pending_resume.take();
        let target = pending.and_then(|p| p.seek_to).unwrap_or(start).max(start);
        self.main.seek(target);
        self.local_time = target;

        match pending {
            Some(p) if p.generation == self.resume_generation && p.resume => {
                self.playing = true;
                self.main.play();
                self.start_active_overlays(store);
                tracing::debug!(clip = %clip_id, "Resumed after clip switch");
            }
            Some(p) if p.generation != self.resume_generation => {
                tracing::debug!(clip = %clip_id, "Dropping stale resume request");
            }
            _ => {}
        }
    }

    fn on_overlay_ready(&mut self, store: &EditorStore, lane: usize) {
        let Some(target) = self.overlay_target(store, lane) else {
            return;
        };
        if let Some(stream) = self.overlays.get_mut(lane) {
            stream.seek(target);
            if self.playing {
                stream.play();
            }
        }
    }

    fn on_failed(&mut self, lane: Lane, message: &str) {
        let clip_id = match lane {
            Lane::Main => {
                self.main_loading = false;
                self.pending_resume = None;
                self.playing = false;
                self.main.release();
                self.main_loaded.take()
            }
            Lane::Overlay(n) => {
                if let Some(stream) = self.overlays.get_mut(n) {
                    stream.release();
                }
                self.overlay_loaded
                    .get_mut(n)
                    .and_then(|loaded| loaded.take())
            }
        };

        if let Some(id) = clip_id {
            self.errored.insert(id);
            tracing::warn!(%lane, clip = %id, message, "Stream failed; clip marked errored");
        } else {
            tracing::warn!(%lane, message, "Stream failed with no clip loaded");
        }
    }

    // --- Lockstep helpers ---

    /// Start every overlay that has a clip under the playhead, loading
    /// lazily; called when global playback starts or resumes so main and
    /// overlays start together.
    fn start_active_overlays(&mut self, store: &EditorStore) {
        self.sync_overlays(store);
        for n in 0..self.overlays.len() {
            if self.overlay_loaded[n].is_some() && self.overlays[n].is_ready() {
                self.overlays[n].play();
            }
        }
    }

    /// Reconcile every overlay lane against the current playhead: load
    /// newly active clips, release inactive lanes, and force-seek any ready
    /// stream that drifted beyond [`DRIFT_TOLERANCE`]. Runs every tick to
    /// counter independent clock drift between concurrently decoding
    /// streams.
    fn sync_overlays(&mut self, store: &EditorStore) {
        let visible = store.visible_overlays();
        for n in 0..self.overlays.len() {
            let active = if n < visible {
                self.overlay_clip_at_playhead(store, n)
            } else {
                None
            };

            match active {
                Some((clip_id, source, target)) => {
                    if self.errored.contains(&clip_id) {
                        continue;
                    }
                    if self.overlay_loaded[n] != Some(clip_id) {
                        self.overlay_loaded[n] = Some(clip_id);
                        self.overlays[n].load(&source);
                        continue;
                    }
                    if !self.overlays[n].is_ready() {
                        continue;
                    }
                    let drift = (self.overlays[n].position() - target).abs();
                    if drift > DRIFT_TOLERANCE {
                        tracing::debug!(lane = n, drift, "Correcting overlay drift");
                        self.overlays[n].seek(target);
                    }
                }
                None => {
                    if self.overlay_loaded[n].take().is_some() {
                        self.overlays[n].release();
                    }
                }
            }
        }
    }

    /// The clip covering the playhead on an overlay track, with its source
    /// and the source-local position matching the current sequence time.
    fn overlay_clip_at_playhead(
        &self,
        store: &EditorStore,
        lane: usize,
    ) -> Option<(ClipId, std::path::PathBuf, f64)> {
        let track = store.track(TrackId::overlay(lane))?;
        let (_, clip, offset) = track.clip_at_time(self.sequence_time)?;
        Some((clip.id, clip.source.clone(), clip.start + offset))
    }

    fn overlay_target(&self, store: &EditorStore, lane: usize) -> Option<f64> {
        self.overlay_clip_at_playhead(store, lane)
            .map(|(_, _, target)| target)
    }

    /// Id, source, and trim-in of the clip at the current index on the main
    /// track, clamping the index against the latest store state.
    fn current_main_clip(&mut self, store: &EditorStore) -> Option<(ClipId, std::path::PathBuf, f64)> {
        let main_track = store.main_track();
        let clips = main_track.clips_in_order();
        if clips.is_empty() {
            return None;
        }
        if self.current_clip_index >= clips.len() {
            self.current_clip_index = clips.len() - 1;
        }
        let clip = clips[self.current_clip_index];
        Some((clip.id, clip.source.clone(), clip.start))
    }

    fn stop_all(&mut self) {
        self.playing = false;
        self.pending_resume = None;
        self.main.pause();
        for overlay in &mut self.overlays {
            overlay.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_project_model::{ClipDescriptor, OVERLAY_TRACK_COUNT};
    use std::path::{Path, PathBuf};

    /// In-memory stand-in for an external player.
    #[derive(Debug, Default)]
    struct FakeStream {
        loaded: Option<PathBuf>,
        ready: bool,
        position: f64,
        playing: bool,
        released: bool,
        seeks: Vec<f64>,
        load_count: usize,
    }

    impl MediaStream for FakeStream {
        fn load(&mut self, source: &Path) {
            self.loaded = Some(source.to_path_buf());
            self.ready = false;
            self.released = false;
            self.playing = false;
            self.load_count += 1;
        }

        fn play(&mut self) {
            self.playing = true;
        }

        fn pause(&mut self) {
            self.playing = false;
        }

        fn seek(&mut self, t: f64) {
            self.position = t;
            self.seeks.push(t);
        }

        fn position(&self) -> f64 {
            self.position
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        fn release(&mut self) {
            self.loaded = None;
            self.ready = false;
            self.playing = false;
            self.released = true;
        }
    }

    fn sync() -> PlaybackSynchronizer<FakeStream> {
        let overlays = (0..OVERLAY_TRACK_COUNT).map(|_| FakeStream::default()).collect();
        PlaybackSynchronizer::new(FakeStream::default(), overlays)
    }

    fn store_with_main(durations: &[f64]) -> (EditorStore, Vec<ClipId>) {
        let mut store = EditorStore::new();
        let descriptors = durations
            .iter()
            .enumerate()
            .map(|(i, &d)| ClipDescriptor::from_source(format!("sources/main{i}.mp4"), d))
            .collect();
        let ids = store.add_clips(descriptors, TrackId::MAIN).unwrap();
        (store, ids)
    }

    /// Load the current clip and mark the main stream ready, as a real
    /// player would after `play` kicks off the initial load.
    fn make_main_ready(s: &mut PlaybackSynchronizer<FakeStream>, store: &mut EditorStore) {
        s.play(store);
        s.main.ready = true;
        s.handle_event(store, StreamEvent::Ready { lane: Lane::Main });
    }

    #[test]
    fn test_sequence_time_accumulates_prior_clips() {
        let (mut store, _) = store_with_main(&[10.0, 5.0, 8.0]);
        let mut s = sync();
        make_main_ready(&mut s, &mut store);

        // Inside the first clip.
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 3.0 },
        );
        assert!((s.sequence_time() - 3.0).abs() < 1e-9);

        // Advance into the second clip, then tick at local 2.0.
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 9.95 },
        );
        s.main.ready = true;
        s.handle_event(&mut store, StreamEvent::Ready { lane: Lane::Main });
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 2.0 },
        );
        assert_eq!(s.current_clip_index(), 1);
        assert!((s.sequence_time() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_trimmed_clip_offsets_sequence_time() {
        let (mut store, ids) = store_with_main(&[10.0]);
        store.set_trim(ids[0], 2.0, 8.0).unwrap();
        let mut s = sync();
        make_main_ready(&mut s, &mut store);

        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 5.0 },
        );
        // Local 5.0 with trim-in 2.0 = 3.0 into the sequence.
        assert!((s.sequence_time() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_boundary_advance_resumes_when_playing() {
        let (mut store, ids) = store_with_main(&[10.0, 5.0]);
        let mut s = sync();
        make_main_ready(&mut s, &mut store);
        assert!(s.is_playing());

        // Cross the guard band of the first clip.
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 9.95 },
        );
        assert_eq!(s.current_clip_index(), 1);
        assert!(!s.is_playing(), "stopped while the next stream loads");
        assert_eq!(
            s.main_stream().loaded.as_deref(),
            Some(Path::new("sources/main1.mp4"))
        );
        // The synchronizer follows the playhead with the selection.
        assert_eq!(store.selected(), Some(ids[1]));

        // New stream ready: seek to its trim-in and resume.
        s.main.ready = true;
        s.handle_event(&mut store, StreamEvent::Ready { lane: Lane::Main });
        assert!(s.is_playing());
        assert_eq!(s.main_stream().seeks.last(), Some(&0.0));
    }

    #[test]
    fn test_boundary_advance_stays_paused_when_paused() {
        let (mut store, _) = store_with_main(&[10.0, 5.0]);
        let mut s = sync();
        make_main_ready(&mut s, &mut store);
        s.pause();

        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 9.95 },
        );
        s.main.ready = true;
        s.handle_event(&mut store, StreamEvent::Ready { lane: Lane::Main });
        assert!(!s.is_playing());
    }

    #[test]
    fn test_pause_cancels_pending_resume() {
        let (mut store, _) = store_with_main(&[10.0, 5.0]);
        let mut s = sync();
        make_main_ready(&mut s, &mut store);

        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 9.95 },
        );
        // User pauses while the next clip is still loading.
        s.pause();

        s.main.ready = true;
        s.handle_event(&mut store, StreamEvent::Ready { lane: Lane::Main });
        assert!(!s.is_playing(), "stale resume must not restart playback");
    }

    #[test]
    fn test_end_of_timeline_clamps_and_stops() {
        let (mut store, _) = store_with_main(&[10.0, 5.0]);
        let mut s = sync();
        make_main_ready(&mut s, &mut store);

        // Walk to the last clip.
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 9.95 },
        );
        s.main.ready = true;
        s.handle_event(&mut store, StreamEvent::Ready { lane: Lane::Main });

        // Run past the end of the last clip.
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 4.95 },
        );
        assert!(!s.is_playing());
        assert!((s.sequence_time() - 15.0).abs() < 1e-9);
        assert_eq!(s.current_clip_index(), 1);
    }

    #[test]
    fn test_overlay_drift_correction() {
        let (mut store, _) = store_with_main(&[20.0]);
        store
            .add_clips(
                vec![ClipDescriptor::from_source("sources/pip.mp4", 20.0)],
                TrackId::overlay(0),
            )
            .unwrap();
        let mut s = sync();
        make_main_ready(&mut s, &mut store);

        // First tick activates the overlay lane (load + ready).
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 5.0 },
        );
        s.overlays[0].ready = true;
        s.handle_event(&mut store, StreamEvent::Ready { lane: Lane::Overlay(0) });

        // Overlay has drifted 0.4s behind the playhead.
        s.overlays[0].position = 5.6;
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 6.0 },
        );
        assert!((s.overlays[0].position - 6.0).abs() < 1e-9, "force-seeked");

        // Within tolerance: no corrective seek.
        let seeks_before = s.overlays[0].seeks.len();
        s.overlays[0].position = 6.45;
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 6.5 },
        );
        assert_eq!(s.overlays[0].seeks.len(), seeks_before);
    }

    #[test]
    fn test_overlay_without_coverage_is_released() {
        let (mut store, _) = store_with_main(&[20.0]);
        store
            .add_clips(
                vec![ClipDescriptor::from_source("sources/pip.mp4", 5.0)],
                TrackId::overlay(0),
            )
            .unwrap();
        let mut s = sync();
        make_main_ready(&mut s, &mut store);

        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 2.0 },
        );
        assert!(s.overlays[0].loaded.is_some());

        // Past the overlay clip's 5s of coverage: the lane is released.
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 8.0 },
        );
        assert!(s.overlays[0].released);
        assert!(s.overlays[0].loaded.is_none());
    }

    #[test]
    fn test_hidden_overlay_lane_stays_inactive() {
        let (mut store, _) = store_with_main(&[20.0]);
        store
            .add_clips(
                vec![ClipDescriptor::from_source("sources/pip.mp4", 20.0)],
                TrackId::overlay(1),
            )
            .unwrap();
        store.set_visible_overlays(1); // lane 1 hidden
        let mut s = sync();
        make_main_ready(&mut s, &mut store);

        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 2.0 },
        );
        assert!(s.overlays[1].loaded.is_none());
    }

    #[test]
    fn test_play_pause_apply_to_all_active_lanes() {
        let (mut store, _) = store_with_main(&[20.0]);
        store
            .add_clips(
                vec![ClipDescriptor::from_source("sources/pip.mp4", 20.0)],
                TrackId::overlay(0),
            )
            .unwrap();
        let mut s = sync();
        make_main_ready(&mut s, &mut store);
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 1.0 },
        );
        s.overlays[0].ready = true;
        s.handle_event(&mut store, StreamEvent::Ready { lane: Lane::Overlay(0) });

        s.pause();
        assert!(!s.main_stream().playing);
        assert!(!s.overlays[0].playing);

        s.play(&store);
        assert!(s.main_stream().playing);
        assert!(s.overlays[0].playing);
    }

    #[test]
    fn test_failed_stream_marks_clip_without_halting_others() {
        let (mut store, _) = store_with_main(&[20.0]);
        let overlay_ids = store
            .add_clips(
                vec![ClipDescriptor::from_source("sources/pip.mp4", 20.0)],
                TrackId::overlay(0),
            )
            .unwrap();
        let mut s = sync();
        make_main_ready(&mut s, &mut store);
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 1.0 },
        );

        s.handle_event(
            &mut store,
            StreamEvent::Failed {
                lane: Lane::Overlay(0),
                message: "decoder error".to_string(),
            },
        );

        let errored: Vec<ClipId> = s.errored_clips().collect();
        assert_eq!(errored, overlay_ids);
        // Main lane keeps going.
        assert!(s.is_playing());
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 2.0 },
        );
        assert!((s.sequence_time() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_store_mutation_during_load_is_reread_at_ready() {
        let (mut store, ids) = store_with_main(&[10.0, 5.0, 8.0]);
        let mut s = sync();
        make_main_ready(&mut s, &mut store);

        // Advance toward clip 1; its load is now in flight.
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 9.95 },
        );
        assert_eq!(s.current_clip_index(), 1);

        // While loading, the user deletes the clip being loaded.
        store.delete_clip(ids[1]).unwrap();

        // Ready fires for the deleted clip; the synchronizer re-reads the
        // store and loads whatever actually sits at the playhead now.
        s.main.ready = true;
        s.handle_event(&mut store, StreamEvent::Ready { lane: Lane::Main });
        assert_eq!(
            s.main_stream().loaded.as_deref(),
            Some(Path::new("sources/main2.mp4"))
        );
        // Initial load, advance load, and the post-mutation reload.
        assert_eq!(s.main_stream().load_count, 3);
    }

    #[test]
    fn test_empty_timeline_tick_is_harmless() {
        let mut store = EditorStore::new();
        let mut s = sync();
        s.handle_event(
            &mut store,
            StreamEvent::TimeUpdate { lane: Lane::Main, position: 1.0 },
        );
        assert!(!s.is_playing());
        assert!((s.sequence_time() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_seek_to_switches_clip() {
        let (mut store, _) = store_with_main(&[10.0, 5.0]);
        let mut s = sync();
        make_main_ready(&mut s, &mut store);

        s.seek_to(&store, 12.0);
        assert_eq!(s.current_clip_index(), 1);
        assert_eq!(
            s.main_stream().loaded.as_deref(),
            Some(Path::new("sources/main1.mp4"))
        );

        // The pending seek lands at the mapped source-local position.
        s.main.ready = true;
        s.handle_event(&mut store, StreamEvent::Ready { lane: Lane::Main });
        assert!((s.main_stream().position - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_errored_main_clip_refuses_to_play() {
        let (mut store, ids) = store_with_main(&[10.0]);
        let mut s = sync();
        make_main_ready(&mut s, &mut store);

        s.handle_event(
            &mut store,
            StreamEvent::Failed {
                lane: Lane::Main,
                message: "bad file".to_string(),
            },
        );
        assert!(!s.is_playing());
        let errored: Vec<ClipId> = s.errored_clips().collect();
        assert_eq!(errored, ids);

        s.play(&store);
        assert!(!s.is_playing());

        // Recovery: delete the offending clip, import a fresh one, play.
        store.delete_clip(ids[0]).unwrap();
        let fresh = store
            .add_clips(
                vec![ClipDescriptor::from_source("sources/fresh.mp4", 6.0)],
                TrackId::MAIN,
            )
            .unwrap();
        s.play(&store);
        s.main.ready = true;
        s.handle_event(&mut store, StreamEvent::Ready { lane: Lane::Main });
        assert!(s.is_playing());
        assert!(store.clip(fresh[0]).is_some());
    }
}
