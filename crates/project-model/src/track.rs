//! Track types: the fixed main/overlay lanes of the timeline.

use serde::{Deserialize, Serialize};

use crate::clip::{Clip, ClipId};

/// Number of overlay tracks created at session start.
pub const OVERLAY_TRACK_COUNT: usize = 4;

/// Track identifier. `TrackId(0)` is the main track; overlays are `1..=4`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TrackId(pub u32);

impl TrackId {
    /// The main track.
    pub const MAIN: TrackId = TrackId(0);

    /// The nth overlay track (0-based).
    pub fn overlay(n: usize) -> TrackId {
        TrackId(1 + n as u32)
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 == 0 {
            write!(f, "main")
        } else {
            write!(f, "overlay-{}", self.0 - 1)
        }
    }
}

/// Track kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    /// The single primary lane; drives sequence time.
    Main,
    /// Picture-in-picture lane composited above the main track.
    Overlay,
}

/// A named lane holding an ordered sequence of clips.
///
/// The track set is fixed for the lifetime of a session: exactly one main
/// track and [`OVERLAY_TRACK_COUNT`] overlays, created together. Only clip
/// contents change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Track identifier.
    pub id: TrackId,

    /// Main or overlay.
    pub kind: TrackKind,

    /// Clips on this track. Positions are determined by each clip's
    /// `order` key, not by vector index.
    pub clips: Vec<Clip>,
}

impl Track {
    /// Create an empty track.
    pub fn new(id: TrackId, kind: TrackKind) -> Self {
        Self {
            id,
            kind,
            clips: Vec::new(),
        }
    }

    /// Create the fixed session track set: one main track followed by the
    /// overlay tracks.
    pub fn session_tracks() -> Vec<Track> {
        let mut tracks = vec![Track::new(TrackId::MAIN, TrackKind::Main)];
        for n in 0..OVERLAY_TRACK_COUNT {
            tracks.push(Track::new(TrackId::overlay(n), TrackKind::Overlay));
        }
        tracks
    }

    /// Clips sorted ascending by order key (left-to-right timeline order).
    pub fn clips_in_order(&self) -> Vec<&Clip> {
        let mut sorted: Vec<&Clip> = self.clips.iter().collect();
        sorted.sort_by_key(|c| c.order);
        sorted
    }

    /// Look up a clip by id.
    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    /// Look up a clip by id, mutably.
    pub fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == id)
    }

    /// The order key an appended clip should receive: `max(order) + 1`,
    /// or 0 for an empty track.
    pub fn next_order(&self) -> u32 {
        self.clips
            .iter()
            .map(|c| c.order)
            .max()
            .map(|m| m + 1)
            .unwrap_or(0)
    }

    /// Reassign order keys to the dense sequence `0..n-1`, preserving the
    /// current left-to-right order. Called after every structural change so
    /// future `next_order` arithmetic stays correct.
    pub fn redensify_orders(&mut self) {
        self.clips.sort_by_key(|c| c.order);
        for (i, clip) in self.clips.iter_mut().enumerate() {
            clip.order = i as u32;
        }
    }

    /// Sum of trimmed durations of all clips on this track.
    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(|c| c.trimmed_duration()).sum()
    }

    /// Whether order keys form exactly `{0, 1, ..., n-1}`.
    pub fn orders_are_dense(&self) -> bool {
        let mut orders: Vec<u32> = self.clips.iter().map(|c| c.order).collect();
        orders.sort_unstable();
        orders.iter().enumerate().all(|(i, &o)| o == i as u32)
    }

    /// Cumulative start time of the clip at the given position in the
    /// order-sorted sequence (sum of trimmed durations of earlier clips).
    pub fn cumulative_start(&self, index: usize) -> f64 {
        self.clips_in_order()
            .iter()
            .take(index)
            .map(|c| c.trimmed_duration())
            .sum()
    }

    /// Find the clip covering a given track-local sequence time, together
    /// with its index in the order-sorted sequence and the offset into its
    /// trimmed region. Returns `None` past the end of the track.
    pub fn clip_at_time(&self, t: f64) -> Option<(usize, &Clip, f64)> {
        let mut elapsed = 0.0;
        for (i, clip) in self.clips_in_order().into_iter().enumerate() {
            let d = clip.trimmed_duration();
            if t < elapsed + d {
                return Some((i, clip, (t - elapsed).max(0.0)));
            }
            elapsed += d;
        }
        None
    }
}
