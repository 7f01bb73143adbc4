//! Clip types: trimmed references to source media.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::track::TrackId;

/// Minimum trimmed duration of a clip in seconds.
///
/// Trim and split operations must never produce a clip shorter than this.
pub const MIN_CLIP_DURATION: f64 = 0.1;

/// Globally unique clip identifier.
///
/// Ids are allocated by the editor store from a monotonically increasing
/// counter and are never reused within a session; a split destroys the
/// original id and mints two fresh ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ClipId(pub u64);

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "clip-{}", self.0)
    }
}

/// A trimmed reference to a source media file placed on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip identifier.
    pub id: ClipId,

    /// Opaque reference to the source media file.
    pub source: PathBuf,

    /// Human-readable display name.
    pub name: String,

    /// Total duration of the underlying source in seconds.
    pub duration: f64,

    /// Trim-in point: offset into the source where this clip begins.
    pub start: f64,

    /// Trim-out point: offset into the source where this clip ends.
    ///
    /// Invariant: `0 <= start < end <= duration`.
    pub end: f64,

    /// Track-local position key. Dense `0..n-1` within the owning track.
    pub order: u32,

    /// The track this clip belongs to.
    pub track: TrackId,

    /// Natural pixel width of the source video, when known.
    #[serde(default)]
    pub width: Option<u32>,

    /// Natural pixel height of the source video, when known.
    #[serde(default)]
    pub height: Option<u32>,
}

/// A finished clip description handed to the store by import, capture, or
/// AI collaborators. Becomes a [`Clip`] via `add_clips`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipDescriptor {
    /// Source media reference.
    pub source: PathBuf,

    /// Display name (typically the file stem).
    pub name: String,

    /// Total source duration in seconds. Must be positive.
    pub duration: f64,

    /// Natural dimensions, when known.
    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,
}

impl Clip {
    /// Duration of the trimmed region actually used on the timeline.
    pub fn trimmed_duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the trim invariant `0 <= start < end <= duration` holds.
    pub fn trim_is_valid(&self) -> bool {
        0.0 <= self.start && self.start < self.end && self.end <= self.duration
    }

    /// Whether a source-local time lies strictly inside the trimmed region.
    /// Split points must satisfy this.
    pub fn contains_split_point(&self, t: f64) -> bool {
        self.start < t && t < self.end
    }
}

impl ClipDescriptor {
    /// Build a descriptor from a source path, deriving the name from the
    /// file stem.
    pub fn from_source(source: impl Into<PathBuf>, duration: f64) -> Self {
        let source = source.into();
        let name = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        Self {
            source,
            name,
            duration,
            width: None,
            height: None,
        }
    }

    /// Attach natural dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}
