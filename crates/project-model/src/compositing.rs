//! Picture-in-picture compositing settings and keyframe interpolation.
//!
//! Placement coordinates are the normalized top-left corner of the overlay
//! box; `size` is its width as a fraction of the output frame. The
//! [`CompositingSettings::sample`] function is the single source of truth
//! for instantaneous placement: both the live preview and the export
//! pipeline must call it so final output matches what was previewed.

use serde::{Deserialize, Serialize};

/// Corner padding fraction used by preset placements.
pub const PRESET_PADDING: f64 = 0.04;

/// Keyframes closer together than this are merged on upsert (seconds).
pub const KEYFRAME_MERGE_EPSILON: f64 = 0.1;

/// `remove_nearest` only deletes a keyframe within this distance (seconds).
pub const KEYFRAME_REMOVE_RANGE: f64 = 1.0;

/// Default overlay size fraction.
pub const DEFAULT_PIP_SIZE: f64 = 0.25;

/// Named preset positions for the overlay box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipPreset {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

/// How the overlay is positioned: a named corner preset, an explicit
/// custom position, or keyframe-driven animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PipPlacement {
    /// One of the fixed corner/center positions.
    Preset { preset: PipPreset },
    /// Explicit normalized top-left position.
    Custom { x: f64, y: f64 },
    /// Position and size follow the keyframe list.
    Keyframed,
}

impl Default for PipPlacement {
    fn default() -> Self {
        PipPlacement::Preset {
            preset: PipPreset::default(),
        }
    }
}

/// A timestamped compositing-parameter sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipKeyframe {
    /// Sequence time of this sample in seconds.
    pub time: f64,
    /// Normalized top-left X.
    pub x: f64,
    /// Normalized top-left Y.
    pub y: f64,
    /// Width fraction of the output frame.
    pub size: f64,
}

/// Instantaneous placement produced by [`CompositingSettings::sample`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipSample {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

/// Overlay compositing settings for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositingSettings {
    /// Placement mode, resolved once per query.
    pub placement: PipPlacement,

    /// Overlay width fraction used by preset and custom modes.
    pub size: f64,

    /// Time-ordered keyframe samples. Kept sorted ascending by time after
    /// every mutation.
    #[serde(default)]
    pub keyframes: Vec<PipKeyframe>,
}

impl Default for CompositingSettings {
    fn default() -> Self {
        Self {
            placement: PipPlacement::default(),
            size: DEFAULT_PIP_SIZE,
            keyframes: Vec::new(),
        }
    }
}

impl CompositingSettings {
    /// Compute the instantaneous overlay placement at sequence time `t`.
    pub fn sample(&self, t: f64) -> PipSample {
        match &self.placement {
            PipPlacement::Preset { preset } => preset_sample(*preset, self.size),
            PipPlacement::Custom { x, y } => PipSample {
                x: *x,
                y: *y,
                size: self.size,
            },
            PipPlacement::Keyframed => self.sample_keyframes(t),
        }
    }

    /// Keyframed placement with hold-before-first / hold-after-last
    /// semantics and independent linear interpolation of x, y, and size.
    fn sample_keyframes(&self, t: f64) -> PipSample {
        if self.keyframes.is_empty() {
            // All keyframes removed while still in keyframed mode: fall
            // back to the default corner so the overlay stays visible.
            return preset_sample(PipPreset::default(), self.size);
        }

        let before = self.keyframes.iter().rfind(|k| k.time <= t);
        let after = self.keyframes.iter().find(|k| k.time > t);

        match (before, after) {
            (None, Some(kf)) | (Some(kf), None) => PipSample {
                x: kf.x,
                y: kf.y,
                size: kf.size,
            },
            (Some(a), Some(b)) => {
                let progress = (t - a.time) / (b.time - a.time);
                PipSample {
                    x: a.x + (b.x - a.x) * progress,
                    y: a.y + (b.y - a.y) * progress,
                    size: a.size + (b.size - a.size) * progress,
                }
            }
            // Unreachable with a non-empty list.
            (None, None) => preset_sample(PipPreset::default(), self.size),
        }
    }

    /// Insert a keyframe at time `t` carrying the given sample, replacing
    /// any existing keyframe within [`KEYFRAME_MERGE_EPSILON`] of `t`.
    /// The list stays sorted by time.
    pub fn upsert_keyframe(&mut self, t: f64, sample: PipSample) {
        self.keyframes
            .retain(|k| (k.time - t).abs() > KEYFRAME_MERGE_EPSILON);
        self.keyframes.push(PipKeyframe {
            time: t,
            x: sample.x,
            y: sample.y,
            size: sample.size,
        });
        self.sort_keyframes();
    }

    /// Delete the single keyframe minimizing `|time - t|`, but only when
    /// that minimum distance is below [`KEYFRAME_REMOVE_RANGE`]. Returns
    /// whether a keyframe was removed.
    pub fn remove_nearest(&mut self, t: f64) -> bool {
        let nearest = self
            .keyframes
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.time - t)
                    .abs()
                    .partial_cmp(&(b.time - t).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, k)| (i, (k.time - t).abs()));

        match nearest {
            Some((i, dist)) if dist < KEYFRAME_REMOVE_RANGE => {
                self.keyframes.remove(i);
                true
            }
            _ => false,
        }
    }

    /// Remove all keyframes.
    pub fn clear_keyframes(&mut self) {
        self.keyframes.clear();
    }

    fn sort_keyframes(&mut self) {
        self.keyframes
            .sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(std::cmp::Ordering::Equal));
    }
}

/// Placement of a `size`-wide overlay box for a named preset, inset from
/// the frame edges by [`PRESET_PADDING`].
pub fn preset_sample(preset: PipPreset, size: f64) -> PipSample {
    let pad = PRESET_PADDING;
    let (x, y) = match preset {
        PipPreset::TopLeft => (pad, pad),
        PipPreset::TopRight => (1.0 - pad - size, pad),
        PipPreset::BottomLeft => (pad, 1.0 - pad - size),
        PipPreset::BottomRight => (1.0 - pad - size, 1.0 - pad - size),
        PipPreset::Center => ((1.0 - size) / 2.0, (1.0 - size) / 2.0),
    };
    PipSample { x, y, size }
}
