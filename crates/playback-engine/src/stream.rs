//! Media stream abstraction for external players.
//!
//! Decoding is done by platform players (one per lane) living outside this
//! crate. They load asynchronously and report back through [`StreamEvent`]s:
//! readiness events arrive in unspecified order, and failures arrive as
//! events rather than timeouts.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// A playback lane: the single main stream or one of the overlay streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Main,
    /// Zero-based overlay lane index.
    Overlay(usize),
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lane::Main => write!(f, "main"),
            Lane::Overlay(n) => write!(f, "overlay-{n}"),
        }
    }
}

/// Control surface of one external player.
///
/// `load` begins an asynchronous open; the player reports
/// [`StreamEvent::Ready`] (or `Failed`) when it settles. All other calls
/// apply to whatever media is currently loaded.
pub trait MediaStream {
    /// Begin loading a source. Any previously loaded media is discarded.
    fn load(&mut self, source: &Path);

    /// Start or resume decoding.
    fn play(&mut self);

    /// Pause decoding, keeping the current position.
    fn pause(&mut self);

    /// Jump to a source-local time in seconds.
    fn seek(&mut self, t: f64);

    /// Current source-local position in seconds.
    fn position(&self) -> f64;

    /// Whether the loaded media is ready for seek/play.
    fn is_ready(&self) -> bool;

    /// Stop decoding and drop the loaded media, releasing its resources.
    fn release(&mut self);
}

/// Events reported by external players. Arrival order across lanes is
/// unspecified.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The lane's loaded media became ready for seek/play.
    Ready { lane: Lane },

    /// Periodic position report while decoding.
    TimeUpdate { lane: Lane, position: f64 },

    /// The lane ran out of media.
    Ended { lane: Lane },

    /// The lane failed to decode or load.
    Failed { lane: Lane, message: String },
}

impl StreamEvent {
    /// The lane this event belongs to.
    pub fn lane(&self) -> Lane {
        match self {
            StreamEvent::Ready { lane }
            | StreamEvent::TimeUpdate { lane, .. }
            | StreamEvent::Ended { lane }
            | StreamEvent::Failed { lane, .. } => *lane,
        }
    }
}
