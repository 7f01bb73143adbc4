//! Cutline Playback Engine
//!
//! Advances a virtual playhead across the main track's clip sequence and
//! keeps the parallel overlay streams in lockstep with the main stream:
//! - **Stream:** The [`MediaStream`] trait and the events external players
//!   report back (readiness, time updates, failures)
//! - **Synchronizer:** Per-tick playhead math, clip-boundary advancing with
//!   cancellation-aware resume, drift correction, and per-clip failure
//!   isolation
//!
//! The synchronizer re-reads store state on every tick and at every async
//! resumption point; it never caches timeline data across an await-like
//! boundary.

pub mod stream;
pub mod synchronizer;

pub use stream::{Lane, MediaStream, StreamEvent};
pub use synchronizer::{PlaybackSynchronizer, CLIP_END_EPSILON, DRIFT_TOLERANCE};
