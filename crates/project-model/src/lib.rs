//! Cutline Project Model
//!
//! Defines the core data contracts for Cutline projects:
//! - **Clips:** Trimmed references to source media placed on tracks
//! - **Tracks:** The fixed main/overlay lanes holding ordered clip sequences
//! - **Compositing:** Picture-in-picture placement, size, and keyframes
//! - **Project:** Top-level metadata, editable state, and export configuration
//!
//! Overlay placement coordinates are normalized to `[0.0, 1.0]` relative to
//! the output frame so they survive resolution changes between preview and
//! export.

pub mod clip;
pub mod compositing;
pub mod project;
pub mod track;

pub use clip::*;
pub use compositing::*;
pub use project::*;
pub use track::*;
