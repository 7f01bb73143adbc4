//! Cutline Render Engine
//!
//! Turns committed store state into export jobs and hands them to a render
//! backend:
//!
//! ```text
//! EditorStore ──┐
//!               ├── ExportJob (main segments + overlay plans)
//! ExportSettings┘         │
//!                         ├── per-frame overlay placement (compositor)
//!                         ▼
//!                  RenderBackend (ffmpeg child process)
//!                         │
//!                         ▼
//!                     output.mp4
//! ```
//!
//! Overlay placement is sampled from the same interpolation the live
//! preview uses, so the exported composition matches what was previewed.

pub mod compositor;
pub mod export;

pub use export::*;
