//! Cutline Editor Core
//!
//! The authoritative editing state and every operation that mutates it:
//! - **Store:** Single owned state object (tracks, selection, compositing,
//!   visible overlay count) exposed only through the defined operation set
//! - **History:** Bounded snapshot log driving undo/redo
//! - **Import:** Media-probe driven path from source files to clips
//!
//! All mutations are synchronous and run to completion; no external writer
//! bypasses validation or history.

pub mod history;
pub mod import;
pub mod store;

pub use history::{EditorSnapshot, History, HISTORY_CAP};
pub use import::{import_files, ImportOutcome, MediaProbe, ProbeError, SourceInfo};
pub use store::{EditError, EditorStore};
