//! Media import: probe source files and turn them into clips.
//!
//! Probing is delegated to an external collaborator (ffprobe-style child
//! process in the desktop app). A file that fails to probe, reports zero
//! duration, or carries no video stream is rejected and contributes zero
//! clips; an import is never partial.

use std::path::{Path, PathBuf};

use cutline_project_model::{ClipDescriptor, ClipId, TrackId};

use crate::store::{EditError, EditorStore};

/// Metadata reported by the probe collaborator for a source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    /// Total duration in seconds.
    pub duration: f64,

    /// Natural video dimensions.
    pub width: u32,
    pub height: u32,

    /// Codec identifier (e.g., "h264").
    pub codec: String,

    /// Whether the file carries a video stream at all.
    pub has_video: bool,
}

/// Probe failure for a single source file.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("probe failed for {path}: {message}")]
    Failed { path: PathBuf, message: String },
}

/// External probe collaborator.
pub trait MediaProbe {
    fn probe(&self, source: &Path) -> Result<SourceInfo, ProbeError>;
}

/// Result of an import: the clips that made it in and the files that were
/// rejected, with reasons.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub added: Vec<ClipId>,
    pub rejected: Vec<(PathBuf, String)>,
}

/// Probe each path and append the usable ones to `track` as clips in a
/// single store operation (one history entry per import action).
pub fn import_files(
    probe: &dyn MediaProbe,
    store: &mut EditorStore,
    paths: &[PathBuf],
    track: TrackId,
) -> Result<ImportOutcome, EditError> {
    let mut outcome = ImportOutcome::default();
    let mut descriptors = Vec::new();

    for path in paths {
        match probe.probe(path) {
            Ok(info) if !info.has_video => {
                tracing::warn!(path = ?path, "Rejecting import: no video stream");
                outcome
                    .rejected
                    .push((path.clone(), "no video stream".to_string()));
            }
            Ok(info) if info.duration <= 0.0 => {
                tracing::warn!(path = ?path, "Rejecting import: zero duration");
                outcome
                    .rejected
                    .push((path.clone(), "zero duration".to_string()));
            }
            Ok(info) => {
                descriptors.push(
                    ClipDescriptor::from_source(path.clone(), info.duration)
                        .with_dimensions(info.width, info.height),
                );
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Rejecting import: probe failed");
                outcome.rejected.push((path.clone(), e.to_string()));
            }
        }
    }

    if !descriptors.is_empty() {
        outcome.added = store.add_clips(descriptors, track)?;
    }

    tracing::debug!(
        added = outcome.added.len(),
        rejected = outcome.rejected.len(),
        "Import finished"
    );
    Ok(outcome)
}
