//! Project metadata and persistence.
//!
//! A project file captures the full editable state (tracks, selection,
//! compositing settings, visible overlay count, and export settings) so a
//! JSON round-trip reproduces an equivalent session, including keyframe
//! lists and order values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::clip::ClipId;
use crate::compositing::CompositingSettings;
use crate::track::{Track, TrackKind, OVERLAY_TRACK_COUNT};

/// Top-level project file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Schema version.
    pub version: String,

    /// Human-readable project name.
    pub name: String,

    /// Unique project identifier (UUID).
    pub id: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Last modified timestamp (ISO 8601).
    pub modified_at: String,

    /// All tracks with their clips.
    pub tracks: Vec<Track>,

    /// Currently selected clip, if any.
    #[serde(default)]
    pub selected: Option<ClipId>,

    /// Picture-in-picture compositing settings.
    #[serde(default)]
    pub compositing: CompositingSettings,

    /// How many overlay lanes are shown in the editor.
    #[serde(default)]
    pub visible_overlays: usize,

    /// Export configuration.
    pub export: ExportSettings,
}

/// Output resolution for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportResolution {
    R360p,
    R480p,
    #[default]
    R720p,
    R1080p,
    /// Keep the source resolution of the first main clip.
    Source,
}

impl ExportResolution {
    /// Fixed output dimensions, or `None` for [`ExportResolution::Source`].
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            ExportResolution::R360p => Some((640, 360)),
            ExportResolution::R480p => Some((854, 480)),
            ExportResolution::R720p => Some((1280, 720)),
            ExportResolution::R1080p => Some((1920, 1080)),
            ExportResolution::Source => None,
        }
    }
}

/// Encoder speed/quality tradeoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    Fast,
    #[default]
    Medium,
    Slow,
}

/// Export configuration persisted with the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExportSettings {
    /// Output resolution.
    pub resolution: ExportResolution,

    /// Encoder quality preset.
    pub quality: QualityPreset,
}

impl Project {
    /// Create a new project with the fixed session track set and defaults.
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            id: uuid_v4(),
            created_at: now.clone(),
            modified_at: now,
            tracks: Track::session_tracks(),
            selected: None,
            compositing: CompositingSettings::default(),
            visible_overlays: 1,
            export: ExportSettings::default(),
        }
    }

    /// Load a project from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ProjectError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ProjectError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save the project to a JSON file, stamping `modified_at`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        self.modified_at = chrono::Utc::now().to_rfc3339();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ProjectError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ProjectError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| ProjectError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write this project to the next rotating autosave slot in `dir`.
    /// Slots cycle `autosave-0.json .. autosave-{slots-1}.json`, always
    /// overwriting the oldest.
    pub fn autosave(&mut self, dir: impl AsRef<Path>, slots: usize) -> Result<PathBuf, ProjectError> {
        let dir = dir.as_ref();
        let slots = slots.max(1);

        let oldest = (0..slots)
            .map(|i| dir.join(format!("autosave-{i}.json")))
            .min_by_key(|p| {
                std::fs::metadata(p)
                    .and_then(|m| m.modified())
                    .ok()
            })
            .unwrap_or_else(|| dir.join("autosave-0.json"));

        self.save(&oldest)?;
        Ok(oldest)
    }

    /// Load the most recently written autosave slot from `dir`, if any.
    pub fn load_latest_autosave(dir: impl AsRef<Path>) -> Result<Option<Self>, ProjectError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(None);
        }

        let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
        let entries = std::fs::read_dir(dir).map_err(|e| ProjectError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_slot = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("autosave-") && n.ends_with(".json"));
            if !is_slot {
                continue;
            }
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
                    newest = Some((modified, path));
                }
            }
        }

        match newest {
            Some((_, path)) => Ok(Some(Self::load(path)?)),
            None => Ok(None),
        }
    }

    /// The main track. Panics only if the project was constructed outside
    /// this crate with no main track; `validate` reports that case.
    pub fn main_track(&self) -> Option<&Track> {
        self.tracks.iter().find(|t| t.kind == TrackKind::Main)
    }

    /// Validate structural integrity. Returns human-readable problems;
    /// an empty list means the project is well-formed.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        let main_count = self
            .tracks
            .iter()
            .filter(|t| t.kind == TrackKind::Main)
            .count();
        if main_count != 1 {
            errors.push(format!("Expected exactly one main track, found {main_count}"));
        }
        let overlay_count = self
            .tracks
            .iter()
            .filter(|t| t.kind == TrackKind::Overlay)
            .count();
        if overlay_count != OVERLAY_TRACK_COUNT {
            errors.push(format!(
                "Expected {OVERLAY_TRACK_COUNT} overlay tracks, found {overlay_count}"
            ));
        }

        for track in &self.tracks {
            if !track.orders_are_dense() {
                errors.push(format!("Track {} has non-dense clip orders", track.id));
            }
            for clip in &track.clips {
                if !clip.trim_is_valid() {
                    errors.push(format!(
                        "Clip {} violates trim invariant: start={} end={} duration={}",
                        clip.id, clip.start, clip.end, clip.duration
                    ));
                }
                if clip.track != track.id {
                    errors.push(format!(
                        "Clip {} carries track id {} but lives on track {}",
                        clip.id, clip.track, track.id
                    ));
                }
                if !clip.source.exists() {
                    errors.push(format!("Clip {} source missing: {:?}", clip.id, clip.source));
                }
            }
        }

        if let Some(selected) = self.selected {
            let resolves = self.tracks.iter().any(|t| t.clip(selected).is_some());
            if !resolves {
                errors.push(format!("Selection references unknown clip {selected}"));
            }
        }

        let times: Vec<f64> = self.compositing.keyframes.iter().map(|k| k.time).collect();
        if times.windows(2).any(|w| w[0] > w[1]) {
            errors.push("Compositing keyframes are not sorted by time".to_string());
        }

        if self.visible_overlays > OVERLAY_TRACK_COUNT {
            errors.push(format!(
                "visible_overlays {} exceeds overlay track count {OVERLAY_TRACK_COUNT}",
                self.visible_overlays
            ));
        }

        errors
    }
}

/// Errors that can occur when working with project files.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    Validation { message: String },
}

/// Generate a simple UUID v4 without external dependency.
fn uuid_v4() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (seed & 0xFFFFFFFF) as u32,
        ((seed >> 32) & 0xFFFF) as u16,
        ((seed >> 48) & 0x0FFF) as u16,
        (((seed >> 60) & 0x3F) | 0x80) as u16 | (((seed >> 66) & 0x3FF) as u16) << 6,
        (seed >> 76) & 0xFFFFFFFFFFFF,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::Clip;
    use crate::compositing::{PipKeyframe, PipPlacement};
    use crate::track::TrackId;

    fn sample_clip(id: u64, order: u32) -> Clip {
        Clip {
            id: ClipId(id),
            source: PathBuf::from(format!("/nonexistent/{id}.mp4")),
            name: format!("clip {id}"),
            duration: 10.0,
            start: 0.0,
            end: 10.0,
            order,
            track: TrackId::MAIN,
            width: Some(1920),
            height: Some(1080),
        }
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("My Edit");
        assert_eq!(project.name, "My Edit");
        assert_eq!(project.tracks.len(), 1 + OVERLAY_TRACK_COUNT);
        assert_eq!(project.version, "1.0");
        assert!(project.main_track().is_some());
    }

    #[test]
    fn test_serialization_round_trip_preserves_state() {
        let mut project = Project::new("Round Trip");
        project.tracks[0].clips.push(sample_clip(1, 0));
        project.tracks[0].clips.push(sample_clip(2, 1));
        project.selected = Some(ClipId(2));
        project.visible_overlays = 2;
        project.compositing.placement = PipPlacement::Keyframed;
        project.compositing.keyframes = vec![
            PipKeyframe { time: 0.0, x: 0.0, y: 0.0, size: 0.2 },
            PipKeyframe { time: 5.0, x: 0.5, y: 0.5, size: 0.3 },
        ];

        let json = serde_json::to_string_pretty(&project).unwrap();
        let parsed: Project = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.selected, Some(ClipId(2)));
        assert_eq!(parsed.visible_overlays, 2);
        assert_eq!(parsed.compositing, project.compositing);
        assert_eq!(parsed.tracks[0].clips, project.tracks[0].clips);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join("cutline_test_project");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("edit.json");

        let mut project = Project::new("Disk Test");
        project.tracks[0].clips.push(sample_clip(1, 0));
        project.save(&path).unwrap();

        let loaded = Project::load(&path).unwrap();
        assert_eq!(loaded.name, "Disk Test");
        assert_eq!(loaded.tracks[0].clips.len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_autosave_rotation_and_recovery() {
        let dir = std::env::temp_dir().join("cutline_test_autosave");
        let _ = std::fs::remove_dir_all(&dir);

        let mut project = Project::new("First");
        project.autosave(&dir, 2).unwrap();
        project.name = "Second".to_string();
        project.autosave(&dir, 2).unwrap();

        let recovered = Project::load_latest_autosave(&dir).unwrap().unwrap();
        assert_eq!(recovered.name, "Second");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_latest_autosave_empty_dir() {
        let dir = std::env::temp_dir().join("cutline_test_autosave_empty");
        let _ = std::fs::remove_dir_all(&dir);
        assert!(Project::load_latest_autosave(&dir).unwrap().is_none());
    }

    #[test]
    fn test_validate_reports_missing_source() {
        let mut project = Project::new("Validate");
        project.tracks[0].clips.push(sample_clip(1, 0));

        let errors = project.validate();
        assert!(errors.iter().any(|e| e.contains("source missing")));
    }

    #[test]
    fn test_validate_reports_bad_trim() {
        let mut project = Project::new("Validate");
        let mut clip = sample_clip(1, 0);
        clip.end = 12.0; // past source duration
        project.tracks[0].clips.push(clip);

        let errors = project.validate();
        assert!(errors.iter().any(|e| e.contains("trim invariant")));
    }

    #[test]
    fn test_validate_reports_dangling_selection() {
        let mut project = Project::new("Validate");
        project.selected = Some(ClipId(99));

        let errors = project.validate();
        assert!(errors.iter().any(|e| e.contains("unknown clip")));
    }
}
