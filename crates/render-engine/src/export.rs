//! Export job construction and render backend contract.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use cutline_common::error::{CutlineError, CutlineResult};
use cutline_editor_core::EditorStore;
use cutline_project_model::{
    ExportSettings, PipKeyframe, PipPlacement, PipSample, TrackId,
};

/// One trimmed span of a source file, in timeline order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSegment {
    /// Source media file.
    pub source: PathBuf,

    /// Trim-in within the source (seconds).
    pub trim_start: f64,

    /// Trim-out within the source (seconds).
    pub trim_end: f64,
}

impl ExportSegment {
    pub fn duration(&self) -> f64 {
        self.trim_end - self.trim_start
    }
}

/// Where an overlay sits during export: frozen at one sample, or animated
/// by the full keyframe list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayPlacement {
    Static { sample: PipSample },
    Keyframed { keyframes: Vec<PipKeyframe> },
}

/// Export plan for one overlay lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPlan {
    /// Zero-based overlay lane index.
    pub lane: usize,

    /// The lane's clips as trimmed segments, in timeline order.
    pub segments: Vec<ExportSegment>,

    /// Placement over the output frame.
    pub placement: OverlayPlacement,
}

/// A fully described export, decoupled from the live store: building the
/// job copies everything it needs, so a failed export can never corrupt the
/// timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportJob {
    /// Main-track segments to concatenate, in timeline order.
    pub main_segments: Vec<ExportSegment>,

    /// One plan per visible overlay lane that has clips.
    pub overlays: Vec<OverlayPlan>,

    /// Resolution and quality settings.
    pub settings: ExportSettings,

    /// Output file path.
    pub output_path: PathBuf,
}

impl ExportJob {
    /// Build a job from the current committed store state. Fails when the
    /// main track is empty; there is nothing to export.
    pub fn from_store(
        store: &EditorStore,
        settings: ExportSettings,
        output_path: impl Into<PathBuf>,
    ) -> CutlineResult<Self> {
        let main_segments: Vec<ExportSegment> = store
            .main_track()
            .clips_in_order()
            .iter()
            .map(|c| ExportSegment {
                source: c.source.clone(),
                trim_start: c.start,
                trim_end: c.end,
            })
            .collect();

        if main_segments.is_empty() {
            return Err(CutlineError::export("Main track is empty"));
        }

        let compositing = store.compositing();
        let mut overlays = Vec::new();
        for lane in 0..store.visible_overlays() {
            let Some(track) = store.track(TrackId::overlay(lane)) else {
                continue;
            };
            let segments: Vec<ExportSegment> = track
                .clips_in_order()
                .iter()
                .map(|c| ExportSegment {
                    source: c.source.clone(),
                    trim_start: c.start,
                    trim_end: c.end,
                })
                .collect();
            if segments.is_empty() {
                continue;
            }

            // Keyframed settings ship the whole list so the backend can
            // reproduce the animation; otherwise the placement is frozen at
            // the resolved sample.
            let placement = match compositing.placement {
                PipPlacement::Keyframed => OverlayPlacement::Keyframed {
                    keyframes: compositing.keyframes.clone(),
                },
                _ => OverlayPlacement::Static {
                    sample: compositing.sample(0.0),
                },
            };

            overlays.push(OverlayPlan {
                lane,
                segments,
                placement,
            });
        }

        Ok(Self {
            main_segments,
            overlays,
            settings,
            output_path: output_path.into(),
        })
    }

    /// Total output duration: the concatenated main segments.
    pub fn total_duration(&self) -> f64 {
        self.main_segments.iter().map(|s| s.duration()).sum()
    }
}

/// Export progress report. `percent` is monotonic from 0 to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress {
    /// Completion percentage [0, 100].
    pub percent: u8,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Trait for render backends (ffmpeg child process, GPU pipeline, ...).
pub trait RenderBackend: Send {
    /// Execute the export job, reporting progress along the way.
    fn render(&mut self, job: &ExportJob, progress: Option<ProgressCallback>)
        -> CutlineResult<PathBuf>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Export entry point: validate the job and run it through the backend on
/// a blocking worker, since backends drive a child process.
pub async fn export_job(
    job: ExportJob,
    mut backend: Box<dyn RenderBackend>,
    progress: Option<ProgressCallback>,
) -> CutlineResult<PathBuf> {
    tracing::info!(
        output = %job.output_path.display(),
        segments = job.main_segments.len(),
        overlays = job.overlays.len(),
        "Starting export"
    );

    if !backend.is_available() {
        return Err(CutlineError::unsupported(format!(
            "Render backend '{}' is not available",
            backend.name()
        )));
    }

    if let Some(parent) = job.output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if let Some(cb) = &progress {
        cb(ExportProgress {
            percent: 0,
            stage: ExportStage::Preparing,
        });
    }

    tracing::info!(backend = backend.name(), "Using render backend");
    let result = tokio::task::spawn_blocking(move || backend.render(&job, progress))
        .await
        .map_err(|e| CutlineError::export(format!("render task panicked: {e}")))?;

    match &result {
        Ok(path) => tracing::info!(output = %path.display(), "Export finished"),
        Err(e) => tracing::warn!(error = %e, "Export failed"),
    }
    result
}

/// ffmpeg child-process backend for the simple concatenated export path.
/// Overlay compositing is handled by the desktop preview pipeline and is
/// not supported here.
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }

    fn build_args(&self, job: &ExportJob) -> Vec<String> {
        let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into()];

        for segment in &job.main_segments {
            args.push("-ss".into());
            args.push(format!("{:.3}", segment.trim_start));
            args.push("-to".into());
            args.push(format!("{:.3}", segment.trim_end));
            args.push("-i".into());
            args.push(segment.source.display().to_string());
        }

        let n = job.main_segments.len();
        let inputs: String = (0..n).map(|i| format!("[{i}:v][{i}:a]")).collect();
        let mut filter = format!("{inputs}concat=n={n}:v=1:a=1[v][a]");
        if let Some((w, h)) = job.settings.resolution.dimensions() {
            filter.push_str(&format!(";[v]scale={w}:{h}[v]"));
        }
        args.push("-filter_complex".into());
        args.push(filter);
        args.push("-map".into());
        args.push("[v]".into());
        args.push("-map".into());
        args.push("[a]".into());

        args.push("-preset".into());
        args.push(
            match job.settings.quality {
                cutline_project_model::QualityPreset::Fast => "veryfast",
                cutline_project_model::QualityPreset::Medium => "medium",
                cutline_project_model::QualityPreset::Slow => "slow",
            }
            .into(),
        );

        args.push("-progress".into());
        args.push("pipe:1".into());
        args.push(job.output_path.display().to_string());
        args
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &mut self,
        job: &ExportJob,
        progress: Option<ProgressCallback>,
    ) -> CutlineResult<PathBuf> {
        if !job.overlays.is_empty() {
            return Err(CutlineError::unsupported(
                "ffmpeg backend handles concatenated export only; overlay \
                 compositing runs through the preview pipeline",
            ));
        }

        let args = self.build_args(job);
        tracing::debug!(?args, "Spawning ffmpeg");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn ffmpeg")?;

        // ffmpeg -progress emits key=value lines; track out_time_ms against
        // the expected duration and keep the reported percentage monotonic.
        let total_us = (job.total_duration() * 1_000_000.0).max(1.0);
        let mut last_percent = 0u8;
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let line = line.unwrap_or_default();
                if let Some(value) = line.strip_prefix("out_time_ms=") {
                    if let Ok(us) = value.trim().parse::<f64>() {
                        let percent = ((us / total_us) * 100.0).clamp(0.0, 99.0) as u8;
                        if percent > last_percent {
                            last_percent = percent;
                            if let Some(cb) = &progress {
                                cb(ExportProgress {
                                    percent,
                                    stage: ExportStage::Rendering,
                                });
                            }
                        }
                    }
                }
            }
        }

        let status = child.wait().context("failed to wait for ffmpeg")?;
        if !status.success() {
            if let Some(cb) = &progress {
                cb(ExportProgress {
                    percent: last_percent,
                    stage: ExportStage::Failed,
                });
            }
            return Err(CutlineError::export(format!(
                "ffmpeg exited with status {status}"
            )));
        }

        if let Some(cb) = &progress {
            cb(ExportProgress {
                percent: 100,
                stage: ExportStage::Complete,
            });
        }
        Ok(job.output_path.clone())
    }

    fn is_available(&self) -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}
