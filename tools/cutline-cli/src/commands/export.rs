//! Export a project to video.

use std::path::PathBuf;

use cutline_editor_core::EditorStore;
use cutline_project_model::{ExportResolution, ExportSettings, Project, QualityPreset};
use cutline_render_engine::{export_job, ExportJob, ExportProgress, FfmpegBackend};

pub async fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    resolution: String,
    quality: String,
) -> anyhow::Result<()> {
    let project =
        Project::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let settings = ExportSettings {
        resolution: parse_resolution(&resolution)?,
        quality: parse_quality(&quality)?,
    };

    let output = output.unwrap_or_else(|| {
        path.with_file_name(format!(
            "{}-export.mp4",
            path.file_stem().unwrap_or_default().to_string_lossy()
        ))
    });

    let store = EditorStore::from_project(&project);
    let job = ExportJob::from_store(&store, settings, &output)
        .map_err(|e| anyhow::anyhow!("Cannot build export job: {e}"))?;
    tracing::debug!(segments = job.main_segments.len(), overlays = job.overlays.len(), "Export job built");

    println!(
        "Exporting {} segment(s), {:.1}s total -> {}",
        job.main_segments.len(),
        job.total_duration(),
        output.display()
    );

    let progress: cutline_render_engine::ProgressCallback = Box::new(|p: ExportProgress| {
        println!("  {:?}: {}%", p.stage, p.percent);
    });

    let result = export_job(job, Box::new(FfmpegBackend::new()), Some(progress)).await;
    match result {
        Ok(path) => {
            println!("Export complete: {}", path.display());
            Ok(())
        }
        Err(e) => anyhow::bail!("Export failed: {e}"),
    }
}

fn parse_resolution(s: &str) -> anyhow::Result<ExportResolution> {
    Ok(match s.to_ascii_lowercase().as_str() {
        "360p" => ExportResolution::R360p,
        "480p" => ExportResolution::R480p,
        "720p" => ExportResolution::R720p,
        "1080p" => ExportResolution::R1080p,
        "source" => ExportResolution::Source,
        other => anyhow::bail!("Unknown resolution '{other}' (expected 360p|480p|720p|1080p|source)"),
    })
}

fn parse_quality(s: &str) -> anyhow::Result<QualityPreset> {
    Ok(match s.to_ascii_lowercase().as_str() {
        "fast" => QualityPreset::Fast,
        "medium" => QualityPreset::Medium,
        "slow" => QualityPreset::Slow,
        other => anyhow::bail!("Unknown quality '{other}' (expected fast|medium|slow)"),
    })
}
