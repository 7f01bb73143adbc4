//! Show project information.

use std::path::PathBuf;

use cutline_project_model::{Project, TrackKind};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let project =
        Project::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    println!("Project: {}", project.name);
    println!("  ID: {}", project.id);
    println!("  Created: {}", project.created_at);
    println!("  Modified: {}", project.modified_at);
    println!();

    println!("Tracks:");
    for track in &project.tracks {
        let label = match track.kind {
            TrackKind::Main => "Main".to_string(),
            TrackKind::Overlay => format!("{}", track.id),
        };
        println!(
            "  {label}: {} clips, {:.1}s",
            track.clips.len(),
            track.total_duration()
        );
        for clip in track.clips_in_order() {
            println!(
                "    [{}] {} ({:.1}s - {:.1}s of {:.1}s)",
                clip.order,
                clip.name,
                clip.start,
                clip.end,
                clip.duration
            );
        }
    }
    println!();

    println!("Compositing:");
    println!("  Placement: {:?}", project.compositing.placement);
    println!("  Size: {:.2}", project.compositing.size);
    println!("  Keyframes: {}", project.compositing.keyframes.len());
    println!("  Visible overlays: {}", project.visible_overlays);
    println!();

    println!("Export config:");
    println!("  Resolution: {:?}", project.export.resolution);
    println!("  Quality: {:?}", project.export.quality);

    Ok(())
}
