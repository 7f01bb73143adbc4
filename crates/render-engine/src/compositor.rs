//! Per-frame overlay placement for export rendering.
//!
//! The export pipeline and the live preview must agree on where the
//! overlay sits at every instant, so this module samples the same
//! [`CompositingSettings::sample`] interpolation the preview uses, once
//! per output frame.

use cutline_project_model::{CompositingSettings, PipSample};

/// Placement instructions for a single output frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlacement {
    /// Frame number.
    pub frame_index: u64,

    /// Time in seconds.
    pub time_secs: f64,

    /// Normalized overlay placement at this frame.
    pub overlay: PipSample,
}

/// Overlay bounding box in output pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Sample the overlay placement for every frame of the export.
pub fn plan_frames(
    compositing: &CompositingSettings,
    fps: u32,
    duration_secs: f64,
) -> Vec<FramePlacement> {
    let total_frames = (duration_secs * fps as f64).ceil() as u64;
    let mut frames = Vec::with_capacity(total_frames as usize);

    for frame in 0..total_frames {
        let time_secs = frame as f64 / fps as f64;
        frames.push(FramePlacement {
            frame_index: frame,
            time_secs,
            overlay: compositing.sample(time_secs),
        });
    }

    frames
}

/// Map a normalized sample to output pixels. The overlay box is square in
/// normalized space; `size` is its width fraction of the output width, and
/// the height preserves the overlay source's aspect when given.
pub fn to_output_rect(
    sample: PipSample,
    output_width: u32,
    output_height: u32,
    source_aspect: Option<f64>,
) -> OverlayRect {
    let width = sample.size * output_width as f64;
    let height = match source_aspect {
        Some(aspect) if aspect > 0.0 => width / aspect,
        _ => sample.size * output_height as f64,
    };
    OverlayRect {
        x: sample.x * output_width as f64,
        y: sample.y * output_height as f64,
        width,
        height,
    }
}
