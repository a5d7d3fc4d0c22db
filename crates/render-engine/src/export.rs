//! Full-resolution export: plan, render, encode, write.

use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use runstamp_common::error::{RunstampError, RunstampResult};
use runstamp_common::naming::export_file_name;
use runstamp_image_model::{CanvasSize, PixelBuffer, Placement, ScaleRatio, ShadowSpec};

use crate::compositor::{Compositor, RenderTarget, RenderedFrame, Scene};

/// Placement and shadow mapped from the preview canvas onto the
/// background's native resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportPlan {
    /// Output canvas, equal to the background's native size.
    pub canvas: CanvasSize,
    /// Export-to-preview ratio per axis.
    pub ratio: ScaleRatio,
    pub placement: Placement,
    pub shadow: ShadowSpec,
}

/// Rescale a preview-space placement to the background's native size.
///
/// Each axis is scaled by `native / preview` independently, so the overlay
/// keeps its relative position even when rounding made the preview's aspect
/// ratio drift slightly from the background's.
pub fn plan_export(
    background: CanvasSize,
    preview: CanvasSize,
    placement: Placement,
    shadow: ShadowSpec,
) -> RunstampResult<ExportPlan> {
    if background.is_empty() {
        return Err(RunstampError::render("Background image is empty"));
    }
    if preview.is_empty() {
        return Err(RunstampError::render(
            "Preview canvas has no area; nothing to export",
        ));
    }

    let ratio = background.ratio_from(preview);
    Ok(ExportPlan {
        canvas: background,
        ratio,
        placement: placement.rescaled(ratio),
        shadow: shadow.rescaled(ratio),
    })
}

/// Render the export frame described by `plan`.
pub fn render_export(
    compositor: &Compositor,
    background: &PixelBuffer,
    overlay: &PixelBuffer,
    plan: &ExportPlan,
) -> RunstampResult<RenderedFrame> {
    if background.size() != plan.canvas {
        return Err(RunstampError::render(format!(
            "Export planned for {}x{} but background is {}x{}",
            plan.canvas.width,
            plan.canvas.height,
            background.width(),
            background.height()
        )));
    }

    tracing::info!(
        width = plan.canvas.width,
        height = plan.canvas.height,
        ratio_x = plan.ratio.x,
        ratio_y = plan.ratio.y,
        "Rendering export"
    );

    let scene = Scene {
        background,
        overlay,
        placement: plan.placement,
        shadow: plan.shadow,
    };
    compositor.compose(&scene, RenderTarget::Export)
}

/// Encode a buffer as an 8-bit RGBA PNG.
pub fn encode_png(buffer: &PixelBuffer) -> RunstampResult<Vec<u8>> {
    if buffer.is_empty() {
        return Err(RunstampError::encode("Cannot encode an empty image"));
    }

    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            buffer.samples(),
            buffer.width(),
            buffer.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| RunstampError::encode(format!("PNG encoding failed: {e}")))?;
    Ok(out)
}

/// Write `buffer` as `{prefix}_{timestamp}.png` inside `output_dir`.
///
/// The directory is created if needed. An existing file with the same name
/// is never overwritten; a numeric suffix is appended instead.
pub fn write_png(buffer: &PixelBuffer, output_dir: &Path, prefix: &str) -> RunstampResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = unique_path(output_dir.join(export_file_name(prefix)));
    write_png_to(buffer, &path)?;
    Ok(path)
}

/// Encode and write `buffer` to exactly `path`.
pub fn write_png_to(buffer: &PixelBuffer, path: &Path) -> RunstampResult<()> {
    let bytes = encode_png(buffer)?;
    std::fs::write(path, &bytes)?;
    tracing::info!(
        path = %path.display(),
        bytes = bytes.len(),
        "Wrote export"
    );
    Ok(())
}

fn unique_path(path: PathBuf) -> PathBuf {
    if !path.exists() {
        return path;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    (1u32..)
        .map(|n| parent.join(format!("{stem}_{n}.png")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(path)
}
