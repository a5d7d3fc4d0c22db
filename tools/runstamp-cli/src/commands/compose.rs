//! Compose a stamped photo and export it.

use std::path::PathBuf;

use anyhow::Context;

use runstamp_common::config::AppConfig;
use runstamp_common::error::{RunstampError, RunstampResult};
use runstamp_composer::{Composer, ImageSource, RunOutcome, RunRequest, SessionConfig};
use runstamp_image_model::{CanvasSize, ColorMode, CropSensitivity, DragDelta};
use runstamp_render_engine::{write_png_to, Compositor};

pub struct ComposeArgs {
    pub background: PathBuf,
    pub screenshot: PathBuf,
    pub color: Option<String>,
    pub sensitivity: Option<String>,
    pub nudges: Vec<DragDelta>,
    pub reset: bool,
    pub preview: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Resolve color mode and crop preset, letting flags override the config.
pub fn resolve_modes(
    config: &AppConfig,
    color: Option<&str>,
    sensitivity: Option<&str>,
) -> RunstampResult<(ColorMode, CropSensitivity)> {
    let color_mode = color
        .unwrap_or(config.processing.color_mode.as_str())
        .parse::<ColorMode>()
        .map_err(|e| RunstampError::config(e.to_string()))?;
    let sensitivity = sensitivity
        .unwrap_or(config.processing.crop_sensitivity.as_str())
        .parse::<CropSensitivity>()
        .map_err(|e| RunstampError::config(e.to_string()))?;
    Ok((color_mode, sensitivity))
}

pub async fn run(config: &AppConfig, args: ComposeArgs) -> anyhow::Result<()> {
    let (color_mode, sensitivity) =
        resolve_modes(config, args.color.as_deref(), args.sensitivity.as_deref())?;

    let mut session = SessionConfig::new(color_mode, sensitivity);
    session.preview_container = CanvasSize::new(
        config.processing.preview_width,
        config.processing.preview_height,
    );

    println!("Composing:");
    println!("  Background: {}", args.background.display());
    println!("  Screenshot: {}", args.screenshot.display());
    println!("  Color: {color_mode}, crop: {sensitivity}");

    let compositor = Compositor::cpu().context("Render backend is not ready")?;
    let composer = Composer::new(compositor);

    let mut request = RunRequest::new(
        ImageSource::Path(args.background),
        ImageSource::Path(args.screenshot),
        session,
    );
    request.nudges = args.nudges;
    request.reset_position = args.reset;

    let output = match composer.run(request).await? {
        RunOutcome::Ready(output) => output,
        RunOutcome::Superseded { ticket } => {
            anyhow::bail!("Run {ticket} was superseded before it finished")
        }
    };

    let b = output.crop.bounds;
    println!(
        "  Crop: {}x{} at ({}, {}){}",
        b.width,
        b.height,
        b.x,
        b.y,
        if output.crop.fell_back_to_full {
            " (no content found, full image)"
        } else {
            ""
        }
    );
    println!(
        "  Placement: ({:.1}, {:.1}) scale {:.3} on {}x{} preview",
        output.placement.left,
        output.placement.top,
        output.placement.scale_x,
        output.preview_canvas.width,
        output.preview_canvas.height
    );

    if let Some(path) = &args.preview {
        write_png_to(&output.preview, path)
            .with_context(|| format!("Failed to write preview to {}", path.display()))?;
        println!("  Preview: {}", path.display());
    }

    let path = match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            write_png_to(&output.export, &path)?;
            path
        }
        None => output.save(&config.output_dir, &config.export.file_prefix)?,
    };

    println!(
        "\nExport complete: {} ({}x{})",
        path.display(),
        output.export.width(),
        output.export.height()
    );
    Ok(())
}
