//! Show what crop and matte detection find in a screenshot.

use std::path::PathBuf;

use runstamp_common::config::AppConfig;
use runstamp_composer::load_image;
use runstamp_processing_core::{prepare_overlay, BackgroundEstimate, OverlayOptions};

use super::compose::resolve_modes;

pub fn run(
    config: &AppConfig,
    screenshot: PathBuf,
    sensitivity: Option<String>,
    color: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let (color_mode, sensitivity) =
        resolve_modes(config, color.as_deref(), sensitivity.as_deref())?;

    let shot = load_image(&screenshot)
        .map_err(|e| anyhow::anyhow!("Failed to load screenshot: {e}"))?;
    let prepared = prepare_overlay(&shot, &OverlayOptions::new(color_mode, sensitivity));

    if json {
        let report = serde_json::json!({
            "screenshot": screenshot,
            "width": shot.width(),
            "height": shot.height(),
            "color_mode": color_mode,
            "sensitivity": sensitivity,
            "crop": prepared.crop,
            "matte": prepared.matte,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Screenshot: {}", screenshot.display());
    println!("  Size: {}x{}", shot.width(), shot.height());
    println!("  Crop preset: {sensitivity}");
    println!();

    let crop = &prepared.crop;
    println!("Crop:");
    println!(
        "  Box: {}x{} at ({}, {})",
        crop.bounds.width, crop.bounds.height, crop.bounds.x, crop.bounds.y
    );
    println!("  Content pixels: {}", crop.content_pixels);
    println!("  Priority-region pixels: {}", crop.priority_pixels);
    if crop.fell_back_to_full {
        println!("  No content found; the full image is used");
    }
    println!();

    let matte = &prepared.matte;
    println!("Matte ({color_mode}):");
    match matte.background {
        BackgroundEstimate::Color { r, g, b } => {
            println!("  Background: rgb({r:.0}, {g:.0}, {b:.0})");
        }
        BackgroundEstimate::Unavailable => {
            println!("  Background: unavailable (transparent border), removal disabled");
        }
    }
    println!("  Transparent pixels: {}", matte.transparent_pixels);
    println!("  Opaque pixels: {}", matte.opaque_pixels);

    Ok(())
}
