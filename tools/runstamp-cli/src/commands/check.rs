//! Check render backend and effective configuration.

use runstamp_common::config::{config_file_path, AppConfig};
use runstamp_image_model::{ColorMode, CropSensitivity};
use runstamp_render_engine::Compositor;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("RunStamp System Check");
    println!("{}", "=".repeat(50));

    let mut ok = true;

    match Compositor::cpu() {
        Ok(compositor) => println!("[OK] Render backend: {}", compositor.backend_name()),
        Err(e) => {
            ok = false;
            println!("[FAIL] Render backend: {e}");
        }
    }

    let path = config_file_path();
    if path.exists() {
        println!("[OK] Config file: {}", path.display());
    } else {
        println!("[INFO] Config file: {} (not found, using defaults)", path.display());
    }

    match config.processing.color_mode.parse::<ColorMode>() {
        Ok(mode) => println!("[OK] Default color mode: {mode}"),
        Err(e) => {
            ok = false;
            println!("[FAIL] Default color mode: {e}");
        }
    }
    match config.processing.crop_sensitivity.parse::<CropSensitivity>() {
        Ok(s) => println!("[OK] Default crop preset: {s}"),
        Err(e) => {
            ok = false;
            println!("[FAIL] Default crop preset: {e}");
        }
    }

    if config.processing.preview_width == 0 || config.processing.preview_height == 0 {
        ok = false;
        println!("[FAIL] Preview container has no area");
    } else {
        println!(
            "[OK] Preview container: {}x{}",
            config.processing.preview_width, config.processing.preview_height
        );
    }
    println!("[OK] Output directory: {}", config.output_dir.display());

    println!();
    println!("Effective configuration:");
    println!("{}", serde_json::to_string_pretty(config)?);

    println!();
    if ok {
        println!("Everything looks good. RunStamp is ready.");
    } else {
        println!("Some checks failed. See above for details.");
    }

    Ok(())
}
