//! RunStamp CLI: command-line interface for composing activity overlays.
//!
//! Usage:
//!   runstamp compose <BACKGROUND> <SCREENSHOT>   Compose and export a stamped photo
//!   runstamp inspect <SCREENSHOT>                Show crop and background detection
//!   runstamp check                               Check backend and configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use runstamp_common::config::AppConfig;
use runstamp_image_model::DragDelta;

mod commands;

#[derive(Parser)]
#[command(
    name = "runstamp",
    about = "Stamp running-app stats onto your photos",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overlay a stats screenshot on a photo and export it
    Compose {
        /// Background photo
        background: PathBuf,

        /// Running-app stats screenshot
        screenshot: PathBuf,

        /// Foreground color: white|black
        #[arg(long)]
        color: Option<String>,

        /// Crop preset: standard|extended
        #[arg(long)]
        sensitivity: Option<String>,

        /// Move the overlay by DX,DY preview pixels (repeatable)
        #[arg(
            long = "nudge",
            value_name = "DX,DY",
            value_parser = parse_nudge,
            allow_hyphen_values = true
        )]
        nudges: Vec<DragDelta>,

        /// Return the overlay to its default position after nudging
        #[arg(long)]
        reset: bool,

        /// Also write the preview frame to this path
        #[arg(long)]
        preview: Option<PathBuf>,

        /// Exact output file (defaults to a timestamped name in the output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show what crop and matte detection find in a screenshot
    Inspect {
        /// Running-app stats screenshot
        screenshot: PathBuf,

        /// Crop preset: standard|extended
        #[arg(long)]
        sensitivity: Option<String>,

        /// Foreground color: white|black
        #[arg(long)]
        color: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check render backend and effective configuration
    Check,
}

fn parse_nudge(value: &str) -> Result<DragDelta, String> {
    let (dx, dy) = value
        .split_once(',')
        .ok_or_else(|| format!("expected DX,DY but got '{value}'"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{s}' is not a number"))
    };
    Ok(DragDelta::new(parse(dx)?, parse(dy)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    runstamp_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Compose {
            background,
            screenshot,
            color,
            sensitivity,
            nudges,
            reset,
            preview,
            output,
        } => {
            commands::compose::run(
                &config,
                commands::compose::ComposeArgs {
                    background,
                    screenshot,
                    color,
                    sensitivity,
                    nudges,
                    reset,
                    preview,
                    output,
                },
            )
            .await
        }
        Commands::Inspect {
            screenshot,
            sensitivity,
            color,
            json,
        } => commands::inspect::run(&config, screenshot, sensitivity, color, json),
        Commands::Check => commands::check::run(&config),
    }
}
