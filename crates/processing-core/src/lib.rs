//! RunStamp Processing Core
//!
//! Turns a running-app stats screenshot into a transparent overlay:
//! - **Smart Crop:** isolate the numeric/text region from surrounding chrome
//! - **Background Matte:** estimate the card color and make it transparent
//! - **Recolor:** paint the remaining foreground white, or deepen dark text
//!
//! This crate is pure computation: no I/O, no rendering backend.
//! All inputs are buffers; all outputs are new buffers.

pub mod crop_detect;
pub mod matte;
pub mod overlay;

pub use crop_detect::{CropConfig, CropDetection, CropDetector};
pub use matte::{BackgroundEstimate, BackgroundMatte, MatteConfig, MatteReport};
pub use overlay::{prepare_overlay, OverlayOptions, PreparedOverlay};
