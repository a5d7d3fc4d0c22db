//! Overlay preparation: crop, then matte.

use serde::{Deserialize, Serialize};

use runstamp_image_model::{ColorMode, CropSensitivity, PixelBuffer};

use crate::crop_detect::{apply_crop, CropConfig, CropDetection, CropDetector};
use crate::matte::{BackgroundMatte, MatteConfig, MatteReport};

/// Options for turning a screenshot into an overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayOptions {
    pub color_mode: ColorMode,
    pub crop: CropConfig,
    pub matte: MatteConfig,
}

impl OverlayOptions {
    pub fn new(color_mode: ColorMode, sensitivity: CropSensitivity) -> Self {
        Self {
            color_mode,
            crop: CropConfig::for_sensitivity(sensitivity),
            matte: MatteConfig::default(),
        }
    }
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self::new(ColorMode::default(), CropSensitivity::default())
    }
}

/// A matted overlay ready for compositing.
#[derive(Debug, Clone)]
pub struct PreparedOverlay {
    /// Cropped, matted pixels.
    pub buffer: PixelBuffer,
    /// How the crop region was found.
    pub crop: CropDetection,
    /// How the background was removed.
    pub matte: MatteReport,
}

/// Crop the screenshot to its content and remove its background.
pub fn prepare_overlay(screenshot: &PixelBuffer, options: &OverlayOptions) -> PreparedOverlay {
    let crop = CropDetector::new(options.crop.clone()).detect_with_report(screenshot);
    let cropped = apply_crop(screenshot, &crop.bounds);
    let (buffer, matte) =
        BackgroundMatte::new(options.matte.clone()).matte_with_report(&cropped, options.color_mode);

    tracing::info!(
        source_w = screenshot.width(),
        source_h = screenshot.height(),
        overlay_w = buffer.width(),
        overlay_h = buffer.height(),
        full_image = crop.fell_back_to_full,
        "Prepared overlay"
    );

    PreparedOverlay {
        buffer,
        crop,
        matte,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runstamp_image_model::Rgba;

    #[test]
    fn overlay_has_crop_dimensions() {
        let mut shot = PixelBuffer::filled(200, 100, Rgba::WHITE).unwrap();
        for y in 40..60 {
            for x in 80..120 {
                shot.set_pixel(x, y, Rgba::BLACK);
            }
        }
        let prepared = prepare_overlay(&shot, &OverlayOptions::default());
        assert_eq!(prepared.buffer.width(), prepared.crop.bounds.width);
        assert_eq!(prepared.buffer.height(), prepared.crop.bounds.height);
        // margin ring is white card, text is recolored white and opaque
        assert_eq!(prepared.buffer.pixel(0, 0).unwrap().a, 0);
        assert_eq!(prepared.buffer.pixel(15, 15), Some(Rgba::WHITE));
    }
}
