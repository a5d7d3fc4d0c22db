//! Background matting: turn a cropped screenshot into a transparent overlay.
//!
//! The background color is estimated from square patches at the four
//! corners of the image. Pixels close to that color become fully
//! transparent; everything else is recolored according to the
//! [`ColorMode`] and made fully opaque.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use runstamp_image_model::{ColorMode, PixelBuffer, CHANNELS};

/// Configuration for background matting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatteConfig {
    /// Side length of the square sampled at each corner.
    pub sample_depth: u32,

    /// Euclidean RGB distance below which a pixel counts as background.
    pub distance_threshold: f64,

    /// In black mode, pixels whose channel sum is below this get darkened.
    pub dark_sum_threshold: u32,

    /// Amount subtracted from each channel of a darkened pixel.
    pub darken_amount: u8,
}

impl Default for MatteConfig {
    fn default() -> Self {
        Self {
            sample_depth: 20,
            distance_threshold: 40.0,
            dark_sum_threshold: 300,
            darken_amount: 20,
        }
    }
}

/// Estimated background color of a screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BackgroundEstimate {
    /// Mean color of the corner samples.
    Color { r: f64, g: f64, b: f64 },
    /// No usable samples; transparency is disabled.
    Unavailable,
}

impl BackgroundEstimate {
    fn distance(&self, r: u8, g: u8, b: u8) -> Option<f64> {
        match *self {
            BackgroundEstimate::Color {
                r: br,
                g: bg,
                b: bb,
            } => {
                let dr = r as f64 - br;
                let dg = g as f64 - bg;
                let db = b as f64 - bb;
                Some((dr * dr + dg * dg + db * db).sqrt())
            }
            BackgroundEstimate::Unavailable => None,
        }
    }
}

/// Summary of a matting pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatteReport {
    pub background: BackgroundEstimate,
    pub transparent_pixels: u64,
    pub opaque_pixels: u64,
}

/// The background matting stage.
pub struct BackgroundMatte {
    config: MatteConfig,
}

impl BackgroundMatte {
    pub fn new(config: MatteConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(MatteConfig::default())
    }

    pub fn config(&self) -> &MatteConfig {
        &self.config
    }

    /// Estimate the background color from the four corner patches.
    ///
    /// Transparent samples are skipped. Small images sample overlapping
    /// patches, so central pixels may be counted more than once.
    pub fn estimate_background(&self, buffer: &PixelBuffer) -> BackgroundEstimate {
        let (w, h) = (buffer.width(), buffer.height());
        let depth_x = self.config.sample_depth.min(w);
        let depth_y = self.config.sample_depth.min(h);

        let mut sum = [0u64; 3];
        let mut count = 0u64;

        for i in 0..depth_x {
            for j in 0..depth_y {
                let corners = [
                    (i, j),
                    (w - 1 - i, j),
                    (i, h - 1 - j),
                    (w - 1 - i, h - 1 - j),
                ];
                for (x, y) in corners {
                    let Some(px) = buffer.pixel(x, y) else {
                        continue;
                    };
                    if px.a == 0 {
                        continue;
                    }
                    sum[0] += px.r as u64;
                    sum[1] += px.g as u64;
                    sum[2] += px.b as u64;
                    count += 1;
                }
            }
        }

        if count == 0 {
            return BackgroundEstimate::Unavailable;
        }

        let n = count as f64;
        BackgroundEstimate::Color {
            r: sum[0] as f64 / n,
            g: sum[1] as f64 / n,
            b: sum[2] as f64 / n,
        }
    }

    /// Matte `buffer`, returning a new buffer of the same dimensions.
    pub fn matte(&self, buffer: &PixelBuffer, mode: ColorMode) -> PixelBuffer {
        self.matte_with_report(buffer, mode).0
    }

    /// Matte `buffer` and report the estimate and pixel counts.
    pub fn matte_with_report(
        &self,
        buffer: &PixelBuffer,
        mode: ColorMode,
    ) -> (PixelBuffer, MatteReport) {
        let background = self.estimate_background(buffer);
        if background == BackgroundEstimate::Unavailable && !buffer.is_empty() {
            tracing::warn!(
                width = buffer.width(),
                height = buffer.height(),
                "No usable border samples, background removal disabled"
            );
        }

        let mut out = buffer.clone();
        if out.is_empty() {
            return (
                out,
                MatteReport {
                    background,
                    transparent_pixels: 0,
                    opaque_pixels: 0,
                },
            );
        }

        let stride = out.row_stride();
        let transparent_pixels: u64 = out
            .samples_mut()
            .par_chunks_exact_mut(stride)
            .map(|row| self.matte_row(row, &background, mode))
            .sum();

        let total = buffer.width() as u64 * buffer.height() as u64;
        let report = MatteReport {
            background,
            transparent_pixels,
            opaque_pixels: total - transparent_pixels,
        };

        tracing::debug!(
            ?mode,
            ?background,
            transparent = report.transparent_pixels,
            opaque = report.opaque_pixels,
            "Matted overlay"
        );

        (out, report)
    }

    /// Rewrite one row in place and return how many pixels became transparent.
    fn matte_row(&self, row: &mut [u8], background: &BackgroundEstimate, mode: ColorMode) -> u64 {
        let mut transparent = 0u64;

        for px in row.chunks_exact_mut(CHANNELS) {
            if px[3] == 0 {
                transparent += 1;
                continue;
            }

            let is_background = background
                .distance(px[0], px[1], px[2])
                .is_some_and(|d| d < self.config.distance_threshold);

            if is_background {
                px[3] = 0;
                transparent += 1;
                continue;
            }

            match mode {
                ColorMode::White => {
                    px[0] = 255;
                    px[1] = 255;
                    px[2] = 255;
                }
                ColorMode::Black => {
                    let sum = px[0] as u32 + px[1] as u32 + px[2] as u32;
                    if sum < self.config.dark_sum_threshold {
                        let d = self.config.darken_amount;
                        px[0] = px[0].saturating_sub(d);
                        px[1] = px[1].saturating_sub(d);
                        px[2] = px[2].saturating_sub(d);
                    }
                }
            }
            px[3] = 255;
        }

        transparent
    }
}

impl Default for BackgroundMatte {
    fn default() -> Self {
        Self::with_defaults()
    }
}
