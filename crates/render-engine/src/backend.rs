//! Raster backends used by the compositor.

use image::imageops::FilterType;
use image::{GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};

use runstamp_common::error::{RunstampError, RunstampResult};
use runstamp_image_model::{CanvasSize, PixelBuffer};

/// Resampling quality for a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeQuality {
    /// Bilinear; used for interactive previews.
    Fast,
    /// Bicubic; used for exports.
    High,
}

impl ResizeQuality {
    fn filter(self) -> FilterType {
        match self {
            ResizeQuality::Fast => FilterType::Triangle,
            ResizeQuality::High => FilterType::CatmullRom,
        }
    }
}

/// Trait for raster backends (CPU, GPU, etc.).
pub trait RenderBackend: Send + Sync {
    /// Resample `src` to `size`.
    fn resize(
        &self,
        src: &PixelBuffer,
        size: CanvasSize,
        quality: ResizeQuality,
    ) -> RunstampResult<PixelBuffer>;

    /// Gaussian-blur a single-channel mask with standard deviation `sigma`.
    fn blur_mask(&self, mask: &GrayImage, sigma: f32) -> RunstampResult<GrayImage>;

    /// Check if this backend can render on this system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Pure-CPU backend built on `image` and `imageproc`.
#[derive(Debug, Clone)]
pub struct CpuRenderBackend {
    max_pixels: u64,
}

/// Largest canvas the CPU backend will allocate by default.
///
/// Matches the decoder's default allocation limit in bytes, so any image
/// that decodes (at one byte or more per pixel) can also be rendered.
pub const DEFAULT_MAX_PIXELS: u64 = 512 * 1024 * 1024;

impl CpuRenderBackend {
    pub fn new() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    /// Limit the number of pixels a single resize may produce.
    pub fn with_pixel_limit(max_pixels: u64) -> Self {
        Self { max_pixels }
    }

    fn check_size(&self, size: CanvasSize) -> RunstampResult<()> {
        let pixels = size.width as u64 * size.height as u64;
        if pixels > self.max_pixels {
            return Err(RunstampError::render(format!(
                "Target {}x{} exceeds the {} pixel limit",
                size.width, size.height, self.max_pixels
            )));
        }
        Ok(())
    }
}

impl Default for CpuRenderBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for CpuRenderBackend {
    fn resize(
        &self,
        src: &PixelBuffer,
        size: CanvasSize,
        quality: ResizeQuality,
    ) -> RunstampResult<PixelBuffer> {
        self.check_size(size)?;

        if size == src.size() {
            return Ok(src.clone());
        }
        if size.is_empty() || src.is_empty() {
            return PixelBuffer::transparent(size.width, size.height)
                .map_err(|e| RunstampError::render(e.to_string()));
        }

        // Resample premultiplied so transparent pixels do not bleed their
        // hidden color into the edges of the overlay.
        let mut img = src.to_rgba_image();
        premultiply(&mut img);
        let mut resized = image::imageops::resize(&img, size.width, size.height, quality.filter());
        unpremultiply(&mut resized);

        Ok(PixelBuffer::from(resized))
    }

    fn blur_mask(&self, mask: &GrayImage, sigma: f32) -> RunstampResult<GrayImage> {
        if sigma <= 0.0 || !sigma.is_finite() {
            return Err(RunstampError::render(format!(
                "Blur sigma must be positive, got {sigma}"
            )));
        }
        Ok(imageproc::filter::gaussian_blur_f32(mask, sigma))
    }

    fn is_available(&self) -> bool {
        self.max_pixels > 0
    }

    fn name(&self) -> &str {
        "cpu"
    }
}

fn premultiply(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let a = px[3] as u32;
        for c in 0..3 {
            px[c] = ((px[c] as u32 * a + 127) / 255) as u8;
        }
    }
}

fn unpremultiply(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let a = px[3] as u32;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        for c in 0..3 {
            px[c] = ((px[c] as u32 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runstamp_image_model::Rgba;

    #[test]
    fn resize_to_same_size_is_a_copy() {
        let src = PixelBuffer::filled(8, 8, Rgba::opaque(1, 2, 3)).unwrap();
        let out = CpuRenderBackend::new()
            .resize(&src, CanvasSize::new(8, 8), ResizeQuality::High)
            .unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn resize_keeps_uniform_color() {
        let src = PixelBuffer::filled(40, 20, Rgba::opaque(200, 100, 50)).unwrap();
        let out = CpuRenderBackend::new()
            .resize(&src, CanvasSize::new(10, 5), ResizeQuality::Fast)
            .unwrap();
        assert_eq!(out.size(), CanvasSize::new(10, 5));
        assert_eq!(out.pixel(4, 2), Some(Rgba::opaque(200, 100, 50)));
    }

    #[test]
    fn transparent_neighbors_do_not_tint_edges() {
        // left half opaque white, right half transparent red
        let mut src = PixelBuffer::filled(16, 4, Rgba::new(255, 0, 0, 0)).unwrap();
        for y in 0..4 {
            for x in 0..8 {
                src.set_pixel(x, y, Rgba::WHITE);
            }
        }
        let out = CpuRenderBackend::new()
            .resize(&src, CanvasSize::new(8, 2), ResizeQuality::Fast)
            .unwrap();
        for x in 0..8 {
            let px = out.pixel(x, 0).unwrap();
            if px.a > 0 {
                assert!(px.g >= 250 && px.b >= 250, "edge tinted: {px:?}");
            }
        }
    }

    #[test]
    fn pixel_limit_rejects_huge_targets() {
        let src = PixelBuffer::filled(2, 2, Rgba::WHITE).unwrap();
        let err = CpuRenderBackend::with_pixel_limit(10)
            .resize(&src, CanvasSize::new(4, 4), ResizeQuality::Fast)
            .unwrap_err();
        assert!(err.to_string().contains("pixel limit"));
    }

    #[test]
    fn default_limit_admits_large_photos() {
        let backend = CpuRenderBackend::new();
        assert!(backend.check_size(CanvasSize::new(12000, 9000)).is_ok());
        assert!(backend.check_size(CanvasSize::new(16384, 16384)).is_ok());
    }

    #[test]
    fn default_limit_covers_decoder_allocation_limit() {
        let decoder_bytes = image::Limits::default().max_alloc.unwrap_or(0);
        assert!(decoder_bytes <= DEFAULT_MAX_PIXELS);
    }

    #[test]
    fn blur_rejects_non_positive_sigma() {
        let mask = GrayImage::new(4, 4);
        assert!(CpuRenderBackend::new().blur_mask(&mask, 0.0).is_err());
    }

    #[test]
    fn blur_spreads_mask() {
        let mut mask = GrayImage::new(21, 21);
        mask.put_pixel(10, 10, image::Luma([255]));
        let blurred = CpuRenderBackend::new().blur_mask(&mask, 2.0).unwrap();
        assert!(blurred.get_pixel(10, 10)[0] < 255);
        assert!(blurred.get_pixel(12, 10)[0] > 0);
    }
}
