//! RGBA pixel buffers.
//!
//! A [`PixelBuffer`] is the unit of exchange between every pipeline stage.
//! Samples are stored row-major from the top-left corner, four bytes per
//! pixel, and the length invariant `width * height * 4` is enforced at
//! construction time.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, CanvasSize};

/// Number of bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// A single RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Average of the three color channels.
    pub fn brightness(&self) -> f64 {
        (self.r as f64 + self.g as f64 + self.b as f64) / 3.0
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(v: [u8; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Errors raised when a pixel buffer would violate its layout invariant.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("sample length {actual} does not match {width}x{height}x4 = {expected}")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("dimensions {width}x{height} overflow addressable memory")]
    TooLarge { width: u32, height: u32 },
}

/// An owned RGBA image.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples, validating the length invariant.
    pub fn new(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, BufferError> {
        let expected = sample_len(width, height)?;
        if samples.len() != expected {
            return Err(BufferError::LengthMismatch {
                width,
                height,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// A buffer filled with one color.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Result<Self, BufferError> {
        let len = sample_len(width, height)?;
        let mut samples = Vec::with_capacity(len);
        for _ in 0..len / CHANNELS {
            samples.extend_from_slice(&color.to_array());
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// A fully transparent buffer.
    pub fn transparent(width: u32, height: u32) -> Result<Self, BufferError> {
        let len = sample_len(width, height)?;
        Ok(Self {
            width,
            height,
            samples: vec![0; len],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }

    /// Whether the buffer contains no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Mutable access to the samples. The length cannot change.
    pub fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.samples
    }

    /// Number of bytes in one row.
    pub fn row_stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Read a pixel. Returns `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        let p = &self.samples[idx..idx + CHANNELS];
        Some(Rgba::new(p[0], p[1], p[2], p[3]))
    }

    /// Write a pixel. Writes outside the buffer are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.samples[idx..idx + CHANNELS].copy_from_slice(&color.to_array());
    }

    /// Copy the region described by `region` into a new buffer.
    ///
    /// The region is clamped to the buffer first, so an oversized box yields
    /// the overlapping part rather than a panic.
    pub fn crop(&self, region: &BoundingBox) -> PixelBuffer {
        let region = region.clamped_to(self.width, self.height);
        let mut samples =
            Vec::with_capacity(region.width as usize * region.height as usize * CHANNELS);
        let stride = self.row_stride();
        let start = region.x as usize * CHANNELS;
        let end = start + region.width as usize * CHANNELS;

        for y in region.y..region.bottom() {
            let row = y as usize * stride;
            samples.extend_from_slice(&self.samples[row + start..row + end]);
        }

        PixelBuffer {
            width: region.width,
            height: region.height,
            samples,
        }
    }

    /// Convert into an `image` crate buffer without copying.
    pub fn into_rgba_image(self) -> RgbaImage {
        let (w, h) = (self.width, self.height);
        // length invariant guarantees this succeeds
        RgbaImage::from_raw(w, h, self.samples).unwrap_or_else(|| RgbaImage::new(w, h))
    }

    /// Copy into an `image` crate buffer.
    pub fn to_rgba_image(&self) -> RgbaImage {
        self.clone().into_rgba_image()
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            samples: img.into_raw(),
        }
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.samples.len())
            .finish()
    }
}

fn sample_len(width: u32, height: u32) -> Result<usize, BufferError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(CHANNELS))
        .ok_or(BufferError::TooLarge { width, height })
}
