//! Smart crop: find the region of a stats screenshot that holds its numbers.
//!
//! # Algorithm
//!
//! 1. **Classify** every pixel as content or chrome using the preset's
//!    content rule (dark pixels, optionally also strongly colored ones).
//! 2. **Scan** rows in parallel, recording per-row content counts and
//!    horizontal extents.
//! 3. **Filter** rows with too few content pixels out of the initial box.
//! 4. **Prioritize** content inside the headline regions (top of the card,
//!    optionally the bottom): it widens the box even when sparse.
//! 5. **Expand** by margins proportional to `min(width, height)` and clamp.
//!
//! A screenshot without any content pixel yields the full image.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use runstamp_image_model::{BoundingBox, CropSensitivity, PixelBuffer, Rgba, CHANNELS};

/// Rule deciding whether a pixel belongs to the informative foreground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ContentRule {
    /// Mean of R, G, B below `max_brightness`.
    Dark { max_brightness: f64 },
    /// Dark as above, or any two channels differing by more than
    /// `min_channel_spread` (colored text on a neutral card).
    DarkOrColored {
        max_brightness: f64,
        min_channel_spread: u8,
    },
}

impl ContentRule {
    pub fn is_content(&self, r: u8, g: u8, b: u8) -> bool {
        let brightness = Rgba::opaque(r, g, b).brightness();
        match *self {
            ContentRule::Dark { max_brightness } => brightness < max_brightness,
            ContentRule::DarkOrColored {
                max_brightness,
                min_channel_spread,
            } => brightness < max_brightness || channel_spread(r, g, b) > min_channel_spread,
        }
    }
}

/// Crop margins, each a fraction of `min(width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl CropMargins {
    pub fn uniform(fraction: f64) -> Self {
        Self {
            left: fraction,
            right: fraction,
            top: fraction,
            bottom: fraction,
        }
    }
}

/// Configuration for the crop detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropConfig {
    /// Pixel classification rule.
    pub content_rule: ContentRule,

    /// Rows whose top edge lies above `height * top_priority_fraction`
    /// are headline rows.
    pub top_priority_fraction: f64,

    /// When set, rows in the bottom `height * fraction` are headline rows too.
    pub bottom_priority_fraction: Option<f64>,

    /// Rows with fewer content pixels than this do not seed the initial box
    /// unless they are headline rows.
    pub min_row_pixels: u32,

    /// Margins added around the detected content.
    pub margins: CropMargins,
}

impl CropConfig {
    pub fn for_sensitivity(sensitivity: CropSensitivity) -> Self {
        match sensitivity {
            CropSensitivity::Standard => Self {
                content_rule: ContentRule::Dark {
                    max_brightness: 120.0,
                },
                top_priority_fraction: 0.4,
                bottom_priority_fraction: None,
                min_row_pixels: 1,
                margins: CropMargins::uniform(0.1),
            },
            CropSensitivity::Extended => Self {
                content_rule: ContentRule::DarkOrColored {
                    max_brightness: 160.0,
                    min_channel_spread: 30,
                },
                top_priority_fraction: 0.4,
                bottom_priority_fraction: Some(0.3),
                min_row_pixels: 1,
                margins: CropMargins {
                    left: 0.1,
                    right: 0.1,
                    top: 0.15,
                    bottom: 0.225,
                },
            },
        }
    }
}

impl Default for CropConfig {
    fn default() -> Self {
        Self::for_sensitivity(CropSensitivity::Standard)
    }
}

/// Result of a detection pass with diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropDetection {
    /// The crop region, clamped to the source.
    pub bounds: BoundingBox,
    /// Total content pixels found.
    pub content_pixels: u64,
    /// Content pixels inside headline regions.
    pub priority_pixels: u64,
    /// True when no content was found and the full image was returned.
    pub fell_back_to_full: bool,
}

/// Content statistics for a single row.
#[derive(Debug, Clone, Copy)]
struct RowScan {
    y: u32,
    count: u32,
    min_x: u32,
    max_x: u32,
}

/// Inclusive pixel extent accumulated over content rows.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Extent {
    min_x: u32,
    max_x: u32,
    min_y: u32,
    max_y: u32,
}

impl Extent {
    fn from_row(row: &RowScan) -> Self {
        Self {
            min_x: row.min_x,
            max_x: row.max_x,
            min_y: row.y,
            max_y: row.y,
        }
    }

    fn include(self, row: &RowScan) -> Self {
        Self {
            min_x: self.min_x.min(row.min_x),
            max_x: self.max_x.max(row.max_x),
            min_y: self.min_y.min(row.y),
            max_y: self.max_y.max(row.y),
        }
    }
}

fn extend(extent: Option<Extent>, row: &RowScan) -> Option<Extent> {
    Some(match extent {
        Some(e) => e.include(row),
        None => Extent::from_row(row),
    })
}

/// The smart-crop detector.
pub struct CropDetector {
    config: CropConfig,
}

impl CropDetector {
    /// Create a detector with the given configuration.
    pub fn new(config: CropConfig) -> Self {
        Self { config }
    }

    /// Create a detector for a sensitivity preset.
    pub fn with_sensitivity(sensitivity: CropSensitivity) -> Self {
        Self::new(CropConfig::for_sensitivity(sensitivity))
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    /// Detect the content bounding box of `buffer`.
    pub fn detect(&self, buffer: &PixelBuffer) -> BoundingBox {
        self.detect_with_report(buffer).bounds
    }

    /// Detect the content bounding box and report how it was derived.
    pub fn detect_with_report(&self, buffer: &PixelBuffer) -> CropDetection {
        let (width, height) = (buffer.width(), buffer.height());
        let full = BoundingBox::full(width, height);

        if buffer.is_empty() {
            return CropDetection {
                bounds: full,
                content_pixels: 0,
                priority_pixels: 0,
                fell_back_to_full: true,
            };
        }

        let rows = self.scan_rows(buffer);
        let content_pixels: u64 = rows.iter().map(|r| r.count as u64).sum();

        if rows.is_empty() {
            tracing::debug!(width, height, "No content pixels found, keeping full image");
            return CropDetection {
                bounds: full,
                content_pixels: 0,
                priority_pixels: 0,
                fell_back_to_full: true,
            };
        }

        let top_limit = height as f64 * self.config.top_priority_fraction;
        let bottom_limit = self
            .config
            .bottom_priority_fraction
            .map(|fraction| height as f64 * (1.0 - fraction));
        let is_priority = |y: u32| {
            let y = y as f64;
            y < top_limit || bottom_limit.is_some_and(|limit| y >= limit)
        };

        // Filter pass: dense rows seed the box.
        let mut extent = rows
            .iter()
            .filter(|r| r.count >= self.config.min_row_pixels)
            .fold(None, extend);

        // Headline rows widen it even when sparse.
        let mut priority_pixels = 0u64;
        for row in rows.iter().filter(|r| is_priority(r.y)) {
            priority_pixels += row.count as u64;
            extent = extend(extent, row);
        }

        // Only sparse rows outside the headline regions: use them all.
        let Some(extent) = extent.or_else(|| rows.iter().fold(None, extend)) else {
            return CropDetection {
                bounds: full,
                content_pixels,
                priority_pixels,
                fell_back_to_full: true,
            };
        };

        let bounds = self.apply_margins(extent, width, height);

        tracing::debug!(
            x = bounds.x,
            y = bounds.y,
            w = bounds.width,
            h = bounds.height,
            content_pixels,
            priority_pixels,
            "Detected content region"
        );

        CropDetection {
            bounds,
            content_pixels,
            priority_pixels,
            fell_back_to_full: false,
        }
    }

    /// Scan every row and keep the ones that contain content, in row order.
    fn scan_rows(&self, buffer: &PixelBuffer) -> Vec<RowScan> {
        let rule = self.config.content_rule;
        let stride = buffer.row_stride();

        buffer
            .samples()
            .par_chunks_exact(stride)
            .enumerate()
            .filter_map(|(y, row)| scan_row(y as u32, row, &rule))
            .collect()
    }

    fn apply_margins(&self, extent: Extent, width: u32, height: u32) -> BoundingBox {
        let base = width.min(height) as f64;
        let m = &self.config.margins;

        let left = (extent.min_x as f64 - base * m.left).max(0.0).floor();
        let top = (extent.min_y as f64 - base * m.top).max(0.0).floor();
        let right = ((extent.max_x + 1) as f64 + base * m.right)
            .min(width as f64)
            .ceil();
        let bottom = ((extent.max_y + 1) as f64 + base * m.bottom)
            .min(height as f64)
            .ceil();

        BoundingBox::from_edges(
            left as u32,
            top as u32,
            right as u32,
            bottom as u32,
            width,
            height,
        )
    }
}

impl Default for CropDetector {
    fn default() -> Self {
        Self::new(CropConfig::default())
    }
}

fn scan_row(y: u32, row: &[u8], rule: &ContentRule) -> Option<RowScan> {
    let mut count = 0u32;
    let mut min_x = u32::MAX;
    let mut max_x = 0u32;

    for (x, px) in row.chunks_exact(CHANNELS).enumerate() {
        // Fully transparent pixels carry no visible content.
        if px[3] == 0 || !rule.is_content(px[0], px[1], px[2]) {
            continue;
        }
        let x = x as u32;
        count += 1;
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }

    (count > 0).then_some(RowScan {
        y,
        count,
        min_x,
        max_x,
    })
}

fn channel_spread(r: u8, g: u8, b: u8) -> u8 {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    max - min
}

/// Copy the detected region into a new buffer.
pub fn apply_crop(buffer: &PixelBuffer, bounds: &BoundingBox) -> PixelBuffer {
    buffer.crop(bounds)
}
