//! Pixel-space rectangles and canvas sizes.

use serde::{Deserialize, Serialize};

/// A rectangular region of a source image, in pixels.
///
/// Boxes produced by [`BoundingBox::clamped_to`] or [`BoundingBox::full`]
/// always satisfy `x + width <= source_width` and `y + height <= source_height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole image.
    pub fn full(source_width: u32, source_height: u32) -> Self {
        Self::new(0, 0, source_width, source_height)
    }

    /// Build a box from exclusive edges, clamping to the source.
    ///
    /// Inverted edges collapse to an empty box rather than wrapping.
    pub fn from_edges(
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
        source_width: u32,
        source_height: u32,
    ) -> Self {
        let left = left.min(source_width);
        let top = top.min(source_height);
        let right = right.clamp(left, source_width);
        let bottom = bottom.clamp(top, source_height);
        Self::new(left, top, right - left, bottom - top)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the box lies entirely inside a `source_width x source_height` image.
    pub fn is_within(&self, source_width: u32, source_height: u32) -> bool {
        self.right() <= source_width && self.bottom() <= source_height
    }

    /// Clamp the box to a `source_width x source_height` image.
    pub fn clamped_to(&self, source_width: u32, source_height: u32) -> Self {
        Self::from_edges(
            self.x,
            self.y,
            self.right(),
            self.bottom(),
            source_width,
            source_height,
        )
    }
}

/// Width and height of a canvas or image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height. Zero-height sizes report 1.0.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f64 / self.height as f64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Fit `self` inside `container`, preserving aspect ratio.
    ///
    /// A relatively wider image takes the container's full width; otherwise
    /// it takes the full height. Each side is at least one pixel.
    pub fn fit_within(&self, container: CanvasSize) -> CanvasSize {
        let aspect = self.aspect_ratio();
        let container_aspect = container.aspect_ratio();

        let (w, h) = if aspect > container_aspect {
            let w = container.width as f64;
            (w, w / aspect)
        } else {
            let h = container.height as f64;
            (h * aspect, h)
        };

        CanvasSize::new((w.round() as u32).max(1), (h.round() as u32).max(1))
    }

    /// Per-axis ratio `self / from`, used to map coordinates between canvases.
    pub fn ratio_from(&self, from: CanvasSize) -> ScaleRatio {
        let axis = |to: u32, from: u32| {
            if from == 0 {
                1.0
            } else {
                to as f64 / from as f64
            }
        };
        ScaleRatio {
            x: axis(self.width, from.width),
            y: axis(self.height, from.height),
        }
    }
}

/// Independent horizontal and vertical scale factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRatio {
    pub x: f64,
    pub y: f64,
}

impl ScaleRatio {
    pub const IDENTITY: ScaleRatio = ScaleRatio { x: 1.0, y: 1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Mean of both axes, for quantities without a direction (blur radius).
    pub fn mean(&self) -> f64 {
        (self.x + self.y) / 2.0
    }
}

impl Default for ScaleRatio {
    fn default() -> Self {
        Self::IDENTITY
    }
}
