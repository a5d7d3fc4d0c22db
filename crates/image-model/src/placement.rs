//! Overlay placement and drop shadow parameters.
//!
//! Both are expressed in the pixel space of whichever canvas is being
//! rendered. Moving between the preview canvas and the export canvas goes
//! through [`Placement::rescaled`] and [`ShadowSpec::rescaled`].

use serde::{Deserialize, Serialize};

use crate::geometry::{CanvasSize, ScaleRatio};
use crate::options::CropSensitivity;
use crate::pixel::Rgba;

/// Fraction of the canvas used as the default top-left inset.
pub const DEFAULT_INSET_FRACTION: f64 = 0.05;

/// Sizing rules for the initial overlay placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementPreset {
    /// Maximum overlay width as a fraction of the canvas width.
    pub max_width_fraction: f64,
    /// Upper bound on the initial scale factor.
    pub max_scale: f64,
    /// Top-left inset as a fraction of the canvas size.
    pub inset_fraction: f64,
}

impl PlacementPreset {
    pub fn for_sensitivity(sensitivity: CropSensitivity) -> Self {
        match sensitivity {
            CropSensitivity::Standard => Self {
                max_width_fraction: 0.30,
                max_scale: 1.0,
                inset_fraction: DEFAULT_INSET_FRACTION,
            },
            CropSensitivity::Extended => Self {
                max_width_fraction: 0.25,
                max_scale: 0.8,
                inset_fraction: DEFAULT_INSET_FRACTION,
            },
        }
    }
}

impl Default for PlacementPreset {
    fn default() -> Self {
        Self::for_sensitivity(CropSensitivity::Standard)
    }
}

/// Pointer movement between two preview renders, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DragDelta {
    pub dx: f64,
    pub dy: f64,
}

impl DragDelta {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// Where the overlay is drawn on a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Left edge of the scaled overlay.
    pub left: f64,
    /// Top edge of the scaled overlay.
    pub top: f64,
    /// Horizontal scale applied to the overlay's native width.
    pub scale_x: f64,
    /// Vertical scale applied to the overlay's native height.
    pub scale_y: f64,
}

impl Placement {
    pub fn new(left: f64, top: f64, scale_x: f64, scale_y: f64) -> Self {
        Self {
            left,
            top,
            scale_x,
            scale_y,
        }
    }

    /// Default placement for a freshly prepared overlay.
    ///
    /// The overlay is inset from the top-left corner and scaled so its width
    /// does not exceed `preset.max_width_fraction` of the canvas, never
    /// beyond `preset.max_scale`.
    pub fn initial(canvas: CanvasSize, overlay: CanvasSize, preset: &PlacementPreset) -> Self {
        let max_width = canvas.width as f64 * preset.max_width_fraction;
        let scale = if overlay.width == 0 {
            preset.max_scale
        } else {
            (max_width / overlay.width as f64).min(preset.max_scale)
        };

        Self {
            left: canvas.width as f64 * preset.inset_fraction,
            top: canvas.height as f64 * preset.inset_fraction,
            scale_x: scale,
            scale_y: scale,
        }
    }

    /// Move back to the default inset, keeping the current scale.
    pub fn with_position_reset(self, canvas: CanvasSize) -> Self {
        Self {
            left: canvas.width as f64 * DEFAULT_INSET_FRACTION,
            top: canvas.height as f64 * DEFAULT_INSET_FRACTION,
            ..self
        }
    }

    /// Apply a drag.
    pub fn dragged(self, delta: DragDelta) -> Self {
        Self {
            left: self.left + delta.dx,
            top: self.top + delta.dy,
            ..self
        }
    }

    /// Map this placement onto a canvas scaled by `ratio`.
    pub fn rescaled(self, ratio: ScaleRatio) -> Self {
        Self {
            left: self.left * ratio.x,
            top: self.top * ratio.y,
            scale_x: self.scale_x * ratio.x,
            scale_y: self.scale_y * ratio.y,
        }
    }

    /// Size of the overlay once drawn, in canvas pixels.
    pub fn drawn_size(&self, overlay: CanvasSize) -> (f64, f64) {
        (
            overlay.width as f64 * self.scale_x,
            overlay.height as f64 * self.scale_y,
        )
    }

    /// Top-left corner as a fraction of the canvas size.
    pub fn relative_origin(&self, canvas: CanvasSize) -> (f64, f64) {
        let rel = |v: f64, extent: u32| {
            if extent == 0 {
                0.0
            } else {
                v / extent as f64
            }
        };
        (rel(self.left, canvas.width), rel(self.top, canvas.height))
    }
}

/// Drop shadow drawn beneath the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSpec {
    /// Shadow tint; its alpha is the peak shadow opacity.
    pub color: Rgba,
    /// Blur radius in canvas pixels.
    pub blur_radius: f64,
    /// Horizontal offset in canvas pixels.
    pub offset_x: f64,
    /// Vertical offset in canvas pixels.
    pub offset_y: f64,
}

impl ShadowSpec {
    /// A shadow that draws nothing.
    pub const NONE: ShadowSpec = ShadowSpec {
        color: Rgba::TRANSPARENT,
        blur_radius: 0.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Map this shadow onto a canvas scaled by `ratio`.
    pub fn rescaled(self, ratio: ScaleRatio) -> Self {
        Self {
            blur_radius: self.blur_radius * ratio.mean(),
            offset_x: self.offset_x * ratio.x,
            offset_y: self.offset_y * ratio.y,
            ..self
        }
    }

    pub fn is_visible(&self) -> bool {
        self.color.a > 0
    }
}

impl Default for ShadowSpec {
    /// `rgba(0, 0, 0, 0.3)`, blur 10, offset (3, 3) on the preview canvas.
    fn default() -> Self {
        Self {
            color: Rgba::new(0, 0, 0, 77),
            blur_radius: 10.0,
            offset_x: 3.0,
            offset_y: 3.0,
        }
    }
}
