//! RunStamp Image Model
//!
//! Defines the data contracts shared by every pipeline stage:
//! - **Pixels:** owned RGBA buffers with a checked layout
//! - **Geometry:** crop boxes, canvas sizes, and scale ratios
//! - **Placement:** where the overlay sits and how its shadow is drawn
//! - **Options:** color mode and crop sensitivity presets
//!
//! Placement and shadow values are expressed in the pixel space of the
//! canvas they are rendered on; conversions between canvases are explicit.

pub mod geometry;
pub mod options;
pub mod pixel;
pub mod placement;

pub use geometry::*;
pub use options::*;
pub use pixel::*;
pub use placement::*;
