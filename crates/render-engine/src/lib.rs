//! RunStamp Render Engine
//!
//! Draws a prepared overlay and its drop shadow over a background photo,
//! either as a letterboxed preview or at the photo's native resolution.
//!
//! # Pipeline
//!
//! ```text
//! background ──── stretch to canvas ─────┐
//!                                        ├── shadow (blurred alpha, offset)
//! overlay ─── scale by placement ────────┤
//!                                        └── overlay (source-over)
//!                                                   │
//!                                                   ▼
//!                                            PNG encode / write
//! ```

pub mod backend;
pub mod compositor;
pub mod export;

pub use backend::{CpuRenderBackend, RenderBackend, ResizeQuality};
pub use compositor::{Compositor, RenderTarget, RenderedFrame, Scene};
pub use export::*;
