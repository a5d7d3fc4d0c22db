//! Scene compositor: background, drop shadow, then overlay.
//!
//! A scene is rendered onto a canvas whose size depends on the target:
//! previews letterbox-fit the background into a container, exports use the
//! background's native resolution. Placement and shadow values must already
//! be expressed in the target canvas's pixel space.

use image::{GrayImage, Luma};

use runstamp_common::error::{RunstampError, RunstampResult};
use runstamp_image_model::{CanvasSize, PixelBuffer, Placement, ShadowSpec, CHANNELS};

use crate::backend::{CpuRenderBackend, RenderBackend, ResizeQuality};

/// Blur radii below this are drawn as a hard-edged shadow.
const MIN_BLUR_SIGMA: f32 = 0.05;

/// Coordinates are clamped to this magnitude before integer pixel math.
const MAX_COORDINATE: f64 = u32::MAX as f64;

/// Where a scene is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// Interactive preview fitted inside `container`.
    Preview { container: CanvasSize },
    /// Final export at the background's native resolution.
    Export,
}

impl RenderTarget {
    fn quality(self) -> ResizeQuality {
        match self {
            RenderTarget::Preview { .. } => ResizeQuality::Fast,
            RenderTarget::Export => ResizeQuality::High,
        }
    }
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub background: &'a PixelBuffer,
    pub overlay: &'a PixelBuffer,
    pub placement: Placement,
    pub shadow: ShadowSpec,
}

/// A rendered frame and the canvas it was drawn on.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub buffer: PixelBuffer,
    pub canvas: CanvasSize,
}

/// Composites scenes through an injected raster backend.
pub struct Compositor {
    backend: Box<dyn RenderBackend>,
}

impl Compositor {
    /// Build a compositor once its backend reports it is ready.
    pub fn new(backend: Box<dyn RenderBackend>) -> RunstampResult<Self> {
        if !backend.is_available() {
            return Err(RunstampError::backend_unavailable(format!(
                "backend '{}' is not available",
                backend.name()
            )));
        }
        tracing::debug!(backend = backend.name(), "Compositor ready");
        Ok(Self { backend })
    }

    /// Compositor on the default CPU backend.
    pub fn cpu() -> RunstampResult<Self> {
        Self::new(Box::new(CpuRenderBackend::new()))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Canvas size used for `background` on `target`.
    pub fn canvas_size(background: CanvasSize, target: RenderTarget) -> CanvasSize {
        match target {
            RenderTarget::Preview { container } => background.fit_within(container),
            RenderTarget::Export => background,
        }
    }

    /// Render `scene` onto a fresh canvas.
    pub fn compose(
        &self,
        scene: &Scene<'_>,
        target: RenderTarget,
    ) -> RunstampResult<RenderedFrame> {
        if scene.background.is_empty() {
            return Err(RunstampError::render("Background image is empty"));
        }

        let canvas = Self::canvas_size(scene.background.size(), target);
        let quality = target.quality();

        // Background is stretched to the canvas, never padded.
        let mut frame = self.backend.resize(scene.background, canvas, quality)?;

        match scaled_overlay_size(scene.overlay.size(), &scene.placement) {
            Some(size) => {
                let overlay = self.backend.resize(scene.overlay, size, quality)?;
                let left = to_pixel(scene.placement.left);
                let top = to_pixel(scene.placement.top);

                if scene.shadow.is_visible() {
                    self.draw_shadow(&mut frame, &overlay, left, top, &scene.shadow)?;
                }
                blit(&mut frame, overlay.width(), overlay.height(), left, top, |x, y| {
                    let idx = (y as usize * overlay.width() as usize + x as usize) * CHANNELS;
                    let p = &overlay.samples()[idx..idx + CHANNELS];
                    [p[0], p[1], p[2], p[3]]
                });
            }
            None => {
                tracing::debug!(
                    scale_x = scene.placement.scale_x,
                    scale_y = scene.placement.scale_y,
                    "Overlay has no drawable area, skipping"
                );
            }
        }

        tracing::debug!(
            width = canvas.width,
            height = canvas.height,
            ?target,
            "Composited frame"
        );

        Ok(RenderedFrame {
            buffer: frame,
            canvas,
        })
    }

    /// Draw the blurred, tinted silhouette of `overlay` beneath where it
    /// will be placed.
    fn draw_shadow(
        &self,
        frame: &mut PixelBuffer,
        overlay: &PixelBuffer,
        left: i64,
        top: i64,
        shadow: &ShadowSpec,
    ) -> RunstampResult<()> {
        let sigma = (shadow.blur_radius / 2.0) as f32;
        let blurred = sigma.is_finite() && sigma > MIN_BLUR_SIGMA;
        let pad = if blurred {
            (sigma * 3.0).ceil() as u32
        } else {
            0
        };

        let padded = |side: u32| {
            pad.checked_mul(2)
                .and_then(|p| side.checked_add(p))
                .ok_or_else(|| RunstampError::render("Shadow blur radius is too large"))
        };
        let mut mask = GrayImage::new(padded(overlay.width())?, padded(overlay.height())?);
        let width = overlay.width().max(1) as usize;
        for (i, px) in overlay.samples().chunks_exact(CHANNELS).enumerate() {
            if px[3] == 0 {
                continue;
            }
            let x = (i % width) as u32 + pad;
            let y = (i / width) as u32 + pad;
            mask.put_pixel(x, y, Luma([px[3]]));
        }

        let mask = if blurred {
            self.backend.blur_mask(&mask, sigma)?
        } else {
            mask
        };

        let color = shadow.color;
        let origin_x = left + to_pixel(shadow.offset_x) - pad as i64;
        let origin_y = top + to_pixel(shadow.offset_y) - pad as i64;
        blit(frame, mask.width(), mask.height(), origin_x, origin_y, |x, y| {
            let coverage = mask.get_pixel(x, y)[0] as u32;
            let alpha = (coverage * color.a as u32 + 127) / 255;
            [color.r, color.g, color.b, alpha as u8]
        });

        Ok(())
    }
}

/// Round a canvas coordinate to a pixel, saturating far off-canvas values.
fn to_pixel(v: f64) -> i64 {
    v.round().clamp(-MAX_COORDINATE, MAX_COORDINATE) as i64
}

/// Pixel size of the overlay after scaling, or `None` if nothing would be drawn.
fn scaled_overlay_size(overlay: CanvasSize, placement: &Placement) -> Option<CanvasSize> {
    if overlay.is_empty() {
        return None;
    }
    let (w, h) = placement.drawn_size(overlay);
    if !w.is_finite() || !h.is_finite() {
        return None;
    }
    let (w, h) = (w.round(), h.round());
    if w < 1.0 || h < 1.0 || w > u32::MAX as f64 || h > u32::MAX as f64 {
        return None;
    }
    Some(CanvasSize::new(w as u32, h as u32))
}

/// Source-over a `width x height` layer onto `frame` at `(left, top)`,
/// clipping to the frame. `sample(x, y)` yields the layer's RGBA pixel.
fn blit<F>(frame: &mut PixelBuffer, width: u32, height: u32, left: i64, top: i64, sample: F)
where
    F: Fn(u32, u32) -> [u8; 4],
{
    let fw = frame.width() as i64;
    let fh = frame.height() as i64;

    let x_start = (-left).clamp(0, width as i64);
    let x_end = (fw - left).clamp(0, width as i64);
    let y_start = (-top).clamp(0, height as i64);
    let y_end = (fh - top).clamp(0, height as i64);
    if x_start >= x_end || y_start >= y_end {
        return;
    }

    let stride = frame.row_stride();
    let samples = frame.samples_mut();
    for ly in y_start..y_end {
        let row = (top + ly) as usize * stride;
        for lx in x_start..x_end {
            let idx = row + (left + lx) as usize * CHANNELS;
            let src = sample(lx as u32, ly as u32);
            blend_over(&mut samples[idx..idx + CHANNELS], src);
        }
    }
}

/// Porter-Duff source-over of `src` onto `dst`, both straight alpha.
fn blend_over(dst: &mut [u8], src: [u8; 4]) {
    match src[3] {
        0 => {}
        255 => dst.copy_from_slice(&src),
        sa => {
            let sa = sa as f32 / 255.0;
            let da = dst[3] as f32 / 255.0;
            let out_a = sa + da * (1.0 - sa);
            for c in 0..3 {
                let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
                dst[c] = v.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runstamp_image_model::Rgba;

    struct OfflineBackend;

    impl RenderBackend for OfflineBackend {
        fn resize(
            &self,
            src: &PixelBuffer,
            _size: CanvasSize,
            _quality: ResizeQuality,
        ) -> RunstampResult<PixelBuffer> {
            Ok(src.clone())
        }

        fn blur_mask(&self, mask: &GrayImage, _sigma: f32) -> RunstampResult<GrayImage> {
            Ok(mask.clone())
        }

        fn is_available(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "offline"
        }
    }

    fn red_square(side: u32) -> PixelBuffer {
        PixelBuffer::filled(side, side, Rgba::opaque(255, 0, 0)).unwrap()
    }

    #[test]
    fn unavailable_backend_is_rejected() {
        let err = Compositor::new(Box::new(OfflineBackend)).err().unwrap();
        assert!(matches!(err, RunstampError::BackendUnavailable { .. }));
    }

    #[test]
    fn preview_canvas_is_letterboxed() {
        let background = PixelBuffer::filled(1200, 1600, Rgba::WHITE).unwrap();
        let overlay = red_square(10);
        let scene = Scene {
            background: &background,
            overlay: &overlay,
            placement: Placement::new(0.0, 0.0, 1.0, 1.0),
            shadow: ShadowSpec::NONE,
        };
        let frame = Compositor::cpu()
            .unwrap()
            .compose(
                &scene,
                RenderTarget::Preview {
                    container: CanvasSize::new(300, 450),
                },
            )
            .unwrap();
        assert_eq!(frame.canvas, CanvasSize::new(300, 400));
        assert_eq!(frame.buffer.size(), frame.canvas);
    }

    #[test]
    fn overlay_lands_at_placement() {
        let background = PixelBuffer::filled(100, 100, Rgba::WHITE).unwrap();
        let overlay = red_square(10);
        let scene = Scene {
            background: &background,
            overlay: &overlay,
            placement: Placement::new(20.0, 30.0, 1.0, 1.0),
            shadow: ShadowSpec::NONE,
        };
        let frame = Compositor::cpu()
            .unwrap()
            .compose(&scene, RenderTarget::Export)
            .unwrap();
        let buf = &frame.buffer;
        assert_eq!(buf.size(), CanvasSize::new(100, 100));
        assert_eq!(buf.pixel(20, 30), Some(Rgba::opaque(255, 0, 0)));
        assert_eq!(buf.pixel(29, 39), Some(Rgba::opaque(255, 0, 0)));
        assert_eq!(buf.pixel(19, 30), Some(Rgba::WHITE));
        assert_eq!(buf.pixel(30, 40), Some(Rgba::WHITE));
    }

    #[test]
    fn hard_shadow_sits_under_offset_overlay() {
        let background = PixelBuffer::filled(100, 100, Rgba::WHITE).unwrap();
        let overlay = red_square(10);
        let scene = Scene {
            background: &background,
            overlay: &overlay,
            placement: Placement::new(20.0, 30.0, 1.0, 1.0),
            shadow: ShadowSpec {
                color: Rgba::BLACK,
                blur_radius: 0.0,
                offset_x: 5.0,
                offset_y: 5.0,
            },
        };
        let frame = Compositor::cpu()
            .unwrap()
            .compose(&scene, RenderTarget::Export)
            .unwrap();
        let buf = &frame.buffer;
        assert_eq!(buf.pixel(34, 44), Some(Rgba::BLACK));
        assert_eq!(buf.pixel(25, 35), Some(Rgba::opaque(255, 0, 0)));
        assert_eq!(buf.pixel(35, 45), Some(Rgba::WHITE));
    }

    #[test]
    fn blurred_shadow_is_translucent() {
        let background = PixelBuffer::filled(100, 100, Rgba::WHITE).unwrap();
        let overlay = red_square(10);
        let scene = Scene {
            background: &background,
            overlay: &overlay,
            placement: Placement::new(40.0, 40.0, 1.0, 1.0),
            shadow: ShadowSpec::default(),
        };
        let frame = Compositor::cpu()
            .unwrap()
            .compose(&scene, RenderTarget::Export)
            .unwrap();
        let shade = frame.buffer.pixel(51, 51).unwrap();
        assert!(shade.r < 255 && shade.r > 150, "unexpected shadow {shade:?}");
        assert_eq!(shade.a, 255);
    }

    #[test]
    fn transparent_overlay_pixels_keep_background() {
        let background = PixelBuffer::filled(50, 50, Rgba::opaque(0, 0, 255)).unwrap();
        let overlay = PixelBuffer::transparent(10, 10).unwrap();
        let scene = Scene {
            background: &background,
            overlay: &overlay,
            placement: Placement::new(5.0, 5.0, 1.0, 1.0),
            shadow: ShadowSpec::default(),
        };
        let frame = Compositor::cpu()
            .unwrap()
            .compose(&scene, RenderTarget::Export)
            .unwrap();
        assert_eq!(frame.buffer, background);
    }

    #[test]
    fn overlay_off_canvas_is_clipped() {
        let background = PixelBuffer::filled(20, 20, Rgba::WHITE).unwrap();
        let overlay = red_square(10);
        let scene = Scene {
            background: &background,
            overlay: &overlay,
            placement: Placement::new(-5.0, 15.0, 1.0, 1.0),
            shadow: ShadowSpec::default(),
        };
        let frame = Compositor::cpu()
            .unwrap()
            .compose(&scene, RenderTarget::Export)
            .unwrap();
        assert_eq!(frame.buffer.pixel(0, 19), Some(Rgba::opaque(255, 0, 0)));
        assert_eq!(frame.buffer.pixel(5, 14).map(|p| p.g > 0), Some(true));
    }

    #[test]
    fn far_off_canvas_placement_leaves_background_untouched() {
        let background = PixelBuffer::filled(60, 80, Rgba::WHITE).unwrap();
        let overlay = red_square(10);
        let compositor = Compositor::cpu().unwrap();
        for left in [-1e30, 1e30] {
            let scene = Scene {
                background: &background,
                overlay: &overlay,
                placement: Placement::new(left, 0.0, 1.0, 1.0),
                shadow: ShadowSpec {
                    color: Rgba::BLACK,
                    blur_radius: 0.0,
                    offset_x: left,
                    offset_y: 5.0,
                },
            };
            let frame = compositor.compose(&scene, RenderTarget::Export).unwrap();
            assert_eq!(frame.buffer, background);
        }
    }

    #[test]
    fn empty_background_is_an_error() {
        let background = PixelBuffer::new(0, 0, vec![]).unwrap();
        let overlay = red_square(2);
        let scene = Scene {
            background: &background,
            overlay: &overlay,
            placement: Placement::new(0.0, 0.0, 1.0, 1.0),
            shadow: ShadowSpec::NONE,
        };
        assert!(Compositor::cpu()
            .unwrap()
            .compose(&scene, RenderTarget::Export)
            .is_err());
    }

    #[test]
    fn half_transparent_source_blends() {
        let mut dst = [0u8, 0, 0, 255];
        blend_over(&mut dst, [255, 255, 255, 128]);
        assert_eq!(dst[3], 255);
        assert!((dst[0] as i32 - 128).abs() <= 1);
    }
}
