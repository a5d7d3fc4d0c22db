//! Editor session: one overlay placed over one background.

use std::sync::Arc;

use runstamp_common::error::{RunstampError, RunstampResult};
use runstamp_image_model::{
    CanvasSize, ColorMode, CropSensitivity, DragDelta, PixelBuffer, Placement, PlacementPreset,
    ShadowSpec,
};
use runstamp_processing_core::{
    prepare_overlay, CropDetection, MatteConfig, MatteReport, OverlayOptions,
};
use runstamp_render_engine::{
    plan_export, render_export, Compositor, ExportPlan, RenderTarget, RenderedFrame, Scene,
};

/// Default preview container, in CSS-pixel-like units.
pub const DEFAULT_PREVIEW_CONTAINER: CanvasSize = CanvasSize::new(300, 450);

/// Settings fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Recolor applied to the overlay foreground.
    pub color_mode: ColorMode,

    /// Crop and initial-size preset.
    pub sensitivity: CropSensitivity,

    /// Box the preview is letterboxed into.
    pub preview_container: CanvasSize,

    /// Shadow as seen on the preview canvas.
    pub shadow: ShadowSpec,

    /// Matting thresholds.
    pub matte: MatteConfig,
}

impl SessionConfig {
    pub fn new(color_mode: ColorMode, sensitivity: CropSensitivity) -> Self {
        Self {
            color_mode,
            sensitivity,
            preview_container: DEFAULT_PREVIEW_CONTAINER,
            shadow: ShadowSpec::default(),
            matte: MatteConfig::default(),
        }
    }

    /// Overlay options equivalent to this session's settings.
    pub fn overlay_options(&self) -> OverlayOptions {
        OverlayOptions {
            matte: self.matte.clone(),
            ..OverlayOptions::new(self.color_mode, self.sensitivity)
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(ColorMode::default(), CropSensitivity::default())
    }
}

/// Where a session is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    /// No inputs loaded.
    Idle,
    /// Crop region found for the screenshot.
    CropDetected,
    /// Overlay matted and placed; nothing rendered yet.
    Matted,
    /// A preview has been rendered for the current placement.
    PreviewComposited,
    /// The full-resolution image has been handed out.
    Exported,
    /// A stage failed; the run is over.
    Failed,
}

/// A preview-space editing session.
///
/// Owns the decoded background, the matted overlay and the current
/// [`Placement`]. Every operation checks the stage it is called in; a
/// failing stage moves the session to [`SessionStage::Failed`] until
/// [`EditorSession::reset`] is called.
pub struct EditorSession {
    config: SessionConfig,
    compositor: Arc<Compositor>,
    stage: SessionStage,
    background: Option<PixelBuffer>,
    overlay: Option<PixelBuffer>,
    crop: Option<CropDetection>,
    matte: Option<MatteReport>,
    preview_canvas: CanvasSize,
    placement: Option<Placement>,
}

impl EditorSession {
    /// Create an idle session drawing through `compositor`.
    pub fn new(config: SessionConfig, compositor: Arc<Compositor>) -> Self {
        Self {
            config,
            compositor,
            stage: SessionStage::Idle,
            background: None,
            overlay: None,
            crop: None,
            matte: None,
            preview_canvas: CanvasSize::new(0, 0),
            placement: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    /// Current placement on the preview canvas.
    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub fn preview_canvas(&self) -> CanvasSize {
        self.preview_canvas
    }

    pub fn crop(&self) -> Option<&CropDetection> {
        self.crop.as_ref()
    }

    pub fn matte_report(&self) -> Option<&MatteReport> {
        self.matte.as_ref()
    }

    /// The matted overlay at its native resolution.
    pub fn overlay(&self) -> Option<&PixelBuffer> {
        self.overlay.as_ref()
    }

    /// Crop and matte `screenshot`, then place it on `background`'s preview.
    ///
    /// Only valid from [`SessionStage::Idle`].
    pub fn load(
        &mut self,
        background: PixelBuffer,
        screenshot: &PixelBuffer,
    ) -> RunstampResult<()> {
        self.expect_stage(&[SessionStage::Idle], "load")?;

        if background.is_empty() {
            return self.fail(RunstampError::invalid_buffer("Background image has no pixels"));
        }
        if screenshot.is_empty() {
            return self.fail(RunstampError::invalid_buffer("Screenshot has no pixels"));
        }

        let prepared = prepare_overlay(screenshot, &self.config.overlay_options());
        self.crop = Some(prepared.crop);
        self.stage = SessionStage::CropDetected;
        tracing::debug!(bounds = ?prepared.crop.bounds, "Crop detected");

        let overlay = prepared.buffer;
        if overlay.is_empty() {
            return self.fail(RunstampError::processing("Matted overlay is empty"));
        }

        self.preview_canvas = Compositor::canvas_size(
            background.size(),
            RenderTarget::Preview {
                container: self.config.preview_container,
            },
        );
        let preset = PlacementPreset::for_sensitivity(self.config.sensitivity);
        self.placement = Some(Placement::initial(
            self.preview_canvas,
            overlay.size(),
            &preset,
        ));

        tracing::info!(
            background_w = background.width(),
            background_h = background.height(),
            overlay_w = overlay.width(),
            overlay_h = overlay.height(),
            preview_w = self.preview_canvas.width,
            preview_h = self.preview_canvas.height,
            "Session loaded"
        );

        self.background = Some(background);
        self.overlay = Some(overlay);
        self.matte = Some(prepared.matte);
        self.stage = SessionStage::Matted;
        Ok(())
    }

    /// Render the preview for the current placement.
    pub fn render_preview(&mut self) -> RunstampResult<RenderedFrame> {
        self.expect_stage(
            &[SessionStage::Matted, SessionStage::PreviewComposited],
            "render a preview",
        )?;

        let result = {
            let (background, overlay, placement) = self.scene_parts()?;
            let scene = Scene {
                background,
                overlay,
                placement,
                shadow: self.config.shadow,
            };
            self.compositor.compose(
                &scene,
                RenderTarget::Preview {
                    container: self.config.preview_container,
                },
            )
        };

        match result {
            Ok(frame) => {
                self.stage = SessionStage::PreviewComposited;
                Ok(frame)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Move the overlay by a preview-space delta and re-render.
    pub fn drag(&mut self, delta: DragDelta) -> RunstampResult<RenderedFrame> {
        self.update_placement(|p, _| p.dragged(delta))?;
        self.render_preview()
    }

    /// Move the overlay back to its default inset, keeping its scale.
    pub fn reset_placement(&mut self) -> RunstampResult<RenderedFrame> {
        self.update_placement(|p, canvas| p.with_position_reset(canvas))?;
        self.render_preview()
    }

    /// Map the current placement onto the background's native resolution.
    pub fn export_plan(&self) -> RunstampResult<ExportPlan> {
        let (background, _, placement) = self.scene_parts()?;
        plan_export(
            background.size(),
            self.preview_canvas,
            placement,
            self.config.shadow,
        )
    }

    /// Render the full-resolution composite.
    ///
    /// Requires at least one preview so the placement the user saw is the
    /// one exported.
    pub fn export(&mut self) -> RunstampResult<PixelBuffer> {
        self.expect_stage(&[SessionStage::PreviewComposited], "export")?;

        let result = self.export_plan().and_then(|plan| {
            let (background, overlay, _) = self.scene_parts()?;
            render_export(&self.compositor, background, overlay, &plan)
        });

        match result {
            Ok(frame) => {
                self.stage = SessionStage::Exported;
                Ok(frame.buffer)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Drop all buffers and return to [`SessionStage::Idle`].
    pub fn reset(&mut self) {
        self.background = None;
        self.overlay = None;
        self.crop = None;
        self.matte = None;
        self.placement = None;
        self.preview_canvas = CanvasSize::new(0, 0);
        self.stage = SessionStage::Idle;
    }

    fn update_placement<F>(&mut self, f: F) -> RunstampResult<()>
    where
        F: FnOnce(Placement, CanvasSize) -> Placement,
    {
        self.expect_stage(
            &[SessionStage::Matted, SessionStage::PreviewComposited],
            "move the overlay",
        )?;
        let current = self
            .placement
            .ok_or_else(|| RunstampError::processing("No overlay has been placed"))?;
        self.placement = Some(f(current, self.preview_canvas));
        Ok(())
    }

    fn scene_parts(&self) -> RunstampResult<(&PixelBuffer, &PixelBuffer, Placement)> {
        match (&self.background, &self.overlay, self.placement) {
            (Some(background), Some(overlay), Some(placement)) => {
                Ok((background, overlay, placement))
            }
            _ => Err(RunstampError::processing("Session has no loaded images")),
        }
    }

    fn expect_stage(&self, allowed: &[SessionStage], action: &str) -> RunstampResult<()> {
        if allowed.contains(&self.stage) {
            return Ok(());
        }
        Err(RunstampError::processing(format!(
            "Cannot {action} while the session is {:?}",
            self.stage
        )))
    }

    fn fail<T>(&mut self, err: RunstampError) -> RunstampResult<T> {
        tracing::error!(stage = ?self.stage, error = %err, "Session stage failed");
        self.stage = SessionStage::Failed;
        Err(err)
    }
}
