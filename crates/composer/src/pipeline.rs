//! Run orchestration with last-write-wins semantics.
//!
//! Every call to [`Composer::run`] takes a ticket. When a newer run has
//! started by the time an older one finishes, the older result is discarded
//! and [`RunOutcome::Superseded`] is returned instead.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use runstamp_common::error::{RunstampError, RunstampResult};
use runstamp_image_model::{CanvasSize, DragDelta, PixelBuffer, Placement};
use runstamp_processing_core::{CropDetection, MatteReport};
use runstamp_render_engine::{write_png, Compositor};

use crate::loader::{load_sources, ImageSource};
use crate::session::{EditorSession, SessionConfig};

/// Inputs and edits for one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub background: ImageSource,
    pub screenshot: ImageSource,
    pub session: SessionConfig,

    /// Preview-space drags applied in order after the initial placement.
    pub nudges: Vec<DragDelta>,

    /// Return the overlay to its default inset after the nudges.
    pub reset_position: bool,
}

impl RunRequest {
    pub fn new(background: ImageSource, screenshot: ImageSource, session: SessionConfig) -> Self {
        Self {
            background,
            screenshot,
            session,
            nudges: Vec::new(),
            reset_position: false,
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Final preview frame.
    pub preview: PixelBuffer,
    /// Composite at the background's native resolution.
    pub export: PixelBuffer,
    pub preview_canvas: CanvasSize,
    /// Final placement on the preview canvas.
    pub placement: Placement,
    pub crop: CropDetection,
    pub matte: MatteReport,
}

impl RunOutput {
    /// Write the export as a timestamped PNG in `output_dir`.
    pub fn save(&self, output_dir: &std::path::Path, prefix: &str) -> RunstampResult<PathBuf> {
        write_png(&self.export, output_dir, prefix)
    }
}

/// Result of a run.
#[derive(Debug)]
pub enum RunOutcome {
    Ready(Box<RunOutput>),
    /// A newer run started before this one finished.
    Superseded { ticket: u64 },
}

/// Identifies a run; higher tickets are newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunTicket(u64);

impl RunTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Runs the pipeline, keeping only the most recent run's result.
#[derive(Clone)]
pub struct Composer {
    compositor: Arc<Compositor>,
    latest: Arc<AtomicU64>,
}

impl Composer {
    pub fn new(compositor: Compositor) -> Self {
        Self {
            compositor: Arc::new(compositor),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Issue a ticket for a new run, superseding all earlier ones.
    pub fn begin(&self) -> RunTicket {
        RunTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` is still the newest run.
    pub fn is_current(&self, ticket: RunTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Start and execute a run.
    pub async fn run(&self, request: RunRequest) -> RunstampResult<RunOutcome> {
        let ticket = self.begin();
        self.run_with_ticket(ticket, request).await
    }

    /// Execute a run under a ticket obtained from [`Composer::begin`].
    pub async fn run_with_ticket(
        &self,
        ticket: RunTicket,
        request: RunRequest,
    ) -> RunstampResult<RunOutcome> {
        tracing::info!(ticket = ticket.id(), "Run started");

        let sources = load_sources(request.background, request.screenshot).await?;
        if !self.is_current(ticket) {
            return Ok(self.superseded(ticket, "after decode"));
        }

        let compositor = Arc::clone(&self.compositor);
        let config = request.session;
        let nudges = request.nudges;
        let reset_position = request.reset_position;

        let output = tokio::task::spawn_blocking(move || {
            let mut session = EditorSession::new(config, compositor);
            session.load(sources.background, &sources.screenshot)?;
            session.render_preview()?;
            for delta in nudges {
                session.drag(delta)?;
            }
            if reset_position {
                session.reset_placement()?;
            }
            let preview = session.render_preview()?;
            let placement = session
                .placement()
                .ok_or_else(|| RunstampError::processing("Overlay was never placed"))?;
            let crop = session
                .crop()
                .copied()
                .ok_or_else(|| RunstampError::processing("Crop was never detected"))?;
            let matte = session
                .matte_report()
                .copied()
                .ok_or_else(|| RunstampError::processing("Overlay was never matted"))?;
            let export = session.export()?;
            session.reset();

            Ok::<_, RunstampError>(RunOutput {
                preview: preview.buffer,
                export,
                preview_canvas: preview.canvas,
                placement,
                crop,
                matte,
            })
        })
        .await
        .map_err(|e| RunstampError::processing(format!("Run worker failed: {e}")))??;

        if !self.is_current(ticket) {
            return Ok(self.superseded(ticket, "after render"));
        }

        tracing::info!(
            ticket = ticket.id(),
            width = output.export.width(),
            height = output.export.height(),
            "Run finished"
        );
        Ok(RunOutcome::Ready(Box::new(output)))
    }

    fn superseded(&self, ticket: RunTicket, at: &str) -> RunOutcome {
        tracing::debug!(
            ticket = ticket.id(),
            latest = self.latest.load(Ordering::SeqCst),
            at,
            "Run superseded, dropping result"
        );
        RunOutcome::Superseded { ticket: ticket.id() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_increase() {
        let composer = Composer::new(Compositor::cpu().unwrap());
        let a = composer.begin();
        let b = composer.begin();
        assert!(b > a);
        assert!(!composer.is_current(a));
        assert!(composer.is_current(b));
    }

    #[test]
    fn clones_share_tickets() {
        let composer = Composer::new(Compositor::cpu().unwrap());
        let other = composer.clone();
        let a = composer.begin();
        let _b = other.begin();
        assert!(!composer.is_current(a));
    }
}
