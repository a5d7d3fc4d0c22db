//! RunStamp Composer
//!
//! Drives one screenshot-over-photo run from encoded inputs to an exported
//! image: decode both inputs concurrently, crop and matte the screenshot,
//! place it on a letterboxed preview, apply edits, then re-render at the
//! photo's native resolution.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                  Composer                     │
//! │   run tickets (last write wins)               │
//! │  ┌──────────┐     ┌─────────────────────────┐ │
//! │  │ loader   │ ──▶ │ EditorSession           │ │
//! │  │ (tokio)  │     │ crop → matte → preview  │ │
//! │  └──────────┘     │ → drag/reset → export   │ │
//! │                   └─────────────────────────┘ │
//! └───────────────────────────────────────────────┘
//! ```

pub mod loader;
pub mod pipeline;
pub mod session;

pub use loader::{load_image, load_source, load_sources, ImageSource, SourceImages};
pub use pipeline::{Composer, RunOutcome, RunOutput, RunRequest, RunTicket};
pub use session::*;
