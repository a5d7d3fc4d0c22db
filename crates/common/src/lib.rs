//! RunStamp Common Utilities
//!
//! Shared infrastructure for all RunStamp crates:
//! - Error types and result aliases
//! - Export file naming
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod naming;

pub use config::*;
pub use error::*;
pub use naming::*;
