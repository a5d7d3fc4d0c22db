//! Error types shared across RunStamp crates.

use std::path::PathBuf;

/// Top-level error type for RunStamp operations.
#[derive(Debug, thiserror::Error)]
pub enum RunstampError {
    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("Invalid pixel buffer: {message}")]
    InvalidBuffer { message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Render backend unavailable: {message}")]
    BackendUnavailable { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using RunstampError.
pub type RunstampResult<T> = Result<T, RunstampError>;

impl RunstampError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn invalid_buffer(msg: impl Into<String>) -> Self {
        Self::InvalidBuffer {
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error came from reading a source image.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::FileNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_are_classified() {
        assert!(RunstampError::decode("bad header").is_decode_failure());
        assert!(RunstampError::FileNotFound {
            path: PathBuf::from("missing.png")
        }
        .is_decode_failure());
        assert!(!RunstampError::render("oops").is_decode_failure());
    }

    #[test]
    fn messages_include_context() {
        let err = RunstampError::backend_unavailable("cpu backend disabled");
        assert_eq!(
            err.to_string(),
            "Render backend unavailable: cpu backend disabled"
        );
    }
}
