//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Unknown adapter: {0}")]
    UnknownAdapter(String),

    #[error("Missing resource: {0}")]
    MissingResource(String),

    #[error("Adapter {adapter} failed: {message}")]
    RenderFailed { adapter: String, message: String },

    #[error("Normalization failed: {0}")]
    NormalizeFailed(String),

    #[error("Assembly precondition violated: {0}")]
    AssemblyPrecondition(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn missing_resource(message: impl Into<String>) -> Self {
        Self::MissingResource(message.into())
    }

    /// Create an adapter render failure.
    pub fn render_failed(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RenderFailed {
            adapter: adapter.into(),
            message: message.into(),
        }
    }

    pub fn normalize_failed(message: impl Into<String>) -> Self {
        Self::NormalizeFailed(message.into())
    }

    pub fn assembly_precondition(message: impl Into<String>) -> Self {
        Self::AssemblyPrecondition(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the external process was stopped from outside.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Timeout(_))
    }
}
