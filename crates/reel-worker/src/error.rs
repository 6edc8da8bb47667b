//! Pipeline error types.

use thiserror::Error;

use reel_media::MediaError;
use reel_models::BeatParseError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Beat document error: {0}")]
    BeatParse(#[from] BeatParseError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Fatal input problems: no beats, unreadable beat document, missing or
    /// too-short voice track.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::BeatParse(_) | Self::Media(MediaError::InvalidInput(_))
        )
    }

    /// Clips reached the assembler in mixed formats.
    pub fn is_assembly_precondition(&self) -> bool {
        matches!(self, Self::Media(MediaError::AssemblyPrecondition(_)))
    }
}
