//! External renderer capability.
//!
//! Adapters, the normalizer, the assembler and the budgeter all describe
//! their work as an [`FfmpegCommand`] and hand it to an [`ExternalRenderer`].
//! Swapping the backend (or faking it in tests) never touches routing code.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::watch;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Runs one declarative render command to completion.
#[async_trait]
pub trait ExternalRenderer: Send + Sync {
    /// Run `command`. When `cancel` flips to `true` the render is killed and
    /// `MediaError::Cancelled` is returned.
    async fn run(&self, command: &FfmpegCommand, cancel: Option<watch::Receiver<bool>>) -> MediaResult<()>;
}

/// Renderer that shells out to ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    binary: PathBuf,
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRenderer {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            timeout_secs: None,
        }
    }
}

impl FfmpegRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout_secs: None,
        }
    }

    /// Kill any single render that runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

#[async_trait]
impl ExternalRenderer for FfmpegRenderer {
    async fn run(&self, command: &FfmpegCommand, cancel: Option<watch::Receiver<bool>>) -> MediaResult<()> {
        let mut runner = FfmpegRunner::new().with_binary(self.binary.clone());
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(secs);
        }
        if let Some(rx) = cancel {
            runner = runner.with_cancel(rx);
        }
        runner.run(command).await
    }
}
