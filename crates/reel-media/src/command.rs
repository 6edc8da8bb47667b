//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use reel_models::EncodingConfig;

use crate::error::{MediaError, MediaResult};

/// Number of stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// One `-i` input together with the arguments that precede it.
#[derive(Debug, Clone, PartialEq)]
struct Input {
    args: Vec<String>,
    source: String,
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegCommand {
    /// Inputs in `-i` order
    inputs: Vec<Input>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after the last -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add a plain file input.
    pub fn input(self, path: impl AsRef<Path>) -> Self {
        self.input_with_args(Vec::<String>::new(), path.as_ref().to_string_lossy())
    }

    /// Add a file input that loops forever; pair with an output duration.
    pub fn looped_input(self, path: impl AsRef<Path>) -> Self {
        self.input_with_args(["-stream_loop", "-1"], path.as_ref().to_string_lossy())
    }

    /// Add a lavfi source graph as input.
    pub fn lavfi_input(self, graph: impl Into<String>) -> Self {
        self.input_with_args(["-f", "lavfi"], graph)
    }

    /// Add a concat-demuxer list file as input.
    pub fn concat_input(self, list: impl AsRef<Path>) -> Self {
        self.input_with_args(
            ["-f", "concat", "-safe", "0"],
            list.as_ref().to_string_lossy(),
        )
    }

    /// Add an input preceded by arbitrary input arguments.
    pub fn input_with_args<I, S>(mut self, args: I, source: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(Input {
            args: args.into_iter().map(Into::into).collect(),
            source: source.into(),
        });
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream or filter label into the output.
    pub fn map(self, label: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(label)
    }

    /// Set output frame rate.
    pub fn frame_rate(self, fps: u32) -> Self {
        self.output_arg("-r").output_arg(fps.to_string())
    }

    /// Drop audio streams.
    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    /// Stream-copy every stream.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Apply a video encoding configuration.
    pub fn encoding(self, config: &EncodingConfig, pixel_format: &str) -> Self {
        self.output_args(config.to_ffmpeg_args(pixel_format))
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Number of `-i` inputs.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Input sources in order.
    pub fn input_sources(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|i| i.source.as_str())
    }

    /// Value following the first occurrence of an output flag.
    pub fn output_value(&self, flag: &str) -> Option<&str> {
        self.output_args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.output_args.get(i + 1))
            .map(String::as_str)
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());
        args.push("-nostdin".to_string());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.source.clone());
        }

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with cancellation and timeout.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    /// Executable name or path
    binary: PathBuf,
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            cancel_rx: None,
            timeout_secs: None,
        }
    }

    /// Use a specific ffmpeg executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let binary = which::which(&self.binary).map_err(|_| MediaError::FfmpegNotFound)?;

        if let Some(rx) = &self.cancel_rx {
            if *rx.borrow() {
                return Err(MediaError::Cancelled);
            }
        }

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new(binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr not captured"))?;
        let mut reader = BufReader::new(stderr).lines();

        let tail_handle = tokio::spawn(async move {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            while let Ok(Some(line)) = reader.next_line().await {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        let result = self.wait_for_completion(&mut child).await;

        let tail = tail_handle.await.unwrap_or_default();

        let status = result?;
        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                (!tail.is_empty()).then_some(tail),
                status.code(),
            ))
        }
    }

    /// Wait for child process with cancellation and timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        let mut cancel_rx = self.cancel_rx.clone();
        let cancelled = async move {
            match cancel_rx.as_mut() {
                Some(rx) => loop {
                    if *rx.borrow_and_update() {
                        return;
                    }
                    if rx.changed().await.is_err() {
                        // Sender gone: nobody can cancel any more.
                        std::future::pending::<()>().await;
                    }
                },
                None => std::future::pending::<()>().await,
            }
        };

        let timeout_secs = self.timeout_secs;
        let timed_out = async move {
            match timeout_secs {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            status = child.wait() => Ok(status?),
            _ = cancelled => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                Err(MediaError::Cancelled)
            }
            _ = timed_out => {
                let secs = timeout_secs.unwrap_or_default();
                warn!("FFmpeg timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                Err(MediaError::Timeout(secs))
            }
        }
    }
}

/// Resolve the FFmpeg binary (a name on PATH or an explicit path).
pub fn check_ffmpeg(binary: impl AsRef<std::ffi::OsStr>) -> MediaResult<PathBuf> {
    which::which(binary).map_err(|_| MediaError::FfmpegNotFound)
}

/// Resolve the FFprobe binary (a name on PATH or an explicit path).
pub fn check_ffprobe(binary: impl AsRef<std::ffi::OsStr>) -> MediaResult<PathBuf> {
    which::which(binary).map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("output.mp4")
            .input("input.mp4")
            .duration(30.0)
            .no_audio()
            .encoding(&EncodingConfig::default(), "yuv420p");

        let args = cmd.build_args();
        assert_eq!(args.last().map(String::as_str), Some("output.mp4"));
        assert!(args.contains(&"-an".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert_eq!(cmd.output_value("-t"), Some("30.000"));
    }

    #[test]
    fn test_inputs_keep_their_own_arguments() {
        let cmd = FfmpegCommand::new("out.mp4")
            .lavfi_input("color=c=black:s=1080x1920:r=30:d=2.000")
            .looped_input("bg.mp4");

        let args = cmd.build_args();
        let lavfi = args.iter().position(|a| a == "lavfi").unwrap();
        let loop_flag = args.iter().position(|a| a == "-stream_loop").unwrap();
        let bg = args.iter().position(|a| a == "bg.mp4").unwrap();
        assert!(lavfi < loop_flag && loop_flag < bg);
        assert_eq!(cmd.input_count(), 2);
    }

    #[test]
    fn test_concat_input() {
        let cmd = FfmpegCommand::new("track.mp4").concat_input("list.txt").codec_copy();
        let joined = cmd.build_args().join(" ");
        assert!(joined.contains("-f concat -safe 0 -i list.txt -c copy track.mp4"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let runner = FfmpegRunner::new().with_binary("definitely-not-ffmpeg-4f1c");
        let err = runner.run(&FfmpegCommand::new("x.mp4")).await.unwrap_err();
        assert!(matches!(err, MediaError::FfmpegNotFound));
    }
}
