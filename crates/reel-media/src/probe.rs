//! FFprobe video information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Video file information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Video codec
    pub codec: String,
    /// Pixel format (e.g. "yuv420p")
    pub pixel_format: String,
    /// File size in bytes
    pub size: u64,
    /// Bitrate in bits/second
    pub bitrate: u64,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    pix_fmt: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Media inspection capability.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Inspect the first video stream of a file.
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo>;

    /// Container duration in seconds; works for audio-only files too.
    async fn duration(&self, path: &Path) -> MediaResult<f64> {
        Ok(self.probe(path).await?.duration)
    }
}

/// `MediaProber` backed by the ffprobe executable.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: PathBuf,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffprobe"),
        }
    }
}

impl FfprobeProber {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run_json(&self, path: &Path) -> MediaResult<FfprobeOutput> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        let binary = which::which(&self.binary).map_err(|_| MediaError::FfprobeNotFound)?;

        let output = Command::new(binary)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::FfprobeFailed {
                message: "FFprobe failed".to_string(),
                stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        video_info(self.run_json(path).await?)
    }

    async fn duration(&self, path: &Path) -> MediaResult<f64> {
        let probe = self.run_json(path).await?;
        parse_seconds(probe.format.duration.as_deref())
            .ok_or_else(|| MediaError::InvalidVideo(format!("no duration for {}", path.display())))
    }
}

/// Probe a video file with the default ffprobe.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    FfprobeProber::default().probe(path.as_ref()).await
}

/// Parse ffprobe `-print_format json` output into `VideoInfo`.
pub fn parse_probe_json(bytes: &[u8]) -> MediaResult<VideoInfo> {
    video_info(serde_json::from_slice(bytes)?)
}

fn video_info(probe: FfprobeOutput) -> MediaResult<VideoInfo> {
    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::InvalidVideo("No video stream found".to_string()))?;

    let duration = parse_seconds(probe.format.duration.as_deref()).unwrap_or(0.0);

    let size = probe
        .format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let bitrate = probe
        .format
        .bit_rate
        .as_ref()
        .and_then(|b| b.parse::<u64>().ok())
        .unwrap_or(0);

    let fps = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video_stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(30.0);

    Ok(VideoInfo {
        duration,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        fps,
        codec: video_stream.codec_name.clone().unwrap_or_default(),
        pixel_format: video_stream.pix_fmt.clone().unwrap_or_default(),
        size,
        bitrate,
    })
}

fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
pub(crate) fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 && num > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    s.parse().ok().filter(|f: &f64| *f > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
    }

    #[test]
    fn test_parse_probe_json() {
        let json = br#"{
            "format": {"duration": "52.000000", "size": "1048576", "bit_rate": "161319"},
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264", "width": 1080, "height": 1920,
                 "pix_fmt": "yuv420p", "avg_frame_rate": "30/1", "r_frame_rate": "30/1"}
            ]
        }"#;
        let info = parse_probe_json(json).unwrap();
        assert_eq!(info.codec, "h264");
        assert_eq!((info.width, info.height), (1080, 1920));
        assert_eq!(info.pixel_format, "yuv420p");
        assert!((info.duration - 52.0).abs() < 1e-9);
        assert!((info.fps - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_audio_only_has_no_video_info() {
        let json = br#"{"format": {"duration": "12.5"}, "streams": [{"codec_type": "audio"}]}"#;
        assert!(matches!(
            parse_probe_json(json),
            Err(MediaError::InvalidVideo(_))
        ));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = FfprobeProber::default()
            .probe(Path::new("/nonexistent/clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
