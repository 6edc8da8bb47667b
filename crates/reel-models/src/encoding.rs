//! Canonical frame spec and video encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Portrait output width
pub const REEL_WIDTH: u32 = 1080;
/// Portrait output height
pub const REEL_HEIGHT: u32 = 1920;
/// Canonical frame rate
pub const REEL_FPS: u32 = 30;
/// Canonical pixel format
pub const REEL_PIXEL_FORMAT: &str = "yuv420p";

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "veryfast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// H.264 profile accepted by the target platforms
pub const DEFAULT_PROFILE: &str = "high";
/// H.264 level accepted by the target platforms
pub const DEFAULT_LEVEL: &str = "4.0";

/// The single frame format every clip on the timeline must share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,
}

fn default_pixel_format() -> String {
    REEL_PIXEL_FORMAT.to_string()
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self::portrait()
    }
}

impl FrameSpec {
    /// 1080x1920 at 30 fps, yuv420p.
    pub fn portrait() -> Self {
        Self {
            width: REEL_WIDTH,
            height: REEL_HEIGHT,
            fps: REEL_FPS,
            pixel_format: REEL_PIXEL_FORMAT.to_string(),
        }
    }

    /// `WxH` for lavfi `size=` and scale arguments.
    pub fn size_arg(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Whether the frame is exactly 9:16.
    pub fn is_portrait_9_16(&self) -> bool {
        self.width * 16 == self.height * 9
    }
}

/// Video encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "veryfast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(default = "default_level")]
    pub level: String,

    /// Move the moov atom to the front for progressive playback
    #[serde(default = "default_faststart")]
    pub faststart: bool,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}
fn default_level() -> String {
    DEFAULT_LEVEL.to_string()
}
fn default_faststart() -> bool {
    true
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            profile: DEFAULT_PROFILE.to_string(),
            level: DEFAULT_LEVEL.to_string(),
            faststart: true,
            extra_args: Vec::new(),
        }
    }
}

impl EncodingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// Convert to FFmpeg output arguments for a video-only stream in the
    /// given pixel format.
    pub fn to_ffmpeg_args(&self, pixel_format: &str) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            pixel_format.to_string(),
        ];

        if self.codec.contains("264") {
            args.extend_from_slice(&[
                "-profile:v".to_string(),
                self.profile.clone(),
                "-level".to_string(),
                self.level.clone(),
            ]);
        }

        if self.faststart {
            args.extend_from_slice(&["-movflags".to_string(), "+faststart".to_string()]);
        }

        args.extend(self.extra_args.clone());

        args
    }
}
