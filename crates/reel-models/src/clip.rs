//! Rendered clips and assembled tracks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::encoding::FrameSpec;

/// Frame-rate difference below which two rates are the same.
const FPS_TOLERANCE: f64 = 0.01;

/// A rendered video file plus the metadata the timeline needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Clip {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub pixel_format: String,
    /// Seconds
    pub duration: f64,
}

impl Clip {
    /// A clip that was rendered directly in `frame`.
    pub fn from_spec(path: impl Into<PathBuf>, frame: &FrameSpec, duration: f64) -> Self {
        Self {
            path: path.into(),
            width: frame.width,
            height: frame.height,
            fps: frame.fps as f64,
            pixel_format: frame.pixel_format.clone(),
            duration,
        }
    }

    /// Whether the clip can be stream-copied into a timeline in `frame`.
    pub fn conforms_to(&self, frame: &FrameSpec) -> bool {
        self.width == frame.width
            && self.height == frame.height
            && (self.fps - frame.fps as f64).abs() < FPS_TOLERANCE
            && self.pixel_format == frame.pixel_format
    }
}

/// A single continuous video built by concatenating clips in beat order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Track {
    pub path: PathBuf,
    pub frame: FrameSpec,
    /// Seconds
    pub duration: f64,
    pub clip_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conforms_to_frame() {
        let frame = FrameSpec::portrait();
        let clip = Clip::from_spec("/tmp/a.mp4", &frame, 4.0);
        assert!(clip.conforms_to(&frame));

        let slow = Clip { fps: 24.0, ..clip.clone() };
        assert!(!slow.conforms_to(&frame));

        let rgb = Clip { pixel_format: "rgb24".into(), ..clip.clone() };
        assert!(!rgb.conforms_to(&frame));

        let ntsc = Clip { fps: 29.999, ..clip };
        assert!(ntsc.conforms_to(&frame));
    }
}
