//! Duration budgeting of the assembled visuals track against the voice track.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use reel_models::{EncodingConfig, Track};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::renderer::ExternalRenderer;

/// Policy constants for the final program length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationBounds {
    /// Shortest publishable program, seconds
    pub min: f64,
    /// Longest publishable program, seconds
    pub max: f64,
    /// Added to the voice duration before clamping
    pub pad: f64,
    /// Voice tracks shorter than this are rejected
    pub voice_floor: f64,
    /// Track/target difference treated as equal
    pub tolerance: f64,
    /// Shortfall that always raises a warning
    pub warn_shortfall: f64,
}

impl Default for DurationBounds {
    fn default() -> Self {
        Self {
            min: 30.0,
            max: 90.0,
            pad: 2.0,
            voice_floor: 3.0,
            tolerance: 0.05,
            warn_shortfall: 2.0,
        }
    }
}

impl DurationBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            ..Default::default()
        }
    }

    pub fn with_pad(mut self, pad: f64) -> Self {
        self.pad = pad;
        self
    }
}

/// `clamp(voice + pad, min, max)`; voice below the floor is an input error.
pub fn target_duration(voice: f64, bounds: &DurationBounds) -> MediaResult<f64> {
    if !voice.is_finite() || voice < bounds.voice_floor {
        return Err(MediaError::invalid_input(format!(
            "voice track too short ({:.2}s), need >= {:.1}s",
            voice, bounds.voice_floor
        )));
    }
    if bounds.min > bounds.max {
        return Err(MediaError::invalid_input(format!(
            "duration bounds inverted: [{}, {}]",
            bounds.min, bounds.max
        )));
    }
    Ok((voice + bounds.pad).clamp(bounds.min, bounds.max))
}

/// What the budgeter will do to a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BudgetAction {
    Keep,
    Trim { target: f64 },
    Extend { target: f64, by: f64 },
}

pub fn plan_budget(track_duration: f64, target: f64, tolerance: f64) -> BudgetAction {
    let diff = track_duration - target;
    if diff.abs() <= tolerance {
        BudgetAction::Keep
    } else if diff > 0.0 {
        BudgetAction::Trim { target }
    } else {
        BudgetAction::Extend { target, by: -diff }
    }
}

/// Achieved duration fell short of target, or shortfall handling was used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetWarning {
    pub target: f64,
    pub achieved: f64,
    pub extended: bool,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct BudgetOutcome {
    pub track: Track,
    pub target: f64,
    pub action: BudgetAction,
    pub warning: Option<BudgetWarning>,
}

/// Hard cut at `target` without re-encoding.
pub fn plan_trim(track: &Track, target: f64, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input(&track.path)
        .duration(target)
        .codec_copy()
}

/// Hold the last frame for `by` seconds, then cut at `target`.
pub fn plan_extend(track: &Track, target: f64, by: f64, output: &Path, encoding: &EncodingConfig) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input(&track.path)
        .video_filter(format!("tpad=stop_mode=clone:stop_duration={:.3}", by))
        .duration(target)
        .no_audio()
        .frame_rate(track.frame.fps)
        .encoding(encoding, &track.frame.pixel_format)
}

/// Fit `track` to the target derived from `voice` seconds.
///
/// Trimming is exact and its failure is returned. Extension is best-effort:
/// if it fails the original track is kept and the shortfall is reported in
/// the warning.
pub async fn budget_track(
    track: &Track,
    voice: f64,
    bounds: &DurationBounds,
    output: &Path,
    encoding: &EncodingConfig,
    renderer: &dyn ExternalRenderer,
) -> MediaResult<BudgetOutcome> {
    let target = target_duration(voice, bounds)?;
    let action = plan_budget(track.duration, target, bounds.tolerance);

    let (budgeted, warning) = match action {
        BudgetAction::Keep => (track.clone(), None),
        BudgetAction::Trim { target } => {
            renderer.run(&plan_trim(track, target, output), None).await?;
            info!(from = track.duration, to = target, "Trimmed visuals track");
            (retimed(track, output, target), None)
        }
        BudgetAction::Extend { target, by } => {
            let cmd = plan_extend(track, target, by, output, encoding);
            match renderer.run(&cmd, None).await {
                Ok(()) => {
                    let message = format!("extended final frame by {:.2}s to reach {:.2}s", by, target);
                    warn!(target_secs = target, by, "Visuals track shorter than target, {}", message);
                    let warning = BudgetWarning {
                        target,
                        achieved: target,
                        extended: true,
                        message,
                    };
                    (retimed(track, output, target), Some(warning))
                }
                Err(e) if by > bounds.warn_shortfall => {
                    let message = format!(
                        "extension failed ({}); visuals are {:.2}s short of {:.2}s",
                        e, by, target
                    );
                    warn!(target_secs = target, achieved = track.duration, "{}", message);
                    let warning = BudgetWarning {
                        target,
                        achieved: track.duration,
                        extended: false,
                        message,
                    };
                    (track.clone(), Some(warning))
                }
                Err(e) => {
                    info!(error = %e, shortfall = by, "Extension failed, accepting small shortfall");
                    (track.clone(), None)
                }
            }
        }
    };

    Ok(BudgetOutcome {
        track: budgeted,
        target,
        action,
        warning,
    })
}

fn retimed(track: &Track, path: &Path, duration: f64) -> Track {
    Track {
        path: path.to_path_buf(),
        duration,
        ..track.clone()
    }
}
