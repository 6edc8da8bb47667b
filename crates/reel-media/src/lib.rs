//! FFmpeg-backed media layer for the beat-to-reel pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a cancellable runner
//! - The `ExternalRenderer` and `MediaProber` capabilities
//! - Stock index and keyword matcher
//! - The adapter registry (stock, card, diagram, slide, procedural, filler)
//! - Clip normalization, timeline assembly, duration budgeting and validation

pub mod adapters;
pub mod budget;
pub mod command;
pub mod concat;
pub mod error;
pub mod filters;
pub mod normalize;
pub mod probe;
pub mod renderer;
pub mod stock;
pub mod validate;

pub use adapters::{AdapterEnv, AdapterRegistry, PlanFn, RenderPlan};
pub use budget::{budget_track, target_duration, BudgetAction, BudgetOutcome, BudgetWarning, DurationBounds};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::concat_clips;
pub use error::{MediaError, MediaResult};
pub use normalize::normalize;
pub use probe::{probe_video, FfprobeProber, MediaProber, VideoInfo};
pub use renderer::{ExternalRenderer, FfmpegRenderer};
pub use stock::{best_match, select_for_cues, StockCandidate, StockIndex, StockSource};
pub use validate::{validate_artifact, validate_info, ValidationRules};
