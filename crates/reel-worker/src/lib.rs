//! Episode orchestration for the beat-to-reel pipeline.
//!
//! Routes each narration beat to a rendering adapter, absorbs render
//! failures through the slide/filler fallback chain, assembles the clips
//! in beat order and budgets the result against the voice track.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod router;

pub use config::EpisodeConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::EpisodeLogger;
pub use pipeline::{load_beats, EpisodePipeline, EpisodeReport};
pub use router::{pad_beats, pick_mode, select_route, BeatOutcome, BeatRouter, FallbackStage, Route, RouteReason};
