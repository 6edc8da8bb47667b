//! Shared data models for the beat-to-reel pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Narration beats and the beat document format
//! - Adapter kinds, animation modes and series policy
//! - Canonical frame spec and encoding configuration
//! - Render requests, clips and assembled tracks

pub mod adapter;
pub mod beat;
pub mod clip;
pub mod encoding;
pub mod mode;
pub mod request;

// Re-export common types
pub use adapter::{AdapterKind, AdapterParseError};
pub use beat::{parse_beats, Beat, BeatParseError, DEFAULT_BEAT_DURATION};
pub use clip::{Clip, Track};
pub use encoding::{EncodingConfig, FrameSpec};
pub use mode::{AnimationMode, ModeParseError, Series};
pub use request::RenderRequest;
