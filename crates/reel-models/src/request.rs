//! Adapter render requests.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::mode::AnimationMode;

/// Everything an adapter needs to render one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderRequest {
    /// Destination file
    pub output: PathBuf,

    /// Looping background video, if the episode has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<PathBuf>,

    /// Target duration in seconds, already clamped to the adapter range
    pub duration: f64,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub keywords: Vec<String>,

    /// Stock footage chosen for this beat
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_clip: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<AnimationMode>,

    /// Seed for any randomized visual parameters
    #[serde(default)]
    pub seed: u64,
}

impl RenderRequest {
    pub fn new(output: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            output: output.into(),
            background: None,
            duration,
            title: String::new(),
            body: String::new(),
            keywords: Vec::new(),
            source_clip: None,
            mode: None,
            seed: 0,
        }
    }

    pub fn with_text(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.title = title.into();
        self.body = body.into();
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_background(mut self, background: Option<PathBuf>) -> Self {
        self.background = background;
        self
    }

    pub fn with_source_clip(mut self, clip: Option<PathBuf>) -> Self {
        self.source_clip = clip;
        self
    }

    pub fn with_mode(mut self, mode: Option<AnimationMode>, seed: u64) -> Self {
        self.mode = mode;
        self.seed = seed;
        self
    }

    /// Title if set, otherwise the body.
    pub fn headline(&self) -> &str {
        if self.title.trim().is_empty() {
            self.body.trim()
        } else {
            self.title.trim()
        }
    }
}
