//! Procedural animation modes and series policy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Animation selector for the procedural adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnimationMode {
    /// Two vectors on a grid, slowly rotating and scaling
    VectorField,
    /// Three basis vectors under a spinning camera
    Basis3d,
    /// A single vector sweeping around the origin
    Rotation,
    /// A vector and its shadow on a plane
    Projection,
    /// Ring of agents with a chord
    AgentGraph,
    /// Message pulses travelling along agent edges
    MessagePulse,
    /// Bars growing to seeded heights
    BarChart,
}

impl AnimationMode {
    pub const ALL: &'static [AnimationMode] = &[
        AnimationMode::VectorField,
        AnimationMode::Basis3d,
        AnimationMode::Rotation,
        AnimationMode::Projection,
        AnimationMode::AgentGraph,
        AnimationMode::MessagePulse,
        AnimationMode::BarChart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationMode::VectorField => "vector_field",
            AnimationMode::Basis3d => "basis3d",
            AnimationMode::Rotation => "rotation",
            AnimationMode::Projection => "projection",
            AnimationMode::AgentGraph => "agent_graph",
            AnimationMode::MessagePulse => "message_pulse",
            AnimationMode::BarChart => "bar_chart",
        }
    }

    /// Keyword fragments that indicate this mode.
    pub fn keyword_hints(&self) -> &'static [&'static str] {
        match self {
            AnimationMode::VectorField => &["vector", "arrow", "direction"],
            AnimationMode::Basis3d => &["basis", "3d", "span", "dimension"],
            AnimationMode::Rotation => &["rotat", "spin", "turn"],
            AnimationMode::Projection => &["project", "shadow", "onto"],
            AnimationMode::AgentGraph => &["agent", "network", "topology"],
            AnimationMode::MessagePulse => &["message", "communicat", "signal", "protocol"],
            AnimationMode::BarChart => &["chart", "plot", "data", "metric", "compare"],
        }
    }

    /// Whether a single keyword hints at this mode.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.keyword_hints().iter().any(|h| keyword.contains(h))
    }
}

impl fmt::Display for AnimationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AnimationMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        AnimationMode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| ModeParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown animation mode: {0}")]
pub struct ModeParseError(String);

/// Content series an episode belongs to.
///
/// Domain-specific series replace the diagram/slide keyword heuristic with
/// procedural mode rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Series {
    #[default]
    General,
    LinearAlgebra,
    MultiAgent,
}

impl Series {
    /// Classify a series slug such as `math_of_ml` or `multi_agent_systems`.
    pub fn from_slug(slug: &str) -> Self {
        let slug = slug.to_lowercase();
        if slug.contains("agent") || slug.split(|c: char| !c.is_alphanumeric()).any(|t| t == "mas") {
            Series::MultiAgent
        } else if slug.contains("linear") || slug.contains("algebra") || slug.contains("math") {
            Series::LinearAlgebra
        } else {
            Series::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Series::General => "general",
            Series::LinearAlgebra => "linear_algebra",
            Series::MultiAgent => "multi_agent",
        }
    }

    /// Whether beats fall through to mode rotation instead of diagram/slide.
    pub fn is_domain_specific(&self) -> bool {
        !matches!(self, Series::General)
    }

    /// Candidate animation modes, in rotation order.
    pub fn modes(&self) -> &'static [AnimationMode] {
        match self {
            Series::General => &[AnimationMode::BarChart, AnimationMode::VectorField],
            Series::LinearAlgebra => &[
                AnimationMode::VectorField,
                AnimationMode::Basis3d,
                AnimationMode::Rotation,
                AnimationMode::Projection,
            ],
            Series::MultiAgent => &[
                AnimationMode::AgentGraph,
                AnimationMode::MessagePulse,
                AnimationMode::BarChart,
            ],
        }
    }

    /// Tags unioned into every untagged stock candidate.
    pub fn default_tags(&self) -> &'static [&'static str] {
        match self {
            Series::General => &[],
            Series::LinearAlgebra => &["math", "vector", "matrix", "algebra", "geometry"],
            Series::MultiAgent => &["agent", "network", "graph", "simulation"],
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
