//! Visual adapter kinds.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named strategies that render a beat into a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Matched or forced stock footage, cover-cropped to the frame
    Stock,
    /// Bordered panel over the background with title and keyword bullets
    Card,
    /// Header band of keyword tokens and a centered caption
    Diagram,
    /// Full-bleed title and body card
    Slide,
    /// Deterministic mode/seed driven animation
    Procedural,
    /// Solid-color last resort
    Filler,
}

impl AdapterKind {
    pub const ALL: &'static [AdapterKind] = &[
        AdapterKind::Stock,
        AdapterKind::Card,
        AdapterKind::Diagram,
        AdapterKind::Slide,
        AdapterKind::Procedural,
        AdapterKind::Filler,
    ];

    /// Registry name of this adapter.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Stock => "stock",
            AdapterKind::Card => "card",
            AdapterKind::Diagram => "diagram",
            AdapterKind::Slide => "slide",
            AdapterKind::Procedural => "procedural",
            AdapterKind::Filler => "filler",
        }
    }

    /// Comfortable duration range in seconds.
    pub fn duration_range(&self) -> (f64, f64) {
        match self {
            AdapterKind::Stock | AdapterKind::Card | AdapterKind::Diagram | AdapterKind::Slide => {
                (3.0, 8.0)
            }
            // animations need a little longer to read
            AdapterKind::Procedural => (4.0, 8.0),
            AdapterKind::Filler => (1.5, 15.0),
        }
    }

    /// Clamp a requested duration into this adapter's range.
    pub fn clamp_duration(&self, requested: f64) -> f64 {
        let (min, max) = self.duration_range();
        if !requested.is_finite() {
            return min;
        }
        requested.clamp(min, max)
    }

    /// Whether the adapter consumes stock footage.
    pub fn uses_stock(&self) -> bool {
        matches!(self, AdapterKind::Stock | AdapterKind::Card)
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AdapterKind {
    type Err = AdapterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" => Ok(AdapterKind::Stock),
            "card" => Ok(AdapterKind::Card),
            "diagram" | "map" | "flow" => Ok(AdapterKind::Diagram),
            "slide" => Ok(AdapterKind::Slide),
            "procedural" | "data_viz" | "chart" => Ok(AdapterKind::Procedural),
            "filler" => Ok(AdapterKind::Filler),
            _ => Err(AdapterParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown adapter: {0}")]
pub struct AdapterParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for kind in AdapterKind::ALL {
            assert_eq!(kind.as_str().parse::<AdapterKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn test_shotlist_aliases() {
        assert_eq!("MAP".parse::<AdapterKind>().unwrap(), AdapterKind::Diagram);
        assert_eq!("data_viz".parse::<AdapterKind>().unwrap(), AdapterKind::Procedural);
        assert!("code".parse::<AdapterKind>().is_err());
    }

    #[test]
    fn test_clamp_duration() {
        assert!((AdapterKind::Slide.clamp_duration(12.0) - 8.0).abs() < 1e-9);
        assert!((AdapterKind::Slide.clamp_duration(1.0) - 3.0).abs() < 1e-9);
        assert!((AdapterKind::Procedural.clamp_duration(3.5) - 4.0).abs() < 1e-9);
        assert!((AdapterKind::Filler.clamp_duration(f64::NAN) - 1.5).abs() < 1e-9);
        assert!((AdapterKind::Card.clamp_duration(5.9) - 5.9).abs() < 1e-9);
    }
}
