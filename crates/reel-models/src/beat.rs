//! Narration beats and the beat document format.
//!
//! Beats arrive from the text-generation step as JSON. Three document
//! shapes are accepted: a bare array, an object with a `beats` array, or a
//! single beat object.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::adapter::AdapterKind;

/// Requested duration used when a beat carries none.
pub const DEFAULT_BEAT_DURATION: f64 = 5.9;

/// One narration segment requiring one visual clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Beat {
    /// On-screen / narration text
    pub text: String,

    /// Optional headline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Ordered, case-insensitively unique keywords
    #[serde(default, deserialize_with = "deserialize_keywords")]
    #[schemars(with = "Vec<String>")]
    pub keywords: Vec<String>,

    /// Requested duration in seconds (`dur` is accepted as an alias)
    #[serde(
        default = "default_duration",
        alias = "dur",
        deserialize_with = "deserialize_duration"
    )]
    #[schemars(with = "f64")]
    pub duration: f64,

    /// Explicit strategy tag; `"auto"` and empty strings mean none
    #[serde(
        default,
        rename = "type",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_kind"
    )]
    #[schemars(with = "Option<String>")]
    pub kind: Option<String>,
}

fn default_duration() -> f64 {
    DEFAULT_BEAT_DURATION
}

impl Beat {
    /// Create a beat with default duration and no keywords.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: None,
            keywords: Vec::new(),
            duration: DEFAULT_BEAT_DURATION,
            kind: None,
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = normalize_keywords(keywords.into_iter().map(Into::into));
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = sanitize_duration(Some(seconds));
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = normalize_kind(kind.into());
        self
    }

    /// Title if present and non-blank.
    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// All keywords joined into one lowercase string.
    pub fn keyword_string(&self) -> String {
        self.keywords.join(" ").to_lowercase()
    }

    /// The adapter named by the explicit type tag, if it names one.
    pub fn explicit_adapter(&self) -> Option<AdapterKind> {
        self.kind.as_deref().and_then(|k| k.parse().ok())
    }
}

/// Errors from parsing a beat document.
#[derive(Debug, Error)]
pub enum BeatParseError {
    #[error("Malformed beat document: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BeatDocument {
    List(Vec<Beat>),
    Wrapped { beats: Vec<Beat> },
    Single(Beat),
}

/// Parse a beat document in any of the accepted shapes.
///
/// An empty list parses successfully; callers decide whether that is an
/// input error.
pub fn parse_beats(json: &str) -> Result<Vec<Beat>, BeatParseError> {
    let doc: BeatDocument = serde_json::from_str(json)?;
    Ok(match doc {
        BeatDocument::List(beats) | BeatDocument::Wrapped { beats } => beats,
        BeatDocument::Single(beat) => vec![beat],
    })
}

fn normalize_keywords(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for kw in raw {
        let kw = kw.trim().to_string();
        if kw.is_empty() {
            continue;
        }
        if seen.insert(kw.to_lowercase()) {
            out.push(kw);
        }
    }
    out
}

fn normalize_kind(kind: String) -> Option<String> {
    let kind = kind.trim().to_lowercase();
    if kind.is_empty() || kind == "auto" {
        None
    } else {
        Some(kind)
    }
}

fn sanitize_duration(value: Option<f64>) -> f64 {
    match value {
        Some(d) if d.is_finite() && d > 0.0 => d,
        _ => DEFAULT_BEAT_DURATION,
    }
}

fn deserialize_keywords<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    // Non-string entries are dropped rather than rejected.
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    let strings = raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string));
    Ok(normalize_keywords(strings))
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(sanitize_duration(raw))
}

fn deserialize_kind<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(normalize_kind))
}
