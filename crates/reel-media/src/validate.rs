//! Final artifact validation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::probe::{MediaProber, VideoInfo};

/// Hard constraints a publishable artifact must meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    pub width: u32,
    pub height: u32,
    /// Accepted codec identifiers
    pub codecs: Vec<String>,
    pub min_duration: f64,
    pub max_duration: f64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            codecs: vec!["h264".to_string(), "libx264".to_string()],
            min_duration: 30.0,
            max_duration: 90.0,
        }
    }
}

/// Check probed info against the rules; one problem string per failed rule.
pub fn validate_info(info: &VideoInfo, rules: &ValidationRules) -> Vec<String> {
    let mut problems = Vec::new();

    let aspect_ok = info.width as u64 * 16 == info.height as u64 * 9;
    if info.width != rules.width || info.height != rules.height || !aspect_ok {
        problems.push(format!(
            "resolution {}x{} does not match required {}x{} (9:16)",
            info.width, info.height, rules.width, rules.height
        ));
    }

    let codec = info.codec.to_lowercase();
    if !rules.codecs.iter().any(|c| c.eq_ignore_ascii_case(&codec)) {
        problems.push(format!(
            "codec '{}' not accepted (expected one of: {})",
            info.codec,
            rules.codecs.join(", ")
        ));
    }

    if info.duration < rules.min_duration || info.duration > rules.max_duration {
        problems.push(format!(
            "duration {:.2}s outside [{:.0}, {:.0}]s",
            info.duration, rules.min_duration, rules.max_duration
        ));
    }

    problems
}

/// Probe `path` and validate it. An unprobeable file is a single problem.
pub async fn validate_artifact(path: &Path, prober: &dyn MediaProber, rules: &ValidationRules) -> Vec<String> {
    match prober.probe(path).await {
        Ok(info) => validate_info(&info, rules),
        Err(e) => vec![format!("could not probe {}: {}", path.display(), e)],
    }
}
