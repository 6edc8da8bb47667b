//! Routing and budgeting metrics.
//!
//! Recorded through the `metrics` facade; the process installs no exporter,
//! so these are no-ops unless an embedding service installs a recorder.

use metrics::{counter, histogram};

pub mod names {
    pub const BEATS_ROUTED_TOTAL: &str = "reel_beats_routed_total";
    pub const FALLBACKS_TOTAL: &str = "reel_fallbacks_total";
    pub const RENDER_DURATION_SECONDS: &str = "reel_render_duration_seconds";
    pub const BUDGET_WARNINGS_TOTAL: &str = "reel_budget_warnings_total";
    pub const EPISODES_COMPLETED_TOTAL: &str = "reel_episodes_completed_total";
    pub const EPISODES_FAILED_TOTAL: &str = "reel_episodes_failed_total";
}

/// A beat produced its clip with `adapter`.
pub fn record_beat_routed(adapter: &str) {
    let labels = [("adapter", adapter.to_string())];
    counter!(names::BEATS_ROUTED_TOTAL, &labels).increment(1);
}

/// A beat dropped to the given fallback stage ("slide" or "filler").
pub fn record_fallback(stage: &str) {
    let labels = [("stage", stage.to_string())];
    counter!(names::FALLBACKS_TOTAL, &labels).increment(1);
}

pub fn record_render_seconds(adapter: &str, secs: f64) {
    let labels = [("adapter", adapter.to_string())];
    histogram!(names::RENDER_DURATION_SECONDS, &labels).record(secs);
}

pub fn record_budget_warning(extended: bool) {
    let labels = [("extended", extended.to_string())];
    counter!(names::BUDGET_WARNINGS_TOTAL, &labels).increment(1);
}

pub fn record_episode_completed(series: &str) {
    let labels = [("series", series.to_string())];
    counter!(names::EPISODES_COMPLETED_TOTAL, &labels).increment(1);
}

pub fn record_episode_failed(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::EPISODES_FAILED_TOTAL, &labels).increment(1);
}
