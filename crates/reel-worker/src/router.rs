//! Beat router.
//!
//! Selection runs sequentially over the beat list (mode rotation depends on
//! the previous beat's mode); rendering then runs with bounded parallelism
//! and results are slotted back by beat index. Every beat ends as a clip:
//! selected adapter, then slide, then a solid filler.

use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, warn};

use reel_media::{best_match, normalize, AdapterRegistry, ExternalRenderer, MediaError, MediaResult, StockIndex};
use reel_models::{AdapterKind, AnimationMode, Beat, Clip, RenderRequest, Series};

use crate::error::{PipelineError, PipelineResult};
use crate::metrics;

/// Keyword fragments that send a general-series beat to the diagram adapter.
pub const CONCEPT_MARKERS: &[&str] = &[
    "diagram", "flow", "map", "axes", "vector", "matrix", "plot", "chart", "graph",
];

/// Text of synthesized variety beats.
pub const PADDING_TEXT: &str = "concept link";

/// Why a beat got its adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteReason {
    ExplicitType,
    Override,
    StockMatch,
    ModeRotation,
    ConceptMarker,
    Default,
}

/// Selected adapter for one beat plus what it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub adapter: AdapterKind,
    pub source_clip: Option<PathBuf>,
    pub mode: Option<AnimationMode>,
    pub reason: RouteReason,
}

/// Which step of the fallback chain produced the clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStage {
    Primary,
    Slide,
    Filler,
}

impl FallbackStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackStage::Primary => "primary",
            FallbackStage::Slide => "slide",
            FallbackStage::Filler => "filler",
        }
    }
}

/// Result of routing one beat.
#[derive(Debug, Clone, Serialize)]
pub struct BeatOutcome {
    pub index: usize,
    pub selected: AdapterKind,
    pub used: AdapterKind,
    pub stage: FallbackStage,
    pub reason: RouteReason,
    pub mode: Option<AnimationMode>,
    pub clip: Clip,
    /// Last failure seen before the clip was produced
    pub error: Option<String>,
}

/// Read-only inputs to the selection policy.
#[derive(Debug, Clone, Copy)]
pub struct RoutingContext<'a> {
    pub registry: &'a AdapterRegistry,
    pub index: &'a StockIndex,
    /// Externally pre-selected clips, by beat index
    pub overrides: &'a [Option<PathBuf>],
    pub series: Series,
}

impl RoutingContext<'_> {
    fn override_for(&self, position: usize) -> Option<PathBuf> {
        self.overrides.get(position).cloned().flatten()
    }

    fn stock_for(&self, beat: &Beat) -> Option<PathBuf> {
        best_match(self.index, &beat.keywords).map(|c| c.path().to_path_buf())
    }
}

fn has_concept_marker(beat: &Beat) -> bool {
    let keywords = beat.keyword_string();
    CONCEPT_MARKERS.iter().any(|m| keywords.contains(m))
}

/// Animation mode for a beat in `series`, never repeating `previous` while
/// another mode is available.
///
/// Keywords (then the title) are checked for mode hints in order; without a
/// hint the remaining candidates rotate by beat position.
pub fn pick_mode(beat: &Beat, series: Series, previous: Option<AnimationMode>, position: usize) -> AnimationMode {
    let all = series.modes();
    let mut candidates: Vec<AnimationMode> = all.iter().copied().filter(|m| Some(*m) != previous).collect();
    if candidates.is_empty() {
        candidates = all.to_vec();
    }

    let hints = beat.keywords.iter().map(String::as_str).chain(beat.title_text());
    for hint in hints {
        if let Some(mode) = candidates.iter().copied().find(|m| m.matches_keyword(hint)) {
            return mode;
        }
    }
    candidates[position % candidates.len()]
}

/// Apply the selection policy to one beat.
pub fn select_route(
    beat: &Beat,
    position: usize,
    previous_mode: Option<AnimationMode>,
    ctx: &RoutingContext<'_>,
) -> Route {
    if let Some(kind) = beat.explicit_adapter().filter(|k| ctx.registry.contains(k.as_str())) {
        let source_clip = if kind.uses_stock() {
            ctx.override_for(position).or_else(|| ctx.stock_for(beat))
        } else {
            None
        };
        let mode = (kind == AdapterKind::Procedural).then(|| pick_mode(beat, ctx.series, previous_mode, position));
        return Route {
            adapter: kind,
            source_clip,
            mode,
            reason: RouteReason::ExplicitType,
        };
    }

    if let Some(clip) = ctx.override_for(position) {
        return Route {
            adapter: AdapterKind::Stock,
            source_clip: Some(clip),
            mode: None,
            reason: RouteReason::Override,
        };
    }

    if let Some(clip) = ctx.stock_for(beat) {
        return Route {
            adapter: AdapterKind::Stock,
            source_clip: Some(clip),
            mode: None,
            reason: RouteReason::StockMatch,
        };
    }

    if ctx.series.is_domain_specific() {
        return Route {
            adapter: AdapterKind::Procedural,
            source_clip: None,
            mode: Some(pick_mode(beat, ctx.series, previous_mode, position)),
            reason: RouteReason::ModeRotation,
        };
    }

    let (adapter, reason) = if has_concept_marker(beat) {
        (AdapterKind::Diagram, RouteReason::ConceptMarker)
    } else {
        (AdapterKind::Slide, RouteReason::Default)
    };
    Route {
        adapter,
        source_clip: None,
        mode: None,
        reason,
    }
}

/// Append concept-link diagram beats until there are `floor` beats.
///
/// Padding beats borrow keywords round-robin from the narrated beats so the
/// header bands differ.
pub fn pad_beats(mut beats: Vec<Beat>, floor: usize) -> Vec<Beat> {
    let narrated = beats.len();
    if narrated == 0 || narrated >= floor {
        return beats;
    }
    for i in 0..floor - narrated {
        let keywords = beats[i % narrated].keywords.clone();
        beats.push(
            Beat::new(PADDING_TEXT)
                .with_keywords(keywords)
                .with_kind(AdapterKind::Diagram.as_str()),
        );
    }
    beats
}

/// Parse a stock override list: line i names the clip for beat i. Blank
/// lines and files that do not exist leave that beat unforced.
pub fn parse_overrides(content: &str, base_dir: &Path) -> Vec<Option<PathBuf>> {
    content
        .lines()
        .map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let path = PathBuf::from(line);
            let path = if path.is_absolute() { path } else { base_dir.join(path) };
            path.is_file().then_some(path)
        })
        .collect()
}

/// Routes, renders and normalizes every beat of an episode.
pub struct BeatRouter {
    registry: AdapterRegistry,
    renderer: Arc<dyn ExternalRenderer>,
    index: StockIndex,
    series: Series,
    overrides: Vec<Option<PathBuf>>,
    background: Option<PathBuf>,
    parallelism: usize,
    episode_timeout: Option<Duration>,
    seed: u64,
}

impl BeatRouter {
    pub fn new(registry: AdapterRegistry, renderer: Arc<dyn ExternalRenderer>) -> Self {
        Self {
            registry,
            renderer,
            index: StockIndex::default(),
            series: Series::General,
            overrides: Vec::new(),
            background: None,
            parallelism: 4,
            episode_timeout: None,
            seed: 0,
        }
    }

    pub fn with_index(mut self, index: StockIndex) -> Self {
        self.index = index;
        self
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series = series;
        self
    }

    pub fn with_overrides(mut self, overrides: Vec<Option<PathBuf>>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_background(mut self, background: Option<PathBuf>) -> Self {
        self.background = background;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_episode_timeout(mut self, timeout: Duration) -> Self {
        self.episode_timeout = Some(timeout);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn context(&self) -> RoutingContext<'_> {
        RoutingContext {
            registry: &self.registry,
            index: &self.index,
            overrides: &self.overrides,
            series: self.series,
        }
    }

    /// Selection for every beat, in order.
    pub fn plan_routes(&self, beats: &[Beat]) -> Vec<Route> {
        let ctx = self.context();
        let mut previous_mode = None;
        beats
            .iter()
            .enumerate()
            .map(|(position, beat)| {
                let route = select_route(beat, position, previous_mode, &ctx);
                if route.mode.is_some() {
                    previous_mode = route.mode;
                }
                debug!(
                    beat_index = position,
                    adapter = %route.adapter,
                    reason = ?route.reason,
                    "Selected adapter"
                );
                route
            })
            .collect()
    }

    /// Produce one normalized clip per beat, in beat order.
    ///
    /// Only an empty beat list or a failing filler render is an error.
    pub async fn route_episode(&self, beats: &[Beat], clips_dir: &Path) -> PipelineResult<Vec<BeatOutcome>> {
        if beats.is_empty() {
            return Err(PipelineError::invalid_input("beat list is empty"));
        }
        tokio::fs::create_dir_all(clips_dir).await?;

        let routes = self.plan_routes(beats);
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let renders = beats.iter().zip(routes).enumerate().map(|(position, (beat, route))| {
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel_rx.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| MediaError::internal(format!("render pool closed: {}", e)))?;
                self.render_beat(position, beat, route, clips_dir, cancel).await
            }
        });

        let mut all = std::pin::pin!(join_all(renders));
        let results = match self.episode_timeout {
            Some(limit) => match tokio::time::timeout(limit, all.as_mut()).await {
                Ok(results) => results,
                Err(_) => {
                    warn!(
                        timeout_secs = limit.as_secs_f64(),
                        "Episode timeout reached, cancelling in-flight renders"
                    );
                    let _ = cancel_tx.send(true);
                    all.await
                }
            },
            None => all.await,
        };

        let mut slots: Vec<Option<BeatOutcome>> = vec![None; beats.len()];
        for result in results {
            let outcome = result?;
            metrics::record_beat_routed(outcome.used.as_str());
            if outcome.stage != FallbackStage::Primary {
                metrics::record_fallback(outcome.stage.as_str());
            }
            let position = outcome.index;
            slots[position] = Some(outcome);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| PipelineError::from(MediaError::internal(format!("beat {} produced no clip", i))))
            })
            .collect()
    }

    fn beat_seed(&self, position: usize) -> u64 {
        self.seed ^ (position as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    fn request(&self, position: usize, beat: &Beat, route: &Route, output: PathBuf, duration: f64) -> RenderRequest {
        RenderRequest::new(output, duration)
            .with_text(beat.title_text().unwrap_or_default(), beat.text.clone())
            .with_keywords(beat.keywords.clone())
            .with_background(self.background.clone())
            .with_source_clip(route.source_clip.clone())
            .with_mode(route.mode, self.beat_seed(position))
    }

    async fn attempt(
        &self,
        kind: AdapterKind,
        req: &RenderRequest,
        cancel: Option<watch::Receiver<bool>>,
    ) -> MediaResult<Clip> {
        let started = Instant::now();
        let env = self.registry.env();
        let clip = self
            .registry
            .render(kind.as_str(), req, self.renderer.as_ref(), cancel.clone())
            .await?;
        let clip = normalize(&clip, &env.frame, &env.encoding, self.renderer.as_ref(), cancel).await?;
        metrics::record_render_seconds(kind.as_str(), started.elapsed().as_secs_f64());
        Ok(clip)
    }

    async fn render_beat(
        &self,
        position: usize,
        beat: &Beat,
        route: Route,
        clips_dir: &Path,
        cancel: watch::Receiver<bool>,
    ) -> MediaResult<BeatOutcome> {
        let duration = route.adapter.clamp_duration(beat.duration);
        let output = |kind: AdapterKind| clips_dir.join(format!("{:04}_{}.mp4", position, kind.as_str()));
        let outcome = |used: AdapterKind, stage: FallbackStage, clip: Clip, error: Option<String>| BeatOutcome {
            index: position,
            selected: route.adapter,
            used,
            stage,
            reason: route.reason,
            mode: route.mode,
            clip,
            error,
        };

        let mut last_error = None;
        let mut cancelled = *cancel.borrow();

        if !cancelled {
            let req = self.request(position, beat, &route, output(route.adapter), duration);
            match self.attempt(route.adapter, &req, Some(cancel.clone())).await {
                Ok(clip) => {
                    debug!(beat_index = position, adapter = %route.adapter, "Beat rendered");
                    return Ok(outcome(route.adapter, FallbackStage::Primary, clip, None));
                }
                Err(e) => {
                    warn!(
                        beat_index = position,
                        adapter = %route.adapter,
                        error = %e,
                        "Adapter failed, falling back"
                    );
                    last_error = Some(e.to_string());
                    cancelled = *cancel.borrow();
                }
            }
        }

        if !cancelled && route.adapter != AdapterKind::Slide {
            let req = self.request(position, beat, &route, output(AdapterKind::Slide), duration);
            match self.attempt(AdapterKind::Slide, &req, Some(cancel.clone())).await {
                Ok(clip) => {
                    info!(beat_index = position, from = %route.adapter, "Beat rendered with slide fallback");
                    return Ok(outcome(AdapterKind::Slide, FallbackStage::Slide, clip, last_error));
                }
                Err(e) => {
                    warn!(beat_index = position, error = %e, "Slide fallback failed");
                    last_error = Some(e.to_string());
                }
            }
        }

        // Filler runs without the episode cancel so a timed-out beat still
        // yields a clip.
        let req = self.request(position, beat, &route, output(AdapterKind::Filler), duration);
        let clip = self.attempt(AdapterKind::Filler, &req, None).await?;
        info!(beat_index = position, cancelled, "Beat rendered with filler");
        Ok(outcome(AdapterKind::Filler, FallbackStage::Filler, clip, last_error))
    }
}

impl std::fmt::Debug for BeatRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeatRouter")
            .field("registry", &self.registry)
            .field("stock_candidates", &self.index.len())
            .field("series", &self.series)
            .field("parallelism", &self.parallelism)
            .field("episode_timeout", &self.episode_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reel_media::{AdapterEnv, FfmpegCommand, StockCandidate};
    use std::sync::Mutex;

    type FailWhen = fn(&FfmpegCommand) -> bool;

    /// Writes every output file; fails commands matching `fail_when`, and
    /// with `block` holds non-filler renders until cancelled. With
    /// `stagger`, lower beat positions take longer to finish.
    struct FakeRenderer {
        fail_when: FailWhen,
        block: bool,
        stagger: bool,
        outputs: Mutex<Vec<PathBuf>>,
    }

    impl FakeRenderer {
        fn new(fail_when: FailWhen) -> Self {
            Self {
                fail_when,
                block: false,
                stagger: false,
                outputs: Mutex::new(Vec::new()),
            }
        }
    }

    fn output_name(command: &FfmpegCommand) -> String {
        command.output().to_string_lossy().to_string()
    }

    #[async_trait]
    impl ExternalRenderer for FakeRenderer {
        async fn run(&self, command: &FfmpegCommand, cancel: Option<watch::Receiver<bool>>) -> MediaResult<()> {
            if self.block && !output_name(command).contains("filler") {
                if let Some(mut rx) = cancel {
                    let _ = rx.wait_for(|cancelled| *cancelled).await;
                    return Err(MediaError::Cancelled);
                }
            }
            if self.stagger {
                let position: u64 = command
                    .output()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.get(..4))
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(40 * 4u64.saturating_sub(position))).await;
            }
            if (self.fail_when)(command) {
                return Err(MediaError::ffmpeg_failed("render failed", None, Some(1)));
            }
            tokio::fs::write(command.output(), b"clip").await?;
            self.outputs.lock().unwrap().push(command.output().to_path_buf());
            Ok(())
        }
    }

    fn never(_: &FfmpegCommand) -> bool {
        false
    }

    fn registry() -> AdapterRegistry {
        AdapterRegistry::with_defaults(AdapterEnv::default())
    }

    fn ctx<'a>(registry: &'a AdapterRegistry, index: &'a StockIndex, overrides: &'a [Option<PathBuf>], series: Series) -> RoutingContext<'a> {
        RoutingContext {
            registry,
            index,
            overrides,
            series,
        }
    }

    fn stock_index() -> StockIndex {
        StockIndex::from_candidates(vec![StockCandidate::new(
            "/stock/city_night.mp4",
            vec!["city".to_string(), "night".to_string()],
        )])
    }

    #[test]
    fn test_selection_policy_order() {
        let registry = registry();
        let index = stock_index();
        let overrides = vec![None, Some(PathBuf::from("/forced/a.mp4"))];
        let ctx = ctx(&registry, &index, &overrides, Series::General);

        let explicit = Beat::new("x").with_kind("slide").with_keywords(["city"]);
        assert_eq!(select_route(&explicit, 1, None, &ctx).reason, RouteReason::ExplicitType);
        assert_eq!(select_route(&explicit, 1, None, &ctx).adapter, AdapterKind::Slide);

        let forced = Beat::new("x").with_keywords(["city"]);
        let route = select_route(&forced, 1, None, &ctx);
        assert_eq!(route.reason, RouteReason::Override);
        assert_eq!(route.source_clip, Some(PathBuf::from("/forced/a.mp4")));

        let matched = select_route(&forced, 0, None, &ctx);
        assert_eq!(matched.reason, RouteReason::StockMatch);
        assert_eq!(matched.source_clip, Some(PathBuf::from("/stock/city_night.mp4")));

        let concept = Beat::new("x").with_keywords(["Flow Chart"]);
        assert_eq!(select_route(&concept, 0, None, &ctx).adapter, AdapterKind::Diagram);

        let plain = Beat::new("x").with_keywords(["ocean"]).with_kind("auto");
        let route = select_route(&plain, 0, None, &ctx);
        assert_eq!(route.adapter, AdapterKind::Slide);
        assert_eq!(route.reason, RouteReason::Default);
    }

    #[test]
    fn test_explicit_stock_without_match_has_no_clip() {
        let registry = registry();
        let index = StockIndex::default();
        let ctx = ctx(&registry, &index, &[], Series::General);
        let route = select_route(&Beat::new("x").with_kind("stock"), 0, None, &ctx);
        assert_eq!(route.adapter, AdapterKind::Stock);
        assert_eq!(route.source_clip, None);
    }

    #[test]
    fn test_domain_series_uses_mode_rotation() {
        let registry = registry();
        let index = StockIndex::default();
        let ctx = ctx(&registry, &index, &[], Series::LinearAlgebra);

        let route = select_route(&Beat::new("x").with_keywords(["rotate the plane"]), 0, None, &ctx);
        assert_eq!(route.adapter, AdapterKind::Procedural);
        assert_eq!(route.mode, Some(AnimationMode::Rotation));
        assert_eq!(route.reason, RouteReason::ModeRotation);
    }

    #[test]
    fn test_modes_never_repeat_consecutively() {
        let router = BeatRouter::new(registry(), Arc::new(FakeRenderer::new(never))).with_series(Series::MultiAgent);
        let beats: Vec<Beat> = (0..10).map(|_| Beat::new("agents talk").with_keywords(["agent"])).collect();
        let routes = router.plan_routes(&beats);

        let modes: Vec<_> = routes.iter().map(|r| r.mode.unwrap()).collect();
        assert_eq!(modes[0], AnimationMode::AgentGraph);
        for pair in modes.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_pick_mode_falls_back_to_full_set() {
        let beat = Beat::new("x");
        let mode = pick_mode(&beat, Series::General, Some(AnimationMode::BarChart), 0);
        assert_eq!(mode, AnimationMode::VectorField);
    }

    #[test]
    fn test_pad_beats_to_floor() {
        let beats = vec![
            Beat::new("one").with_keywords(["alpha"]),
            Beat::new("two").with_keywords(["beta"]),
        ];
        let padded = pad_beats(beats, 5);
        assert_eq!(padded.len(), 5);
        assert_eq!(padded[0].text, "one");
        assert_eq!(padded[2].text, PADDING_TEXT);
        assert_eq!(padded[2].explicit_adapter(), Some(AdapterKind::Diagram));
        assert_eq!(padded[3].keywords, vec!["beta".to_string()]);

        assert_eq!(pad_beats(padded.clone(), 3).len(), 5);
        assert!(pad_beats(Vec::new(), 12).is_empty());
    }

    #[test]
    fn test_parse_overrides_ignores_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        let overrides = parse_overrides("a.mp4\n\nmissing.mp4\n", dir.path());
        assert_eq!(overrides, vec![Some(dir.path().join("a.mp4")), None, None]);
    }

    #[tokio::test]
    async fn test_empty_beat_list_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let router = BeatRouter::new(registry(), Arc::new(FakeRenderer::new(never)));
        let err = tokio_test::assert_err!(router.route_episode(&[], dir.path()).await);
        assert!(err.is_input_error());
    }

    fn diagram_fails(command: &FfmpegCommand) -> bool {
        output_name(command).contains("_diagram")
    }

    #[tokio::test]
    async fn test_failed_adapter_falls_back_to_slide_with_clamped_duration() {
        let dir = tempfile::tempdir().unwrap();
        let router = BeatRouter::new(registry(), Arc::new(FakeRenderer::new(diagram_fails))).with_parallelism(2);
        let beats = vec![
            Beat::new("intro"),
            Beat::new("the matrix").with_keywords(["matrix"]).with_duration(20.0),
            Beat::new("outro"),
        ];

        let outcomes = router.route_episode(&beats, dir.path()).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.iter().map(|o| o.index).collect::<Vec<_>>(), vec![0, 1, 2]);

        let fallen = &outcomes[1];
        assert_eq!(fallen.selected, AdapterKind::Diagram);
        assert_eq!(fallen.used, AdapterKind::Slide);
        assert_eq!(fallen.stage, FallbackStage::Slide);
        assert!((fallen.clip.duration - 8.0).abs() < 1e-9);
        assert!(fallen.error.is_some());
    }

    fn all_but_filler_fail(command: &FfmpegCommand) -> bool {
        !output_name(command).contains("filler")
    }

    #[tokio::test]
    async fn test_slide_failure_ends_in_filler() {
        let dir = tempfile::tempdir().unwrap();
        let router = BeatRouter::new(registry(), Arc::new(FakeRenderer::new(all_but_filler_fail)));
        let outcomes = router
            .route_episode(&[Beat::new("x").with_duration(2.0)], dir.path())
            .await
            .unwrap();

        assert_eq!(outcomes[0].stage, FallbackStage::Filler);
        assert_eq!(outcomes[0].used, AdapterKind::Filler);
        // Slide clamps 2.0 up to its 3 s minimum; the filler keeps it.
        assert!((outcomes[0].clip.duration - 3.0).abs() < 1e-9);
    }

    fn everything_fails(_: &FfmpegCommand) -> bool {
        true
    }

    #[tokio::test]
    async fn test_filler_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let router = BeatRouter::new(registry(), Arc::new(FakeRenderer::new(everything_fails)));
        tokio_test::assert_err!(router.route_episode(&[Beat::new("x")], dir.path()).await);
    }

    #[tokio::test]
    async fn test_procedural_clips_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Arc::new(FakeRenderer::new(never));
        let router = BeatRouter::new(registry(), renderer.clone()).with_series(Series::LinearAlgebra);
        let outcomes = router.route_episode(&[Beat::new("basis")], dir.path()).await.unwrap();

        assert_eq!(outcomes[0].used, AdapterKind::Procedural);
        assert!((outcomes[0].clip.fps - 30.0).abs() < 1e-9);
        assert!(outcomes[0].clip.path.to_string_lossy().ends_with("_norm.mp4"));
        assert_eq!(renderer.outputs.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_episode_timeout_routes_to_filler() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer {
            block: true,
            ..FakeRenderer::new(never)
        };
        let router = BeatRouter::new(registry(), Arc::new(renderer))
            .with_parallelism(2)
            .with_episode_timeout(Duration::from_millis(100));
        let beats: Vec<Beat> = (0..4).map(|i| Beat::new(format!("beat {}", i))).collect();

        let outcomes = router.route_episode(&beats, dir.path()).await.unwrap();
        assert_eq!(outcomes.len(), 4);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.index, i);
            assert_eq!(outcome.stage, FallbackStage::Filler);
            assert!((outcome.clip.duration - 5.9).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_beat_order() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Arc::new(FakeRenderer {
            stagger: true,
            ..FakeRenderer::new(never)
        });
        let router = BeatRouter::new(registry(), renderer.clone()).with_parallelism(4);
        let beats: Vec<Beat> = (0..4).map(|i| Beat::new(format!("beat {}", i))).collect();

        let outcomes = router.route_episode(&beats, dir.path()).await.unwrap();

        // Beat 0 was the last render to finish.
        let finished = renderer.outputs.lock().unwrap().clone();
        assert_eq!(finished.len(), 4);
        assert!(finished[3].to_string_lossy().contains("0000_"));
        assert!(finished[0].to_string_lossy().contains("0003_"));

        assert_eq!(outcomes.iter().map(|o| o.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        let clips: Vec<_> = outcomes.iter().map(|o| o.clip.clone()).collect();
        let list = reel_media::concat::concat_manifest(&clips).unwrap();
        let lines: Vec<&str> = list.lines().collect();
        assert_eq!(lines.len(), 4);
        for (i, line) in lines.iter().enumerate() {
            assert!(line.contains(&format!("{:04}_", i)), "line {} out of order: {}", i, line);
        }
    }
}
