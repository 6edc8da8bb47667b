//! Episode pipeline: beats in, budgeted visuals track and report out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use reel_media::{
    budget_track, concat_clips, select_for_cues, target_duration, validate_artifact, AdapterEnv, AdapterRegistry,
    BudgetAction, BudgetWarning, ExternalRenderer, FfmpegRenderer, FfprobeProber, MediaError, MediaProber, StockIndex,
    StockSource, ValidationRules,
};
use reel_models::{parse_beats, Beat, Clip, Series};

use crate::config::EpisodeConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::EpisodeLogger;
use crate::metrics;
use crate::router::{pad_beats, parse_overrides, BeatOutcome, BeatRouter};

pub const VISUALS_FILE: &str = "visuals.mp4";
pub const BUDGETED_FILE: &str = "visuals_budgeted.mp4";
pub const REPORT_FILE: &str = "report.json";
pub const STOCK_LIST_FILE: &str = "stock_list.txt";

/// Written to `report.json` after every successful run.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeReport {
    pub episode_id: String,
    pub series: Series,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Beats in the document, before variety padding
    pub narrated_beats: usize,
    pub beats: Vec<BeatOutcome>,
    pub track: PathBuf,
    pub voice_duration: f64,
    pub target_duration: f64,
    pub achieved_duration: f64,
    pub budget_action: BudgetAction,
    pub budget_warning: Option<BudgetWarning>,
    pub validation_problems: Vec<String>,
}

impl EpisodeReport {
    pub fn fallback_count(&self) -> usize {
        self.beats.iter().filter(|b| b.used != b.selected).count()
    }

    pub fn is_valid(&self) -> bool {
        self.validation_problems.is_empty()
    }
}

/// Read and parse a beat document; an empty list is an input error.
pub async fn load_beats(path: &Path) -> PipelineResult<Vec<Beat>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        PipelineError::invalid_input(format!("cannot read beat document {}: {}", path.display(), e))
    })?;
    let beats = parse_beats(&content)?;
    if beats.is_empty() {
        return Err(PipelineError::invalid_input(format!(
            "beat document {} contains no beats",
            path.display()
        )));
    }
    Ok(beats)
}

/// One episode run over an explicit configuration.
pub struct EpisodePipeline {
    config: EpisodeConfig,
    renderer: Arc<dyn ExternalRenderer>,
    prober: Arc<dyn MediaProber>,
}

impl EpisodePipeline {
    /// Pipeline backed by the configured ffmpeg and ffprobe binaries.
    pub fn new(config: EpisodeConfig) -> Self {
        let renderer = FfmpegRenderer::new(&config.ffmpeg_bin).with_timeout(config.render_timeout.as_secs());
        let prober = FfprobeProber::new(&config.ffprobe_bin);
        Self::with_backends(config, Arc::new(renderer), Arc::new(prober))
    }

    pub fn with_backends(
        config: EpisodeConfig,
        renderer: Arc<dyn ExternalRenderer>,
        prober: Arc<dyn MediaProber>,
    ) -> Self {
        Self {
            config,
            renderer,
            prober,
        }
    }

    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    /// Run the episode and write `report.json`.
    pub async fn run(&self) -> PipelineResult<EpisodeReport> {
        let episode_id = Uuid::new_v4().to_string();
        let logger = EpisodeLogger::new(&episode_id, "episode");

        let result = self.run_episode(&episode_id, &logger).instrument(logger.create_span()).await;
        match &result {
            Ok(report) => metrics::record_episode_completed(report.series.as_str()),
            Err(e) => {
                logger.log_error(&e.to_string());
                let reason = if e.is_input_error() {
                    "input"
                } else if e.is_assembly_precondition() {
                    "assembly"
                } else {
                    "pipeline"
                };
                metrics::record_episode_failed(reason);
            }
        }
        result
    }

    async fn run_episode(&self, episode_id: &str, logger: &EpisodeLogger) -> PipelineResult<EpisodeReport> {
        let config = &self.config;
        let started_at = Utc::now();
        logger.log_start(&format!("beats from {}", config.beats_path.display()));

        let beats = load_beats(&config.beats_path).await?;
        let voice = self.voice_duration().await?;
        // Reject a bad voice track before anything is rendered.
        target_duration(voice, &config.bounds)?;

        let series = Series::from_slug(&config.series);
        tokio::fs::create_dir_all(&config.output_dir).await?;

        let index = self.build_index(series).await?;
        let overrides = self.overrides(&beats, &index).await?;
        logger.log_progress(&format!(
            "{} beats, {} stock candidates, {} overrides, series {}",
            beats.len(),
            index.len(),
            overrides.iter().flatten().count(),
            series.as_str()
        ));

        let narrated_beats = beats.len();
        let beats = pad_beats(beats, config.variety_floor);
        if beats.len() > narrated_beats {
            info!(padded = beats.len() - narrated_beats, "Added concept-link beats for variety");
        }

        let registry = AdapterRegistry::with_defaults(AdapterEnv {
            frame: config.frame.clone(),
            encoding: config.encoding.clone(),
            font: config.font.clone(),
        });
        let router = BeatRouter::new(registry, Arc::clone(&self.renderer))
            .with_index(index)
            .with_series(series)
            .with_overrides(overrides)
            .with_background(config.background.clone())
            .with_parallelism(config.render_parallelism)
            .with_episode_timeout(config.episode_timeout)
            .with_seed(config.seed);

        let route_logger = logger.for_stage("route");
        let outcomes = router.route_episode(&beats, &config.clips_dir()).await?;
        let fallbacks = outcomes.iter().filter(|o| o.used != o.selected).count();
        route_logger.log_progress(&format!("{} clips rendered, {} via fallback", outcomes.len(), fallbacks));

        let clips: Vec<Clip> = outcomes.iter().map(|o| o.clip.clone()).collect();
        let track = concat_clips(&clips, &config.output_dir.join(VISUALS_FILE), self.renderer.as_ref()).await?;

        let budget_logger = logger.for_stage("budget");
        let budget = budget_track(
            &track,
            voice,
            &config.bounds,
            &config.output_dir.join(BUDGETED_FILE),
            &config.encoding,
            self.renderer.as_ref(),
        )
        .await?;
        if let Some(warning) = &budget.warning {
            budget_logger.log_warning(&warning.message);
            metrics::record_budget_warning(warning.extended);
        }

        let rules = ValidationRules {
            width: config.frame.width,
            height: config.frame.height,
            min_duration: config.bounds.min,
            max_duration: config.bounds.max,
            ..ValidationRules::default()
        };
        let validation_problems = validate_artifact(&budget.track.path, self.prober.as_ref(), &rules).await;
        let validate_logger = logger.for_stage("validate");
        for problem in &validation_problems {
            validate_logger.log_warning(problem);
        }

        let report = EpisodeReport {
            episode_id: episode_id.to_string(),
            series,
            started_at,
            finished_at: Utc::now(),
            narrated_beats,
            beats: outcomes,
            track: budget.track.path.clone(),
            voice_duration: voice,
            target_duration: budget.target,
            achieved_duration: budget.track.duration,
            budget_action: budget.action,
            budget_warning: budget.warning,
            validation_problems,
        };
        tokio::fs::write(config.output_dir.join(REPORT_FILE), serde_json::to_vec_pretty(&report)?).await?;

        logger.log_completion(&format!(
            "{:.2}s track at {}, {} validation problems",
            report.achieved_duration,
            report.track.display(),
            report.validation_problems.len()
        ));
        Ok(report)
    }

    /// Explicit duration wins; otherwise probe the voice artifact.
    async fn voice_duration(&self) -> PipelineResult<f64> {
        if let Some(seconds) = self.config.voice_duration {
            return Ok(seconds);
        }
        let path = self
            .config
            .voice_path
            .as_ref()
            .ok_or_else(|| PipelineError::invalid_input("no voice track configured"))?;
        self.prober.duration(path).await.map_err(|e| {
            PipelineError::invalid_input(format!("cannot probe voice track {}: {}", path.display(), e))
        })
    }

    async fn build_index(&self, series: Series) -> PipelineResult<StockIndex> {
        let mut sources: Vec<StockSource> = self
            .config
            .stock_dirs
            .iter()
            .cloned()
            .map(StockSource::Library)
            .collect();
        if let Some(manifest) = &self.config.stock_manifest {
            sources.push(StockSource::Manifest(manifest.clone()));
        }
        tokio::task::spawn_blocking(move || StockIndex::build(&sources, series))
            .await
            .map_err(|e| PipelineError::from(MediaError::internal(format!("stock index task failed: {}", e))))
    }

    /// Per-beat overrides from the configured list, or from episode-level
    /// pre-selection when requested (written to `stock_list.txt`).
    async fn overrides(&self, beats: &[Beat], index: &StockIndex) -> PipelineResult<Vec<Option<PathBuf>>> {
        if let Some(list) = &self.config.stock_list {
            return match tokio::fs::read_to_string(list).await {
                Ok(content) => {
                    let base = list.parent().unwrap_or_else(|| Path::new("."));
                    Ok(parse_overrides(&content, base))
                }
                Err(e) => {
                    warn!(list = %list.display(), error = %e, "Could not read stock list, no beats forced");
                    Ok(Vec::new())
                }
            };
        }
        if self.config.stock_preselect == 0 || index.is_empty() {
            return Ok(Vec::new());
        }

        let cues: Vec<&str> = beats
            .iter()
            .flat_map(|b| b.title_text().into_iter().chain(std::iter::once(b.text.as_str())))
            .collect();
        let picked: Vec<PathBuf> = select_for_cues(index, &cues, self.config.stock_preselect, self.prober.as_ref())
            .await
            .into_iter()
            .map(|c| c.path().to_path_buf())
            .collect();

        let body: String = picked.iter().map(|p| format!("{}\n", p.display())).collect();
        tokio::fs::write(self.config.output_dir.join(STOCK_LIST_FILE), body).await?;
        info!(count = picked.len(), "Pre-selected stock clips");
        Ok(picked.into_iter().map(Some).collect())
    }
}

impl std::fmt::Debug for EpisodePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpisodePipeline").field("config", &self.config).finish()
    }
}
