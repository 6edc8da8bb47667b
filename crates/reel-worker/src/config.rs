//! Episode configuration.

use std::path::PathBuf;
use std::time::Duration;

use reel_media::DurationBounds;
use reel_models::{EncodingConfig, FrameSpec};

/// Minimum clip count before the router pads with concept-link beats.
pub const DEFAULT_VARIETY_FLOOR: usize = 12;

/// Everything one episode run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct EpisodeConfig {
    /// Beat document (JSON)
    pub beats_path: PathBuf,
    /// Directories scanned recursively for stock footage
    pub stock_dirs: Vec<PathBuf>,
    /// Optional `path | tags` manifest
    pub stock_manifest: Option<PathBuf>,
    /// Optional per-beat override list (line i = beat i)
    pub stock_list: Option<PathBuf>,
    /// Pre-select this many stock clips into `stock_list.txt` (0 = off)
    pub stock_preselect: usize,
    /// Looped background for adapters that need one
    pub background: Option<PathBuf>,
    /// Voice artifact to probe for its duration
    pub voice_path: Option<PathBuf>,
    /// Explicit voice duration in seconds, wins over `voice_path`
    pub voice_duration: Option<f64>,
    /// Per-beat clips, the assembled track and the report land here
    pub output_dir: PathBuf,
    /// Series slug, e.g. "linear-algebra" or "multi-agent"
    pub series: String,
    /// Concurrent external renders
    pub render_parallelism: usize,
    /// Per-render timeout
    pub render_timeout: Duration,
    /// Whole-episode routing timeout
    pub episode_timeout: Duration,
    pub variety_floor: usize,
    pub bounds: DurationBounds,
    pub ffmpeg_bin: PathBuf,
    pub ffprobe_bin: PathBuf,
    pub font: PathBuf,
    /// Base seed for procedural animations
    pub seed: u64,
    pub frame: FrameSpec,
    pub encoding: EncodingConfig,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            beats_path: PathBuf::from("beats.json"),
            stock_dirs: Vec::new(),
            stock_manifest: None,
            stock_list: None,
            stock_preselect: 0,
            background: None,
            voice_path: None,
            voice_duration: None,
            output_dir: PathBuf::from("out"),
            series: "general".to_string(),
            render_parallelism: 4,
            render_timeout: Duration::from_secs(120),
            episode_timeout: Duration::from_secs(1800), // 30 minutes
            variety_floor: DEFAULT_VARIETY_FLOOR,
            bounds: DurationBounds::default(),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            font: PathBuf::from(reel_media::filters::DEFAULT_FONT),
            seed: 0,
            frame: FrameSpec::portrait(),
            encoding: EncodingConfig::default(),
        }
    }
}

/// Reads one setting by key; `None` when unset.
struct Settings<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Settings<F> {
    fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        (self.lookup)(key).and_then(|s| s.trim().parse().ok())
    }

    fn path(&self, key: &str) -> Option<PathBuf> {
        (self.lookup)(key).filter(|s| !s.trim().is_empty()).map(PathBuf::from)
    }

    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }
}

impl EpisodeConfig {
    /// Create config from `REEL_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from any key/value source using the `REEL_*` names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = Settings { lookup };
        let defaults = Self::default();
        let bounds = DurationBounds::new(
            env.parse("REEL_MIN_DURATION").unwrap_or(defaults.bounds.min),
            env.parse("REEL_MAX_DURATION").unwrap_or(defaults.bounds.max),
        )
        .with_pad(env.parse("REEL_DURATION_PAD").unwrap_or(defaults.bounds.pad));
        let encoding = EncodingConfig::new()
            .with_preset(env.string("REEL_X264_PRESET").unwrap_or(defaults.encoding.preset))
            .with_crf(env.parse("REEL_X264_CRF").unwrap_or(defaults.encoding.crf));

        Self {
            beats_path: env.path("REEL_BEATS").unwrap_or(defaults.beats_path),
            stock_dirs: env
                .string("REEL_STOCK_DIRS")
                .map(|v| std::env::split_paths(&v).filter(|p| !p.as_os_str().is_empty()).collect())
                .unwrap_or_default(),
            stock_manifest: env.path("REEL_STOCK_MANIFEST"),
            stock_list: env.path("REEL_STOCK_LIST"),
            stock_preselect: env.parse("REEL_STOCK_PRESELECT").unwrap_or(0),
            background: env.path("REEL_BACKGROUND"),
            voice_path: env.path("REEL_VOICE"),
            voice_duration: env.parse("REEL_VOICE_DURATION"),
            output_dir: env.path("REEL_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            series: env.string("REEL_SERIES").unwrap_or(defaults.series),
            render_parallelism: env.parse("REEL_RENDER_PARALLEL").unwrap_or(defaults.render_parallelism),
            render_timeout: Duration::from_secs(env.parse("REEL_RENDER_TIMEOUT").unwrap_or(120)),
            episode_timeout: Duration::from_secs(env.parse("REEL_EPISODE_TIMEOUT").unwrap_or(1800)),
            variety_floor: env.parse("REEL_VARIETY_FLOOR").unwrap_or(DEFAULT_VARIETY_FLOOR),
            bounds,
            ffmpeg_bin: env.path("FFMPEG_BIN").unwrap_or(defaults.ffmpeg_bin),
            ffprobe_bin: env.path("FFPROBE_BIN").unwrap_or(defaults.ffprobe_bin),
            font: env.path("REEL_FONT").unwrap_or(defaults.font),
            seed: env.parse("REEL_SEED").unwrap_or(0),
            frame: defaults.frame,
            encoding,
        }
    }

    pub fn clips_dir(&self) -> PathBuf {
        self.output_dir.join("clips")
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_beats(mut self, path: impl Into<PathBuf>) -> Self {
        self.beats_path = path.into();
        self
    }

    pub fn with_voice_duration(mut self, seconds: f64) -> Self {
        self.voice_duration = Some(seconds);
        self
    }
}
