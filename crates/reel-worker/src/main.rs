//! Episode worker binary: renders one episode described by `REEL_*` env vars.

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_media::{check_ffmpeg, check_ffprobe};
use reel_worker::{EpisodeConfig, EpisodePipeline};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("reel=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting reel-worker");

    let config = EpisodeConfig::from_env();
    info!("Episode config: {:?}", config);

    if let Err(e) = check_ffmpeg(&config.ffmpeg_bin) {
        error!("FFmpeg unavailable: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = check_ffprobe(&config.ffprobe_bin) {
        error!("FFprobe unavailable: {}", e);
        std::process::exit(1);
    }

    let pipeline = EpisodePipeline::new(config);
    match pipeline.run().await {
        Ok(report) => {
            info!(
                episode_id = %report.episode_id,
                beats = report.beats.len(),
                fallbacks = report.fallback_count(),
                duration = report.achieved_duration,
                track = %report.track.display(),
                "Episode finished"
            );
            if !report.is_valid() {
                warn!(problems = report.validation_problems.len(), "Artifact failed validation");
                std::process::exit(3);
            }
        }
        Err(e) => {
            error!("Episode failed: {}", e);
            std::process::exit(if e.is_input_error() { 2 } else { 1 });
        }
    }
}
