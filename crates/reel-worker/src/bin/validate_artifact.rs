//! Validate a rendered artifact against the publishing rules.
//!
//! Usage: `validate-artifact <path> [min_secs max_secs]`
//!
//! Prints one line per problem and exits non-zero when any exist.

use anyhow::{bail, Context};
use std::path::PathBuf;

use reel_media::{validate_artifact, FfprobeProber, ValidationRules};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(path) = args.first().map(PathBuf::from) else {
        bail!("usage: validate-artifact <path> [min_secs max_secs]");
    };

    let mut rules = ValidationRules::default();
    if let [_, min, max] = args.as_slice() {
        rules.min_duration = min.parse().context("invalid min_secs")?;
        rules.max_duration = max.parse().context("invalid max_secs")?;
    }

    let ffprobe = std::env::var("FFPROBE_BIN").unwrap_or_else(|_| "ffprobe".to_string());
    let problems = validate_artifact(&path, &FfprobeProber::new(ffprobe), &rules).await;

    if problems.is_empty() {
        println!("OK: {}", path.display());
        return Ok(());
    }

    println!("{} problem(s) in {}:", problems.len(), path.display());
    for problem in &problems {
        println!("  - {}", problem);
    }
    std::process::exit(1);
}
