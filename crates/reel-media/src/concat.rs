//! Timeline assembly by stream-copy concatenation.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use reel_models::{Clip, FrameSpec, Track};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::renderer::ExternalRenderer;

/// Check that every clip shares the first clip's frame format.
///
/// Returns that shared frame.
pub fn check_uniform(clips: &[Clip]) -> MediaResult<FrameSpec> {
    let first = clips
        .first()
        .ok_or_else(|| MediaError::assembly_precondition("no clips to concatenate"))?;
    let frame = FrameSpec {
        width: first.width,
        height: first.height,
        fps: first.fps.round() as u32,
        pixel_format: first.pixel_format.clone(),
    };

    for (i, clip) in clips.iter().enumerate() {
        if !clip.conforms_to(&frame) {
            return Err(MediaError::assembly_precondition(format!(
                "clip {} ({}) is {}x{}@{:.2} {}, expected {}x{}@{} {}",
                i,
                clip.path.display(),
                clip.width,
                clip.height,
                clip.fps,
                clip.pixel_format,
                frame.width,
                frame.height,
                frame.fps,
                frame.pixel_format
            )));
        }
    }
    Ok(frame)
}

/// Concat-demuxer list body: one `file '<abs path>'` line per clip.
pub fn concat_manifest(clips: &[Clip]) -> MediaResult<String> {
    let mut body = String::new();
    for clip in clips {
        let abs = std::path::absolute(&clip.path)?;
        // Single quotes close, escape and reopen inside a quoted path.
        let quoted = abs.to_string_lossy().replace('\'', "'\\''");
        body.push_str(&format!("file '{}'\n", quoted));
    }
    Ok(body)
}

/// Concatenate clips, in the given order, into `output`.
///
/// The clips must already share one frame format; a mismatch is an
/// `AssemblyPrecondition` error and nothing is rendered.
pub async fn concat_clips(clips: &[Clip], output: &Path, renderer: &dyn ExternalRenderer) -> MediaResult<Track> {
    let frame = check_uniform(clips)?;

    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut list = tempfile::Builder::new()
        .prefix("concat_")
        .suffix(".txt")
        .tempfile_in(&dir)?;
    list.write_all(concat_manifest(clips)?.as_bytes())?;
    list.flush()?;

    let cmd = FfmpegCommand::new(output).concat_input(list.path()).codec_copy();
    renderer.run(&cmd, None).await?;

    let duration: f64 = clips.iter().map(|c| c.duration).sum();
    info!(
        clips = clips.len(),
        duration,
        output = %output.display(),
        "Assembled visuals track"
    );

    Ok(Track {
        path: output.to_path_buf(),
        frame,
        duration,
        clip_count: clips.len(),
    })
}
