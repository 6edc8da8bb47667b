//! Clip normalization to the canonical frame.

use std::path::PathBuf;
use tokio::sync::watch;
use tracing::debug;

use reel_models::{Clip, EncodingConfig, FrameSpec};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::filters::conform;
use crate::renderer::ExternalRenderer;

/// Path the normalized copy of `clip` is written to.
pub fn normalized_path(clip: &Clip) -> PathBuf {
    let stem = clip
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "clip".to_string());
    clip.path.with_file_name(format!("{}_norm.mp4", stem))
}

/// Plan the conform re-encode for a non-conforming clip.
pub fn plan_normalize(clip: &Clip, frame: &FrameSpec, encoding: &EncodingConfig) -> FfmpegCommand {
    FfmpegCommand::new(normalized_path(clip))
        .input(&clip.path)
        .video_filter(conform(frame))
        .duration(clip.duration)
        .no_audio()
        .frame_rate(frame.fps)
        .encoding(encoding, &frame.pixel_format)
}

/// Bring `clip` to `frame`.
///
/// A clip that already conforms is returned unchanged without touching the
/// renderer.
pub async fn normalize(
    clip: &Clip,
    frame: &FrameSpec,
    encoding: &EncodingConfig,
    renderer: &dyn ExternalRenderer,
    cancel: Option<watch::Receiver<bool>>,
) -> MediaResult<Clip> {
    if clip.conforms_to(frame) {
        return Ok(clip.clone());
    }

    debug!(
        path = %clip.path.display(),
        fps = clip.fps,
        width = clip.width,
        height = clip.height,
        "Normalizing clip"
    );

    let cmd = plan_normalize(clip, frame, encoding);
    renderer.run(&cmd, cancel).await.map_err(|e| {
        if e.is_interrupted() {
            e
        } else {
            MediaError::normalize_failed(format!("{}: {}", clip.path.display(), e))
        }
    })?;

    Ok(Clip::from_spec(cmd.output(), frame, clip.duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ExternalRenderer for CountingRenderer {
        async fn run(&self, _command: &FfmpegCommand, _cancel: Option<watch::Receiver<bool>>) -> MediaResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl ExternalRenderer for FailingRenderer {
        async fn run(&self, _command: &FfmpegCommand, _cancel: Option<watch::Receiver<bool>>) -> MediaResult<()> {
            Err(MediaError::ffmpeg_failed("boom", None, Some(1)))
        }
    }

    #[tokio::test]
    async fn test_conforming_clip_is_untouched() {
        let frame = FrameSpec::portrait();
        let clip = Clip::from_spec("/out/0001.mp4", &frame, 5.0);
        let renderer = CountingRenderer::default();

        let out = normalize(&clip, &frame, &EncodingConfig::default(), &renderer, None)
            .await
            .unwrap();

        assert_eq!(out, clip);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_off_spec_clip_is_conformed() {
        let frame = FrameSpec::portrait();
        let clip = Clip {
            fps: 24.0,
            ..Clip::from_spec("/out/0006.mp4", &frame, 6.0)
        };
        let renderer = CountingRenderer::default();

        let out = normalize(&clip, &frame, &EncodingConfig::default(), &renderer, None)
            .await
            .unwrap();

        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(out.path, PathBuf::from("/out/0006_norm.mp4"));
        assert!(out.conforms_to(&frame));
        assert!((out.duration - 6.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failure_is_normalize_error() {
        let frame = FrameSpec::portrait();
        let clip = Clip { width: 720, ..Clip::from_spec("/out/0007.mp4", &frame, 4.0) };
        let err = normalize(&clip, &frame, &EncodingConfig::default(), &FailingRenderer, None)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::NormalizeFailed(_)));
    }

    #[test]
    fn test_plan_forces_rate_and_format() {
        let frame = FrameSpec::portrait();
        let clip = Clip { fps: 24.0, ..Clip::from_spec("/out/a.mp4", &frame, 4.0) };
        let cmd = plan_normalize(&clip, &frame, &EncodingConfig::default());
        assert_eq!(cmd.output_value("-r"), Some("30"));
        assert!(cmd.output_value("-vf").unwrap().ends_with("fps=30,format=yuv420p"));
        assert_eq!(cmd.output_value("-t"), Some("4.000"));
    }
}
