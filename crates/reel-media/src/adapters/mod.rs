//! Adapter registry.
//!
//! Each adapter is a pure planner: it turns a [`RenderRequest`] into a
//! [`RenderPlan`] (an ffmpeg command plus the frame it will produce). The
//! registry maps adapter names to planners and runs the plan through an
//! [`ExternalRenderer`]. New strategies are added by registering another
//! name/function pair.

use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::debug;

use reel_models::{AdapterKind, Clip, EncodingConfig, FrameSpec, RenderRequest};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::filters::DEFAULT_FONT;
use crate::renderer::ExternalRenderer;

pub mod card;
pub mod diagram;
pub mod filler;
pub mod procedural;
pub mod slide;
pub mod stock;

/// Read-only configuration shared by every adapter.
#[derive(Debug, Clone)]
pub struct AdapterEnv {
    /// Canonical output frame
    pub frame: FrameSpec,
    pub encoding: EncodingConfig,
    pub font: PathBuf,
}

impl Default for AdapterEnv {
    fn default() -> Self {
        Self {
            frame: FrameSpec::portrait(),
            encoding: EncodingConfig::default(),
            font: PathBuf::from(DEFAULT_FONT),
        }
    }
}

/// A planned render and the frame format it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub command: FfmpegCommand,
    pub frame: FrameSpec,
}

impl RenderPlan {
    pub fn new(command: FfmpegCommand, frame: FrameSpec) -> Self {
        Self { command, frame }
    }
}

/// Planner signature every adapter implements.
pub type PlanFn = fn(&RenderRequest, &AdapterEnv) -> MediaResult<RenderPlan>;

/// Static mapping from adapter name to planner.
#[derive(Clone)]
pub struct AdapterRegistry {
    env: AdapterEnv,
    adapters: HashMap<&'static str, PlanFn>,
}

impl AdapterRegistry {
    /// An empty registry.
    pub fn new(env: AdapterEnv) -> Self {
        Self {
            env,
            adapters: HashMap::new(),
        }
    }

    /// A registry with all built-in adapters.
    pub fn with_defaults(env: AdapterEnv) -> Self {
        let mut registry = Self::new(env);
        registry.register(AdapterKind::Stock.as_str(), stock::plan);
        registry.register(AdapterKind::Card.as_str(), card::plan);
        registry.register(AdapterKind::Diagram.as_str(), diagram::plan);
        registry.register(AdapterKind::Slide.as_str(), slide::plan);
        registry.register(AdapterKind::Procedural.as_str(), procedural::plan);
        registry.register(AdapterKind::Filler.as_str(), filler::plan);
        registry
    }

    /// Register (or replace) a planner under `name`.
    pub fn register(&mut self, name: &'static str, plan: PlanFn) {
        self.adapters.insert(name, plan);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.adapters.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn env(&self) -> &AdapterEnv {
        &self.env
    }

    /// Plan without rendering.
    pub fn plan(&self, name: &str, req: &RenderRequest) -> MediaResult<RenderPlan> {
        let planner = self
            .adapters
            .get(name)
            .ok_or_else(|| MediaError::UnknownAdapter(name.to_string()))?;
        planner(req, &self.env)
    }

    /// Plan and render `req` with the named adapter.
    ///
    /// The returned clip carries the request duration and the plan's frame.
    /// Cancellation and timeouts pass through unchanged; every other failure
    /// is reported as `RenderFailed`.
    pub async fn render(
        &self,
        name: &str,
        req: &RenderRequest,
        renderer: &dyn ExternalRenderer,
        cancel: Option<watch::Receiver<bool>>,
    ) -> MediaResult<Clip> {
        let plan = self.plan(name, req)?;

        debug!(adapter = name, output = %req.output.display(), "Rendering clip");

        renderer.run(&plan.command, cancel).await.map_err(|e| {
            if e.is_interrupted() {
                e
            } else {
                MediaError::render_failed(name, e.to_string())
            }
        })?;

        if !tokio::fs::try_exists(&req.output).await.unwrap_or(false) {
            return Err(MediaError::render_failed(name, "renderer produced no output file"));
        }

        Ok(Clip::from_spec(&req.output, &plan.frame, req.duration))
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.names())
            .field("frame", &self.env.frame)
            .finish()
    }
}

/// Background input: the looped episode background, or a solid color.
pub(crate) fn background_input(
    cmd: FfmpegCommand,
    req: &RenderRequest,
    env: &AdapterEnv,
    fallback_color: &str,
    fps: u32,
) -> FfmpegCommand {
    match &req.background {
        Some(bg) => cmd.looped_input(bg),
        None => cmd.lavfi_input(crate::filters::color_source(
            fallback_color,
            &env.frame,
            fps,
            req.duration,
        )),
    }
}

/// Shared output tail: exact duration, no audio, frame rate and encoding.
pub(crate) fn finish_output(cmd: FfmpegCommand, req: &RenderRequest, env: &AdapterEnv, fps: u32) -> FfmpegCommand {
    cmd.duration(req.duration)
        .no_audio()
        .frame_rate(fps)
        .encoding(&env.encoding, &env.frame.pixel_format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_register_every_adapter() {
        let registry = AdapterRegistry::with_defaults(AdapterEnv::default());
        for kind in AdapterKind::ALL {
            assert!(registry.contains(kind.as_str()), "missing {}", kind);
        }
        assert_eq!(registry.names().len(), AdapterKind::ALL.len());
    }

    #[test]
    fn test_unknown_adapter() {
        let registry = AdapterRegistry::new(AdapterEnv::default());
        let req = RenderRequest::new("/tmp/x.mp4", 4.0);
        assert!(matches!(
            registry.plan("slide", &req),
            Err(MediaError::UnknownAdapter(_))
        ));
    }

    #[test]
    fn test_register_custom_planner() {
        fn solid(req: &RenderRequest, env: &AdapterEnv) -> MediaResult<RenderPlan> {
            let cmd = FfmpegCommand::new(&req.output).lavfi_input("color=c=red");
            Ok(RenderPlan::new(cmd, env.frame.clone()))
        }

        let mut registry = AdapterRegistry::new(AdapterEnv::default());
        registry.register("solid", solid);
        let plan = registry.plan("solid", &RenderRequest::new("/tmp/s.mp4", 3.0)).unwrap();
        assert_eq!(plan.command.input_count(), 1);
    }
}
