//! Stock footage placement.

use reel_models::RenderRequest;

use super::{finish_output, AdapterEnv, RenderPlan};
use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::filters::conform;

/// Cover-crop the chosen clip (or the background) to the frame.
///
/// The source is looped so short clips still fill the requested duration.
pub fn plan(req: &RenderRequest, env: &AdapterEnv) -> MediaResult<RenderPlan> {
    let source = req
        .source_clip
        .as_ref()
        .or(req.background.as_ref())
        .ok_or_else(|| MediaError::missing_resource("stock adapter needs a source clip or background"))?;

    let cmd = FfmpegCommand::new(&req.output)
        .looped_input(source)
        .video_filter(conform(&env.frame));
    let cmd = finish_output(cmd, req, env, env.frame.fps);

    Ok(RenderPlan::new(cmd, env.frame.clone()))
}
