//! Solid-color last resort.

use reel_models::RenderRequest;

use super::{finish_output, AdapterEnv, RenderPlan};
use crate::command::FfmpegCommand;
use crate::error::MediaResult;
use crate::filters::color_source;

const FILLER_COLOR: &str = "black";

pub fn plan(req: &RenderRequest, env: &AdapterEnv) -> MediaResult<RenderPlan> {
    let frame = &env.frame;
    let cmd = FfmpegCommand::new(&req.output)
        .lavfi_input(color_source(FILLER_COLOR, frame, frame.fps, req.duration))
        .video_filter(format!("format={}", frame.pixel_format));
    let cmd = finish_output(cmd, req, env, frame.fps);
    Ok(RenderPlan::new(cmd, frame.clone()))
}
