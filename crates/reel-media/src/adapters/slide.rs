//! Full-bleed title and body card. Depends on nothing but text rendering,
//! which makes it the universal fallback.

use reel_models::RenderRequest;

use super::{finish_output, AdapterEnv, RenderPlan};
use crate::command::FfmpegCommand;
use crate::error::MediaResult;
use crate::filters::{clean_text, color_source, drawtext, wrap_text, TextStyle};

const BACKGROUND: &str = "0x101426";
const TITLE_Y: u32 = 120;
const TITLE_SIZE: u32 = 64;
const TITLE_WRAP: usize = 24;
const BODY_SIZE: u32 = 48;
const BODY_WRAP: usize = 30;
const BODY_MAX_LINES: usize = 10;

pub fn plan(req: &RenderRequest, env: &AdapterEnv) -> MediaResult<RenderPlan> {
    let frame = &env.frame;
    let mut filters = vec![format!("format={}", frame.pixel_format)];

    let title = clean_text(&req.title);
    if !title.is_empty() {
        let line_height = TITLE_SIZE + TITLE_SIZE / 4;
        for (i, line) in wrap_text(&title, TITLE_WRAP, 2).iter().enumerate() {
            let y = TITLE_Y + i as u32 * line_height;
            filters.push(drawtext(line, &TextStyle::centered(&env.font, TITLE_SIZE, y.to_string())));
        }
    }

    let body = clean_text(&req.body);
    let lines = wrap_text(&body, BODY_WRAP, BODY_MAX_LINES);
    let line_height = BODY_SIZE + BODY_SIZE / 3;
    let top = frame.height.saturating_sub(line_height * lines.len() as u32) / 2;
    for (i, line) in lines.iter().enumerate() {
        let y = top + i as u32 * line_height;
        filters.push(drawtext(line, &TextStyle::centered(&env.font, BODY_SIZE, y.to_string())));
    }

    let cmd = FfmpegCommand::new(&req.output)
        .lavfi_input(color_source(BACKGROUND, frame, frame.fps, req.duration))
        .video_filter(filters.join(","));
    let cmd = finish_output(cmd, req, env, frame.fps);

    Ok(RenderPlan::new(cmd, frame.clone()))
}
