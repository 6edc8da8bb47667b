//! Concept diagram: a header band of keyword tokens over a centered caption.

use reel_models::RenderRequest;

use super::{finish_output, AdapterEnv, RenderPlan};
use crate::command::FfmpegCommand;
use crate::error::MediaResult;
use crate::filters::{clean_text, color_source, drawbox, drawtext, wrap_text, BoxFill, TextStyle};

const BACKGROUND: &str = "0x0e1116";
const BAND_COLOR: &str = "0x1e2a37";
const BAND_HEIGHT: u32 = 160;
const TOKEN_MAX_CHARS: usize = 12;
const HEADER_SIZE: u32 = 44;
const CAPTION_SIZE: u32 = 52;
const CAPTION_WRAP: usize = 28;
const CAPTION_MAX_LINES: usize = 6;

/// Header text: keyword tokens, each truncated, joined by bullets.
pub fn header_text(keywords: &[String]) -> String {
    let tokens: Vec<String> = keywords
        .iter()
        .map(|k| clean_text(k))
        .filter(|k| !k.is_empty())
        .map(|k| k.chars().take(TOKEN_MAX_CHARS).collect())
        .collect();
    if tokens.is_empty() {
        "concept".to_string()
    } else {
        tokens.join(" \u{2022} ")
    }
}

pub fn plan(req: &RenderRequest, env: &AdapterEnv) -> MediaResult<RenderPlan> {
    let frame = &env.frame;

    let mut filters = vec![
        format!("format={}", frame.pixel_format),
        drawbox(0, 0, frame.width, BAND_HEIGHT, BAND_COLOR, BoxFill::Fill, None),
        drawtext(
            &header_text(&req.keywords),
            &TextStyle::at(&env.font, HEADER_SIZE, "40", "60"),
        ),
    ];

    let lines = wrap_text(&clean_text(req.headline()), CAPTION_WRAP, CAPTION_MAX_LINES);
    let line_height = CAPTION_SIZE + CAPTION_SIZE / 3;
    let block = line_height * lines.len() as u32;
    let top = (frame.height.saturating_sub(block)) / 2;
    for (i, line) in lines.iter().enumerate() {
        let y = top + i as u32 * line_height;
        filters.push(drawtext(
            line,
            &TextStyle::centered(&env.font, CAPTION_SIZE, y.to_string()),
        ));
    }

    let cmd = FfmpegCommand::new(&req.output)
        .lavfi_input(color_source(BACKGROUND, frame, frame.fps, req.duration))
        .video_filter(filters.join(","));
    let cmd = finish_output(cmd, req, env, frame.fps);

    Ok(RenderPlan::new(cmd, frame.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_text_truncates_tokens() {
        let keywords = vec!["eigendecomposition".to_string(), "flow".to_string()];
        assert_eq!(header_text(&keywords), "eigendecompo \u{2022} flow");
        assert_eq!(header_text(&[]), "concept");
    }

    #[test]
    fn test_diagram_plan() {
        let req = RenderRequest::new("/out/0003.mp4", 4.5)
            .with_text("How gradients flow", "")
            .with_keywords(vec!["flow".into(), "graph".into()]);
        let plan = plan(&req, &AdapterEnv::default()).unwrap();

        let sources: Vec<_> = plan.command.input_sources().collect();
        assert_eq!(sources, vec!["color=c=0x0e1116:s=1080x1920:r=30:d=4.500"]);

        let vf = plan.command.output_value("-vf").unwrap();
        assert!(vf.contains("drawbox=x=0:y=0:w=1080:h=160:color=0x1e2a37:t=fill"));
        assert!(vf.contains("text='flow \u{2022} graph'"));
        assert!(vf.contains("text='How gradients flow'"));
        assert_eq!(plan.frame.fps, 30);
    }
}
