//! Card composite: a bordered panel over the background with a title line
//! and keyword bullets.

use reel_models::RenderRequest;

use super::{background_input, finish_output, AdapterEnv, RenderPlan};
use crate::command::FfmpegCommand;
use crate::error::MediaResult;
use crate::filters::{clean_text, cover_crop, drawbox, drawtext, BoxFill, TextStyle};

const CARD_MARGIN_X: u32 = 72;
const CARD_MARGIN_Y: u32 = 180;
const PANEL_WIDTH: u32 = 960;
const PANEL_OFFSET_Y: u32 = 160;
const TITLE_OFFSET_Y: u32 = 40;
const TITLE_SIZE: u32 = 56;
const BULLET_GAP_Y: u32 = 120;
const BULLET_SIZE: u32 = 40;
const BULLET_LINE_HEIGHT: u32 = 56;
const MAX_BULLETS: usize = 4;
const FALLBACK_BACKGROUND: &str = "0x0e1116";

/// Pixel layout of a card for a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardLayout {
    pub card_x: u32,
    pub card_y: u32,
    pub card_w: u32,
    pub card_h: u32,
    pub panel_x: u32,
    pub panel_y: u32,
    pub panel_w: u32,
    pub panel_h: u32,
    pub title_y: u32,
    pub bullets_y: u32,
}

impl CardLayout {
    pub fn for_frame(width: u32, height: u32) -> Self {
        let card_w = width.saturating_sub(CARD_MARGIN_X * 2);
        let card_h = height.saturating_sub(CARD_MARGIN_Y * 2);
        let panel_w = PANEL_WIDTH.min(width);
        // 16:9, kept even for yuv420p
        let panel_h = (panel_w * 9 / 16) & !1;
        let panel_y = CARD_MARGIN_Y + PANEL_OFFSET_Y;
        Self {
            card_x: CARD_MARGIN_X,
            card_y: CARD_MARGIN_Y,
            card_w,
            card_h,
            panel_x: (width - panel_w) / 2,
            panel_y,
            panel_w,
            panel_h,
            title_y: CARD_MARGIN_Y + TITLE_OFFSET_Y,
            bullets_y: panel_y + panel_h + BULLET_GAP_Y,
        }
    }
}

/// Card over the background; the panel shows the stock clip, else the
/// background itself, else stays an empty framed box.
pub fn plan(req: &RenderRequest, env: &AdapterEnv) -> MediaResult<RenderPlan> {
    let frame = &env.frame;
    let layout = CardLayout::for_frame(frame.width, frame.height);

    let panel_source = req.source_clip.as_ref().or(req.background.as_ref());

    let mut cmd = background_input(FfmpegCommand::new(&req.output), req, env, FALLBACK_BACKGROUND, frame.fps);
    if let Some(source) = panel_source {
        cmd = cmd.looped_input(source);
    }

    let shadow = drawbox(
        (layout.card_x + 12) as i64,
        (layout.card_y + 16) as i64,
        layout.card_w,
        layout.card_h,
        "black@0.35",
        BoxFill::Outline(20),
        None,
    );
    let fill = drawbox(
        layout.card_x as i64,
        layout.card_y as i64,
        layout.card_w,
        layout.card_h,
        "white@0.06",
        BoxFill::Fill,
        None,
    );
    let border = drawbox(
        layout.card_x as i64,
        layout.card_y as i64,
        layout.card_w,
        layout.card_h,
        "white@0.7",
        BoxFill::Outline(6),
        None,
    );

    let mut graph = format!(
        "[0:v]{},format={},{},{},{}[bg];",
        cover_crop(frame.width, frame.height),
        frame.pixel_format,
        shadow,
        fill,
        border
    );

    if panel_source.is_some() {
        graph.push_str(&format!(
            "[1:v]{}[panel];[bg][panel]overlay=x={}:y={}:format=auto:shortest=1[base];",
            cover_crop(layout.panel_w, layout.panel_h),
            layout.panel_x,
            layout.panel_y
        ));
    } else {
        let frame_box = drawbox(
            layout.panel_x as i64,
            layout.panel_y as i64,
            layout.panel_w,
            layout.panel_h,
            "white@0.25",
            BoxFill::Outline(4),
            None,
        );
        graph.push_str(&format!("[bg]{}[base];", frame_box));
    }

    let mut texts = Vec::new();
    let title = clean_text(req.headline());
    if !title.is_empty() {
        texts.push(drawtext(
            &title,
            &TextStyle::centered(&env.font, TITLE_SIZE, layout.title_y.to_string()),
        ));
    }
    for (i, keyword) in req.keywords.iter().take(MAX_BULLETS).enumerate() {
        let y = layout.bullets_y + i as u32 * BULLET_LINE_HEIGHT;
        texts.push(drawtext(
            &format!("\u{2022} {}", clean_text(keyword)),
            &TextStyle::centered(&env.font, BULLET_SIZE, y.to_string()),
        ));
    }

    if texts.is_empty() {
        graph.push_str("[base]null[vout]");
    } else {
        graph.push_str(&format!("[base]{}[vout]", texts.join(",")));
    }

    let cmd = cmd.filter_complex(graph).map("[vout]");
    let cmd = finish_output(cmd, req, env, frame.fps);

    Ok(RenderPlan::new(cmd, frame.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_portrait_layout() {
        let layout = CardLayout::for_frame(1080, 1920);
        assert_eq!((layout.card_x, layout.card_y), (72, 180));
        assert_eq!((layout.card_w, layout.card_h), (936, 1560));
        assert_eq!((layout.panel_w, layout.panel_h), (960, 540));
        assert_eq!((layout.panel_x, layout.panel_y), (60, 340));
        assert_eq!(layout.title_y, 220);
        assert_eq!(layout.bullets_y, 1000);
    }

    #[test]
    fn test_card_with_stock_panel() {
        let req = RenderRequest::new("/out/0002.mp4", 6.0)
            .with_text("Eigenvectors", "")
            .with_keywords(vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()])
            .with_background(Some(PathBuf::from("/bg.mp4")))
            .with_source_clip(Some(PathBuf::from("/stock/eigen.mp4")));
        let plan = plan(&req, &AdapterEnv::default()).unwrap();

        let sources: Vec<_> = plan.command.input_sources().collect();
        assert_eq!(sources, vec!["/bg.mp4", "/stock/eigen.mp4"]);

        let graph = plan.command.output_value("-filter_complex").unwrap();
        assert!(graph.contains("overlay=x=60:y=340"));
        assert!(graph.contains("text='Eigenvectors'"));
        assert_eq!(graph.matches("\u{2022} ").count(), 4);
        assert_eq!(plan.command.output_value("-map"), Some("[vout]"));
    }

    #[test]
    fn test_card_without_any_video_source() {
        let req = RenderRequest::new("/out/0002.mp4", 6.0).with_text("", "Body only");
        let plan = plan(&req, &AdapterEnv::default()).unwrap();
        assert_eq!(plan.command.input_count(), 1);
        let graph = plan.command.output_value("-filter_complex").unwrap();
        assert!(!graph.contains("overlay"));
        assert!(graph.contains("text='Body only'"));
    }
}
