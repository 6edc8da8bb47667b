//! Deterministic procedural animations for domain series.
//!
//! Everything is drawn with per-frame drawtext/drawbox expressions over a
//! lavfi color source, so a clip is fully determined by its mode, seed and
//! duration. Clips come out at their native 24 fps and are conformed by the
//! normalizer like any other off-spec input.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::{PI, TAU};
use std::path::Path;

use reel_models::{AnimationMode, FrameSpec, RenderRequest};

use super::{finish_output, AdapterEnv, RenderPlan};
use crate::command::FfmpegCommand;
use crate::error::MediaResult;
use crate::filters::{clean_text, color_source, drawbox, drawtext, wrap_text, BoxFill, TextStyle};

/// Native frame rate of procedural clips.
pub const PROCEDURAL_FPS: u32 = 24;

const BACKGROUND: &str = "0x0e1116";
const DOT: &str = "\u{25CF}";
const TITLE_SIZE: u32 = 52;
const PALETTE: &[&str] = &["0x4fc3f7", "0xffb74d", "0x81c784", "0xe57373", "0xba68c8", "0x67e8f9"];
const DIM: &str = "0x334155";
const NODE: &str = "0xe2e8f0";

/// Filter accumulator with drawing helpers.
struct Canvas<'a> {
    font: &'a Path,
    width: u32,
    height: u32,
    filters: Vec<String>,
}

impl<'a> Canvas<'a> {
    fn new(font: &'a Path, frame: &FrameSpec) -> Self {
        Self {
            font,
            width: frame.width,
            height: frame.height,
            filters: vec![format!("format={}", frame.pixel_format)],
        }
    }

    fn cx(&self) -> f64 {
        self.width as f64 / 2.0
    }

    /// Drawing center sits a little below the frame center, under the title.
    fn cy(&self) -> f64 {
        self.height as f64 / 2.0 + 80.0
    }

    fn unit(&self) -> f64 {
        self.width as f64 * 0.32
    }

    fn push(&mut self, filter: String) {
        self.filters.push(filter);
    }

    /// A dot centered on the (possibly time-varying) point `x`,`y`.
    fn dot(&mut self, x: &str, y: &str, size: u32, color: &'static str, enable: Option<&str>) {
        let style = TextStyle::at(self.font, size, format!("{}-text_w/2", x), format!("{}-text_h/2", y)).color(color);
        let mut filter = drawtext(DOT, &style);
        if let Some(expr) = enable {
            filter.push_str(&format!(":enable='{}'", expr));
        }
        self.push(filter);
    }

    /// Dotted arrow from the center along unit direction (`ux`, `uy`).
    fn arrow(&mut self, length: &str, ux: &str, uy: &str, color: &'static str) {
        const DOTS: usize = 12;
        let (cx, cy) = (self.cx(), self.cy());
        for k in 1..=DOTS {
            let f = k as f64 / DOTS as f64;
            let x = format!("{:.1}+{:.3}*({})*({})", cx, f, length, ux);
            let y = format!("{:.1}-{:.3}*({})*({})", cy, f, length, uy);
            let size = if k == DOTS { 44 } else { 22 };
            self.dot(&x, &y, size, color, None);
        }
    }

    /// Static dotted segment between two points.
    fn segment(&mut self, a: (f64, f64), b: (f64, f64), dots: usize, color: &'static str) {
        for k in 1..dots {
            let f = k as f64 / dots as f64;
            let x = a.0 + (b.0 - a.0) * f;
            let y = a.1 + (b.1 - a.1) * f;
            self.dot(&format!("{:.1}", x), &format!("{:.1}", y), 14, color, None);
        }
    }

    fn axes(&mut self) {
        let (cx, cy) = (self.cx() as i64, self.cy() as i64);
        self.push(drawbox(0, cy - 1, self.width, 2, "white@0.3", BoxFill::Fill, None));
        self.push(drawbox(cx - 1, 260, 2, self.height - 420, "white@0.3", BoxFill::Fill, None));
    }

    fn ring_points(&self, n: usize, radius: f64) -> Vec<(f64, f64)> {
        (0..n)
            .map(|i| {
                let a = TAU * i as f64 / n as f64 - PI / 2.0;
                (self.cx() + radius * a.cos(), self.cy() + radius * a.sin())
            })
            .collect()
    }

    fn title(&mut self, text: &str) {
        let line_height = TITLE_SIZE + TITLE_SIZE / 4;
        for (i, line) in wrap_text(&clean_text(text), 26, 2).iter().enumerate() {
            let y = 120 + i as u32 * line_height;
            self.push(drawtext(line, &TextStyle::centered(self.font, TITLE_SIZE, y.to_string())));
        }
    }
}

/// Pick the mode's animation and draw it for `duration` seconds.
pub fn plan(req: &RenderRequest, env: &AdapterEnv) -> MediaResult<RenderPlan> {
    let frame = FrameSpec {
        fps: PROCEDURAL_FPS,
        ..env.frame.clone()
    };
    let mode = req.mode.unwrap_or(AnimationMode::BarChart);
    let mut rng = StdRng::seed_from_u64(req.seed);
    let mut canvas = Canvas::new(&env.font, &frame);

    match mode {
        AnimationMode::VectorField => vector_field(&mut canvas, &mut rng),
        AnimationMode::Basis3d => basis3d(&mut canvas, &mut rng),
        AnimationMode::Rotation => rotation(&mut canvas, &mut rng),
        AnimationMode::Projection => projection(&mut canvas, &mut rng),
        AnimationMode::AgentGraph => agent_graph(&mut canvas, &mut rng),
        AnimationMode::MessagePulse => message_pulse(&mut canvas, &mut rng),
        AnimationMode::BarChart => bar_chart(&mut canvas, &mut rng, req.duration),
    }
    canvas.title(req.headline());

    let cmd = FfmpegCommand::new(&req.output)
        .lavfi_input(color_source(BACKGROUND, &frame, frame.fps, req.duration))
        .video_filter(canvas.filters.join(","));
    let cmd = finish_output(cmd, req, env, frame.fps);

    Ok(RenderPlan::new(cmd, frame))
}

fn vector_field(canvas: &mut Canvas<'_>, rng: &mut StdRng) {
    canvas.push("drawgrid=width=120:height=120:thickness=2:color=white@0.08".to_string());
    canvas.axes();

    let unit = canvas.unit();
    let p1 = rng.random_range(0.0..TAU);
    let w1 = rng.random_range(0.3..0.8);
    let p2 = rng.random_range(0.0..TAU);
    let w2 = rng.random_range(0.2..0.6);

    let a1 = format!("{:.3}+{:.3}*t", p1, w1);
    let len1 = format!("{:.1}*(1+0.15*sin(1.3*t))", unit);
    canvas.arrow(&len1, &format!("cos({})", a1), &format!("sin({})", a1), PALETTE[0]);

    let a2 = format!("{:.3}-{:.3}*t", p2, w2);
    let len2 = format!("{:.1}", unit * 0.7);
    canvas.arrow(&len2, &format!("cos({})", a2), &format!("sin({})", a2), PALETTE[1]);
}

fn basis3d(canvas: &mut Canvas<'_>, rng: &mut StdRng) {
    let unit = format!("{:.1}", canvas.unit());
    let tilt: f64 = rng.random_range(0.3..0.6);
    let (st, ct) = (tilt.sin(), tilt.cos());
    let a = format!("{:.3}+{:.3}*t", rng.random_range(0.0..TAU), rng.random_range(0.4..0.9));

    // Axes rotate about the vertical, seen from a camera tilted by `tilt`.
    canvas.arrow(&unit, &format!("cos({})", a), &format!("{:.4}*sin({})", st, a), PALETTE[3]);
    canvas.arrow(&unit, "0", &format!("{:.4}", ct), PALETTE[2]);
    canvas.arrow(&unit, &format!("sin({})", a), &format!("-{:.4}*cos({})", st, a), PALETTE[0]);
}

fn rotation(canvas: &mut Canvas<'_>, rng: &mut StdRng) {
    canvas.axes();
    let unit = canvas.unit();
    for (x, y) in canvas.ring_points(36, unit) {
        canvas.dot(&format!("{:.1}", x), &format!("{:.1}", y), 12, DIM, None);
    }
    let a = format!("{:.3}+{:.3}*t", rng.random_range(0.0..TAU), rng.random_range(0.5..1.1));
    canvas.arrow(&format!("{:.1}", unit), &format!("cos({})", a), &format!("sin({})", a), PALETTE[0]);
}

fn projection(canvas: &mut Canvas<'_>, rng: &mut StdRng) {
    canvas.axes();
    let unit = canvas.unit();
    let len = format!("{:.1}", unit);
    let a = format!("{:.3}+0.6*sin(0.8*t)", rng.random_range(0.4..1.2));
    canvas.arrow(&len, &format!("cos({})", a), &format!("sin({})", a), PALETTE[0]);

    // Shadow on the x axis and the drop line from the tip.
    canvas.arrow(&len, &format!("cos({})", a), "0", PALETTE[1]);
    let (cx, cy) = (canvas.cx(), canvas.cy());
    for k in 1..8 {
        let f = k as f64 / 8.0;
        let x = format!("{:.1}+{:.1}*cos({})", cx, unit, a);
        let y = format!("{:.1}-{:.3}*{:.1}*sin({})", cy, f, unit, a);
        canvas.dot(&x, &y, 10, DIM, None);
    }
}

fn draw_agents(canvas: &mut Canvas<'_>, points: &[(f64, f64)]) {
    for (i, &(x, y)) in points.iter().enumerate() {
        canvas.push(drawbox(x as i64 - 20, y as i64 - 20, 40, 40, NODE, BoxFill::Fill, None));
        let label = TextStyle::at(canvas.font, 28, format!("{:.0}-text_w/2", x), format!("{:.0}", y + 34.0)).color("0x94a3b8");
        canvas.push(drawtext(&format!("A{}", i + 1), &label));
    }
}

fn agent_graph(canvas: &mut Canvas<'_>, rng: &mut StdRng) {
    let n: usize = rng.random_range(5..=8);
    let points = canvas.ring_points(n, canvas.unit());

    for i in 0..n {
        canvas.segment(points[i], points[(i + 1) % n], 8, DIM);
    }
    let chord_end = rng.random_range(2..n - 1);
    canvas.segment(points[0], points[chord_end], 10, DIM);
    draw_agents(canvas, &points);

    // Highlight cycles through agents twice a second.
    for (i, &(x, y)) in points.iter().enumerate() {
        let enable = format!("eq(mod(floor(t*2),{}),{})", n, i);
        canvas.push(drawbox(x as i64 - 32, y as i64 - 32, 64, 64, PALETTE[5], BoxFill::Outline(4), Some(&enable)));
    }
}

fn message_pulse(canvas: &mut Canvas<'_>, rng: &mut StdRng) {
    let n: usize = rng.random_range(5..=7);
    let points = canvas.ring_points(n, canvas.unit());

    for i in 0..n {
        canvas.segment(points[i], points[(i + 1) % n], 8, DIM);
    }
    draw_agents(canvas, &points);

    // Each pulse walks the ring one edge per 1/speed seconds.
    for pulse in 0..3 {
        let speed: f64 = rng.random_range(0.8..1.6);
        let phase = pulse as f64 * n as f64 / 3.0;
        let progress = format!("(t*{:.3}+{:.3})", speed, phase);
        let color = PALETTE[pulse % PALETTE.len()];
        for edge in 0..n {
            let (a, b) = (points[edge], points[(edge + 1) % n]);
            let x = format!("{:.1}+{:.1}*mod({},1)", a.0, b.0 - a.0, progress);
            let y = format!("{:.1}+{:.1}*mod({},1)", a.1, b.1 - a.1, progress);
            let enable = format!("eq(mod(floor({}),{}),{})", progress, n, edge);
            canvas.dot(&x, &y, 30, color, Some(&enable));
        }
    }
}

fn bar_chart(canvas: &mut Canvas<'_>, rng: &mut StdRng, duration: f64) {
    const SEGMENTS: u32 = 12;
    let bars: u32 = rng.random_range(4..=6);
    let margin = 120u32;
    let slot = (canvas.width - 2 * margin) / bars;
    let bar_w = slot * 3 / 5;
    let base = (canvas.height as f64 * 0.78) as i64;
    let max_h = canvas.height as f64 * 0.45;
    let grow = duration * 0.6;

    canvas.push(drawbox(margin as i64 - 20, base, canvas.width - 2 * margin + 40, 4, "white@0.6", BoxFill::Fill, None));

    for i in 0..bars {
        let height: f64 = max_h * rng.random_range(0.3..1.0);
        let seg_h = (height / SEGMENTS as f64).max(2.0) as u32;
        let x = (margin + i * slot + (slot - bar_w) / 2) as i64;
        let color = PALETTE[i as usize % PALETTE.len()];
        for j in 0..SEGMENTS {
            let y = base - ((j + 1) * seg_h) as i64;
            let enable = format!("gte(t,{:.3})", grow * j as f64 / SEGMENTS as f64);
            canvas.push(drawbox(x, y, bar_w, seg_h, color, BoxFill::Fill, Some(&enable)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: AnimationMode, seed: u64) -> RenderRequest {
        RenderRequest::new("/out/0006.mp4", 6.0)
            .with_text("Rotations", "")
            .with_mode(Some(mode), seed)
    }

    #[test]
    fn test_same_seed_same_plan() {
        let env = AdapterEnv::default();
        for mode in AnimationMode::ALL {
            let a = plan(&request(*mode, 42), &env).unwrap();
            let b = plan(&request(*mode, 42), &env).unwrap();
            assert_eq!(a, b, "{} is not deterministic", mode);
        }
    }

    #[test]
    fn test_seed_changes_parameters() {
        let env = AdapterEnv::default();
        let a = plan(&request(AnimationMode::BarChart, 1), &env).unwrap();
        let b = plan(&request(AnimationMode::BarChart, 2), &env).unwrap();
        assert_ne!(a.command, b.command);
    }

    #[test]
    fn test_native_frame_rate() {
        let plan = plan(&request(AnimationMode::Rotation, 7), &AdapterEnv::default()).unwrap();
        assert_eq!(plan.frame.fps, PROCEDURAL_FPS);
        assert_eq!(plan.command.output_value("-r"), Some("24"));
        assert_eq!(plan.command.output_value("-t"), Some("6.000"));
        assert!(plan.command.output_value("-vf").unwrap().contains("text='Rotations'"));
    }

    #[test]
    fn test_bar_chart_grows_over_time() {
        let plan = plan(&request(AnimationMode::BarChart, 3), &AdapterEnv::default()).unwrap();
        let vf = plan.command.output_value("-vf").unwrap();
        assert!(vf.contains("enable='gte(t,0.000)'"));
        assert!(vf.contains("enable='gte(t,3.300)'"));
    }
}
