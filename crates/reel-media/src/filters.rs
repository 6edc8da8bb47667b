//! FFmpeg video filter builders shared by the adapters.

use std::path::Path;

use reel_models::FrameSpec;

/// Default font used for all drawn text.
pub const DEFAULT_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Scale to cover `width`x`height`, then center-crop to exactly that size.
pub fn cover_crop(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1",
        w = width,
        h = height
    )
}

/// Full conform chain: cover-crop to the frame, then force rate and format.
pub fn conform(frame: &FrameSpec) -> String {
    format!(
        "{},fps={},format={}",
        cover_crop(frame.width, frame.height),
        frame.fps,
        frame.pixel_format
    )
}

/// lavfi solid-color source covering the frame for `duration` seconds.
pub fn color_source(color: &str, frame: &FrameSpec, fps: u32, duration: f64) -> String {
    format!(
        "color=c={}:s={}:r={}:d={:.3}",
        color,
        frame.size_arg(),
        fps,
        duration
    )
}

/// Escape text for a single-quoted drawtext `text=` value.
///
/// Quotes are swapped for a typographic apostrophe and backslashes dropped,
/// so the only remaining special character is `:`.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => {}
            '\'' => out.push('\u{2019}'),
            ':' => out.push_str("\\:"),
            '\n' | '\r' | '\t' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Collapse runs of whitespace and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Options for one drawtext filter.
#[derive(Debug, Clone)]
pub struct TextStyle<'a> {
    pub font: &'a Path,
    pub size: u32,
    pub color: &'a str,
    /// x expression
    pub x: String,
    /// y expression
    pub y: String,
    pub shadow: bool,
}

impl<'a> TextStyle<'a> {
    /// Horizontally centered text at a fixed y.
    pub fn centered(font: &'a Path, size: u32, y: impl Into<String>) -> Self {
        Self {
            font,
            size,
            color: "white",
            x: "(w-text_w)/2".to_string(),
            y: y.into(),
            shadow: true,
        }
    }

    pub fn at(font: &'a Path, size: u32, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            font,
            size,
            color: "white",
            x: x.into(),
            y: y.into(),
            shadow: false,
        }
    }

    pub fn color(mut self, color: &'a str) -> Self {
        self.color = color;
        self
    }
}

/// drawtext filter with literal (non-expanded) text.
pub fn drawtext(text: &str, style: &TextStyle<'_>) -> String {
    let mut filter = format!(
        "drawtext=fontfile='{}':text='{}':expansion=none:fontcolor={}:fontsize={}:x='{}':y='{}'",
        style.font.display(),
        escape_drawtext(text),
        style.color,
        style.size,
        style.x,
        style.y
    );
    if style.shadow {
        filter.push_str(":shadowcolor=black@0.5:shadowx=2:shadowy=2");
    }
    filter
}

/// Thickness of a drawn box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxFill {
    Fill,
    Outline(u32),
}

/// drawbox filter; `enable` is an optional timeline expression.
pub fn drawbox(x: i64, y: i64, w: u32, h: u32, color: &str, fill: BoxFill, enable: Option<&str>) -> String {
    let t = match fill {
        BoxFill::Fill => "fill".to_string(),
        BoxFill::Outline(px) => px.to_string(),
    };
    let mut filter = format!("drawbox=x={}:y={}:w={}:h={}:color={}:t={}", x, y, w, h, color, t);
    if let Some(expr) = enable {
        filter.push_str(&format!(":enable='{}'", expr));
    }
    filter
}

/// Greedy word wrap to at most `max_lines` lines of `width` characters.
///
/// Words longer than `width` are hard-split. Overflowing text is dropped and
/// the last kept line ends with an ellipsis.
pub fn wrap_text(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            last.push('\u{2026}');
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conform_filter() {
        assert_eq!(
            conform(&FrameSpec::portrait()),
            "scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920,setsar=1,fps=30,format=yuv420p"
        );
    }

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("a:b"), "a\\:b");
        assert_eq!(escape_drawtext("it's"), "it\u{2019}s");
        assert_eq!(escape_drawtext("c:\\x"), "c\\:x");
    }

    #[test]
    fn test_drawtext_centered() {
        let font = Path::new("/f.ttf");
        let f = drawtext("Hi: there", &TextStyle::centered(font, 64, "120"));
        assert!(f.starts_with("drawtext=fontfile='/f.ttf':text='Hi\\: there'"));
        assert!(f.contains("fontsize=64"));
        assert!(f.contains("x='(w-text_w)/2':y='120'"));
    }

    #[test]
    fn test_drawbox_enable() {
        let f = drawbox(10, 20, 30, 40, "white@0.7", BoxFill::Outline(6), Some("gte(t,1)"));
        assert_eq!(f, "drawbox=x=10:y=20:w=30:h=40:color=white@0.7:t=6:enable='gte(t,1)'");
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 10, 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]);

        let lines = wrap_text("one two three four", 4, 2);
        assert_eq!(lines, vec!["one", "two\u{2026}"]);

        assert_eq!(wrap_text("abcdefgh", 3, 5), vec!["abc", "def", "gh"]);
        assert!(wrap_text("   ", 5, 3).is_empty());
    }
}
