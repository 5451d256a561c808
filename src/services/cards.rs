use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AppError, Result};

const CARD_SIZE: u32 = 1080;
const PADDING: u32 = 80;
const TITLE_FONT_SIZE: u32 = 60;
const META_FONT_SIZE: u32 = 36;

/// Wrap width in characters at the title font size.
const TITLE_WRAP_CHARS: usize = 28;

/// The card-rendering collaborator. Unlike caption generation, a render
/// failure is NOT absorbed: it fails the whole item.
#[async_trait]
pub trait CardRenderer: Send + Sync {
    async fn render(&self, title: &str, source: &str, date: &str) -> Result<String>;
}

/// Writes a 1080x1080 SVG news card: wrapped headline on a dark background,
/// "source • date" meta line at the bottom.
pub struct SvgCardRenderer {
    output_dir: PathBuf,
    sequence: AtomicU32,
}

impl SvgCardRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            sequence: AtomicU32::new(0),
        }
    }

    fn build_svg(title: &str, source: &str, date: &str) -> String {
        let mut body = String::new();

        let mut y = PADDING + TITLE_FONT_SIZE;
        for line in wrap_text(title, TITLE_WRAP_CHARS) {
            body.push_str(&format!(
                r##"  <text x="{PADDING}" y="{y}" font-size="{TITLE_FONT_SIZE}" fill="#ffffff" font-family="sans-serif">{}</text>
"##,
                escape_xml(&line)
            ));
            y += TITLE_FONT_SIZE + 10;
        }

        let meta_text = if source.is_empty() {
            date.to_string()
        } else {
            format!("{source} • {date}")
        };
        let meta_y = CARD_SIZE - PADDING - META_FONT_SIZE;
        body.push_str(&format!(
            r##"  <text x="{PADDING}" y="{meta_y}" font-size="{META_FONT_SIZE}" fill="#c8c8c8" font-family="sans-serif">{}</text>
"##,
            escape_xml(&meta_text)
        ));

        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{CARD_SIZE}" height="{CARD_SIZE}" viewBox="0 0 {CARD_SIZE} {CARD_SIZE}">
  <rect width="{CARD_SIZE}" height="{CARD_SIZE}" fill="#0a0a0a"/>
{body}</svg>
"##
        )
    }
}

#[async_trait]
impl CardRenderer for SvgCardRenderer {
    async fn render(&self, title: &str, source: &str, date: &str) -> Result<String> {
        let now = Utc::now();
        let date = if date.is_empty() {
            now.format("%d %b %Y").to_string()
        } else {
            date.to_string()
        };

        let svg = Self::build_svg(title, source, &date);

        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| AppError::Card(format!("create {:?}: {e}", self.output_dir)))?;

        // Timestamp plus sequence number; several items render within a second.
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let filename = format!("card_{}_{seq:03}.svg", now.format("%Y%m%d_%H%M%S"));
        let out_path = self.output_dir.join(filename);

        std::fs::write(&out_path, svg)
            .map_err(|e| AppError::Card(format!("write {out_path:?}: {e}")))?;

        Ok(out_path.to_string_lossy().to_string())
    }
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current_chars > 0 && current_chars + 1 + word_chars > max_chars {
            lines.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if current_chars > 0 {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
