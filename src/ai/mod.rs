mod gemini;

use async_trait::async_trait;

use crate::error::Result;

pub use gemini::GeminiGenerator;

/// Publishing channel a caption is written for. Each channel has its own
/// formatting rules, both in the prompt and in the fallback template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Telegram,
    Instagram,
}

/// The text-generation collaborator. The processor never lets a failure from
/// this trait escape an item: any error is absorbed into the deterministic
/// fallback captions.
#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    async fn one_liner(&self, title: &str, summary: &str) -> Result<String>;

    async fn channel_caption(
        &self,
        channel: Channel,
        title: &str,
        summary: &str,
        source: &str,
        link: &str,
    ) -> Result<String>;
}

/// Character-safe truncation; byte slicing would split Bengali codepoints.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        // 6 Bengali codepoints, many more bytes
        assert_eq!(truncate_chars("তামান্না", 4), "তামা");
    }
}
