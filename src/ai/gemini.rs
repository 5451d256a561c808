use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::{truncate_chars, CaptionGenerator, Channel};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Hard cap on the one-line summary, applied even when the model ignores
/// its instructions.
const ONE_LINER_MAX_CHARS: usize = 140;

const SYSTEM_PROMPT: &str = r#"You are a Bengali Tollywood entertainment news editor.

Rules:
- If the title is Bangla, respond ONLY in Bangla.
- If the title is English, respond ONLY in English.
- Never invent facts.
- Keep outputs short, punchy, and social-media ready."#;

#[derive(Debug, Serialize)]
struct GenerateRequest {
    system_instruction: SystemInstruction,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<Part>>,
}

pub struct GeminiGenerator {
    client: Client,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, api_key }
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/{}:generateContent", GEMINI_API_URL, GEMINI_MODEL))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::GeminiApi(format!("API error: {}", error_text)));
        }

        let generate_response: GenerateResponse = response.json().await?;

        let text = generate_response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.content)
            .filter_map(|c| c.parts)
            .flatten()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(AppError::GeminiApi("Empty Gemini response".to_string()));
        }

        Ok(text)
    }

    fn telegram_prompt(title: &str, summary: &str, source: &str, link: &str) -> String {
        format!(
            r#"Write a Telegram caption for this Tollywood news.

Rules:
- 2-3 short lines
- Headline style first line
- Max 2 emojis
- Include a CTA line like: "পুরো খবর পড়ুন নিচের লিঙ্কে:"
- No invented information
- Do NOT shorten or change the URL.
- You don't need to mention the source or URL yourself; that will be added separately.

---NEWS---
Title: {title}
Summary: {summary}
Source: {source}
Link: {link}"#
        )
    }

    fn instagram_prompt(title: &str, summary: &str, source: &str) -> String {
        format!(
            r#"Write an Instagram caption for a Tollywood entertainment post.

Rules:
- Friendly, natural tone
- 3-6 emojis
- 3-6 short lines
- Mention source casually
- End with 5-7 relevant hashtags

---NEWS---
Title: {title}
Summary: {summary}
Source: {source}"#
        )
    }
}

#[async_trait]
impl CaptionGenerator for GeminiGenerator {
    async fn one_liner(&self, title: &str, summary: &str) -> Result<String> {
        let prompt = format!(
            r#"Summarize this entertainment news into ONE punchy line (max 120 characters).
No emojis.

---NEWS---
Title: {title}
Summary: {summary}"#
        );
        Ok(truncate_chars(&self.ask(&prompt).await?, ONE_LINER_MAX_CHARS))
    }

    async fn channel_caption(
        &self,
        channel: Channel,
        title: &str,
        summary: &str,
        source: &str,
        link: &str,
    ) -> Result<String> {
        match channel {
            Channel::Telegram => {
                let prompt = Self::telegram_prompt(title, summary, source, link);
                let body = self.ask(&prompt).await?;

                // The source line and the raw URL must always be present,
                // whether or not the model chose to include them.
                let mut lines = vec![body.clone()];
                if !source.is_empty() && !body.contains(source) {
                    lines.push(format!("সূত্র: {source}"));
                }
                if !link.is_empty() && !body.contains(link) {
                    lines.push(link.to_string());
                }
                Ok(lines.join("\n"))
            }
            Channel::Instagram => {
                let prompt = Self::instagram_prompt(title, summary, source);
                self.ask(&prompt).await
            }
        }
    }
}
