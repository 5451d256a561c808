use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a stored item. Transitions are one-shot:
/// `Raw -> Ready` or `Raw -> Error`, never reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Raw,
    Ready,
    Error,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Raw => "raw",
            ItemStatus::Ready => "ready",
            ItemStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "raw" => Some(ItemStatus::Raw),
            "ready" => Some(ItemStatus::Ready),
            "error" => Some(ItemStatus::Error),
            _ => None,
        }
    }
}

/// How the captions of a ready item were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiMode {
    Primary,
    Fallback,
}

impl AiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiMode::Primary => "primary",
            AiMode::Fallback => "fallback",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(AiMode::Primary),
            "fallback" => Some(AiMode::Fallback),
            _ => None,
        }
    }
}

/// The normalized, source-agnostic record persisted by the pipeline.
/// Field names are the stable wire schema between ingestion and enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalItem {
    /// Deterministic fingerprint of (link, title); primary key.
    pub uid: String,
    pub title: String,
    pub raw_summary: String,
    pub full_text: String,
    pub link: String,
    pub source: String,
    pub feed_url: String,
    pub media_url: String,
    /// Source-provided date text, preserved verbatim.
    pub published_raw: String,
    /// RFC 3339 timestamp if the source date was parseable, else empty.
    pub published_at: String,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,

    // Populated only once status becomes Ready.
    pub summary: Option<String>,
    pub caption_telegram: Option<String>,
    pub caption_instagram: Option<String>,
    pub hashtags: Option<Vec<String>>,
    pub image_card_path: Option<String>,
    pub ai_mode: Option<AiMode>,
    pub ai_error: Option<String>,

    // Populated only once status becomes Error.
    pub processing_error: Option<String>,

    /// Set exactly when a terminal status is written.
    pub processed_at: Option<DateTime<Utc>>,
}

/// Derived fields committed together with the `ready` status.
#[derive(Debug, Clone)]
pub struct EnrichedFields {
    pub summary: String,
    pub caption_telegram: String,
    pub caption_instagram: String,
    pub hashtags: Vec<String>,
    pub image_card_path: String,
    pub ai_mode: AiMode,
    pub ai_error: Option<String>,
}
