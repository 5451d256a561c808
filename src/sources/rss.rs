use std::time::Duration;

use async_trait::async_trait;
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;

use crate::error::Result;
use crate::models::RawRecord;

use super::{SourceAdapter, SourceBatch};

pub struct RssSource {
    client: Client,
    feed_url: String,
}

impl RssSource {
    pub fn new(feed_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("tollywire/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            feed_url: feed_url.into(),
        }
    }

    /// Feed title when present, else the feed URL's host without "www.".
    fn source_name(feed_title: Option<&str>, feed_url: &str) -> String {
        if let Some(title) = feed_title {
            let title = title.trim();
            if !title.is_empty() {
                return title.to_string();
            }
        }
        url::Url::parse(feed_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
            .unwrap_or_else(|| feed_url.to_string())
    }

    /// First usable media URL: media content, then thumbnail, then enclosure-style link.
    fn media_url(entry: &Entry) -> String {
        for media in &entry.media {
            if let Some(url) = media.content.iter().find_map(|c| c.url.as_ref()) {
                return url.to_string();
            }
            if let Some(thumb) = media.thumbnails.first() {
                return thumb.image.uri.clone();
            }
        }
        entry
            .links
            .iter()
            .find(|l| {
                l.media_type
                    .as_deref()
                    .map(|t| t.starts_with("image/"))
                    .unwrap_or(false)
            })
            .map(|l| l.href.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SourceAdapter for RssSource {
    fn label(&self) -> &str {
        &self.feed_url
    }

    async fn list_raw_records(&self) -> Result<SourceBatch> {
        let response = self.client.get(&self.feed_url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed: HTTP {}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        let feed = parser::parse(&bytes[..])?;

        let source = Self::source_name(
            feed.title.as_ref().map(|t| t.content.as_str()),
            &self.feed_url,
        );

        let records: Vec<RawRecord> = feed
            .entries
            .iter()
            .map(|entry| {
                let summary_html = entry.summary.as_ref().map(|s| s.content.as_str());
                let summary = summary_html
                    .and_then(|html| html2text::from_read(html.as_bytes(), 80).ok())
                    .map(|text| text.trim().to_string())
                    .unwrap_or_default();

                RawRecord {
                    title: entry
                        .title
                        .as_ref()
                        .map(|t| t.content.trim().to_string())
                        .unwrap_or_default(),
                    link: entry
                        .links
                        .first()
                        .map(|l| l.href.clone())
                        .unwrap_or_default(),
                    summary,
                    media_url: Self::media_url(entry),
                    published: entry
                        .published
                        .or(entry.updated)
                        .map(|dt| dt.to_rfc2822())
                        .unwrap_or_default(),
                    detail: None,
                }
            })
            .collect();

        tracing::debug!("Fetched {} entries from {}", records.len(), source);

        Ok(SourceBatch {
            source,
            feed_url: self.feed_url.clone(),
            records,
        })
    }
}
