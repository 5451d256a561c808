use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use url::Url;

use crate::config::ListingConfig;
use crate::error::Result;
use crate::models::{ArticleDetail, RawRecord};

use super::{SourceAdapter, SourceBatch};

const USER_AGENT_STRING: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Anchors with at least a headline's worth of text are treated as article links.
const MIN_HEADLINE_CHARS: usize = 15;

/// Scrapes a category listing page, then each linked article page. The
/// site-specific part is deliberately thin: anchor harvesting plus OpenGraph
/// metadata, so one adapter covers several newspaper layouts.
pub struct ListingSource {
    client: Client,
    name: String,
    listing_url: String,
    max_articles: usize,
    /// Pause between consecutive article fetches so the source is not hammered.
    delay: Duration,
    anchor_re: Regex,
}

impl ListingSource {
    pub fn new(config: &ListingConfig, delay: Duration) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT_STRING)
            .build()
            .expect("Failed to create HTTP client");

        let anchor_re = Regex::new(r#"(?is)<a[^>]+href=["']([^"']+)["'][^>]*>(.*?)</a>"#)
            .expect("Invalid anchor regex");

        Self {
            client,
            name: config.name.clone(),
            listing_url: config.url.clone(),
            max_articles: config.max_articles,
            delay,
            anchor_re,
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch {}: HTTP {}", url, response.status()).into());
        }

        Ok(response.text().await?)
    }

    /// Harvest candidate (headline, article URL) pairs from the listing page.
    fn extract_article_links(&self, html: &str) -> Vec<(String, String)> {
        let base = match Url::parse(&self.listing_url) {
            Ok(u) => u,
            Err(_) => return Vec::new(),
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut links = Vec::new();

        for caps in self.anchor_re.captures_iter(html) {
            let href = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let inner = caps.get(2).map(|m| m.as_str()).unwrap_or("");

            let headline = decode_entities(&strip_tags(inner));
            if headline.chars().count() < MIN_HEADLINE_CHARS {
                continue;
            }

            let resolved = match base.join(href.trim()) {
                Ok(u) => u,
                Err(_) => continue,
            };
            if !matches!(resolved.scheme(), "http" | "https") {
                continue;
            }
            if resolved.host_str() != base.host_str() {
                continue;
            }
            if resolved.path() == base.path() {
                continue;
            }

            let url = resolved.to_string();
            if seen.insert(url.clone()) {
                links.push((headline, url));
            }
            if links.len() >= self.max_articles {
                break;
            }
        }

        links
    }

    fn scrape_article(&self, html: &str) -> ArticleDetail {
        let title = first_non_empty(&[
            meta_content(html, "og:title"),
            tag_text(html, "h1"),
            tag_text(html, "title"),
        ]);

        ArticleDetail {
            title,
            description: first_non_empty(&[
                meta_content(html, "og:description"),
                meta_content(html, "description"),
            ]),
            image_url: meta_content(html, "og:image"),
            date: first_non_empty(&[
                meta_content(html, "article:published_time"),
                meta_content(html, "og:updated_time"),
            ]),
            full_text: extract_body(html),
        }
    }
}

#[async_trait]
impl SourceAdapter for ListingSource {
    fn label(&self) -> &str {
        &self.name
    }

    async fn list_raw_records(&self) -> Result<SourceBatch> {
        let listing_html = self.fetch_page(&self.listing_url).await?;
        let links = self.extract_article_links(&listing_html);

        tracing::debug!("{}: {} candidate articles", self.name, links.len());

        let mut records = Vec::with_capacity(links.len());
        for (idx, (headline, url)) in links.into_iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(self.delay).await;
            }

            let detail = match self.fetch_page(&url).await {
                Ok(html) => Some(self.scrape_article(&html)),
                Err(e) => {
                    // Keep the listing-level record; the article page is a bonus.
                    tracing::debug!("{}: article fetch failed for {}: {}", self.name, url, e);
                    None
                }
            };

            records.push(RawRecord {
                title: headline,
                link: url,
                summary: String::new(),
                media_url: String::new(),
                published: String::new(),
                detail,
            });
        }

        Ok(SourceBatch {
            source: self.name.clone(),
            feed_url: self.listing_url.clone(),
            records,
        })
    }
}

/// Content of a `<meta property|name=key content=...>` tag, either attribute order.
fn meta_content(html: &str, key: &str) -> String {
    let patterns = [
        format!(r#"(?i)<meta[^>]+(?:property|name)=["']{key}["'][^>]+content=["']([^"']*)["']"#),
        format!(r#"(?i)<meta[^>]+content=["']([^"']*)["'][^>]+(?:property|name)=["']{key}["']"#),
    ];

    for pattern in &patterns {
        if let Some(caps) = Regex::new(pattern).ok().and_then(|re| re.captures(html)) {
            if let Some(m) = caps.get(1) {
                let value = decode_entities(m.as_str());
                if !value.is_empty() {
                    return value;
                }
            }
        }
    }
    String::new()
}

fn tag_text(html: &str, tag: &str) -> String {
    let pattern = format!(r"(?is)<{tag}[^>]*>(.*?)</{tag}>");
    Regex::new(&pattern)
        .ok()
        .and_then(|re| re.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(&strip_tags(m.as_str())))
        .unwrap_or_default()
}

/// Readable article body via html2text, or empty when the page yields too
/// little text to be an article.
fn extract_body(html: &str) -> String {
    let text = match html2text::from_read(html.as_bytes(), 80) {
        Ok(t) => t,
        Err(_) => return String::new(),
    };

    let cleaned: String = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.len() > 200 {
        cleaned
    } else {
        String::new()
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .trim()
        .to_string()
}

fn first_non_empty(candidates: &[String]) -> String {
    candidates
        .iter()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ListingSource {
        let config = ListingConfig {
            name: "Bartaman Binodon".to_string(),
            url: "https://bartamanpatrika.com/category/binodon".to_string(),
            max_articles: 10,
        };
        ListingSource::new(&config, Duration::from_millis(0))
    }

    #[test]
    fn extracts_same_host_article_links_with_headlines() {
        let html = r#"
            <a href="/detail/binodon-123">বায়োপিকে তামান্না, নতুন ছবির ঘোষণা এল</a>
            <a href="https://other-site.com/story">অন্য সাইটের দীর্ঘ শিরোনাম এখানে আছে</a>
            <a href="/detail/binodon-456"><span>দীর্ঘ বিরতির পর বড় পর্দায় ফিরছেন মিমি</span></a>
            <a href="/detail/binodon-123">বায়োপিকে তামান্না, নতুন ছবির ঘোষণা এল</a>
            <a href="/short">ছোট</a>
        "#;

        let links = source().extract_article_links(html);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].1, "https://bartamanpatrika.com/detail/binodon-123");
        assert!(links[0].0.starts_with("বায়োপিকে"));
        assert_eq!(links[1].1, "https://bartamanpatrika.com/detail/binodon-456");
    }

    #[test]
    fn scrapes_article_metadata() {
        let html = r#"
            <html><head>
            <title>fallback title</title>
            <meta property="og:title" content="বায়োপিকে তামান্না" />
            <meta property="og:description" content="নতুন ছবিতে নাম ভূমিকায়।" />
            <meta content="https://cdn.example.com/img.jpg" property="og:image" />
            <meta property="article:published_time" content="2026-01-10T09:30:00+05:30" />
            </head><body><h1>ignored</h1></body></html>
        "#;

        let detail = source().scrape_article(html);
        assert_eq!(detail.title, "বায়োপিকে তামান্না");
        assert_eq!(detail.description, "নতুন ছবিতে নাম ভূমিকায়।");
        assert_eq!(detail.image_url, "https://cdn.example.com/img.jpg");
        assert_eq!(detail.date, "2026-01-10T09:30:00+05:30");
    }

    #[test]
    fn falls_back_to_h1_when_og_title_missing() {
        let html = "<html><head><title>Site | Section</title></head><body><h1>আসল শিরোনাম</h1></body></html>";
        let detail = source().scrape_article(html);
        assert_eq!(detail.title, "আসল শিরোনাম");
    }

    #[test]
    fn strip_tags_flattens_markup() {
        assert_eq!(strip_tags("<span>a <b>b</b></span> c"), "a b c");
        assert_eq!(decode_entities(" a &amp; b "), "a & b");
    }
}
