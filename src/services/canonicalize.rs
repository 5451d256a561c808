use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sha2::{Digest, Sha256};

use crate::models::{CanonicalItem, ItemStatus, RawRecord};

/// Stable content identity: SHA-256 over `link + "|" + title`. Missing parts
/// are empty strings, never an error.
pub fn fingerprint(link: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    hex::encode(hasher.finalize())
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%d %B %Y", "%B %d, %Y"];

/// Best-effort parse of a source-native date string. Failure is normal and
/// yields None, never an error.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
        }
    }
    None
}

/// Map a source adapter's record to the canonical shape. Article-detail
/// fields win over listing-level fields when non-empty.
pub fn canonicalize(record: &RawRecord, source: &str, feed_url: &str) -> CanonicalItem {
    let detail = record.detail.as_ref();

    let title = pick(detail.map(|d| d.title.as_str()), &record.title);
    let link = record.link.trim().to_string();
    let raw_summary = pick(detail.map(|d| d.description.as_str()), &record.summary);
    let media_url = pick(detail.map(|d| d.image_url.as_str()), &record.media_url);
    let published_raw = pick(detail.map(|d| d.date.as_str()), &record.published);
    let full_text = detail
        .map(|d| d.full_text.trim().to_string())
        .unwrap_or_default();

    let published_at = parse_published(&published_raw)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();

    CanonicalItem {
        uid: fingerprint(&link, &title),
        title,
        raw_summary,
        full_text,
        link,
        source: source.to_string(),
        feed_url: feed_url.to_string(),
        media_url,
        published_raw,
        published_at,
        status: ItemStatus::Raw,
        created_at: Utc::now(),
        summary: None,
        caption_telegram: None,
        caption_instagram: None,
        hashtags: None,
        image_card_path: None,
        ai_mode: None,
        ai_error: None,
        processing_error: None,
        processed_at: None,
    }
}

fn pick(specific: Option<&str>, fallback: &str) -> String {
    match specific.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => fallback.trim().to_string(),
    }
}

/// Reverse-chronological batch order: parseable timestamps newest first,
/// unparseable ones after all of them, ties keeping input order.
pub fn sort_newest_first(items: &mut Vec<CanonicalItem>) {
    let mut keyed: Vec<(Option<DateTime<Utc>>, CanonicalItem)> = items
        .drain(..)
        .map(|item| (parse_published(&item.published_at), item))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    items.extend(keyed.into_iter().map(|(_, item)| item));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleDetail;

    #[test]
    fn fingerprint_is_pure_and_deterministic() {
        let a = fingerprint("https://a/x", "T1");
        let b = fingerprint("https://a/x", "T1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        assert_ne!(fingerprint("https://a/x", "T2"), a);
        assert_ne!(fingerprint("https://a/y", "T1"), a);
        // Separator keeps (link, title) boundaries unambiguous
        assert_ne!(fingerprint("https://a/x|T", "1"), fingerprint("https://a/x", "|T1"));
    }

    #[test]
    fn fingerprint_tolerates_missing_fields() {
        assert_eq!(fingerprint("", ""), fingerprint("", ""));
    }

    #[test]
    fn parses_common_date_formats() {
        assert!(parse_published("2026-01-10T09:30:00+05:30").is_some());
        assert!(parse_published("Sat, 10 Jan 2026 10:00:00 +0000").is_some());
        assert!(parse_published("2026-01-10 09:30:00").is_some());
        assert!(parse_published("2026-01-10").is_some());
        assert!(parse_published("10 Jan 2026").is_some());
    }

    #[test]
    fn unparseable_dates_are_lenient() {
        // Bengali date text the sources actually emit
        assert!(parse_published("ডিসেম্বর ১, ২০২৫").is_none());
        assert!(parse_published("").is_none());
        assert!(parse_published("yesterday-ish").is_none());
    }

    #[test]
    fn canonicalize_keeps_raw_date_on_parse_failure() {
        let record = RawRecord {
            title: "T1".to_string(),
            link: "https://a/x".to_string(),
            published: "ডিসেম্বর ১, ২০২৫".to_string(),
            ..Default::default()
        };

        let item = canonicalize(&record, "Bartaman Binodon", "https://bartamanpatrika.com");
        assert_eq!(item.published_at, "");
        assert_eq!(item.published_raw, "ডিসেম্বর ১, ২০২৫");
        assert_eq!(item.status, crate::models::ItemStatus::Raw);
        assert_eq!(item.uid, fingerprint("https://a/x", "T1"));
    }

    #[test]
    fn article_detail_wins_over_listing_fields() {
        let record = RawRecord {
            title: "listing headline".to_string(),
            link: "https://a/x".to_string(),
            summary: "listing snippet".to_string(),
            media_url: "https://a/listing.jpg".to_string(),
            published: String::new(),
            detail: Some(ArticleDetail {
                title: "article headline".to_string(),
                description: "article description".to_string(),
                image_url: "https://a/article.jpg".to_string(),
                date: "2026-01-10T09:30:00+05:30".to_string(),
                full_text: "body text".to_string(),
            }),
        };

        let item = canonicalize(&record, "Src", "https://a");
        assert_eq!(item.title, "article headline");
        assert_eq!(item.raw_summary, "article description");
        assert_eq!(item.media_url, "https://a/article.jpg");
        assert_eq!(item.full_text, "body text");
        assert!(!item.published_at.is_empty());
        // uid derives from the winning title
        assert_eq!(item.uid, fingerprint("https://a/x", "article headline"));
    }

    #[test]
    fn empty_detail_fields_fall_back_to_listing() {
        let record = RawRecord {
            title: "listing headline".to_string(),
            link: "https://a/x".to_string(),
            summary: "listing snippet".to_string(),
            detail: Some(ArticleDetail::default()),
            ..Default::default()
        };

        let item = canonicalize(&record, "Src", "https://a");
        assert_eq!(item.title, "listing headline");
        assert_eq!(item.raw_summary, "listing snippet");
    }

    #[test]
    fn batch_sorts_newest_first_with_undated_last() {
        fn dated(title: &str, published_at: &str) -> CanonicalItem {
            let record = RawRecord {
                title: title.to_string(),
                link: format!("https://a/{title}"),
                published: published_at.to_string(),
                ..Default::default()
            };
            canonicalize(&record, "Src", "https://a")
        }

        let mut items = vec![
            dated("undated-1", ""),
            dated("old", "2026-01-01T00:00:00Z"),
            dated("undated-2", "not a date"),
            dated("new", "2026-02-01T00:00:00Z"),
        ];

        sort_newest_first(&mut items);

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old", "undated-1", "undated-2"]);
    }
}
