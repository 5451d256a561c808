use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{AiMode, CanonicalItem, EnrichedFields, ItemStatus};

use super::schema::SCHEMA;

/// Outcome of an insert-if-absent against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Added,
    Skipped,
}

const ITEM_COLUMNS: &str = "uid, title, raw_summary, full_text, link, source, feed_url, media_url, \
     published_raw, published_at, status, created_at, summary, caption_telegram, \
     caption_instagram, hashtags, image_card_path, ai_mode, ai_error, processing_error, processed_at";

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Insert keyed by uid; a no-op if the uid is already present.
    /// This is the pipeline's exactly-once-per-identity guarantee.
    pub async fn insert_if_absent(&self, item: CanonicalItem) -> Result<InsertOutcome> {
        let outcome = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT OR IGNORE INTO news_items
                       (uid, title, raw_summary, full_text, link, source, feed_url, media_url,
                        published_raw, published_at, status, created_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
                    params![
                        item.uid,
                        item.title,
                        item.raw_summary,
                        item.full_text,
                        item.link,
                        item.source,
                        item.feed_url,
                        item.media_url,
                        item.published_raw,
                        item.published_at,
                        ItemStatus::Raw.as_str(),
                        item.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(if conn.changes() > 0 {
                    InsertOutcome::Added
                } else {
                    InsertOutcome::Skipped
                })
            })
            .await?;
        Ok(outcome)
    }

    pub async fn exists(&self, uid: &str) -> Result<bool> {
        let uid = uid.to_string();
        let exists = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM news_items WHERE uid = ?1",
                    params![uid],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await?;
        Ok(exists)
    }

    pub async fn get_item(&self, uid: &str) -> Result<Option<CanonicalItem>> {
        let uid = uid.to_string();
        let item = self
            .conn
            .call(move |conn| {
                let sql = format!("SELECT {ITEM_COLUMNS} FROM news_items WHERE uid = ?1");
                let mut stmt = conn.prepare(&sql)?;
                let item = stmt
                    .query_row(params![uid], |row| Ok(item_from_row(row)))
                    .optional()?;
                Ok(item)
            })
            .await?;
        Ok(item)
    }

    /// Work query for the processor: all items currently in the given state,
    /// newest first.
    pub async fn list_by_status(&self, status: ItemStatus) -> Result<Vec<CanonicalItem>> {
        let status = status.as_str();
        let items = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {ITEM_COLUMNS} FROM news_items WHERE status = ?1 \
                     ORDER BY published_at DESC, created_at DESC"
                );
                let mut stmt = conn.prepare(&sql)?;
                let items = stmt
                    .query_map(params![status], |row| Ok(item_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    pub async fn count_items(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM news_items", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    /// Commit derived fields and the terminal `ready` status in one write.
    /// The `status = 'raw'` guard keeps the transition one-shot; returns false
    /// if the item was no longer raw.
    pub async fn mark_ready(&self, uid: &str, fields: EnrichedFields) -> Result<bool> {
        let uid = uid.to_string();
        let updated = self
            .conn
            .call(move |conn| {
                let hashtags_json = serde_json::to_string(&fields.hashtags)
                    .unwrap_or_else(|_| "[]".to_string());
                let changed = conn.execute(
                    r#"UPDATE news_items SET
                           summary = ?1,
                           caption_telegram = ?2,
                           caption_instagram = ?3,
                           hashtags = ?4,
                           image_card_path = ?5,
                           ai_mode = ?6,
                           ai_error = ?7,
                           status = 'ready',
                           processed_at = datetime('now')
                       WHERE uid = ?8 AND status = 'raw'"#,
                    params![
                        fields.summary,
                        fields.caption_telegram,
                        fields.caption_instagram,
                        hashtags_json,
                        fields.image_card_path,
                        fields.ai_mode.as_str(),
                        fields.ai_error,
                        uid,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(updated)
    }

    /// Commit the terminal `error` status with its explanation.
    pub async fn mark_error(&self, uid: &str, message: &str) -> Result<bool> {
        let uid = uid.to_string();
        let message = message.to_string();
        let updated = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    r#"UPDATE news_items SET
                           status = 'error',
                           processing_error = ?1,
                           processed_at = datetime('now')
                       WHERE uid = ?2 AND status = 'raw'"#,
                    params![message, uid],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(updated)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn item_from_row(row: &Row) -> CanonicalItem {
    let hashtags = row
        .get::<_, Option<String>>(15)
        .unwrap()
        .and_then(|json| serde_json::from_str::<Vec<String>>(&json).ok());

    CanonicalItem {
        uid: row.get(0).unwrap(),
        title: row.get(1).unwrap(),
        raw_summary: row.get(2).unwrap(),
        full_text: row.get(3).unwrap(),
        link: row.get(4).unwrap(),
        source: row.get(5).unwrap(),
        feed_url: row.get(6).unwrap(),
        media_url: row.get(7).unwrap(),
        published_raw: row.get(8).unwrap(),
        published_at: row.get(9).unwrap(),
        status: row
            .get::<_, String>(10)
            .ok()
            .and_then(|s| ItemStatus::parse(&s))
            .unwrap_or_default(),
        created_at: row
            .get::<_, String>(11)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        summary: row.get(12).unwrap(),
        caption_telegram: row.get(13).unwrap(),
        caption_instagram: row.get(14).unwrap(),
        hashtags,
        image_card_path: row.get(16).unwrap(),
        ai_mode: row
            .get::<_, Option<String>>(17)
            .unwrap()
            .and_then(|s| AiMode::parse(&s)),
        ai_error: row.get(18).unwrap(),
        processing_error: row.get(19).unwrap(),
        processed_at: row
            .get::<_, Option<String>>(20)
            .unwrap()
            .and_then(|s| parse_datetime(&s)),
    }
}
