pub const SCHEMA: &str = r#"
-- news_items table: one row per deduplicated canonical item
CREATE TABLE IF NOT EXISTS news_items (
    uid TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    raw_summary TEXT NOT NULL DEFAULT '',
    full_text TEXT NOT NULL DEFAULT '',
    link TEXT NOT NULL,
    source TEXT NOT NULL,
    feed_url TEXT NOT NULL DEFAULT '',
    media_url TEXT NOT NULL DEFAULT '',
    published_raw TEXT NOT NULL DEFAULT '',
    published_at TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'raw',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),

    -- derived fields, written together with the terminal status
    summary TEXT,
    caption_telegram TEXT,
    caption_instagram TEXT,
    hashtags TEXT,
    image_card_path TEXT,
    ai_mode TEXT,
    ai_error TEXT,
    processing_error TEXT,
    processed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_news_items_status ON news_items(status);
CREATE INDEX IF NOT EXISTS idx_news_items_published_at ON news_items(published_at DESC);
"#;
