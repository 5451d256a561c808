use std::sync::Arc;

use crate::ai::{truncate_chars, CaptionGenerator, Channel};
use crate::db::Repository;
use crate::error::Result;
use crate::models::{AiMode, CanonicalItem, EnrichedFields, ItemStatus};

use super::cards::CardRenderer;
use super::hashtags::build_hashtags;

/// Fallback one-liner length, matching the primary generator's instruction.
const FALLBACK_ONE_LINER_CHARS: usize = 120;

/// Counts reported by one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub processed: usize,
    pub ready: usize,
    pub errored: usize,
}

struct Captions {
    one_liner: String,
    telegram: String,
    instagram: String,
    ai_mode: AiMode,
    ai_error: Option<String>,
}

/// Enriches raw items one at a time. Generation failures are absorbed into
/// deterministic fallback captions; card-render and store failures make the
/// single item terminal with `error`. One item's failure never aborts the pass.
pub struct Processor {
    generator: Option<Arc<dyn CaptionGenerator>>,
    renderer: Arc<dyn CardRenderer>,
}

impl Processor {
    pub fn new(
        generator: Option<Arc<dyn CaptionGenerator>>,
        renderer: Arc<dyn CardRenderer>,
    ) -> Self {
        Self { generator, renderer }
    }

    pub async fn run(&self, repo: &Repository) -> Result<ProcessReport> {
        let items = repo.list_by_status(ItemStatus::Raw).await?;
        let mut report = ProcessReport::default();

        for item in items {
            report.processed += 1;
            match self.enrich(&item).await {
                Ok(fields) => match repo.mark_ready(&item.uid, fields).await {
                    Ok(true) => report.ready += 1,
                    Ok(false) => {
                        tracing::warn!("Item {} was no longer raw, leaving untouched", item.uid);
                    }
                    Err(e) => {
                        report.errored += 1;
                        self.record_error(repo, &item.uid, &format!("store write failed: {e}"))
                            .await;
                    }
                },
                Err(e) => {
                    report.errored += 1;
                    tracing::warn!("Enrichment failed for {}: {}", item.uid, e);
                    self.record_error(repo, &item.uid, &e.to_string()).await;
                }
            }
        }

        tracing::info!(
            "Enrichment pass: {} processed, {} ready, {} errored",
            report.processed,
            report.ready,
            report.errored
        );
        Ok(report)
    }

    async fn record_error(&self, repo: &Repository, uid: &str, message: &str) {
        // Last-resort write; if even this fails the item stays raw for the
        // next pass.
        if let Err(e) = repo.mark_error(uid, message).await {
            tracing::warn!("Could not record error for {}: {}", uid, e);
        }
    }

    /// Produce all derived fields for one item. An Err here means an
    /// unrecoverable per-item failure (card render); generation trouble never
    /// surfaces as Err.
    async fn enrich(&self, item: &CanonicalItem) -> Result<EnrichedFields> {
        let captions = self.generate_captions(item).await;

        let hashtags = build_hashtags(&item.source);
        let tag_line = hashtags.join(" ");

        let caption_telegram = append_tag_line(&captions.telegram, &tag_line);
        let caption_instagram = append_tag_line(&captions.instagram, &tag_line);

        // Card dates show the day only.
        let card_date: String = item.published_at.chars().take(10).collect();
        let image_card_path = self
            .renderer
            .render(&item.title, &item.source, &card_date)
            .await?;

        Ok(EnrichedFields {
            summary: captions.one_liner,
            caption_telegram,
            caption_instagram,
            hashtags,
            image_card_path,
            ai_mode: captions.ai_mode,
            ai_error: captions.ai_error,
        })
    }

    async fn generate_captions(&self, item: &CanonicalItem) -> Captions {
        if let Some(generator) = &self.generator {
            match self.primary_captions(generator.as_ref(), item).await {
                Ok((one_liner, telegram, instagram)) => {
                    return Captions {
                        one_liner,
                        telegram,
                        instagram,
                        ai_mode: AiMode::Primary,
                        ai_error: None,
                    };
                }
                Err(e) => {
                    tracing::warn!("Generation failed for {}, using fallback: {}", item.uid, e);
                    return fallback_captions(item, Some(e.to_string()));
                }
            }
        }
        fallback_captions(item, None)
    }

    async fn primary_captions(
        &self,
        generator: &dyn CaptionGenerator,
        item: &CanonicalItem,
    ) -> Result<(String, String, String)> {
        let one_liner = generator.one_liner(&item.title, &item.raw_summary).await?;
        let telegram = generator
            .channel_caption(
                Channel::Telegram,
                &item.title,
                &item.raw_summary,
                &item.source,
                &item.link,
            )
            .await?;
        let instagram = generator
            .channel_caption(
                Channel::Instagram,
                &item.title,
                &item.raw_summary,
                &item.source,
                &item.link,
            )
            .await?;
        Ok((one_liner, telegram, instagram))
    }
}

/// Deterministic captions built purely from already-known fields.
fn fallback_captions(item: &CanonicalItem, ai_error: Option<String>) -> Captions {
    Captions {
        one_liner: truncate_chars(&item.title, FALLBACK_ONE_LINER_CHARS),
        telegram: format!("📰 {}\n\n🔗 {}", item.title, item.link),
        instagram: format!("🎬 {}\n\nSource: {}", item.title, item.source),
        ai_mode: AiMode::Fallback,
        ai_error,
    }
}

fn append_tag_line(caption: &str, tag_line: &str) -> String {
    if tag_line.is_empty() {
        caption.to_string()
    } else {
        format!("{caption}\n\n{tag_line}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::RawRecord;
    use crate::services::canonicalize::{canonicalize, fingerprint};
    use async_trait::async_trait;

    struct StubGenerator {
        fail: bool,
    }

    #[async_trait]
    impl CaptionGenerator for StubGenerator {
        async fn one_liner(&self, title: &str, _summary: &str) -> Result<String> {
            if self.fail {
                return Err(AppError::GeminiApi("quota exceeded".to_string()));
            }
            Ok(format!("one line about {title}"))
        }

        async fn channel_caption(
            &self,
            channel: Channel,
            title: &str,
            _summary: &str,
            source: &str,
            link: &str,
        ) -> Result<String> {
            if self.fail {
                return Err(AppError::GeminiApi("quota exceeded".to_string()));
            }
            Ok(match channel {
                Channel::Telegram => format!("tg: {title}\nসূত্র: {source}\n{link}"),
                Channel::Instagram => format!("ig: {title} ({source})"),
            })
        }
    }

    struct StubRenderer {
        fail_on_title: Option<String>,
    }

    #[async_trait]
    impl CardRenderer for StubRenderer {
        async fn render(&self, title: &str, _source: &str, date: &str) -> Result<String> {
            if self.fail_on_title.as_deref() == Some(title) {
                return Err(AppError::Card("font missing".to_string()));
            }
            Ok(format!("cards/{title}_{date}.svg"))
        }
    }

    fn raw_item(title: &str, link: &str, source: &str) -> CanonicalItem {
        let record = RawRecord {
            title: title.to_string(),
            link: link.to_string(),
            summary: format!("{title} summary"),
            published: "2026-01-10T10:00:00Z".to_string(),
            ..Default::default()
        };
        canonicalize(&record, source, "https://example.com/feed")
    }

    async fn temp_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        (dir, repo)
    }

    fn processor(generator_fails: bool, fail_on_title: Option<&str>) -> Processor {
        Processor::new(
            Some(Arc::new(StubGenerator {
                fail: generator_fails,
            })),
            Arc::new(StubRenderer {
                fail_on_title: fail_on_title.map(|s| s.to_string()),
            }),
        )
    }

    #[tokio::test]
    async fn failing_generator_still_yields_ready_with_fallback() {
        let (_dir, repo) = temp_repo().await;
        let item = raw_item("T1", "https://a/x", "News18 Bangla");
        let uid = item.uid.clone();
        repo.insert_if_absent(item).await.unwrap();

        let report = processor(true, None).run(&repo).await.unwrap();
        assert_eq!(report, ProcessReport { processed: 1, ready: 1, errored: 0 });

        let stored = repo.get_item(&uid).await.unwrap().unwrap();
        assert_eq!(stored.status, ItemStatus::Ready);
        assert_eq!(stored.ai_mode, Some(AiMode::Fallback));
        assert!(stored.ai_error.unwrap().contains("quota exceeded"));

        let tg = stored.caption_telegram.unwrap();
        assert!(tg.contains("T1"));
        assert!(tg.contains("https://a/x"));
        let ig = stored.caption_instagram.unwrap();
        assert!(ig.contains("T1"));
        assert!(ig.contains("News18 Bangla"));
        assert_eq!(stored.summary.unwrap(), "T1");
    }

    #[tokio::test]
    async fn missing_generator_means_fallback_without_error_text() {
        let (_dir, repo) = temp_repo().await;
        let item = raw_item("T1", "https://a/x", "Src");
        let uid = item.uid.clone();
        repo.insert_if_absent(item).await.unwrap();

        let processor = Processor::new(None, Arc::new(StubRenderer { fail_on_title: None }));
        processor.run(&repo).await.unwrap();

        let stored = repo.get_item(&uid).await.unwrap().unwrap();
        assert_eq!(stored.status, ItemStatus::Ready);
        assert_eq!(stored.ai_mode, Some(AiMode::Fallback));
        assert!(stored.ai_error.is_none());
    }

    #[tokio::test]
    async fn render_failure_is_isolated_to_its_item() {
        let (_dir, repo) = temp_repo().await;
        let items = [
            raw_item("first", "https://a/1", "Src"),
            raw_item("second", "https://a/2", "Src"),
            raw_item("third", "https://a/3", "Src"),
        ];
        let uids: Vec<String> = items.iter().map(|i| i.uid.clone()).collect();
        for item in items {
            repo.insert_if_absent(item).await.unwrap();
        }

        let report = processor(false, Some("second")).run(&repo).await.unwrap();
        assert_eq!(report.processed, 3);
        assert_eq!(report.ready, 2);
        assert_eq!(report.errored, 1);

        let first = repo.get_item(&uids[0]).await.unwrap().unwrap();
        let second = repo.get_item(&uids[1]).await.unwrap().unwrap();
        let third = repo.get_item(&uids[2]).await.unwrap().unwrap();

        assert_eq!(first.status, ItemStatus::Ready);
        assert_eq!(third.status, ItemStatus::Ready);
        assert_eq!(second.status, ItemStatus::Error);
        assert!(second.processing_error.unwrap().contains("font missing"));
        assert!(second.processed_at.is_some());
        assert!(second.caption_telegram.is_none());

        // Totality: nothing attempted is left raw.
        assert!(repo.list_by_status(ItemStatus::Raw).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn captions_carry_the_tag_line() {
        let (_dir, repo) = temp_repo().await;
        let item = raw_item("T1", "https://a/x", "News18 Bangla");
        let uid = item.uid.clone();
        repo.insert_if_absent(item).await.unwrap();

        processor(false, None).run(&repo).await.unwrap();

        let stored = repo.get_item(&uid).await.unwrap().unwrap();
        let tg = stored.caption_telegram.unwrap();
        assert!(tg.ends_with("#Tollywood #BanglaCinema #EntertainmentNews #News18Bangla"));
        assert!(stored.caption_instagram.unwrap().contains("#News18Bangla"));
    }

    // The full ingestion-to-enrichment path for a single News18 Bangla record.
    #[tokio::test]
    async fn end_to_end_ingest_dedup_enrich() {
        let (_dir, repo) = temp_repo().await;

        let record = RawRecord {
            title: "T1".to_string(),
            link: "https://a/x".to_string(),
            summary: "S1".to_string(),
            ..Default::default()
        };
        let item = canonicalize(&record, "News18 Bangla", "https://bengali.news18.com/rss");
        assert_eq!(item.uid, fingerprint("https://a/x", "T1"));
        assert_eq!(item.status, ItemStatus::Raw);

        use crate::db::InsertOutcome;
        assert_eq!(
            repo.insert_if_absent(item.clone()).await.unwrap(),
            InsertOutcome::Added
        );
        assert_eq!(
            repo.insert_if_absent(item.clone()).await.unwrap(),
            InsertOutcome::Skipped
        );

        let report = processor(false, None).run(&repo).await.unwrap();
        assert_eq!(report.ready, 1);

        let stored = repo.get_item(&item.uid).await.unwrap().unwrap();
        assert_eq!(stored.status, ItemStatus::Ready);
        assert_eq!(stored.ai_mode, Some(AiMode::Primary));
        assert!(stored.image_card_path.is_some());
        let hashtags = stored.hashtags.unwrap();
        for tag in ["#Tollywood", "#BanglaCinema", "#EntertainmentNews", "#News18Bangla"] {
            assert!(hashtags.contains(&tag.to_string()), "missing {tag}");
        }
        assert!(hashtags.len() <= 8);
    }
}
