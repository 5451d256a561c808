use std::path::PathBuf;
use std::sync::Arc;

mod ai;
mod config;
mod db;
mod error;
mod models;
mod services;
mod sources;

use ai::{CaptionGenerator, GeminiGenerator};
use config::Config;
use db::Repository;
use error::Result;
use services::{Collector, Processor, SvgCardRenderer};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = Config::load()?;

    match args.get(1).map(String::as_str) {
        Some("collect") => {
            // Optional JSON dump of the canonicalized batch for inspection
            let out_path = args
                .iter()
                .position(|a| a == "--out")
                .and_then(|i| args.get(i + 1))
                .map(PathBuf::from);

            run_collect(&config, out_path).await?;
        }
        Some("process") => {
            run_process(&config).await?;
        }
        _ => {
            eprintln!("Usage: tollywire <collect [--out items.json] | process>");
            std::process::exit(2);
        }
    }

    Ok(())
}

async fn run_collect(config: &Config, out_path: Option<PathBuf>) -> Result<()> {
    let repo = Repository::new(&config.db_path).await?;
    let collector = Collector::from_config(config);

    let items = collector.collect().await;

    if let Some(path) = out_path {
        std::fs::write(&path, serde_json::to_string_pretty(&items)?)?;
        println!("Saved {} items to {:?}", items.len(), path);
    }

    let report = collector.ingest(&repo, items).await?;
    println!(
        "Collected {}: added {}, skipped {} (already existed)",
        report.collected, report.added, report.skipped
    );
    Ok(())
}

async fn run_process(config: &Config) -> Result<()> {
    let repo = Repository::new(&config.db_path).await?;

    let generator: Option<Arc<dyn CaptionGenerator>> = match config.gemini_key() {
        Some(key) => Some(Arc::new(GeminiGenerator::new(key))),
        None => {
            tracing::warn!("No Gemini API key configured; captions use fallback templates");
            None
        }
    };
    let renderer = Arc::new(SvgCardRenderer::new(&config.cards_dir));

    let processor = Processor::new(generator, renderer);
    let report = processor.run(&repo).await?;

    println!(
        "Processed {} items: {} ready, {} errored",
        report.processed, report.ready, report.errored
    );
    Ok(())
}
