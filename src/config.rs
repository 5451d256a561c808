use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub gemini_api_key: Option<String>,

    #[serde(default = "default_cards_dir")]
    pub cards_dir: String,

    /// Minimum delay between consecutive article-detail fetches of one
    /// listing source. Keeps the crawl polite; sources block aggressive ones.
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,

    #[serde(default = "default_feeds")]
    pub feeds: Vec<String>,

    #[serde(default = "default_listings")]
    pub listings: Vec<ListingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    pub name: String,
    pub url: String,

    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tollywire");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("news.db").to_string_lossy().to_string()
}

fn default_cards_dir() -> String {
    "cards".to_string()
}

fn default_fetch_delay_ms() -> u64 {
    1000
}

fn default_max_articles() -> usize {
    12
}

fn default_feeds() -> Vec<String> {
    vec![
        "https://bangla.hindustantimes.com/rss/entertainment".to_string(),
        "https://bengali.abplive.com/entertainment/feed".to_string(),
        "https://bengali.news18.com/commonfeeds/v1/ben/rss/entertainment/film-review.xml".to_string(),
        "https://bengali.news18.com/commonfeeds/v1/ben/rss/entertainment/tollywood-movies.xml".to_string(),
        "https://timesofindia.indiatimes.com/rssfeedsvideo/3812908.cms".to_string(),
    ]
}

fn default_listings() -> Vec<ListingConfig> {
    vec![
        ListingConfig {
            name: "Bartaman Binodon".to_string(),
            url: "https://bartamanpatrika.com/category/binodon".to_string(),
            max_articles: default_max_articles(),
        },
        ListingConfig {
            name: "Dainik Statesman Binodan".to_string(),
            url: "https://www.dainikstatesmannews.com/entertainment".to_string(),
            max_articles: default_max_articles(),
        },
        ListingConfig {
            name: "Eisamay Entertainment".to_string(),
            url: "https://eisamay.com/entertainment".to_string(),
            max_articles: default_max_articles(),
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            gemini_api_key: None,
            cards_dir: default_cards_dir(),
            fetch_delay_ms: default_fetch_delay_ms(),
            feeds: default_feeds(),
            listings: default_listings(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tollywire")
            .join("config.toml")
    }

    /// API key resolution: environment first, config file second.
    pub fn gemini_key(&self) -> Option<String> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.gemini_api_key.clone())
    }
}
