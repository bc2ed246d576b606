use chrono::{DateTime, Utc};
use std::path::PathBuf;

pub const DEFAULT_FEED_URL: &str = "https://feeds2.feedburner.com/jetsoclub";
/// Some feed hosts reject library default agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_CHECKPOINT_PATH: &str = "assets/data/last_rss_time.txt";
pub const DEFAULT_OUTPUT_PATH: &str = "assets/data/toaddlist.txt";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub feed_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    /// Seconds to wait before the single retry after a quota error.
    pub retry_delay_seconds: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            retry_delay_seconds: 60,
        }
    }
}

/// Everything one run needs, built once at startup and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    pub fetch: FetchConfig,
    pub classifier: ClassifierConfig,
    pub checkpoint_path: PathBuf,
    pub output_path: PathBuf,
    /// Entries published at or after this instant are ignored.
    pub cutoff: Option<DateTime<Utc>>,
    /// Seconds to pause between entries to stay under the request rate.
    pub entry_delay_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            classifier: ClassifierConfig::default(),
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            cutoff: None,
            entry_delay_seconds: 10,
        }
    }
}
