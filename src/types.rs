use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub title: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewEntries {
    /// Entries that still need classification, oldest first.
    pub entries: Vec<FeedEntry>,
    /// Maximum published time across all parsed entries, seeded with the
    /// loaded checkpoint so it never moves backwards.
    pub latest_published: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub new_entries: usize,
    pub classified: usize,
    pub failed: usize,
    pub checkpoint: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum SieveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed fetch failed: {0}")]
    Fetch(String),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid timestamp {value:?}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Classifier quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SieveError {
    /// Quota-class failures are the only ones that warrant a retry.
    pub fn is_quota(&self) -> bool {
        matches!(self, SieveError::QuotaExceeded(_))
    }
}

pub type Result<T> = std::result::Result<T, SieveError>;
