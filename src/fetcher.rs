use crate::config::FetchConfig;
use crate::types::{Result, SieveError};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Downloads the feed document, once per run.
pub struct FeedFetcher {
    client: Client,
    url: Url,
}

impl FeedFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let url = Url::parse(&config.feed_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, url })
    }

    /// One GET of the feed body. Any failure here is fatal for the run;
    /// retries only apply to classification calls.
    pub async fn fetch(&self) -> Result<String> {
        debug!("Fetching feed: {}", self.url);

        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SieveError::Fetch(format!(
                "HTTP {} for {}",
                status, self.url
            )));
        }

        let body = response.text().await?;
        info!("Fetched feed: {} ({} bytes)", self.url, body.len());
        Ok(body)
    }
}
