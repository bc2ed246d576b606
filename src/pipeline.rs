use crate::checkpoint;
use crate::classifier::Classifier;
use crate::config::Config;
use crate::fetcher::FeedFetcher;
use crate::parser;
use crate::types::{Result, RunReport};
use crate::writer::ResultWriter;
use std::time::Duration;
use tracing::{info, warn};

/// One full poll-classify-append cycle over the configured feed.
pub struct FeedPipeline<C: Classifier> {
    config: Config,
    fetcher: FeedFetcher,
    classifier: C,
}

impl<C: Classifier> FeedPipeline<C> {
    pub fn new(config: Config, classifier: C) -> Result<Self> {
        let fetcher = FeedFetcher::new(&config.fetch)?;
        Ok(Self {
            config,
            fetcher,
            classifier,
        })
    }

    /// Runs the whole cycle. The checkpoint is only written after every
    /// entry has been handled, so a crash mid-batch reprocesses the same
    /// entries next time (at-least-once, duplicate lines accepted).
    pub async fn run(&self) -> Result<RunReport> {
        let checkpoint = checkpoint::load(&self.config.checkpoint_path)?;
        match checkpoint {
            Some(ts) => info!("Last processed time: {}", ts.to_rfc3339()),
            None => info!("No previous run recorded, processing the whole feed"),
        }

        let content = self.fetcher.fetch().await?;
        let selection = parser::select_new_entries(&content, checkpoint, self.config.cutoff)?;

        if selection.entries.is_empty() {
            info!("No new entries to process");
            return Ok(RunReport::default());
        }

        let total = selection.entries.len();
        info!("Found {} new entries, sending for analysis", total);

        let mut report = RunReport {
            new_entries: total,
            ..RunReport::default()
        };
        let mut writer = ResultWriter::open(&self.config.output_path)?;

        for (index, entry) in selection.entries.iter().enumerate() {
            info!("Processing entry {}/{}: {}", index + 1, total, entry.title);

            match self.classifier.classify(entry).await {
                Ok(verdict) => {
                    info!("Verdict: {}", verdict);
                    writer.append(&entry.title, &verdict)?;
                    report.classified += 1;
                }
                Err(err) => {
                    warn!("Classification failed for '{}': {}", entry.title, err);
                    writer.append_failure(&entry.title)?;
                    report.failed += 1;
                }
            }

            // Basic spacing between entries to stay under the request rate.
            if self.config.entry_delay_seconds > 0 {
                tokio::time::sleep(Duration::from_secs(self.config.entry_delay_seconds)).await;
            }
        }

        if let Some(latest) = selection.latest_published {
            checkpoint::save(&self.config.checkpoint_path, latest)?;
            info!("Updated last processed time to: {}", latest.to_rfc3339());
            report.checkpoint = Some(latest);
        }

        Ok(report)
    }
}
