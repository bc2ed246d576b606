use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use jetso_sieve::checkpoint;
use jetso_sieve::config::{
    DEFAULT_CHECKPOINT_PATH, DEFAULT_FEED_URL, DEFAULT_MODEL, DEFAULT_OUTPUT_PATH,
    DEFAULT_USER_AGENT,
};
use jetso_sieve::{ClassifierConfig, Config, FeedPipeline, FetchConfig, GeminiClassifier};
use std::env;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

/// Poll the JetsoClub feed and screen new posts for qualifying promotions.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Feed to poll
    #[arg(long, default_value = DEFAULT_FEED_URL)]
    feed_url: String,

    /// File holding the last processed publish time
    #[arg(long, default_value = DEFAULT_CHECKPOINT_PATH)]
    checkpoint: PathBuf,

    /// File the classification lines are appended to
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Ignore entries published at or after this time (RFC 3339)
    #[arg(long, value_parser = checkpoint::parse_timestamp)]
    cutoff: Option<DateTime<Utc>>,

    /// Gemini model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// User-Agent sent with the feed request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Feed request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Seconds to wait before retrying a quota-limited classification
    #[arg(long, default_value_t = 60)]
    retry_delay: u64,

    /// Seconds to pause between entries
    #[arg(long, default_value_t = 10)]
    entry_delay: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        error!("{:#}", err);
        process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let api_key = env::var("GEMINI_API_KEY").context("GEMINI_API_KEY is not set")?;

    let config = Config {
        fetch: FetchConfig {
            feed_url: args.feed_url,
            user_agent: args.user_agent,
            timeout_seconds: args.timeout,
        },
        classifier: ClassifierConfig {
            api_key,
            model: args.model,
            retry_delay_seconds: args.retry_delay,
            ..ClassifierConfig::default()
        },
        checkpoint_path: args.checkpoint,
        output_path: args.output,
        cutoff: args.cutoff,
        entry_delay_seconds: args.entry_delay,
    };

    let classifier = GeminiClassifier::new(config.classifier.clone())?;
    let pipeline = FeedPipeline::new(config, classifier)?;
    let report = pipeline.run().await?;

    info!(
        "Run complete: {} new entries, {} classified, {} failed",
        report.new_entries, report.classified, report.failed
    );
    Ok(())
}
