pub mod checkpoint;
pub mod classifier;
pub mod config;
pub mod fetcher;
pub mod parser;
pub mod pipeline;
pub mod types;
pub mod writer;

pub use classifier::{Classifier, GeminiClassifier};
pub use config::{ClassifierConfig, Config, FetchConfig};
pub use fetcher::FeedFetcher;
pub use pipeline::FeedPipeline;
pub use types::*;
pub use writer::ResultWriter;
