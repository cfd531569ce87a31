//! Keyword Sentiment - Batch Text Scoring Toolkit
//!
//! This crate computes keyword-weighted sentiment and magnitude scores for
//! batches of documents, aggregates the scores across reporting periods,
//! renders charts and serves the results over a small JSON API backed by
//! object storage.
//!
//! The sentiment classifier and the per-sentence polarity rater are opaque
//! collaborators behind traits, so the pipeline runs against a remote
//! inference endpoint in production and against bundled lexicon backends
//! offline and in tests.
//!
//! # Modules
//!
//! - `keywords`: keyword reference list and occurrence counts
//! - `matcher`: case-insensitive keyword matching over table columns
//! - `text`: fixed-size chunking and sentence splitting
//! - `scoring`: classifier and polarity oracles, sentiment and magnitude
//! - `pipeline`: per-batch processing into per-column output tables
//! - `aggregate`: cross-period means, compiled tables and charts
//! - `weighting`: frequency-weighted overall score
//! - `storage`: object store backends (local filesystem, GCS)
//! - `server`: JSON endpoints for the upload/display workflow
//!
//! # Example
//!
//! ```rust,no_run
//! use keyword_sentiment::config::AppConfig;
//! use keyword_sentiment::pipeline::ScoringPipeline;
//! use keyword_sentiment::storage::store_from_config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::default();
//!     let store = store_from_config(&config)?;
//!     let pipeline = ScoringPipeline::from_config(&config, store, true);
//!
//!     let report = pipeline.process_batch("q1_calls").await?;
//!     println!("rows: {}, skipped: {}", report.total_rows(), report.total_skipped());
//!
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod error;
pub mod keywords;
pub mod matcher;
pub mod pipeline;
pub mod scoring;
pub mod server;
pub mod storage;
pub mod table;
pub mod text;
pub mod weighting;

// Re-exports for convenience
pub use aggregate::{Aggregator, CompiledBatch};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use keywords::{KeywordEntry, KeywordList};
pub use matcher::{KeywordMatcher, MatchedParagraph};
pub use pipeline::{BatchReport, ScoringPipeline};
pub use scoring::{ClassProbs, MagnitudeScorer, SentimentScorer};
pub use storage::{ObjectStore, store_from_config};
pub use table::{CompiledTable, OutputRow, OutputTable, SourceTable};
pub use weighting::{WeightCalculator, WeightedOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
