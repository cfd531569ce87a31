//! Per-batch scoring pipeline
//!
//! Loads the keyword reference and a batch's source table, matches keywords
//! column by column, chunks the matched paragraphs, scores every chunk for
//! sentiment and magnitude and persists one output table per column. A chunk
//! whose scoring fails is skipped and recorded in the report; the column
//! keeps going. Input-load and persist failures stay fatal for the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::keywords::KeywordList;
use crate::matcher::KeywordMatcher;
use crate::scoring::{
    LexiconClassifier, LexiconRater, MagnitudeScorer, RemoteClassifier, SentimentScorer,
};
use crate::storage::{content_type_for, ObjectStore};
use crate::table::{OutputRow, OutputTable, SourceTable};
use crate::text::chunks;

/// A chunk that could not be scored
#[derive(Debug, Clone, Serialize)]
pub struct SkippedChunk {
    pub keyword: String,
    pub chunk_index: usize,
    pub reason: String,
}

/// Outcome of one source column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnReport {
    pub period: String,
    pub artifact: String,
    pub rows: usize,
    pub skipped: Vec<SkippedChunk>,
}

/// Outcome of one batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch: String,
    pub columns: Vec<ColumnReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    /// Total rows across all columns
    pub fn total_rows(&self) -> usize {
        self.columns.iter().map(|c| c.rows).sum()
    }

    /// Total skipped chunks across all columns
    pub fn total_skipped(&self) -> usize {
        self.columns.iter().map(|c| c.skipped.len()).sum()
    }
}

/// The batch scoring pipeline
pub struct ScoringPipeline {
    store: Arc<dyn ObjectStore>,
    sentiment: SentimentScorer,
    magnitude: MagnitudeScorer,
    config: AppConfig,
}

impl ScoringPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        sentiment: SentimentScorer,
        magnitude: MagnitudeScorer,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            sentiment,
            magnitude,
            config,
        }
    }

    /// Build a pipeline with backends chosen from the configuration
    ///
    /// `offline` swaps the remote classifier for the bundled lexicon
    /// backend; the polarity rater is lexicon-based either way.
    pub fn from_config(config: &AppConfig, store: Arc<dyn ObjectStore>, offline: bool) -> Self {
        let sentiment = if offline {
            SentimentScorer::new(Box::new(LexiconClassifier::new()))
        } else {
            let classifier = RemoteClassifier::new(&config.classifier.endpoint)
                .with_token(config.classifier_token())
                .with_timeout(Duration::from_secs(config.classifier.timeout_secs))
                .with_max_retries(config.classifier.max_retries);
            SentimentScorer::new(Box::new(classifier))
        };
        let magnitude = MagnitudeScorer::new(Box::new(LexiconRater::new()));
        Self::new(store, sentiment, magnitude, config.clone())
    }

    /// Run the whole pipeline for one batch
    pub async fn process_batch(&self, batch: &str) -> Result<BatchReport> {
        let started_at = Utc::now();
        info!(batch, backend = self.sentiment.backend_name(), "processing batch");

        let keywords = self.load_keywords().await?;
        let source = self.load_source(batch).await?;
        let matcher = KeywordMatcher::new(&keywords);

        let mut columns = Vec::new();
        for column in source.columns() {
            let report = self.process_column(batch, &source, &matcher, column).await?;
            columns.push(report);
        }

        let report = BatchReport {
            batch: batch.to_string(),
            columns,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            batch,
            rows = report.total_rows(),
            skipped = report.total_skipped(),
            "batch complete"
        );
        Ok(report)
    }

    async fn load_keywords(&self) -> Result<KeywordList> {
        let key = self.config.keywords_key();
        let bytes = self
            .store
            .get(&key)
            .await
            .map_err(|e| Error::input_load(&key, e))?;
        KeywordList::from_csv(&bytes).map_err(|e| Error::input_load(&key, e))
    }

    async fn load_source(&self, batch: &str) -> Result<SourceTable> {
        let key = self.config.input_key(batch);
        let bytes = self
            .store
            .get(&key)
            .await
            .map_err(|e| Error::input_load(&key, e))?;
        SourceTable::from_csv(&bytes).map_err(|e| Error::input_load(&key, e))
    }

    async fn process_column(
        &self,
        batch: &str,
        source: &SourceTable,
        matcher: &KeywordMatcher,
        column: &str,
    ) -> Result<ColumnReport> {
        let cells = source.column(column).unwrap_or_default();
        let matches = matcher.match_column(&cells);
        info!(batch, column, matches = matches.len(), "scoring column");

        let mut table = OutputTable::new(column);
        let mut skipped = Vec::new();
        let chunk_size = self.config.pipeline.chunk_size;

        for matched in &matches {
            for (chunk_index, chunk) in chunks(&matched.text, chunk_size).enumerate() {
                match self.score_chunk(chunk).await {
                    Ok((sentiment, magnitude)) => table.rows.push(OutputRow {
                        category: matched.category.clone(),
                        keyword: matched.keyword.clone(),
                        paragraph: chunk.to_string(),
                        sentiment,
                        magnitude,
                    }),
                    Err(e) => {
                        warn!(
                            batch,
                            column,
                            keyword = %matched.keyword,
                            chunk_index,
                            error = %e,
                            "chunk skipped"
                        );
                        skipped.push(SkippedChunk {
                            keyword: matched.keyword.clone(),
                            chunk_index,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        // an empty table is still written so the period shows up downstream
        let key = format!("{}/{}", self.config.batch_prefix(batch), table.artifact());
        let bytes = table.to_csv().map_err(|e| Error::persist(&key, e))?;
        self.store
            .put(&key, bytes, content_type_for(&key))
            .await
            .map_err(|e| Error::persist(&key, e))?;

        Ok(ColumnReport {
            period: column.to_string(),
            artifact: key,
            rows: table.rows.len(),
            skipped,
        })
    }

    async fn score_chunk(&self, chunk: &str) -> Result<(f64, f64)> {
        let sentiment = self.sentiment.score(chunk).await?;
        let magnitude = self.magnitude.magnitude(chunk).await?;
        Ok((sentiment, magnitude))
    }
}
