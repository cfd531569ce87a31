//! Cross-period aggregation
//!
//! Reads every per-column output table of a batch folder, averages sentiment
//! and magnitude per keyword category, and joins the per-period means into
//! two compiled tables. A category missing from a period keeps an absent
//! cell; means are never invented. The compiled tables and one line chart
//! per metric are persisted back into the batch folder.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::chart::render_line_chart;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::storage::{content_type_for, ObjectStore};
use crate::table::{
    chart_artifact, compiled_artifact, period_from_artifact, CompiledTable, OutputRow,
    OutputTable,
};

/// Compiled artifacts of one batch
#[derive(Debug, Clone)]
pub struct CompiledBatch {
    pub batch: String,
    pub sentiment: CompiledTable,
    pub magnitude: CompiledTable,
    /// Keys written into the batch folder
    pub artifacts: Vec<String>,
}

/// Aggregates a processed batch folder
pub struct Aggregator {
    store: Arc<dyn ObjectStore>,
    config: AppConfig,
}

impl Aggregator {
    pub fn new(store: Arc<dyn ObjectStore>, config: AppConfig) -> Self {
        Self { store, config }
    }

    /// Compile both metrics for a batch and persist tables plus charts
    pub async fn compile_batch(&self, batch: &str) -> Result<CompiledBatch> {
        let prefix = format!("{}/", self.config.batch_prefix(batch));
        let keys = self.store.list(&prefix).await?;
        let output_keys: Vec<&String> = keys
            .iter()
            .filter(|k| period_from_artifact(k).is_some())
            .collect();
        if output_keys.is_empty() {
            return Err(Error::input_load(
                &prefix,
                "no output tables found; process the batch first",
            ));
        }

        let mut periods: Vec<String> = output_keys
            .iter()
            .filter_map(|k| period_from_artifact(k))
            .map(|p| p.to_string())
            .collect();
        periods.sort();
        periods.dedup();

        let mut sentiment = CompiledTable::new("Sentiment", periods.clone());
        let mut magnitude = CompiledTable::new("Magnitude", periods);

        for key in &output_keys {
            let bytes = self
                .store
                .get(key)
                .await
                .map_err(|e| Error::input_load(key, e))?;
            let table = OutputTable::from_csv(key, &bytes)
                .map_err(|e| Error::input_load(key, e))?;
            for (category, (mean_sentiment, mean_magnitude)) in group_means(&table.rows) {
                sentiment.set(&category, &table.period, mean_sentiment);
                magnitude.set(&category, &table.period, mean_magnitude);
            }
        }

        let mut artifacts = Vec::new();
        for table in [&sentiment, &magnitude] {
            let key = format!("{}{}", prefix, table.artifact());
            let bytes = table.to_csv().map_err(|e| Error::persist(&key, e))?;
            self.store
                .put(&key, bytes, content_type_for(&key))
                .await
                .map_err(|e| Error::persist(&key, e))?;
            artifacts.push(key);

            let title = format!("Average {} Scores by Keyword Category", table.metric);
            let svg = render_line_chart(table, &title);
            let chart_key = format!("{}{}", prefix, chart_artifact(&table.metric));
            self.store
                .put(&chart_key, svg.into_bytes(), content_type_for(&chart_key))
                .await
                .map_err(|e| Error::persist(&chart_key, e))?;
            artifacts.push(chart_key);
        }

        info!(
            batch,
            categories = sentiment.row_count(),
            periods = sentiment.periods.len(),
            "batch compiled"
        );
        Ok(CompiledBatch {
            batch: batch.to_string(),
            sentiment,
            magnitude,
            artifacts,
        })
    }

    /// Public URLs of the displayable artifacts: every chart plus the two
    /// compiled tables
    pub async fn result_urls(&self, batch: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", self.config.batch_prefix(batch));
        let keys = self.store.list(&prefix).await?;
        let urls = keys
            .iter()
            .filter(|key| {
                let base = key.rsplit('/').next().unwrap_or(key.as_str());
                base.ends_with(".svg")
                    || base == compiled_artifact("Sentiment")
                    || base == compiled_artifact("Magnitude")
            })
            .map(|key| self.store.public_url(key))
            .collect();
        Ok(urls)
    }
}

/// Per-category (mean sentiment, mean magnitude) of one table's rows
fn group_means(rows: &[OutputRow]) -> BTreeMap<String, (f64, f64)> {
    let mut sums: BTreeMap<String, (f64, f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = sums.entry(row.category.clone()).or_insert((0.0, 0.0, 0));
        entry.0 += row.sentiment;
        entry.1 += row.magnitude;
        entry.2 += 1;
    }
    sums.into_iter()
        .map(|(category, (s, m, n))| (category, (s / n as f64, m / n as f64)))
        .collect()
}
