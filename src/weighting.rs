//! Frequency-weighted overall score
//!
//! A keyword's weight is how often it appears in the reference list relative
//! to the number of matched rows in the scored document. Document rows join
//! to reference pairs on (category, keyword); each joined row contributes
//! sentiment times ratio, and the overall score is the sum. A join that
//! produces no rows is an error, not a zero.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::keywords::KeywordList;
use crate::storage::{content_type_for, ObjectStore};
use crate::table::{weighted_to_csv, OutputRow, OutputTable, WeightedRow};

/// Result of weighting one scored document
#[derive(Debug, Clone)]
pub struct WeightedOutcome {
    pub rows: Vec<WeightedRow>,
    pub overall: f64,
    /// Key of the persisted weighted table
    pub artifact: String,
}

/// Join document rows to reference ratios and weight their sentiment
///
/// `total` is the number of matched rows in the document, joined or not;
/// rows whose pair is missing from the reference drop out of the join.
pub fn weight_rows(
    rows: &[OutputRow],
    counts: &HashMap<(String, String), usize>,
    artifact: &str,
) -> Result<(Vec<WeightedRow>, f64)> {
    let total = rows.len();
    let mut weighted = Vec::new();
    let mut overall = 0.0;

    for row in rows {
        let pair = (row.category.clone(), row.keyword.clone());
        if let Some(count) = counts.get(&pair) {
            let ratio = *count as f64 / total as f64;
            let score = row.sentiment * ratio;
            weighted.push(WeightedRow {
                category: row.category.clone(),
                keyword: row.keyword.clone(),
                sentiment: row.sentiment,
                ratio,
                weighted: score,
            });
            overall += score;
        }
    }

    if weighted.is_empty() {
        return Err(Error::JoinMismatch {
            artifact: artifact.to_string(),
        });
    }
    Ok((weighted, overall))
}

/// Weighs persisted output tables against the keyword reference
pub struct WeightCalculator {
    store: Arc<dyn ObjectStore>,
    config: AppConfig,
}

impl WeightCalculator {
    pub fn new(store: Arc<dyn ObjectStore>, config: AppConfig) -> Self {
        Self { store, config }
    }

    /// Weigh one output table of a batch and persist the joined rows
    ///
    /// `artifact` is a basename inside the batch folder or a full key.
    pub async fn weigh(&self, batch: &str, artifact: &str) -> Result<WeightedOutcome> {
        let key = if artifact.contains('/') {
            artifact.to_string()
        } else {
            format!("{}/{}", self.config.batch_prefix(batch), artifact)
        };

        let bytes = self
            .store
            .get(&key)
            .await
            .map_err(|e| Error::input_load(&key, e))?;
        let table = OutputTable::from_csv(&key, &bytes).map_err(|e| Error::input_load(&key, e))?;

        let keywords_key = self.config.keywords_key();
        let keyword_bytes = self
            .store
            .get(&keywords_key)
            .await
            .map_err(|e| Error::input_load(&keywords_key, e))?;
        let keywords =
            KeywordList::from_csv(&keyword_bytes).map_err(|e| Error::input_load(&keywords_key, e))?;

        let (rows, overall) = weight_rows(&table.rows, &keywords.reference_counts(), &key)?;

        let weighted_key = match key.strip_suffix(".csv") {
            Some(stem) => format!("{}_weighted.csv", stem),
            None => format!("{}_weighted.csv", key),
        };
        let bytes = weighted_to_csv(&rows).map_err(|e| Error::persist(&weighted_key, e))?;
        self.store
            .put(&weighted_key, bytes, content_type_for(&weighted_key))
            .await
            .map_err(|e| Error::persist(&weighted_key, e))?;

        info!(batch, artifact = %weighted_key, overall, "weighted table written");
        Ok(WeightedOutcome {
            rows,
            overall,
            artifact: weighted_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStore;

    fn doc_row(category: &str, keyword: &str, sentiment: f64) -> OutputRow {
        OutputRow {
            category: category.to_string(),
            keyword: keyword.to_string(),
            paragraph: "text".to_string(),
            sentiment,
            magnitude: 0.0,
        }
    }

    fn counts(pairs: &[(&str, &str, usize)]) -> HashMap<(String, String), usize> {
        pairs
            .iter()
            .map(|(c, k, n)| ((c.to_string(), k.to_string()), *n))
            .collect()
    }

    #[test]
    fn test_single_row_ratio_and_overall() {
        let rows = vec![doc_row("CatA", "kw1", 1.0)];
        let reference = counts(&[("CatA", "kw1", 2), ("CatA", "kw2", 1)]);

        let (weighted, overall) = weight_rows(&rows, &reference, "t.csv").unwrap();
        assert_eq!(weighted.len(), 1);
        assert_eq!(weighted[0].ratio, 2.0);
        assert_eq!(weighted[0].weighted, 2.0);
        assert_eq!(overall, 2.0);
    }

    #[test]
    fn test_unjoined_rows_count_toward_total_but_not_score() {
        let rows = vec![
            doc_row("CatA", "kw1", 1.0),
            doc_row("CatX", "unknown", 5.0),
        ];
        let reference = counts(&[("CatA", "kw1", 1)]);

        let (weighted, overall) = weight_rows(&rows, &reference, "t.csv").unwrap();
        assert_eq!(weighted.len(), 1);
        assert_eq!(weighted[0].ratio, 0.5);
        assert_eq!(overall, 0.5);
    }

    #[test]
    fn test_empty_join_is_an_error() {
        let rows = vec![doc_row("CatX", "unknown", 1.0)];
        let reference = counts(&[("CatA", "kw1", 1)]);
        match weight_rows(&rows, &reference, "output_Q1.csv") {
            Err(Error::JoinMismatch { artifact }) => assert_eq!(artifact, "output_Q1.csv"),
            other => panic!("expected JoinMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_document_is_an_error() {
        let reference = counts(&[("CatA", "kw1", 1)]);
        assert!(matches!(
            weight_rows(&[], &reference, "t.csv"),
            Err(Error::JoinMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_weigh_persists_joined_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.root = dir.path().to_string_lossy().into_owned();
        let store = Arc::new(LocalStore::new(dir.path()));

        store
            .put(
                &config.keywords_key(),
                b"Key Word Category,Key Words/Topics\nGrowth,expansion\nGrowth,expansion\n"
                    .to_vec(),
                "text/csv",
            )
            .await
            .unwrap();

        let table = OutputTable {
            period: "Q1".to_string(),
            rows: vec![doc_row("Growth", "expansion", 0.5)],
        };
        store
            .put(
                "scores_magnitude/calls/output_Q1.csv",
                table.to_csv().unwrap(),
                "text/csv",
            )
            .await
            .unwrap();

        let calculator = WeightCalculator::new(store.clone(), config);
        let outcome = calculator.weigh("calls", "output_Q1.csv").await.unwrap();

        // one doc row, reference pair occurs twice: ratio 2, overall 1.0
        assert_eq!(outcome.rows[0].ratio, 2.0);
        assert_eq!(outcome.overall, 1.0);
        assert_eq!(
            outcome.artifact,
            "scores_magnitude/calls/output_Q1_weighted.csv"
        );

        let bytes = store.get(&outcome.artifact).await.unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Key Word Category,Keyword,Sentiment Score,Ratio,Weighted Score"));
        assert!(text.contains("Growth,expansion,0.5,2.0,1.0"));
    }
}
