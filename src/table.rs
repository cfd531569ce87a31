//! Tabular artifacts
//!
//! Row types and CSV codecs for everything the pipeline reads and writes:
//! source tables, per-column output tables, cross-period compiled tables and
//! the weighted-score table. Header names follow the upstream reporting
//! convention ("Key Word Category", "Sentiment Score", ...), so artifacts
//! stay drop-in compatible with the sheets analysts already use.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Basename of a per-column output artifact
pub fn output_artifact(period: &str) -> String {
    format!("output_{}.csv", period)
}

/// Recover the period label from an output artifact key
///
/// Accepts either a bare basename or a full storage key; returns `None` for
/// artifacts that are not per-column outputs (compiled tables, charts, and
/// the `_weighted` tables written next to them).
pub fn period_from_artifact(key: &str) -> Option<&str> {
    let base = key.rsplit('/').next().unwrap_or(key);
    let period = base.strip_prefix("output_")?.strip_suffix(".csv")?;
    if period.ends_with("_weighted") {
        return None;
    }
    Some(period)
}

/// Basename of a compiled cross-period table
pub fn compiled_artifact(metric: &str) -> String {
    format!("compiled_results_{}.csv", metric.to_lowercase())
}

/// Basename of a rendered chart
pub fn chart_artifact(metric: &str) -> String {
    format!("average_{}_scores.svg", metric.to_lowercase())
}

/// A source table: named text columns, cells kept verbatim
#[derive(Debug, Clone)]
pub struct SourceTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SourceTable {
    /// Parse a source table from CSV bytes
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(bytes);
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.is_empty() {
            return Err(Error::InvalidInput("source table has no columns".into()));
        }
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(Self { headers, rows })
    }

    /// Column names in file order
    pub fn columns(&self) -> &[String] {
        &self.headers
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(|c| c.as_str()).unwrap_or(""))
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// One scored chunk in a per-column output table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    #[serde(rename = "Key Word Category")]
    pub category: String,
    #[serde(rename = "Keyword")]
    pub keyword: String,
    #[serde(rename = "Paragraph")]
    pub paragraph: String,
    #[serde(rename = "Sentiment Score")]
    pub sentiment: f64,
    #[serde(rename = "Magnitude")]
    pub magnitude: f64,
}

/// All scored chunks of one source column, in scoring order
#[derive(Debug, Clone, Default)]
pub struct OutputTable {
    pub period: String,
    pub rows: Vec<OutputRow>,
}

impl OutputTable {
    pub fn new(period: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            rows: Vec::new(),
        }
    }

    /// Basename this table persists under
    pub fn artifact(&self) -> String {
        output_artifact(&self.period)
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::InvalidInput(format!("csv buffer flush failed: {}", e)))
    }

    /// Parse a persisted output table; the period comes from the artifact key
    pub fn from_csv(key: &str, bytes: &[u8]) -> Result<Self> {
        let period = period_from_artifact(key)
            .ok_or_else(|| {
                Error::InvalidInput(format!("'{}' is not an output artifact", key))
            })?
            .to_string();
        let mut reader = csv::Reader::from_reader(bytes);
        let mut rows = Vec::new();
        for row in reader.deserialize::<OutputRow>() {
            rows.push(row?);
        }
        Ok(Self { period, rows })
    }
}

/// Cross-period category means for one metric
///
/// One row per category, one column per period. A `None` cell means the
/// category produced no rows in that period and serializes as an empty
/// field, never as a zero.
#[derive(Debug, Clone)]
pub struct CompiledTable {
    pub metric: String,
    pub periods: Vec<String>,
    rows: BTreeMap<String, Vec<Option<f64>>>,
}

impl CompiledTable {
    pub fn new(metric: impl Into<String>, periods: Vec<String>) -> Self {
        Self {
            metric: metric.into(),
            periods,
            rows: BTreeMap::new(),
        }
    }

    /// Set the mean for one (category, period) cell
    pub fn set(&mut self, category: &str, period: &str, mean: f64) {
        let width = self.periods.len();
        let idx = match self.periods.iter().position(|p| p == period) {
            Some(idx) => idx,
            None => return,
        };
        self.rows
            .entry(category.to_string())
            .or_insert_with(|| vec![None; width])[idx] = Some(mean);
    }

    pub fn get(&self, category: &str, period: &str) -> Option<f64> {
        let idx = self.periods.iter().position(|p| p == period)?;
        self.rows.get(category)?.get(idx).copied().flatten()
    }

    /// Categories in sorted order
    pub fn categories(&self) -> Vec<&str> {
        self.rows.keys().map(|k| k.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Basename this table persists under
    pub fn artifact(&self) -> String {
        compiled_artifact(&self.metric)
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec!["Key Word Category".to_string()];
        for period in &self.periods {
            header.push(format!("{} {}", self.metric, period));
        }
        writer.write_record(&header)?;
        for (category, cells) in &self.rows {
            let mut record = vec![category.clone()];
            for cell in cells {
                record.push(match cell {
                    Some(v) => format!("{}", v),
                    None => String::new(),
                });
            }
            writer.write_record(&record)?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::InvalidInput(format!("csv buffer flush failed: {}", e)))
    }
}

/// One row of the frequency-weighted score table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedRow {
    #[serde(rename = "Key Word Category")]
    pub category: String,
    #[serde(rename = "Keyword")]
    pub keyword: String,
    #[serde(rename = "Sentiment Score")]
    pub sentiment: f64,
    #[serde(rename = "Ratio")]
    pub ratio: f64,
    #[serde(rename = "Weighted Score")]
    pub weighted: f64,
}

/// Serialize weighted rows to CSV bytes
pub fn weighted_to_csv(rows: &[WeightedRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::InvalidInput(format!("csv buffer flush failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_from_artifact() {
        assert_eq!(period_from_artifact("output_Q1 2023.csv"), Some("Q1 2023"));
        assert_eq!(
            period_from_artifact("scores_magnitude/calls/output_Q1.csv"),
            Some("Q1")
        );
        assert_eq!(period_from_artifact("compiled_results_sentiment.csv"), None);
        assert_eq!(period_from_artifact("average_sentiment_scores.svg"), None);
    }

    #[test]
    fn test_period_from_artifact_skips_weighted_tables() {
        assert_eq!(period_from_artifact("output_Q1_weighted.csv"), None);
        assert_eq!(
            period_from_artifact("scores_magnitude/calls/output_2023-03_weighted.csv"),
            None
        );
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(output_artifact("Q1"), "output_Q1.csv");
        assert_eq!(
            compiled_artifact("Sentiment"),
            "compiled_results_sentiment.csv"
        );
        assert_eq!(chart_artifact("Magnitude"), "average_magnitude_scores.svg");
    }

    #[test]
    fn test_source_table_columns() {
        let csv = "Q1 2023,Q2 2023\nrevenue grew,costs rose\nsecond cell,\n";
        let table = SourceTable::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["Q1 2023", "Q2 2023"]);
        assert_eq!(
            table.column("Q1 2023").unwrap(),
            vec!["revenue grew", "second cell"]
        );
        assert_eq!(table.column("Q2 2023").unwrap(), vec!["costs rose", ""]);
        assert!(table.column("Q3 2023").is_none());
    }

    #[test]
    fn test_output_table_round_trip() {
        let mut table = OutputTable::new("Q1");
        table.rows.push(OutputRow {
            category: "Growth".to_string(),
            keyword: "expansion".to_string(),
            paragraph: "expansion continued".to_string(),
            sentiment: 0.5,
            magnitude: 0.25,
        });

        let bytes = table.to_csv().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("Key Word Category,Keyword,Paragraph,Sentiment Score,Magnitude"));

        let parsed = OutputTable::from_csv("output_Q1.csv", &bytes).unwrap();
        assert_eq!(parsed.period, "Q1");
        assert_eq!(parsed.rows, table.rows);
    }

    #[test]
    fn test_compiled_table_absent_cells_stay_empty() {
        let mut table = CompiledTable::new(
            "Sentiment",
            vec!["Q1".to_string(), "Q2".to_string()],
        );
        table.set("Growth", "Q1", 0.8);
        table.set("Risk", "Q1", -0.2);
        table.set("Risk", "Q2", -0.4);

        assert_eq!(table.get("Growth", "Q2"), None);

        let text = String::from_utf8(table.to_csv().unwrap()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Key Word Category,Sentiment Q1,Sentiment Q2"
        );
        assert_eq!(lines.next().unwrap(), "Growth,0.8,");
        assert_eq!(lines.next().unwrap(), "Risk,-0.2,-0.4");
    }

    #[test]
    fn test_compiled_table_ignores_unknown_period() {
        let mut table = CompiledTable::new("Sentiment", vec!["Q1".to_string()]);
        table.set("Growth", "Q9", 1.0);
        assert_eq!(table.row_count(), 0);
    }
}
