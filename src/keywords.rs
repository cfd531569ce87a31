//! Keyword reference list
//!
//! The reference list pairs each keyword or topic with the category it
//! belongs to. The same keyword may appear more than once; occurrence counts
//! feed the frequency-weighted score in [`crate::weighting`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One row of the keyword reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    #[serde(rename = "Key Word Category")]
    pub category: String,
    #[serde(rename = "Key Words/Topics")]
    pub keyword: String,
}

/// The loaded reference list, in file order
#[derive(Debug, Clone, Default)]
pub struct KeywordList {
    entries: Vec<KeywordEntry>,
}

impl KeywordList {
    pub fn new(entries: Vec<KeywordEntry>) -> Self {
        Self { entries }
    }

    /// Parse the reference table from CSV bytes
    ///
    /// Fields are trimmed; rows with an empty category or keyword are
    /// rejected because every downstream match must map back to a real
    /// reference pair.
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(bytes);
        let mut entries = Vec::new();
        for (idx, row) in reader.deserialize::<KeywordEntry>().enumerate() {
            let mut entry = row?;
            entry.category = entry.category.trim().to_string();
            entry.keyword = entry.keyword.trim().to_string();
            if entry.category.is_empty() || entry.keyword.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "keyword reference row {} has an empty category or keyword",
                    idx + 2
                )));
            }
            entries.push(entry);
        }
        if entries.is_empty() {
            return Err(Error::InvalidInput(
                "keyword reference table has no rows".to_string(),
            ));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[KeywordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct categories in first-appearance order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.category.as_str()) {
                seen.push(entry.category.as_str());
            }
        }
        seen
    }

    /// Number of reference occurrences per (category, keyword) pair
    pub fn reference_counts(&self) -> HashMap<(String, String), usize> {
        let mut counts: HashMap<(String, String), usize> = HashMap::new();
        for entry in &self.entries {
            *counts
                .entry((entry.category.clone(), entry.keyword.clone()))
                .or_insert(0) += 1;
        }
        counts
    }

    /// True if the pair exists in the reference list
    pub fn contains(&self, category: &str, keyword: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.category == category && e.keyword == keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Key Word Category,Key Words/Topics
Growth,revenue growth
Growth,expansion
Risk,litigation
Risk,revenue growth
";

    #[test]
    fn test_from_csv_parses_rows() {
        let list = KeywordList::from_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list.entries()[0].category, "Growth");
        assert_eq!(list.entries()[0].keyword, "revenue growth");
        assert_eq!(list.categories(), vec!["Growth", "Risk"]);
    }

    #[test]
    fn test_reference_counts() {
        let csv = "\
Key Word Category,Key Words/Topics
Growth,expansion
Growth,expansion
Risk,litigation
";
        let list = KeywordList::from_csv(csv.as_bytes()).unwrap();
        let counts = list.reference_counts();
        assert_eq!(
            counts[&("Growth".to_string(), "expansion".to_string())],
            2
        );
        assert_eq!(counts[&("Risk".to_string(), "litigation".to_string())], 1);
    }

    #[test]
    fn test_rejects_empty_fields() {
        let csv = "Key Word Category,Key Words/Topics\nGrowth,\n";
        assert!(KeywordList::from_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_empty_table() {
        let csv = "Key Word Category,Key Words/Topics\n";
        assert!(KeywordList::from_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_trims_whitespace() {
        let csv = "Key Word Category,Key Words/Topics\n Growth , expansion \n";
        let list = KeywordList::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(list.entries()[0].category, "Growth");
        assert_eq!(list.entries()[0].keyword, "expansion");
        assert!(list.contains("Growth", "expansion"));
    }
}
