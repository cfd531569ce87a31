//! Keyword matcher
//!
//! Scans the cells of a text column for reference keywords with a
//! case-insensitive substring test. Each (cell, reference row) hit yields
//! one matched paragraph, so a cell mentioning several keywords is scored
//! once per keyword.

use crate::keywords::KeywordList;

/// A cell that matched one reference keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedParagraph {
    pub category: String,
    pub keyword: String,
    pub text: String,
}

/// Matcher with keywords lowercased once up front
pub struct KeywordMatcher {
    // (category, keyword, lowercased keyword)
    entries: Vec<(String, String, String)>,
}

impl KeywordMatcher {
    pub fn new(keywords: &KeywordList) -> Self {
        let entries = keywords
            .entries()
            .iter()
            .map(|e| (e.category.clone(), e.keyword.clone(), e.keyword.to_lowercase()))
            .collect();
        Self { entries }
    }

    /// Match every cell of a column against every reference row
    ///
    /// Results follow reference-list order, then cell order. Non-matching
    /// cells produce nothing.
    pub fn match_column(&self, cells: &[&str]) -> Vec<MatchedParagraph> {
        let lowered: Vec<String> = cells.iter().map(|c| c.to_lowercase()).collect();
        let mut matches = Vec::new();
        for (category, keyword, needle) in &self.entries {
            for (cell, cell_lower) in cells.iter().zip(&lowered) {
                if cell_lower.contains(needle.as_str()) {
                    matches.push(MatchedParagraph {
                        category: category.clone(),
                        keyword: keyword.clone(),
                        text: (*cell).to_string(),
                    });
                }
            }
        }
        matches
    }
}
