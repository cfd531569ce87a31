//! Chunk magnitude scoring
//!
//! Magnitude measures how emotionally loaded a chunk is, regardless of
//! direction: each sentence gets a signed polarity from the rater and the
//! chunk's magnitude is the sum of their absolute values.

use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::text::split_sentences;

/// Trait for per-sentence polarity raters
///
/// A rating is a signed compound polarity in [-1, 1].
#[async_trait]
pub trait PolarityRater: Send + Sync {
    async fn polarity(&self, sentence: &str) -> Result<f64>;

    fn name(&self) -> &str;
}

/// Lexicon-based polarity rater
///
/// Sums the valence of known words in the sentence and squashes the raw sum
/// onto (-1, 1) with s / sqrt(s^2 + 15), so a single strong word rates lower
/// than several reinforcing ones.
pub struct LexiconRater;

static VALENCE: OnceLock<HashMap<&'static str, f64>> = OnceLock::new();

fn valence_table() -> &'static HashMap<&'static str, f64> {
    VALENCE.get_or_init(|| {
        HashMap::from([
            ("growth", 1.6),
            ("profit", 1.8),
            ("strong", 1.4),
            ("record", 1.2),
            ("gain", 1.5),
            ("gains", 1.5),
            ("improved", 1.7),
            ("beat", 1.3),
            ("success", 2.0),
            ("successful", 1.9),
            ("momentum", 1.1),
            ("opportunity", 1.4),
            ("confident", 1.6),
            ("resilient", 1.3),
            ("exceed", 1.5),
            ("exceeded", 1.5),
            ("surge", 1.7),
            ("rally", 1.4),
            ("loss", -1.9),
            ("losses", -1.9),
            ("decline", -1.4),
            ("declined", -1.4),
            ("weak", -1.5),
            ("weakness", -1.6),
            ("risk", -1.1),
            ("risks", -1.1),
            ("concern", -1.3),
            ("concerns", -1.3),
            ("litigation", -1.6),
            ("miss", -1.2),
            ("missed", -1.2),
            ("impairment", -1.8),
            ("downgrade", -1.7),
            ("warning", -1.4),
            ("shortfall", -1.6),
            ("uncertainty", -1.2),
            ("crash", -2.4),
            ("fall", -1.1),
            ("drop", -1.3),
        ])
    })
}

impl LexiconRater {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LexiconRater {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolarityRater for LexiconRater {
    async fn polarity(&self, sentence: &str) -> Result<f64> {
        let lower = sentence.to_lowercase();
        let mut raw = 0.0;
        for token in lower.split_whitespace() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric());
            if let Some(valence) = valence_table().get(token) {
                raw += valence;
            }
        }
        Ok(raw / (raw * raw + 15.0).sqrt())
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

/// Scores chunk magnitude through a polarity rater
pub struct MagnitudeScorer {
    rater: Box<dyn PolarityRater>,
}

impl MagnitudeScorer {
    pub fn new(rater: Box<dyn PolarityRater>) -> Self {
        Self { rater }
    }

    /// Sum of absolute sentence polarities; zero sentences score 0
    pub async fn magnitude(&self, chunk: &str) -> Result<f64> {
        let mut total = 0.0;
        for sentence in split_sentences(chunk) {
            total += self.rater.polarity(sentence).await?.abs();
        }
        Ok(total)
    }

    pub fn rater_name(&self) -> &str {
        self.rater.name()
    }
}
