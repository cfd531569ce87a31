//! Chunk sentiment scoring
//!
//! Turns the classifier's three-class distribution into a single signed
//! scalar per chunk.

use crate::error::Result;
use crate::scoring::classifier::{ClassProbs, Classifier};

/// Collapse a class distribution into a signed sentiment score
///
/// The fixed weights (3x positive, 1x negative, 2x neutral) and the -2 shift
/// are this crate's scoring convention: a fully positive distribution maps
/// to +1, fully negative to -1, fully neutral to 0. The result always stays
/// within [-2, 2].
pub fn sentiment_score(probs: &ClassProbs) -> f64 {
    probs.negative + 2.0 * probs.neutral + 3.0 * probs.positive - 2.0
}

/// Scores chunks through a classifier backend
pub struct SentimentScorer {
    backend: Box<dyn Classifier>,
}

impl SentimentScorer {
    pub fn new(backend: Box<dyn Classifier>) -> Self {
        Self { backend }
    }

    /// Classify one chunk and collapse the distribution to a score
    pub async fn score(&self, chunk: &str) -> Result<f64> {
        let probs = self.backend.classify(chunk).await?;
        Ok(sentiment_score(&probs))
    }

    /// Name of the underlying backend
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::classifier::LexiconClassifier;

    #[test]
    fn test_boundary_distributions() {
        assert_eq!(sentiment_score(&ClassProbs::new(1.0, 0.0, 0.0)), 1.0);
        assert_eq!(sentiment_score(&ClassProbs::new(0.0, 1.0, 0.0)), -1.0);
        assert_eq!(sentiment_score(&ClassProbs::new(0.0, 0.0, 1.0)), 0.0);
    }

    #[test]
    fn test_mixed_distribution() {
        // 3*0.5 + 1*0.3 + 2*0.2 - 2
        let score = sentiment_score(&ClassProbs::new(0.5, 0.3, 0.2));
        assert!((score - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_score_stays_bounded() {
        let grid = [0.0, 0.25, 0.5, 0.75, 1.0];
        for &p in &grid {
            for &n in &grid {
                if p + n > 1.0 {
                    continue;
                }
                let probs = ClassProbs::new(p, n, 1.0 - p - n);
                let score = sentiment_score(&probs);
                assert!((-2.0..=2.0).contains(&score), "score {} out of range", score);
            }
        }
    }

    #[tokio::test]
    async fn test_scorer_with_lexicon_backend() {
        let scorer = SentimentScorer::new(Box::new(LexiconClassifier::new()));
        assert_eq!(scorer.backend_name(), "lexicon");

        let positive = scorer
            .score("Strong growth and record profit.")
            .await
            .unwrap();
        assert!(positive > 0.0);

        let neutral = scorer.score("The call starts at nine.").await.unwrap();
        assert_eq!(neutral, 0.0);
    }
}
