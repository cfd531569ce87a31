//! Scoring oracles and the scores derived from them
//!
//! Two opaque collaborators live behind traits here: a pretrained three-class
//! sentiment classifier and a lexicon-based per-sentence polarity rater. The
//! sentiment and magnitude scorers wrap them and own the numeric conventions.

pub mod classifier;
pub mod magnitude;
pub mod sentiment;

pub use classifier::{ClassProbs, Classifier, LexiconClassifier, RemoteClassifier};
pub use magnitude::{LexiconRater, MagnitudeScorer, PolarityRater};
pub use sentiment::{sentiment_score, SentimentScorer};
