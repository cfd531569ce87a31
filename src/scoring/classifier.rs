//! Sentiment classifier oracle
//!
//! The classifier is a pretrained model reached over HTTP, or a lexicon
//! stand-in for offline runs and tests. Either way it returns a probability
//! distribution over the three classes (positive, negative, neutral) and is
//! responsible for its own input limits; callers feed it pre-chunked text.

use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Probability distribution over the classifier's three classes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbs {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl ClassProbs {
    pub fn new(positive: f64, negative: f64, neutral: f64) -> Self {
        Self {
            positive,
            negative,
            neutral,
        }
    }

    /// True if every probability is in [0, 1] and they sum to ~1
    pub fn is_distribution(&self) -> bool {
        let in_range =
            |p: f64| (0.0..=1.0).contains(&p);
        in_range(self.positive)
            && in_range(self.negative)
            && in_range(self.neutral)
            && (self.positive + self.negative + self.neutral - 1.0).abs() < 1e-6
    }
}

/// Trait for sentiment classifier backends
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one chunk of text
    async fn classify(&self, text: &str) -> Result<ClassProbs>;

    /// Get the backend name/model
    fn name(&self) -> &str;
}

/// One labeled class probability in an inference response
#[derive(Debug, Serialize, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Map labeled scores onto the fixed class order
fn probs_from_labels(labels: &[LabelScore]) -> Result<ClassProbs> {
    let mut probs = ClassProbs::new(0.0, 0.0, 0.0);
    for entry in labels {
        match entry.label.to_lowercase().as_str() {
            "positive" => probs.positive = entry.score,
            "negative" => probs.negative = entry.score,
            "neutral" => probs.neutral = entry.score,
            other => {
                return Err(Error::Scoring(format!(
                    "classifier returned unknown label '{}'",
                    other
                )))
            }
        }
    }
    if !probs.is_distribution() {
        return Err(Error::Scoring(format!(
            "classifier response is not a probability distribution: {:?}",
            probs
        )));
    }
    Ok(probs)
}

/// HTTP-backed classifier with bounded retry
pub struct RemoteClassifier {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
}

const RETRY_BASE_MS: u64 = 500;

impl RemoteClassifier {
    /// Create a classifier against an inference endpoint
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            token: None,
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }

    /// Set the bearer token sent with each request
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of attempts for retryable failures
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    async fn request(&self, text: &str) -> Result<ClassProbs> {
        let body = serde_json::json!({ "text": text });

        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&body);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(Error::RateLimit {
                retry_after_secs: 5,
            });
        }
        if status.is_server_error() {
            return Err(Error::Inference(format!(
                "classifier endpoint returned {}",
                status
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Scoring(format!(
                "classifier endpoint returned {}: {}",
                status, text
            )));
        }

        let labels: Vec<LabelScore> = response.json().await?;
        probs_from_labels(&labels)
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn classify(&self, text: &str) -> Result<ClassProbs> {
        let mut attempt = 0;
        loop {
            match self.request(text).await {
                Ok(probs) => {
                    debug!(chars = text.chars().count(), "classified chunk");
                    return Ok(probs);
                }
                Err(e) if e.is_retryable() && attempt + 1 < self.max_retries => {
                    let backoff = Duration::from_millis(RETRY_BASE_MS << attempt);
                    warn!(attempt, error = %e, "classifier request failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        "remote"
    }
}

/// Deterministic lexicon-backed classifier for offline runs and tests
///
/// Counts positive and negative vocabulary hits in the text and turns the
/// counts into a distribution. More hits shift weight away from neutral;
/// text with no hits classifies as fully neutral.
pub struct LexiconClassifier;

static POSITIVE_WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
static NEGATIVE_WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();

fn positive_words() -> &'static HashSet<&'static str> {
    POSITIVE_WORDS.get_or_init(|| {
        HashSet::from([
            "growth", "profit", "beat", "strong", "record", "gain", "gains",
            "improve", "improved", "exceed", "exceeded", "expansion",
            "momentum", "outperform", "upgrade", "success", "successful",
            "opportunity", "confident", "resilient", "surge", "rally",
        ])
    })
}

fn negative_words() -> &'static HashSet<&'static str> {
    NEGATIVE_WORDS.get_or_init(|| {
        HashSet::from([
            "loss", "losses", "decline", "declined", "miss", "missed",
            "weak", "weakness", "risk", "risks", "concern", "concerns",
            "litigation", "impairment", "downgrade", "fall", "drop",
            "layoff", "layoffs", "warning", "shortfall", "uncertainty",
            "headwind", "headwinds", "crash",
        ])
    })
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    fn count_hits(text: &str) -> (usize, usize) {
        let lower = text.to_lowercase();
        let mut positive = 0;
        let mut negative = 0;
        for token in lower.split_whitespace() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric());
            if positive_words().contains(token) {
                positive += 1;
            } else if negative_words().contains(token) {
                negative += 1;
            }
        }
        (positive, negative)
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<ClassProbs> {
        let (positive, negative) = Self::count_hits(text);
        let total = positive + negative;
        if total == 0 {
            return Ok(ClassProbs::new(0.0, 0.0, 1.0));
        }
        let confidence = total as f64 / (total as f64 + 1.0);
        Ok(ClassProbs::new(
            confidence * positive as f64 / total as f64,
            confidence * negative as f64 / total as f64,
            1.0 - confidence,
        ))
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}
