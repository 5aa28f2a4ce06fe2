//! Offline word-list classifier.
//!
//! Used when no inference endpoint is configured, and in tests. Deterministic:
//! the same text always yields the same label and score.

use crate::domain::{Classification, DomainError};
use crate::ports::ClassifierPort;
use tracing::debug;

pub const POSITIVE: &str = "POSITIVE";
pub const NEGATIVE: &str = "NEGATIVE";

const POSITIVE_WORDS: &[&str] = &[
    "love", "loved", "like", "liked", "great", "good", "happy", "glad", "joy", "excited",
    "awesome", "amazing", "wonderful", "fantastic", "calm", "grateful", "thankful", "fun",
    "proud", "relaxed", "peaceful", "best", "nice", "beautiful", "enjoyed", "enjoy", "win",
    "smile", "laughed", "hopeful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "hate", "hated", "bad", "sad", "angry", "upset", "awful", "terrible", "horrible", "tired",
    "stressed", "anxious", "worried", "lonely", "bored", "annoyed", "hurt", "cry", "cried",
    "worst", "fail", "failed", "sick", "afraid", "scared", "miserable", "frustrated", "lost",
    "pain", "disappointed",
];

const NEGATORS: &[&str] = &["not", "no", "never", "don't", "didn't", "isn't", "wasn't", "can't"];

/// Word-list classifier. Counts positive and negative words (a preceding negator
/// flips a word) and maps the margin to a confidence in [0.5, 1).
#[derive(Debug, Default, Clone)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Ties (including text with no known words) are labelled positive at 0.5.
    pub fn score(text: &str) -> Classification {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .collect();

        let (mut pos, mut neg) = (0u32, 0u32);
        for (i, token) in tokens.iter().enumerate() {
            let negated = i > 0 && NEGATORS.contains(&tokens[i - 1]);
            let polarity = if POSITIVE_WORDS.contains(token) {
                1
            } else if NEGATIVE_WORDS.contains(token) {
                -1
            } else {
                0
            };
            match (polarity, negated) {
                (1, false) | (-1, true) => pos += 1,
                (-1, false) | (1, true) => neg += 1,
                _ => {}
            }
        }

        let margin = f64::from(pos.abs_diff(neg));
        let score = 0.5 + 0.5 * margin / (margin + 1.0);
        let label = if neg > pos { NEGATIVE } else { POSITIVE };
        Classification {
            label: label.to_string(),
            score,
        }
    }
}

#[async_trait::async_trait]
impl ClassifierPort for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, DomainError> {
        let classification = Self::score(text);
        debug!(
            label = %classification.label,
            score = classification.score,
            "[LEXICON] classified text"
        );
        Ok(classification)
    }
}
