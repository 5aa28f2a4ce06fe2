//! Domain entities. Pure data structures for the journal.
//!
//! No SQL or HTTP types here; adapters map rows and payloads into these.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

/// A single journal entry with its derived sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub text: String,
    pub emoji: String,
    pub sentiment: String,
    pub sentiment_score: f64,
    pub created_at: DateTime<Utc>,
}

/// Entry as submitted by the client, before classification.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEntry {
    pub text: String,
    pub emoji: String,
}

impl NewEntry {
    /// Both fields must be non-empty after trimming.
    pub fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("text", &self.text)?;
        require_non_empty("emoji", &self.emoji)
    }
}

/// Row ready to be inserted: input plus classification and creation time.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub text: String,
    pub emoji: String,
    pub classification: Classification,
    pub created_at: DateTime<Utc>,
}

/// Partial update. Each field is applied independently when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryPatch {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.emoji.is_none()
    }

    /// Fields that are present must be non-empty.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(text) = &self.text {
            require_non_empty("text", text)?;
        }
        if let Some(emoji) = &self.emoji {
            require_non_empty("emoji", emoji)?;
        }
        Ok(())
    }
}

/// Patch after the new text (if any) has been classified. This is what the store applies.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPatch {
    /// New text together with its classification; written in one statement.
    pub text: Option<(String, Classification)>,
    pub emoji: Option<String>,
}

/// Classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub score: f64,
}

impl Classification {
    /// Checks the label is present and the score is a confidence in [0, 1].
    pub fn checked(label: impl Into<String>, score: f64) -> Result<Self, DomainError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(DomainError::Classification("empty sentiment label".into()));
        }
        if !(0.0..=1.0).contains(&score) {
            return Err(DomainError::Classification(format!(
                "score {} outside [0, 1]",
                score
            )));
        }
        Ok(Self { label, score })
    }
}

/// One row of an emoji rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiCount {
    pub emoji: String,
    pub count: u64,
}

/// Pagination window for listing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 50;

    /// Builds a page from raw client values; negatives are rejected.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, DomainError> {
        let limit = limit.unwrap_or(i64::from(Self::DEFAULT_LIMIT));
        let offset = offset.unwrap_or(0);
        Ok(Self {
            limit: page_bound("limit", limit)?,
            offset: page_bound("offset", offset)?,
        })
    }
}

fn page_bound(name: &str, value: i64) -> Result<u32, DomainError> {
    if value < 0 {
        return Err(DomainError::Validation(format!(
            "{} must be non-negative, got {}",
            name, value
        )));
    }
    u32::try_from(value).map_err(|_| {
        DomainError::Validation(format!("{} must be at most {}, got {}", name, u32::MAX, value))
    })
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Fixed-width UTC timestamp used for storage; lexicographic order matches time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn require_non_empty(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_entry_rejects_blank_fields() {
        let blank_text = NewEntry {
            text: "   ".into(),
            emoji: "😊".into(),
        };
        assert!(matches!(
            blank_text.validate(),
            Err(DomainError::Validation(_))
        ));

        let blank_emoji = NewEntry {
            text: "fine day".into(),
            emoji: String::new(),
        };
        assert!(matches!(
            blank_emoji.validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_patch_validation_only_checks_present_fields() {
        assert!(EntryPatch::default().validate().is_ok());
        assert!(EntryPatch::default().is_empty());

        let patch = EntryPatch {
            text: None,
            emoji: Some("🔥".into()),
        };
        assert!(patch.validate().is_ok());
        assert!(!patch.is_empty());

        let bad = EntryPatch {
            text: Some("".into()),
            emoji: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_classification_bounds() {
        assert!(Classification::checked("POSITIVE", 0.0).is_ok());
        assert!(Classification::checked("POSITIVE", 1.0).is_ok());
        assert!(Classification::checked("POSITIVE", 1.01).is_err());
        assert!(Classification::checked("POSITIVE", f64::NAN).is_err());
        assert!(Classification::checked(" ", 0.5).is_err());
    }

    #[test]
    fn test_page_defaults_and_negatives() {
        assert_eq!(Page::new(None, None).unwrap(), Page::default());
        assert_eq!(
            Page::new(Some(1), Some(3)).unwrap(),
            Page { limit: 1, offset: 3 }
        );
        assert!(Page::new(Some(-1), None).is_err());
        assert!(Page::new(None, Some(-5)).is_err());
    }

    #[test]
    fn test_page_over_range_has_its_own_message() {
        let err = Page::new(Some(5_000_000_000), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            DomainError::Validation("limit must be at most 4294967295, got 5000000000".into())
                .to_string()
        );
        let err = Page::new(None, Some(-2)).unwrap_err();
        assert!(err.to_string().contains("offset must be non-negative, got -2"));
    }

    #[test]
    fn test_timestamp_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();
        let (fa, fb) = (format_timestamp(&a), format_timestamp(&b));
        assert_eq!(fa, "2024-01-01T00:00:00.000000Z");
        assert_eq!(fa.len(), fb.len());
        assert!(fa < fb);
    }
}
