//! Entry service. Classify, then persist: create / get / list / update / delete.
//!
//! Classification always finishes before the store is touched, so a classifier
//! failure never leaves a half-written row.

use crate::domain::{DomainError, Entry, EntryDraft, EntryPatch, NewEntry, Page, ResolvedPatch};
use crate::ports::{ClassifierPort, EntryRepoPort};
use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Journal entry use cases.
pub struct EntryService {
    repo: Arc<dyn EntryRepoPort>,
    classifier: Arc<dyn ClassifierPort>,
}

impl EntryService {
    pub fn new(repo: Arc<dyn EntryRepoPort>, classifier: Arc<dyn ClassifierPort>) -> Self {
        Self { repo, classifier }
    }

    /// Validate, classify and insert. Returns the stored entry (with its new id).
    pub async fn create(&self, input: NewEntry) -> Result<Entry, DomainError> {
        input.validate()?;
        let classification = self.classifier.classify(&input.text).await?;
        let draft = EntryDraft {
            text: input.text,
            emoji: input.emoji,
            classification,
            // Storage keeps microseconds; truncate so the returned entry matches a later read.
            created_at: Utc::now().trunc_subsecs(6),
        };
        let entry = self.repo.insert(&draft).await?;
        info!(
            id = entry.id,
            emoji = %entry.emoji,
            sentiment = %entry.sentiment,
            score = entry.sentiment_score,
            "entry added"
        );
        Ok(entry)
    }

    pub async fn get(&self, id: i64) -> Result<Entry, DomainError> {
        self.repo.get(id).await?.ok_or(DomainError::NotFound(id))
    }

    /// Most recent first.
    pub async fn list(&self, page: Page) -> Result<Vec<Entry>, DomainError> {
        let entries = self.repo.list(page).await?;
        debug!(
            limit = page.limit,
            offset = page.offset,
            returned = entries.len(),
            "listed entries"
        );
        Ok(entries)
    }

    /// Apply a partial update. New text is re-classified before anything is written;
    /// text, sentiment and score then change together. `created_at` is never touched.
    pub async fn update(&self, id: i64, patch: EntryPatch) -> Result<(), DomainError> {
        patch.validate()?;
        if self.repo.get(id).await?.is_none() {
            return Err(DomainError::NotFound(id));
        }
        if patch.is_empty() {
            debug!(id, "empty patch, nothing to update");
            return Ok(());
        }

        let text = match patch.text {
            Some(text) => {
                let classification = self.classifier.classify(&text).await?;
                Some((text, classification))
            }
            None => None,
        };
        let resolved = ResolvedPatch {
            text,
            emoji: patch.emoji,
        };
        // The row may have been deleted while classifying.
        if !self.repo.apply_patch(id, &resolved).await? {
            return Err(DomainError::NotFound(id));
        }
        info!(
            id,
            text_changed = resolved.text.is_some(),
            emoji_changed = resolved.emoji.is_some(),
            "entry updated"
        );
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        if !self.repo.delete(id).await? {
            return Err(DomainError::NotFound(id));
        }
        info!(id, "entry deleted");
        Ok(())
    }
}
