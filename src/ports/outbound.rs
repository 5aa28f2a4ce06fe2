//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::{Classification, DomainError, EmojiCount, Entry, EntryDraft, Page, ResolvedPatch};

/// Entry store. Every call opens its own connection and releases it before returning.
#[async_trait::async_trait]
pub trait EntryRepoPort: Send + Sync {
    /// Insert a classified entry. Returns the stored entry with its new id.
    async fn insert(&self, draft: &EntryDraft) -> Result<Entry, DomainError>;

    /// Fetch one entry by id. `None` if absent.
    async fn get(&self, id: i64) -> Result<Option<Entry>, DomainError>;

    /// Newest first (`created_at` desc, then `id` desc).
    async fn list(&self, page: Page) -> Result<Vec<Entry>, DomainError>;

    /// Apply a resolved patch atomically. Returns `false` if no row has this id.
    async fn apply_patch(&self, id: i64, patch: &ResolvedPatch) -> Result<bool, DomainError>;

    /// Delete by id. Returns `false` if no row was affected.
    async fn delete(&self, id: i64) -> Result<bool, DomainError>;

    /// Keyset page in id order: entries with `id > after_id`, at most `limit`.
    async fn entries_after(&self, after_id: i64, limit: u32) -> Result<Vec<Entry>, DomainError>;
}

/// Read-only rollups over the entry store.
#[async_trait::async_trait]
pub trait StatsRepoPort: Send + Sync {
    /// Counts per emoji for entries created at or after `since`.
    async fn emoji_counts_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<BTreeMap<String, u64>, DomainError>;

    /// All-time counts per emoji, count desc then emoji asc, at most `n` rows.
    async fn top_emojis(&self, n: u32) -> Result<Vec<EmojiCount>, DomainError>;

    /// All-time counts per sentiment label.
    async fn sentiment_counts(&self) -> Result<BTreeMap<String, u64>, DomainError>;
}

/// Sentiment classifier. Opaque: `classify(text) -> (label, score)`.
#[async_trait::async_trait]
pub trait ClassifierPort: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, DomainError>;
}
