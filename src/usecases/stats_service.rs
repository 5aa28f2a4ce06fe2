//! Rollups over the entry store. Read-only; no state of its own.

use crate::domain::{DomainError, EmojiCount};
use crate::ports::StatsRepoPort;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Trailing window for weekly counts.
pub const WEEKLY_WINDOW_DAYS: i64 = 7;

/// Default size of the top-emoji ranking.
pub const DEFAULT_TOP_EMOJIS: u32 = 5;

pub struct StatsService {
    repo: Arc<dyn StatsRepoPort>,
}

impl StatsService {
    pub fn new(repo: Arc<dyn StatsRepoPort>) -> Self {
        Self { repo }
    }

    /// Emoji counts over the last 7 days, relative to now.
    pub async fn weekly_emoji_counts(&self) -> Result<BTreeMap<String, u64>, DomainError> {
        self.weekly_emoji_counts_at(Utc::now()).await
    }

    /// Emoji counts for entries created at or after `now - 7 days`.
    /// Emojis with no entries in the window are absent.
    pub async fn weekly_emoji_counts_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<String, u64>, DomainError> {
        let since = now - Duration::days(WEEKLY_WINDOW_DAYS);
        let counts = self.repo.emoji_counts_since(since).await?;
        debug!(since = %since, emojis = counts.len(), "weekly emoji counts");
        Ok(counts)
    }

    /// All-time most used emojis, count desc. Equal counts are ordered by emoji (byte order).
    pub async fn top_emojis(&self, n: u32) -> Result<Vec<EmojiCount>, DomainError> {
        self.repo.top_emojis(n).await
    }

    pub async fn sentiment_distribution(&self) -> Result<BTreeMap<String, u64>, DomainError> {
        self.repo.sentiment_counts().await
    }
}
