//! SQLite-backed entry store via libsql. Implements EntryRepoPort and StatsRepoPort.
//!
//! Single `entries` table keyed by an AUTOINCREMENT id (ids are never reused).
//! `created_at` is fixed-width RFC 3339 text so range filters and ordering work on the raw column.
//! Each operation opens its own connection; it is dropped when the call returns, even on error.

use crate::domain::{
    DomainError, EmojiCount, Entry, EntryDraft, Page, ResolvedPatch, format_timestamp,
};
use crate::ports::{EntryRepoPort, StatsRepoPort};
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    emoji TEXT NOT NULL,
    sentiment TEXT NOT NULL,
    sentiment_score REAL NOT NULL,
    created_at TEXT NOT NULL
)"#;
const ENTRIES_CREATED_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_entries_created_at ON entries (created_at DESC)";

/// Matches the fixed-width form written by `format_timestamp`.
const CANONICAL_TIMESTAMP_GLOB: &str =
    "[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]T[0-9][0-9]:[0-9][0-9]:[0-9][0-9].[0-9][0-9][0-9][0-9][0-9][0-9]Z";

const SELECT_COLS: &str = "id, text, emoji, sentiment, sentiment_score, created_at";

/// Milliseconds a connection waits on a locked database before failing.
const BUSY_TIMEOUT_MS: u32 = 5_000;

fn storage(e: libsql::Error) -> DomainError {
    DomainError::Storage(e.to_string())
}

/// SQLite repository. One database file holds every entry.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Open (or create) the database file and ensure the schema exists.
    /// Call this once at startup; the returned repo is safe to share via Arc.
    ///
    /// Sets WAL mode and synchronous=NORMAL so readers do not block the writer.
    pub async fn connect(db_path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DomainError::Storage(e.to_string()))?;
        }
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(storage)?;

        let repo = Self {
            db,
            db_path: db_path.to_path_buf(),
        };
        let conn = repo.open().await?;
        // PRAGMA returns a row (new value); use query and consume rows (execute fails when rows are returned).
        drain(&conn, "PRAGMA journal_mode=WAL").await?;
        drain(&conn, "PRAGMA synchronous=NORMAL").await?;
        conn.execute(ENTRIES_TABLE, ()).await.map_err(storage)?;
        conn.execute(ENTRIES_CREATED_INDEX, ())
            .await
            .map_err(storage)?;
        normalize_timestamps(&conn).await?;

        info!(path = %repo.db_path.display(), "SQLite connected with WAL mode");
        Ok(repo)
    }

    /// Per-operation connection scope.
    async fn open(&self) -> Result<Connection, DomainError> {
        let conn = self.db.connect().map_err(storage)?;
        drain(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS)).await?;
        Ok(conn)
    }

    async fn collect_entries(mut rows: libsql::Rows) -> Result<Vec<Entry>, DomainError> {
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage)? {
            entries.push(row_to_entry(&row)?);
        }
        Ok(entries)
    }

    async fn collect_counts(mut rows: libsql::Rows) -> Result<BTreeMap<String, u64>, DomainError> {
        let mut counts = BTreeMap::new();
        while let Some(row) = rows.next().await.map_err(storage)? {
            let key: String = row.get(0).map_err(storage)?;
            let count: i64 = row.get(1).map_err(storage)?;
            counts.insert(key, count.max(0) as u64);
        }
        Ok(counts)
    }
}

async fn drain(conn: &Connection, sql: &str) -> Result<(), DomainError> {
    let mut rows = conn
        .query(sql, ())
        .await
        .map_err(|e| DomainError::Storage(format!("{} failed: {}", sql, e)))?;
    while rows.next().await.map_err(storage)?.is_some() {}
    Ok(())
}

/// Rewrite `created_at` values not in the canonical form (e.g. SQLite's
/// `CURRENT_TIMESTAMP` text or RFC 3339 with an offset). Window filters and
/// ordering compare the raw column, so every row must share one format.
async fn normalize_timestamps(conn: &Connection) -> Result<(), DomainError> {
    let mut rows = conn
        .query(
            "SELECT id, created_at FROM entries WHERE created_at NOT GLOB ?1",
            params![CANONICAL_TIMESTAMP_GLOB],
        )
        .await
        .map_err(storage)?;
    let mut stale = Vec::new();
    while let Some(row) = rows.next().await.map_err(storage)? {
        let id: i64 = row.get(0).map_err(storage)?;
        let raw: String = row.get(1).map_err(storage)?;
        stale.push((id, format_timestamp(&parse_timestamp(&raw)?)));
    }
    drop(rows);
    if stale.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction().await.map_err(storage)?;
    for (id, created_at) in &stale {
        tx.execute(
            "UPDATE entries SET created_at = ?1 WHERE id = ?2",
            params![created_at.as_str(), *id],
        )
        .await
        .map_err(storage)?;
    }
    tx.commit().await.map_err(storage)?;
    info!(rows = stale.len(), "normalized legacy created_at values");
    Ok(())
}

fn row_to_entry(row: &libsql::Row) -> Result<Entry, DomainError> {
    let created_at: String = row.get(5).map_err(storage)?;
    Ok(Entry {
        id: row.get(0).map_err(storage)?,
        text: row.get(1).map_err(storage)?,
        emoji: row.get(2).map_err(storage)?,
        sentiment: row.get(3).map_err(storage)?,
        sentiment_score: row.get(4).map_err(storage)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Accepts the stored RFC 3339 form and SQLite's `CURRENT_TIMESTAMP` form.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DomainError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| DomainError::Storage(format!("bad created_at '{}': {}", s, e)))
}

#[async_trait::async_trait]
impl EntryRepoPort for SqliteRepo {
    async fn insert(&self, draft: &EntryDraft) -> Result<Entry, DomainError> {
        let conn = self.open().await?;
        conn.execute(
            r#"
            INSERT INTO entries (text, emoji, sentiment, sentiment_score, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                draft.text.as_str(),
                draft.emoji.as_str(),
                draft.classification.label.as_str(),
                draft.classification.score,
                format_timestamp(&draft.created_at)
            ],
        )
        .await
        .map_err(storage)?;
        let id = conn.last_insert_rowid();
        debug!(id, "inserted entry");
        Ok(Entry {
            id,
            text: draft.text.clone(),
            emoji: draft.emoji.clone(),
            sentiment: draft.classification.label.clone(),
            sentiment_score: draft.classification.score,
            created_at: draft.created_at,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Entry>, DomainError> {
        let conn = self.open().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {SELECT_COLS} FROM entries WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(storage)?;
        match rows.next().await.map_err(storage)? {
            Some(row) => Ok(Some(row_to_entry(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, page: Page) -> Result<Vec<Entry>, DomainError> {
        let conn = self.open().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM entries
                     ORDER BY created_at DESC, id DESC
                     LIMIT ?1 OFFSET ?2"
                ),
                params![i64::from(page.limit), i64::from(page.offset)],
            )
            .await
            .map_err(storage)?;
        Self::collect_entries(rows).await
    }

    async fn apply_patch(&self, id: i64, patch: &ResolvedPatch) -> Result<bool, DomainError> {
        let conn = self.open().await?;
        // Dropping an uncommitted transaction rolls it back.
        let tx = conn.transaction().await.map_err(storage)?;
        let mut rows = tx
            .query("SELECT 1 FROM entries WHERE id = ?1", params![id])
            .await
            .map_err(storage)?;
        if rows.next().await.map_err(storage)?.is_none() {
            return Ok(false);
        }
        drop(rows);

        if let Some((text, classification)) = &patch.text {
            tx.execute(
                "UPDATE entries SET text = ?1, sentiment = ?2, sentiment_score = ?3 WHERE id = ?4",
                params![
                    text.as_str(),
                    classification.label.as_str(),
                    classification.score,
                    id
                ],
            )
            .await
            .map_err(storage)?;
        }
        if let Some(emoji) = &patch.emoji {
            tx.execute(
                "UPDATE entries SET emoji = ?1 WHERE id = ?2",
                params![emoji.as_str(), id],
            )
            .await
            .map_err(storage)?;
        }
        tx.commit().await.map_err(storage)?;
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let conn = self.open().await?;
        let affected = conn
            .execute("DELETE FROM entries WHERE id = ?1", params![id])
            .await
            .map_err(storage)?;
        Ok(affected > 0)
    }

    async fn entries_after(&self, after_id: i64, limit: u32) -> Result<Vec<Entry>, DomainError> {
        let conn = self.open().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM entries
                     WHERE id > ?1
                     ORDER BY id ASC
                     LIMIT ?2"
                ),
                params![after_id, i64::from(limit)],
            )
            .await
            .map_err(storage)?;
        Self::collect_entries(rows).await
    }
}

#[async_trait::async_trait]
impl StatsRepoPort for SqliteRepo {
    async fn emoji_counts_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<BTreeMap<String, u64>, DomainError> {
        let conn = self.open().await?;
        let rows = conn
            .query(
                "SELECT emoji, COUNT(*) FROM entries WHERE created_at >= ?1 GROUP BY emoji",
                params![format_timestamp(&since)],
            )
            .await
            .map_err(storage)?;
        Self::collect_counts(rows).await
    }

    async fn top_emojis(&self, n: u32) -> Result<Vec<EmojiCount>, DomainError> {
        let conn = self.open().await?;
        let mut rows = conn
            .query(
                r#"
                SELECT emoji, COUNT(*) AS cnt FROM entries
                GROUP BY emoji
                ORDER BY cnt DESC, emoji ASC
                LIMIT ?1
                "#,
                params![i64::from(n)],
            )
            .await
            .map_err(storage)?;
        let mut top = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage)? {
            let count: i64 = row.get(1).map_err(storage)?;
            top.push(EmojiCount {
                emoji: row.get(0).map_err(storage)?,
                count: count.max(0) as u64,
            });
        }
        Ok(top)
    }

    async fn sentiment_counts(&self) -> Result<BTreeMap<String, u64>, DomainError> {
        let conn = self.open().await?;
        let rows = conn
            .query(
                "SELECT sentiment, COUNT(*) FROM entries GROUP BY sentiment",
                (),
            )
            .await
            .map_err(storage)?;
        Self::collect_counts(rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Classification;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    async fn test_repo() -> (tempfile::TempDir, SqliteRepo) {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteRepo::connect(dir.path().join("journal.db"))
            .await
            .unwrap();
        (dir, repo)
    }

    fn draft(text: &str, emoji: &str, label: &str, at: DateTime<Utc>) -> EntryDraft {
        EntryDraft {
            text: text.to_string(),
            emoji: emoji.to_string(),
            classification: Classification {
                label: label.to_string(),
                score: 0.75,
            },
            created_at: at,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_get_preserves_fields() {
        let (_dir, repo) = test_repo().await;
        let stored = repo
            .insert(&draft("tea, \"calm\" 🍵", "🍵", "POSITIVE", t0()))
            .await
            .unwrap();
        let fetched = repo.get(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert!(repo.get(stored.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_monotonic_and_not_reused() {
        let (_dir, repo) = test_repo().await;
        let a = repo.insert(&draft("a", "😀", "POSITIVE", t0())).await.unwrap();
        let b = repo.insert(&draft("b", "😀", "POSITIVE", t0())).await.unwrap();
        assert!(b.id > a.id);
        assert!(repo.delete(b.id).await.unwrap());
        let c = repo.insert(&draft("c", "😀", "POSITIVE", t0())).await.unwrap();
        assert!(c.id > b.id);
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_with_paging() {
        let (_dir, repo) = test_repo().await;
        let old = repo.insert(&draft("old", "😐", "NEGATIVE", t0())).await.unwrap();
        let new = repo
            .insert(&draft("new", "😊", "POSITIVE", t0() + Duration::hours(1)))
            .await
            .unwrap();
        let same_time = repo.insert(&draft("tie", "😊", "POSITIVE", t0())).await.unwrap();

        let all = repo.list(Page::default()).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![new.id, same_time.id, old.id]);

        let second = repo.list(Page { limit: 1, offset: 1 }).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, same_time.id);

        assert!(repo.list(Page { limit: 0, offset: 0 }).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_patch_fields_independently() {
        let (_dir, repo) = test_repo().await;
        let e = repo.insert(&draft("meh", "😐", "NEGATIVE", t0())).await.unwrap();

        let emoji_only = ResolvedPatch {
            text: None,
            emoji: Some("🙂".into()),
        };
        assert!(repo.apply_patch(e.id, &emoji_only).await.unwrap());
        let after = repo.get(e.id).await.unwrap().unwrap();
        assert_eq!(after.emoji, "🙂");
        assert_eq!(after.text, "meh");
        assert_eq!(after.sentiment, "NEGATIVE");

        let text_patch = ResolvedPatch {
            text: Some((
                "great".into(),
                Classification {
                    label: "POSITIVE".into(),
                    score: 0.9,
                },
            )),
            emoji: None,
        };
        assert!(repo.apply_patch(e.id, &text_patch).await.unwrap());
        let after = repo.get(e.id).await.unwrap().unwrap();
        assert_eq!(after.text, "great");
        assert_eq!(after.sentiment, "POSITIVE");
        assert_eq!(after.sentiment_score, 0.9);
        assert_eq!(after.emoji, "🙂");
        assert_eq!(after.created_at, t0());
    }

    #[tokio::test]
    async fn test_apply_patch_and_delete_report_missing_rows() {
        let (_dir, repo) = test_repo().await;
        assert!(!repo.apply_patch(99, &ResolvedPatch::default()).await.unwrap());
        assert!(!repo.delete(99).await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_after_walks_in_id_order() {
        let (_dir, repo) = test_repo().await;
        let mut ids = Vec::new();
        for i in 0..5 {
            let at = t0() - Duration::minutes(i);
            ids.push(repo.insert(&draft(&format!("n{i}"), "📝", "POSITIVE", at)).await.unwrap().id);
        }
        let first = repo.entries_after(0, 2).await.unwrap();
        assert_eq!(first.iter().map(|e| e.id).collect::<Vec<_>>(), ids[..2].to_vec());
        let rest = repo.entries_after(ids[1], 10).await.unwrap();
        assert_eq!(rest.iter().map(|e| e.id).collect::<Vec<_>>(), ids[2..].to_vec());
    }

    #[tokio::test]
    async fn test_rollup_queries() {
        let (_dir, repo) = test_repo().await;
        for (emoji, label) in [("😊", "POSITIVE"), ("😊", "POSITIVE"), ("😢", "NEGATIVE"), ("🔥", "POSITIVE")] {
            repo.insert(&draft("x", emoji, label, t0())).await.unwrap();
        }
        repo.insert(&draft("x", "😢", "NEGATIVE", t0() - Duration::days(30)))
            .await
            .unwrap();

        let recent = repo.emoji_counts_since(t0() - Duration::days(1)).await.unwrap();
        assert_eq!(
            recent,
            BTreeMap::from([("😊".to_string(), 2), ("😢".to_string(), 1), ("🔥".to_string(), 1)])
        );

        let top = repo.top_emojis(2).await.unwrap();
        assert_eq!(
            top,
            vec![
                EmojiCount { emoji: "😊".into(), count: 2 },
                EmojiCount { emoji: "😢".into(), count: 2 },
            ]
        );

        let dist = repo.sentiment_counts().await.unwrap();
        assert_eq!(
            dist,
            BTreeMap::from([("NEGATIVE".to_string(), 2), ("POSITIVE".to_string(), 3)])
        );
    }

    #[tokio::test]
    async fn test_legacy_timestamps_are_normalized_on_connect() {
        let (dir, repo) = test_repo().await;
        let canonical = repo
            .insert(&draft("canonical noon", "🕛", "POSITIVE", t0()))
            .await
            .unwrap();
        let conn = repo.open().await.unwrap();
        conn.execute(
            "INSERT INTO entries (text, emoji, sentiment, sentiment_score, created_at)
             VALUES ('legacy evening', '🌙', 'POSITIVE', 0.8, '2024-03-01 18:00:00')",
            (),
        )
        .await
        .unwrap();
        conn.execute(
            "INSERT INTO entries (text, emoji, sentiment, sentiment_score, created_at)
             VALUES ('offset morning', '🌅', 'POSITIVE', 0.8, '2024-03-01T11:00:00+02:00')",
            (),
        )
        .await
        .unwrap();
        drop(conn);
        drop(repo);

        let repo = SqliteRepo::connect(dir.path().join("journal.db"))
            .await
            .unwrap();

        let counts = repo.emoji_counts_since(t0()).await.unwrap();
        assert_eq!(
            counts,
            BTreeMap::from([("🌙".to_string(), 1), ("🕛".to_string(), 1)])
        );

        let texts: Vec<String> = repo
            .list(Page::default())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.text)
            .collect();
        assert_eq!(texts, vec!["legacy evening", "canonical noon", "offset morning"]);

        let legacy = repo.get(canonical.id + 1).await.unwrap().unwrap();
        assert_eq!(legacy.created_at, t0() + Duration::hours(6));

        let conn = repo.open().await.unwrap();
        let mut rows = conn
            .query("SELECT created_at FROM entries ORDER BY id", ())
            .await
            .unwrap();
        while let Some(row) = rows.next().await.unwrap() {
            let raw: String = row.get(0).unwrap();
            assert_eq!(raw, format_timestamp(&parse_timestamp(&raw).unwrap()));
        }
    }

    #[test]
    fn test_parse_timestamp_accepts_sqlite_default_format() {
        let parsed = parse_timestamp("2024-03-01 12:00:00").unwrap();
        assert_eq!(parsed, t0());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
