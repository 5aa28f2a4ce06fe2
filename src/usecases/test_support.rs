//! Shared fixtures for use case tests.

use crate::adapters::classifier::LexiconClassifier;
use crate::adapters::persistence::SqliteRepo;
use crate::domain::{Classification, DomainError};
use crate::ports::ClassifierPort;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fresh on-disk store in a temp dir. Keep the dir alive for the test's duration.
pub async fn temp_repo() -> (tempfile::TempDir, Arc<SqliteRepo>) {
    let dir = tempfile::tempdir().unwrap();
    let repo = SqliteRepo::connect(dir.path().join("journal.db"))
        .await
        .unwrap();
    (dir, Arc::new(repo))
}

/// Word-list classifier that fails on any text containing `FAIL` and counts calls.
pub struct ScriptedClassifier {
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// What `classify` returns for `text` when it succeeds.
    pub fn expected(&self, text: &str) -> Classification {
        LexiconClassifier::score(text)
    }
}

#[async_trait::async_trait]
impl ClassifierPort for ScriptedClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("FAIL") {
            return Err(DomainError::Classification("backend unavailable".into()));
        }
        Ok(self.expected(text))
    }
}
