//! Export service. Streams every entry as CSV in id order.
//!
//! - Reads the store in keyset pages (`id > last_id`), never the whole table at once
//! - Each page becomes one chunk on a bounded channel (producer waits when the consumer is slow)
//! - The first chunk carries the header row, so an empty store still yields a header

use crate::adapters::export::entries_to_csv;
use crate::domain::DomainError;
use crate::ports::EntryRepoPort;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Default rows per chunk.
pub const DEFAULT_EXPORT_BATCH_SIZE: u32 = 500;

/// Chunks buffered between the producer task and the HTTP writer.
const EXPORT_CHANNEL_CAPACITY: usize = 4;

/// One encoded piece of the export, or the error that ended it.
pub type ExportChunk = Result<Vec<u8>, DomainError>;

pub struct ExportService {
    repo: Arc<dyn EntryRepoPort>,
    batch_size: u32,
}

impl ExportService {
    pub fn new(repo: Arc<dyn EntryRepoPort>, batch_size: u32) -> Self {
        Self {
            repo,
            batch_size: batch_size.max(1),
        }
    }

    /// Spawn the producer on the current runtime and hand back the chunk stream.
    /// A failure is delivered as the last item; the stream then ends.
    pub fn stream_csv(self: Arc<Self>) -> mpsc::Receiver<ExportChunk> {
        let (tx, rx) = mpsc::channel(EXPORT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            match self.write_csv(&tx).await {
                Ok(rows) => info!(rows, "csv export complete"),
                Err(e) => {
                    error!(error = %e, "csv export failed");
                    let _ = tx.send(Err(e)).await;
                }
            }
        });
        rx
    }

    /// Whole export in memory. Fine for small stores and tests.
    pub async fn export_all(self: &Arc<Self>) -> Result<Vec<u8>, DomainError> {
        let mut rx = Arc::clone(self).stream_csv();
        let mut out = Vec::new();
        while let Some(chunk) = rx.recv().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    /// Encode pages until the store is exhausted or the receiver goes away.
    /// Returns the number of rows sent.
    async fn write_csv(&self, tx: &mpsc::Sender<ExportChunk>) -> Result<u64, DomainError> {
        let mut last_id = 0i64;
        let mut rows = 0u64;
        let mut first = true;

        loop {
            let batch = self.repo.entries_after(last_id, self.batch_size).await?;
            let chunk = entries_to_csv(&batch, first)
                .map_err(|e| DomainError::Storage(format!("Failed to encode CSV: {}", e)))?;
            first = false;

            if !chunk.is_empty() && tx.send(Ok(chunk)).await.is_err() {
                debug!(rows, "export receiver dropped, stopping");
                return Ok(rows);
            }
            rows += batch.len() as u64;

            match batch.last() {
                Some(last) if batch.len() as u32 == self.batch_size => last_id = last.id,
                _ => break,
            }
        }

        Ok(rows)
    }
}
