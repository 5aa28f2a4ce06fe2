//! Application use cases. Orchestrate domain logic via ports.

pub mod entry_service;
pub mod export_service;
pub mod stats_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use entry_service::EntryService;
pub use export_service::{DEFAULT_EXPORT_BATCH_SIZE, ExportChunk, ExportService};
pub use stats_service::{DEFAULT_TOP_EMOJIS, StatsService, WEEKLY_WINDOW_DAYS};
