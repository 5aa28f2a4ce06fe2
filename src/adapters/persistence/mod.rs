//! Persistence adapters. SQLite entry store.

pub mod sqlite_repo;

pub use sqlite_repo::SqliteRepo;
