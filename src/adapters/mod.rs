//! Infrastructure adapters. Implement ports.
//!
//! SQLite store, sentiment classifiers, CSV export, HTTP API. Map errors to DomainError.

pub mod classifier;
pub mod export;
pub mod http;
pub mod persistence;
