//! Export adapters. Serialization of entries for download.

pub mod csv_utils;

pub use csv_utils::{EXPORT_HEADER, entries_to_csv};
