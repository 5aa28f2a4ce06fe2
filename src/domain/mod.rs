//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;

pub use entities::{
    Classification, EmojiCount, Entry, EntryDraft, EntryPatch, NewEntry, Page, ResolvedPatch,
    format_timestamp,
};
pub use errors::DomainError;
