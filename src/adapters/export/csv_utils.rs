//! CSV encoding for journal export. Uses the `csv` crate for RFC 4180 quoting.
//!
//! Rows are encoded one batch at a time so the export can be streamed.

use crate::domain::{Entry, format_timestamp};

/// Column order of the export.
pub const EXPORT_HEADER: [&str; 5] = ["text", "emoji", "sentiment", "sentiment_score", "created_at"];

/// Encode a batch of entries, optionally preceded by the header row.
///
/// Text is written verbatim: delimiters, quotes and newlines end up inside a
/// quoted field, and multi-byte glyphs pass through as UTF-8.
pub fn entries_to_csv(entries: &[Entry], with_header: bool) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::with_capacity(entries.len() * 96 + 64));

    if with_header {
        wtr.write_record(EXPORT_HEADER)?;
    }

    for entry in entries {
        let score = entry.sentiment_score.to_string();
        let created_at = format_timestamp(&entry.created_at);
        wtr.write_record([
            entry.text.as_str(),
            entry.emoji.as_str(),
            entry.sentiment.as_str(),
            score.as_str(),
            created_at.as_str(),
        ])?;
    }

    wtr.flush()?;
    wtr.into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))
}
