//! Reply values and their conversion to tiny_http responses.

use crate::domain::DomainError;
use crate::usecases::ExportChunk;
use serde_json::{Value, json};
use std::io::{self, Read};
use tiny_http::{Header, Request, Response, StatusCode};
use tokio::sync::mpsc;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const CSV_DISPOSITION: &str = "attachment; filename=journal_entries.csv";

/// What a handler produced.
pub enum Reply {
    Json(u16, Value),
    NoContent,
    Csv(ChunkReader),
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Reply::Json(200, body)
    }

    /// `{"detail": ...}` with the status mapped from the error.
    pub fn error(err: &DomainError) -> Self {
        Reply::Json(err.status_code(), json!({ "detail": err.to_string() }))
    }

    pub fn detail(status: u16, detail: &str) -> Self {
        Reply::Json(status, json!({ "detail": detail }))
    }

    pub fn status(&self) -> u16 {
        match self {
            Reply::Json(status, _) => *status,
            Reply::NoContent => 204,
            Reply::Csv(_) => 200,
        }
    }
}

/// Build a header from static-ish parts. `None` if the value has bytes HTTP forbids.
pub fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

/// Headers added to every response (CORS).
#[derive(Clone)]
pub struct CommonHeaders {
    headers: Vec<Header>,
}

impl CommonHeaders {
    pub fn cors(allow_origin: &str) -> Result<Self, DomainError> {
        let origin = header("Access-Control-Allow-Origin", allow_origin).ok_or_else(|| {
            DomainError::Server(format!("invalid CORS origin '{}'", allow_origin))
        })?;
        Ok(Self {
            headers: vec![origin],
        })
    }

    fn preflight() -> impl Iterator<Item = Header> {
        [
            header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS"),
            header("Access-Control-Allow-Headers", "*"),
            header("Access-Control-Max-Age", "600"),
        ]
        .into_iter()
        .flatten()
    }
}

/// Write `reply` to the client. Returns the status sent, or the I/O error.
pub fn send(request: Request, reply: Reply, common: &CommonHeaders) -> io::Result<u16> {
    let status = reply.status();
    match reply {
        Reply::Json(code, body) => {
            let bytes = serde_json::to_vec(&body).map_err(io::Error::other)?;
            let mut response = Response::from_data(bytes).with_status_code(code);
            for h in common.headers.iter().cloned().chain(header("Content-Type", JSON_CONTENT_TYPE)) {
                response.add_header(h);
            }
            request.respond(response)?;
        }
        Reply::NoContent => {
            let mut response = Response::empty(204);
            for h in common.headers.iter().cloned().chain(CommonHeaders::preflight()) {
                response.add_header(h);
            }
            request.respond(response)?;
        }
        Reply::Csv(reader) => {
            let headers: Vec<Header> = common
                .headers
                .iter()
                .cloned()
                .chain(header("Content-Type", CSV_CONTENT_TYPE))
                .chain(header("Content-Disposition", CSV_DISPOSITION))
                .collect();
            // No length: tiny_http falls back to chunked transfer encoding.
            let response = Response::new(StatusCode(200), headers, reader, None, None);
            request.respond(response)?;
        }
    }
    Ok(status)
}

/// Blocking `Read` over the export channel. Must be read off the async workers.
pub struct ChunkReader {
    rx: mpsc::Receiver<ExportChunk>,
    current: Vec<u8>,
    pos: usize,
}

impl ChunkReader {
    /// `first` is the chunk already taken from `rx`.
    pub fn new(rx: mpsc::Receiver<ExportChunk>, first: Vec<u8>) -> Self {
        Self {
            rx,
            current: first,
            pos: 0,
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.current.len() {
            match self.rx.blocking_recv() {
                Some(Ok(chunk)) => {
                    self.current = chunk;
                    self.pos = 0;
                }
                Some(Err(e)) => return Err(io::Error::other(e.to_string())),
                None => return Ok(0),
            }
        }
        let remaining = &self.current[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reply_shape() {
        let reply = Reply::error(&DomainError::NotFound(3));
        match reply {
            Reply::Json(status, body) => {
                assert_eq!(status, 404);
                assert_eq!(body, json!({ "detail": "Entry not found" }));
            }
            _ => panic!("expected json reply"),
        }
    }

    #[test]
    fn test_invalid_cors_origin_rejected() {
        assert!(CommonHeaders::cors("*").is_ok());
        assert!(CommonHeaders::cors("https://bücher.example").is_err());
    }

    #[test]
    fn test_chunk_reader_concatenates_and_surfaces_errors() {
        let (tx, rx) = mpsc::channel(4);
        tx.try_send(Ok(b"def".to_vec())).unwrap();
        tx.try_send(Ok(Vec::new())).unwrap();
        tx.try_send(Ok(b"gh".to_vec())).unwrap();
        drop(tx);

        let mut reader = ChunkReader::new(rx, b"abc".to_vec());
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "abcdefgh");

        let (tx, rx) = mpsc::channel(1);
        tx.try_send(Err(DomainError::Storage("disk gone".into()))).unwrap();
        let mut reader = ChunkReader::new(rx, Vec::new());
        let mut sink = Vec::new();
        assert!(reader.read_to_end(&mut sink).is_err());
    }
}
