//! tiny_http server. Implements InputPort.
//!
//! `tiny_http::Server::incoming_requests()` blocks, so the accept loop runs in
//! `spawn_blocking`. Every request gets its own blocking task that drives the async
//! use cases with the runtime handle; nothing is shared between requests but the services.

use super::response::{ChunkReader, CommonHeaders, Reply, send};
use super::routes::{Route, RouteError, page_from_query, split_url};
use crate::domain::{DomainError, EntryPatch, NewEntry};
use crate::ports::InputPort;
use crate::usecases::{DEFAULT_TOP_EMOJIS, EntryService, ExportService, StatsService};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tiny_http::Request;
use tokio::runtime::Handle;
use tracing::{error, info, warn};

/// Largest request body accepted.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Services the API exposes.
pub struct ApiState {
    pub entries: Arc<EntryService>,
    pub stats: Arc<StatsService>,
    pub export: Arc<ExportService>,
}

pub struct HttpServer {
    server: Arc<tiny_http::Server>,
    state: Arc<ApiState>,
    common: CommonHeaders,
}

impl HttpServer {
    /// Bind the listener. Use port 0 for an ephemeral port (see `local_addr`).
    pub fn bind(addr: &str, state: ApiState, cors_allow_origin: &str) -> Result<Self, DomainError> {
        let common = CommonHeaders::cors(cors_allow_origin)?;
        let server = tiny_http::Server::http(addr)
            .map_err(|e| DomainError::Server(format!("failed to bind {}: {}", addr, e)))?;
        Ok(Self {
            server: Arc::new(server),
            state: Arc::new(state),
            common,
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Stop accepting; `run` returns once the accept loop notices.
    pub fn shutdown(&self) {
        self.server.unblock();
    }
}

#[async_trait::async_trait]
impl InputPort for HttpServer {
    async fn run(&self) -> Result<(), DomainError> {
        let server = Arc::clone(&self.server);
        let state = Arc::clone(&self.state);
        let common = self.common.clone();
        let rt = Handle::current();

        if let Some(addr) = self.local_addr() {
            info!(%addr, "journal API listening");
        }

        tokio::task::spawn_blocking(move || {
            for request in server.incoming_requests() {
                let state = Arc::clone(&state);
                let common = common.clone();
                let handle = rt.clone();
                rt.spawn_blocking(move || serve_one(&handle, &state, &common, request));
            }
        })
        .await
        .map_err(|e| DomainError::Server(format!("accept loop join: {}", e)))?;

        info!("journal API stopped");
        Ok(())
    }
}

fn serve_one(rt: &Handle, state: &ApiState, common: &CommonHeaders, mut request: Request) {
    let started = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_string();
    let (path, query) = split_url(&url);

    let reply = match Route::resolve(&method, path) {
        Ok(route) => match dispatch(rt, state, route, query, &mut request) {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_client_error() {
                    warn!(%method, path, error = %e, "request rejected");
                } else {
                    error!(%method, path, error = %e, "request failed");
                }
                Reply::error(&e)
            }
        },
        Err(RouteError::NotFound) => Reply::detail(404, "Not Found"),
        Err(RouteError::MethodNotAllowed) => Reply::detail(405, "Method Not Allowed"),
        Err(RouteError::InvalidId(raw)) => Reply::error(&DomainError::Validation(format!(
            "entry id must be a non-negative integer, got '{}'",
            raw
        ))),
    };

    match send(request, reply, common) {
        Ok(status) => info!(
            %method,
            path,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request"
        ),
        Err(e) => warn!(%method, path, error = %e, "failed to write response"),
    }
}

fn dispatch(
    rt: &Handle,
    state: &ApiState,
    route: Route,
    query: &str,
    request: &mut Request,
) -> Result<Reply, DomainError> {
    match route {
        Route::CreateEntry => {
            let input: NewEntry = read_json(request)?;
            let entry = rt.block_on(state.entries.create(input))?;
            Ok(Reply::ok(json!({
                "message": "Entry added",
                "id": entry.id,
                "sentiment": entry.sentiment,
                "score": entry.sentiment_score,
            })))
        }
        Route::ListEntries => {
            let page = page_from_query(query)?;
            let entries = rt.block_on(state.entries.list(page))?;
            Ok(Reply::ok(json!({ "entries": entries })))
        }
        Route::GetEntry(id) => {
            let entry = rt.block_on(state.entries.get(id))?;
            Ok(Reply::ok(json!(entry)))
        }
        Route::UpdateEntry(id) => {
            let patch: EntryPatch = read_json(request)?;
            rt.block_on(state.entries.update(id, patch))?;
            Ok(Reply::ok(json!({ "message": "Entry updated successfully" })))
        }
        Route::DeleteEntry(id) => {
            rt.block_on(state.entries.delete(id))?;
            Ok(Reply::ok(json!({ "message": "Entry deleted successfully" })))
        }
        Route::WeeklyStats => {
            let counts = rt.block_on(state.stats.weekly_emoji_counts())?;
            Ok(Reply::ok(json!({ "weekly_counts": counts })))
        }
        Route::CommonEmotions => {
            let top = rt.block_on(state.stats.top_emojis(DEFAULT_TOP_EMOJIS))?;
            Ok(Reply::ok(json!({ "common_emotions": top })))
        }
        Route::SentimentDistribution => {
            let dist = rt.block_on(state.stats.sentiment_distribution())?;
            Ok(Reply::ok(json!({ "sentiment_distribution": dist })))
        }
        Route::ExportCsv => {
            let mut rx = {
                let _guard = rt.enter();
                Arc::clone(&state.export).stream_csv()
            };
            // Wait for the header chunk so a failing store still gets a JSON error.
            match rx.blocking_recv() {
                Some(Ok(first)) => Ok(Reply::Csv(ChunkReader::new(rx, first))),
                Some(Err(e)) => Err(e),
                None => Err(DomainError::Server("export ended before producing output".into())),
            }
        }
        Route::Preflight => Ok(Reply::NoContent),
    }
}

/// Read and parse a JSON body. Oversized bodies and malformed JSON are client errors.
fn read_json<T: DeserializeOwned>(request: &mut Request) -> Result<T, DomainError> {
    let too_large = DomainError::PayloadTooLarge {
        limit: MAX_BODY_BYTES,
    };
    if request.body_length().is_some_and(|n| n > MAX_BODY_BYTES) {
        return Err(too_large);
    }
    let mut body = Vec::new();
    request
        .as_reader()
        .take(MAX_BODY_BYTES as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| DomainError::Validation(format!("failed to read body: {}", e)))?;
    if body.len() > MAX_BODY_BYTES {
        return Err(too_large);
    }
    serde_json::from_slice(&body)
        .map_err(|e| DomainError::Validation(format!("invalid JSON body: {}", e)))
}
