//! HTTP/JSON API adapter over tiny_http.

pub mod response;
pub mod routes;
pub mod server;

pub use server::{ApiState, HttpServer, MAX_BODY_BYTES};
