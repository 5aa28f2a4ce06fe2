//! Route table and query-string parsing for the journal API.

use crate::domain::{DomainError, Page};
use std::collections::HashMap;
use tiny_http::Method;

/// Every endpoint the API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    CreateEntry,
    ListEntries,
    GetEntry(i64),
    UpdateEntry(i64),
    DeleteEntry(i64),
    WeeklyStats,
    CommonEmotions,
    SentimentDistribution,
    ExportCsv,
    /// CORS preflight on any path.
    Preflight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    NotFound,
    MethodNotAllowed,
    /// Path matched but the id segment is not a non-negative integer.
    InvalidId(String),
}

impl Route {
    /// Match a method and path (no query string). One trailing slash is ignored.
    pub fn resolve(method: &Method, path: &str) -> Result<Route, RouteError> {
        if *method == Method::Options {
            return Ok(Route::Preflight);
        }
        let trimmed = if path.len() > 1 {
            path.strip_suffix('/').unwrap_or(path)
        } else {
            path
        };
        let segments: Vec<&str> = trimmed.trim_start_matches('/').split('/').collect();

        match segments.as_slice() {
            ["entry"] => match method {
                Method::Post => Ok(Route::CreateEntry),
                _ => Err(RouteError::MethodNotAllowed),
            },
            ["entries"] => match method {
                Method::Get => Ok(Route::ListEntries),
                _ => Err(RouteError::MethodNotAllowed),
            },
            ["entries", raw_id] => {
                let known = matches!(method, Method::Get | Method::Put | Method::Delete);
                if !known {
                    return Err(RouteError::MethodNotAllowed);
                }
                let id = raw_id
                    .parse::<i64>()
                    .ok()
                    .filter(|id| *id >= 0)
                    .ok_or_else(|| RouteError::InvalidId(raw_id.to_string()))?;
                Ok(match method {
                    Method::Get => Route::GetEntry(id),
                    Method::Put => Route::UpdateEntry(id),
                    _ => Route::DeleteEntry(id),
                })
            }
            ["stats", "weekly"] => get_only(method, Route::WeeklyStats),
            ["stats", "common_emotions"] => get_only(method, Route::CommonEmotions),
            ["stats", "sentiment_distribution"] => get_only(method, Route::SentimentDistribution),
            ["export", "csv"] => get_only(method, Route::ExportCsv),
            _ => Err(RouteError::NotFound),
        }
    }
}

fn get_only(method: &Method, route: Route) -> Result<Route, RouteError> {
    if *method == Method::Get {
        Ok(route)
    } else {
        Err(RouteError::MethodNotAllowed)
    }
}

/// Split a request URL into path and raw query.
pub fn split_url(url: &str) -> (&str, &str) {
    match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    }
}

/// Decode `a=1&b=2`. Later duplicates win; pairs without `=` get an empty value.
pub fn parse_query(query: &str) -> Result<HashMap<String, String>, DomainError> {
    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = urlencoding::decode(key)
            .map_err(|e| DomainError::Validation(format!("URL decode: {}", e)))?;
        let value = urlencoding::decode(value)
            .map_err(|e| DomainError::Validation(format!("URL decode: {}", e)))?;
        params.insert(key.into_owned(), value.into_owned());
    }
    Ok(params)
}

fn query_int(params: &HashMap<String, String>, key: &str) -> Result<Option<i64>, DomainError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| {
            DomainError::Validation(format!("{} must be an integer, got '{}'", key, raw))
        }),
    }
}

/// `limit` / `offset` from the query string, defaults applied.
pub fn page_from_query(query: &str) -> Result<Page, DomainError> {
    let params = parse_query(query)?;
    Page::new(query_int(&params, "limit")?, query_int(&params, "offset")?)
}
