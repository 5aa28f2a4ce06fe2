//! Application configuration. Listener, database path, classifier endpoint.

use crate::adapters::classifier::{DEFAULT_MODEL, default_api_url};
use crate::usecases::DEFAULT_EXPORT_BATCH_SIZE;
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE_PATH: &str = "./data/journal.db";
pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Bind address. Read from JOURNAL_HOST.
    #[serde(default)]
    pub host: Option<String>,

    /// Listen port. Read from JOURNAL_PORT.
    #[serde(default)]
    pub port: Option<u16>,

    /// SQLite database file. Read from JOURNAL_DATABASE_PATH.
    #[serde(default)]
    pub database_path: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Classifier Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// Inference API token. Read from JOURNAL_CLASSIFIER_API_KEY.
    /// When unset the offline word-list classifier is used.
    #[serde(default)]
    pub classifier_api_key: Option<String>,

    /// Full endpoint URL. Defaults to the hosted endpoint for `classifier_model`.
    #[serde(default)]
    pub classifier_api_url: Option<String>,

    /// Model id. Defaults to the SST-2 DistilBERT sentiment model.
    #[serde(default)]
    pub classifier_model: Option<String>,

    /// Per-request classifier timeout. Read from JOURNAL_CLASSIFIER_TIMEOUT_SECS.
    #[serde(default)]
    pub classifier_timeout_secs: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // HTTP Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// Rows per streamed export chunk. Read from JOURNAL_EXPORT_BATCH_SIZE.
    #[serde(default)]
    pub export_batch_size: Option<u32>,

    /// Value of Access-Control-Allow-Origin. Read from JOURNAL_CORS_ALLOW_ORIGIN.
    #[serde(default)]
    pub cors_allow_origin: Option<String>,
}

impl AppConfig {
    /// Environment (`JOURNAL_*`, `.env` included) plus an optional file named by JOURNAL_CONFIG.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("JOURNAL_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c = c.add_source(config::Environment::with_prefix("JOURNAL").try_parsing(true));
        c.build()?.try_deserialize()
    }

    pub fn host_or_default(&self) -> String {
        self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host_or_default(), self.port_or_default())
    }

    pub fn database_path_or_default(&self) -> String {
        self.database_path
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Classifier Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// API key, ignoring blank values.
    pub fn classifier_api_key(&self) -> Option<String> {
        self.classifier_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
    }

    /// Returns true if the hosted classifier should be used.
    pub fn is_classifier_configured(&self) -> bool {
        self.classifier_api_key().is_some() || self.classifier_api_url.is_some()
    }

    pub fn classifier_model_or_default(&self) -> String {
        self.classifier_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn classifier_api_url_or_default(&self) -> String {
        self.classifier_api_url
            .clone()
            .unwrap_or_else(|| default_api_url(&self.classifier_model_or_default()))
    }

    pub fn classifier_timeout_secs_or_default(&self) -> u64 {
        self.classifier_timeout_secs
            .unwrap_or(DEFAULT_CLASSIFIER_TIMEOUT_SECS)
    }

    pub fn export_batch_size_or_default(&self) -> u32 {
        self.export_batch_size
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_EXPORT_BATCH_SIZE)
    }

    pub fn cors_allow_origin_or_default(&self) -> String {
        self.cors_allow_origin.clone().unwrap_or_else(|| "*".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8000");
        assert_eq!(cfg.database_path_or_default(), "./data/journal.db");
        assert!(!cfg.is_classifier_configured());
        assert_eq!(
            cfg.classifier_api_url_or_default(),
            default_api_url(DEFAULT_MODEL)
        );
        assert_eq!(cfg.export_batch_size_or_default(), DEFAULT_EXPORT_BATCH_SIZE);
        assert_eq!(cfg.cors_allow_origin_or_default(), "*");
        assert_eq!(
            cfg.classifier_timeout_secs_or_default(),
            DEFAULT_CLASSIFIER_TIMEOUT_SECS
        );
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let cfg = AppConfig {
            classifier_api_key: Some("  ".into()),
            ..Default::default()
        };
        assert!(cfg.classifier_api_key().is_none());
        assert!(!cfg.is_classifier_configured());
    }

    #[test]
    fn test_model_drives_default_url() {
        let cfg = AppConfig {
            classifier_model: Some("cardiffnlp/twitter-roberta-base-sentiment".into()),
            export_batch_size: Some(0),
            ..Default::default()
        };
        assert!(cfg.classifier_api_url_or_default().ends_with("/cardiffnlp/twitter-roberta-base-sentiment"));
        assert_eq!(cfg.export_batch_size_or_default(), DEFAULT_EXPORT_BATCH_SIZE);
    }

    #[test]
    fn test_deserialize_from_config_source() {
        let cfg: AppConfig = config::Config::builder()
            .set_override("port", 9001)
            .unwrap()
            .set_override("database_path", "/tmp/j.db")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9001");
        assert_eq!(cfg.database_path_or_default(), "/tmp/j.db");
    }
}
