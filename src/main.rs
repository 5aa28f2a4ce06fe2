//! Wiring & DI. Entry point: bootstrap adapters, inject into services, serve HTTP.
//! No business logic here.

use dotenv::dotenv;
use emotion_journal::adapters::classifier::{InferenceApiClassifier, LexiconClassifier};
use emotion_journal::adapters::http::{ApiState, HttpServer};
use emotion_journal::adapters::persistence::SqliteRepo;
use emotion_journal::ports::{ClassifierPort, EntryRepoPort, InputPort, StatsRepoPort};
use emotion_journal::shared::AppConfig;
use emotion_journal::usecases::{EntryService, ExportService, StatsService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    // --- Storage: one database file, a fresh connection per operation ---
    let db_path = cfg.database_path_or_default();
    let sqlite_repo = Arc::new(
        SqliteRepo::connect(&db_path)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );
    let entry_repo: Arc<dyn EntryRepoPort> = Arc::clone(&sqlite_repo) as Arc<dyn EntryRepoPort>;
    let stats_repo: Arc<dyn StatsRepoPort> = Arc::clone(&sqlite_repo) as Arc<dyn StatsRepoPort>;

    // --- Sentiment classifier ---
    let classifier: Arc<dyn ClassifierPort> = if cfg.is_classifier_configured() {
        let url = cfg.classifier_api_url_or_default();
        info!(
            model = %cfg.classifier_model_or_default(),
            url = %url,
            "sentiment classification via inference API"
        );
        Arc::new(
            InferenceApiClassifier::new(
                url,
                cfg.classifier_api_key().unwrap_or_default(),
                Duration::from_secs(cfg.classifier_timeout_secs_or_default()),
            )
            .map_err(|e| anyhow::anyhow!("{}", e))?,
        )
    } else {
        warn!("JOURNAL_CLASSIFIER_API_KEY not set, using offline lexicon classifier");
        Arc::new(LexiconClassifier::new())
    };

    // --- Services ---
    let export_batch_size = cfg.export_batch_size_or_default();
    info!(export_batch_size, "csv export batch size");
    let state = ApiState {
        entries: Arc::new(EntryService::new(Arc::clone(&entry_repo), classifier)),
        stats: Arc::new(StatsService::new(stats_repo)),
        export: Arc::new(ExportService::new(entry_repo, export_batch_size)),
    };

    // --- HTTP ---
    let addr = cfg.bind_addr();
    let server = Arc::new(
        HttpServer::bind(&addr, state, &cfg.cors_allow_origin_or_default())
            .map_err(|e| anyhow::anyhow!("{}", e))?,
    );

    let serving = Arc::clone(&server);
    let mut run = tokio::spawn(async move { serving.run().await });

    tokio::select! {
        joined = &mut run => {
            joined?.map_err(|e| anyhow::anyhow!("{}", e))?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, shutting down");
            server.shutdown();
            run.await?.map_err(|e| anyhow::anyhow!("{}", e))?;
        }
    }

    Ok(())
}
