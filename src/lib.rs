pub mod models;
pub mod services;
pub mod api;
pub mod logging;

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use anyhow::Context;
use tracing::{info, warn};

use services::{AppConfig, ConfigStore, ModelSpec, ModelStore, NlpServiceClient, SpeechAnalyzer};

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

fn startup_elapsed_ms() -> u128 {
    PROCESS_START
        .get()
        .map(|t| t.elapsed().as_millis())
        .unwrap_or(0)
}

/// Load the config file, falling back to defaults, then apply env overrides.
pub fn load_config() -> AppConfig {
    let mut config = match ConfigStore::default_config_dir() {
        Some(dir) => {
            let store = ConfigStore::new(dir);
            match store.load_or_init() {
                Ok(c) => {
                    info!(path = %store.config_file().display(), "config.loaded");
                    c
                }
                Err(e) => {
                    warn!(error = %e, "config.load_failed, using defaults");
                    AppConfig::default()
                }
            }
        }
        None => {
            warn!("config.no_config_dir, using defaults");
            AppConfig::default()
        }
    };
    config.apply_env_overrides();
    config
}

/// Build the analyzer described by `config`: load (or install) both models
/// and attach the remote NLP service when one is configured.
pub async fn build_analyzer(config: &AppConfig) -> anyhow::Result<SpeechAnalyzer> {
    let store = ModelStore::new(config.models.resolved_model_dir());
    let sentiment = ModelSpec::sentiment(
        &config.models.sentiment_lexicon,
        config.models.sentiment_lexicon_url.as_deref(),
    );
    let entities = ModelSpec::entities(
        &config.models.entity_gazetteer,
        config.models.entity_gazetteer_url.as_deref(),
    );

    let analyzer = SpeechAnalyzer::load(&store, &sentiment, &entities)
        .await
        .with_context(|| format!("failed to load models from {}", store.model_dir().display()))?;

    let service = match config.nlp_service_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => {
            let client = NlpServiceClient::new(url);
            if client.is_available().await {
                info!(url = client.base_url(), "nlp_service.available");
            } else {
                warn!(url = client.base_url(), "nlp_service.unreachable, will retry per request");
            }
            Some(client)
        }
        _ => None,
    };

    Ok(analyzer.with_service(service))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("=== VoxPopuli Shutting Down ===");
}

pub async fn run() -> anyhow::Result<()> {
    PROCESS_START.get_or_init(Instant::now);

    let logging_t0 = Instant::now();
    logging::init(&logging::LogSettings::from_env());
    info!(startup_ms = startup_elapsed_ms(), logging_ms = logging_t0.elapsed().as_millis(), "logging.initialized");

    let config = load_config();
    let analyzer = build_analyzer(&config).await?;
    info!(startup_ms = startup_elapsed_ms(), "analyzer.ready");

    let host = config.server.host.as_str();
    let addr: SocketAddr = tokio::net::lookup_host((host, config.server.port))
        .await
        .with_context(|| format!("cannot resolve listen host {}", host))?
        .next()
        .with_context(|| format!("no address for listen host {}", host))?;

    api::serve(Arc::new(analyzer), addr, shutdown_signal()).await?;

    info!("=== VoxPopuli Exited ===");
    Ok(())
}
