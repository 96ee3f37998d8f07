// Configuration Storage
// config.json with defaults, VOXPOPULI_* overrides and rolling backups

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::services::model_store::{ModelStore, ENTITY_GAZETTEER_FILE, SENTIMENT_LEXICON_FILE};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelConfig,
    /// Base URL of an optional remote NLP service
    #[serde(default)]
    pub nlp_service_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerConfig::default(),
            models: ModelConfig::default(),
            nlp_service_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
    #[serde(default = "default_lexicon_file")]
    pub sentiment_lexicon: String,
    #[serde(default = "default_gazetteer_file")]
    pub entity_gazetteer: String,
    #[serde(default)]
    pub sentiment_lexicon_url: Option<String>,
    #[serde(default)]
    pub entity_gazetteer_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            sentiment_lexicon: default_lexicon_file(),
            entity_gazetteer: default_gazetteer_file(),
            sentiment_lexicon_url: None,
            entity_gazetteer_url: None,
        }
    }
}

impl ModelConfig {
    pub fn resolved_model_dir(&self) -> PathBuf {
        self.model_dir.clone().unwrap_or_else(ModelStore::default_model_dir)
    }
}

fn default_version() -> String { env!("CARGO_PKG_VERSION").to_string() }
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8501 }
fn default_lexicon_file() -> String { SENTIMENT_LEXICON_FILE.to_string() }
fn default_gazetteer_file() -> String { ENTITY_GAZETTEER_FILE.to_string() }

impl AppConfig {
    /// Apply VOXPOPULI_* environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(host) = get("VOXPOPULI_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("VOXPOPULI_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "ignoring invalid VOXPOPULI_PORT"),
            }
        }
        if let Some(url) = get("VOXPOPULI_NLP_URL") {
            self.nlp_service_url = Some(url);
        }
        if let Some(dir) = get("VOXPOPULI_MODEL_DIR") {
            self.models.model_dir = Some(PathBuf::from(dir));
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O failed at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config at {} is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError + '_ {
    move |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

const MAX_BACKUPS: usize = 10;

/// `config.json` in one directory, with timestamped copies under `backups/`.
pub struct ConfigStore {
    dir: PathBuf,
    file: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: PathBuf) -> Self {
        let file = dir.join("config.json");
        Self { dir, file }
    }

    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("voxpopuli"))
    }

    pub fn config_file(&self) -> &Path {
        &self.file
    }

    fn backup_dir(&self) -> PathBuf {
        self.dir.join("backups")
    }

    /// A missing file reads as the defaults.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.file.exists() {
            return Ok(AppConfig::default());
        }
        let raw = fs::read_to_string(&self.file).map_err(io_err(&self.file))?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: self.file.clone(),
            source,
        })
    }

    /// Like `load`, but writes the defaults out on first run.
    pub fn load_or_init(&self) -> Result<AppConfig, ConfigError> {
        if self.file.exists() {
            return self.load();
        }
        let config = AppConfig::default();
        self.save(&config)?;
        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        if self.file.exists() {
            self.backup_current()?;
        }
        let body = serde_json::to_string_pretty(config)?;
        fs::write(&self.file, body).map_err(io_err(&self.file))
    }

    /// Existing backups, oldest first.
    pub fn backups(&self) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = match fs::read_dir(self.backup_dir()) {
            Ok(rd) => rd
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect(),
            Err(_) => return Vec::new(),
        };
        // names carry the timestamp
        found.sort();
        found
    }

    fn backup_current(&self) -> Result<(), ConfigError> {
        let dir = self.backup_dir();
        fs::create_dir_all(&dir).map_err(io_err(&dir))?;

        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%3f");
        let target = dir.join(format!("config_{}.json", stamp));
        fs::copy(&self.file, &target).map_err(io_err(&target))?;

        let backups = self.backups();
        let excess = backups.len().saturating_sub(MAX_BACKUPS);
        for old in backups.into_iter().take(excess) {
            let _ = fs::remove_file(old);
        }
        Ok(())
    }
}
