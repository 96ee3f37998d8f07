// Model Store
// Locates model files on disk, fetches a missing one once, then retries the load

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const SENTIMENT_LEXICON_FILE: &str = "en-sentiment.json";
pub const ENTITY_GAZETTEER_FILE: &str = "en-entities.json";

/// Copies shipped with the binary, installed when no download URL is configured.
pub const BUNDLED_SENTIMENT_LEXICON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/en-sentiment.json"));
pub const BUNDLED_ENTITY_GAZETTEER: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/en-entities.json"));

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model file not found: {}", .path.display())]
    Missing { path: PathBuf },
    #[error("model I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse model {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model download failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("model download returned {status} for {url}")]
    FetchStatus { status: u16, url: String },
    #[error("downloaded {name} from {url} is not a valid model: {source}")]
    BadDownload {
        name: &'static str,
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid model: {0}")]
    Invalid(String),
}

/// Where a missing model is fetched from.
#[derive(Debug, Clone)]
pub enum FetchSource {
    Bundled(&'static str),
    Remote(String),
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub name: &'static str,
    pub file_name: String,
    pub source: FetchSource,
}

impl ModelSpec {
    pub fn sentiment(file_name: &str, remote_url: Option<&str>) -> Self {
        Self::new("sentiment lexicon", file_name, BUNDLED_SENTIMENT_LEXICON, remote_url)
    }

    pub fn entities(file_name: &str, remote_url: Option<&str>) -> Self {
        Self::new("entity gazetteer", file_name, BUNDLED_ENTITY_GAZETTEER, remote_url)
    }

    fn new(name: &'static str, file_name: &str, bundled: &'static str, remote_url: Option<&str>) -> Self {
        let source = match remote_url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => FetchSource::Remote(url.to_string()),
            None => FetchSource::Bundled(bundled),
        };
        Self {
            name,
            file_name: file_name.to_string(),
            source,
        }
    }
}

#[derive(Debug)]
pub struct LoadedModel<T> {
    pub model: T,
    pub path: PathBuf,
    pub fetched: bool,
}

pub struct ModelStore {
    model_dir: PathBuf,
}

impl ModelStore {
    pub fn new(model_dir: PathBuf) -> Self {
        Self { model_dir }
    }

    /// Default model directory under the local data dir
    pub fn default_model_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|p| p.join("voxpopuli").join("models"))
            .unwrap_or_else(|| PathBuf::from("models"))
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn path_for(&self, spec: &ModelSpec) -> PathBuf {
        self.model_dir.join(&spec.file_name)
    }

    /// Load and parse a model file. A missing file is reported as `Missing`.
    pub fn load<T: DeserializeOwned>(&self, spec: &ModelSpec) -> Result<T, ModelError> {
        let path = self.path_for(spec);
        if !path.exists() {
            return Err(ModelError::Missing { path });
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|source| ModelError::Parse { path, source })
    }

    /// Fetch the model into the model directory, replacing any existing file.
    /// The body must parse as `T` before it is written, and it lands through a
    /// temp file + rename so a bad or interrupted fetch never leaves a partial model.
    pub async fn fetch<T: DeserializeOwned>(&self, spec: &ModelSpec) -> Result<PathBuf, ModelError> {
        let path = self.path_for(spec);

        let body = match &spec.source {
            FetchSource::Bundled(content) => {
                info!(model = spec.name, path = %path.display(), "model.install_bundled");
                content.to_string()
            }
            FetchSource::Remote(url) => {
                info!(model = spec.name, url = %url, "model.download");
                let body = download(url).await?;
                serde_json::from_str::<T>(&body).map_err(|source| ModelError::BadDownload {
                    name: spec.name,
                    url: url.clone(),
                    source,
                })?;
                body
            }
        };

        if body.trim().is_empty() {
            return Err(ModelError::Invalid(format!("{} download was empty", spec.name)));
        }

        fs::create_dir_all(&self.model_dir)?;
        let partial = self.model_dir.join(format!(".{}.part", spec.file_name));
        fs::write(&partial, body)?;
        if let Err(e) = fs::rename(&partial, &path) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }
        Ok(path)
    }

    /// Load a model; when the file is missing, fetch it once and retry.
    /// Parse failures are returned as-is and never trigger a fetch.
    pub async fn load_or_fetch<T: DeserializeOwned>(
        &self,
        spec: &ModelSpec,
    ) -> Result<LoadedModel<T>, ModelError> {
        match self.load(spec) {
            Ok(model) => Ok(LoadedModel {
                model,
                path: self.path_for(spec),
                fetched: false,
            }),
            Err(ModelError::Missing { path }) => {
                warn!(model = spec.name, path = %path.display(), "model.missing, fetching");
                self.fetch::<T>(spec).await?;
                let model = self.load(spec)?;
                info!(model = spec.name, path = %path.display(), "model.loaded_after_fetch");
                Ok(LoadedModel {
                    model,
                    path,
                    fetched: true,
                })
            }
            Err(e) => Err(e),
        }
    }
}

async fn download(url: &str) -> Result<String, ModelError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ModelError::FetchStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analyzer::tests::spawn_stub;
    use crate::services::entities::Gazetteer;
    use crate::services::sentiment::Lexicon;
    use axum::http::StatusCode;
    use axum::response::Html;
    use axum::routing::get;
    use axum::Router;

    #[tokio::test]
    async fn test_missing_model_is_fetched_once() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path().join("models"));
        let spec = ModelSpec::sentiment(SENTIMENT_LEXICON_FILE, None);

        let first: LoadedModel<Lexicon> = store.load_or_fetch(&spec).await.unwrap();
        assert!(first.fetched);
        assert!(first.path.exists());

        let second: LoadedModel<Lexicon> = store.load_or_fetch(&spec).await.unwrap();
        assert!(!second.fetched);
        assert_eq!(first.model.words.len(), second.model.words.len());
    }

    #[tokio::test]
    async fn test_corrupt_model_is_not_refetched() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path().to_path_buf());
        let spec = ModelSpec::entities(ENTITY_GAZETTEER_FILE, None);
        fs::write(store.path_for(&spec), "{ not json").unwrap();

        let result: Result<LoadedModel<Gazetteer>, _> = store.load_or_fetch(&spec).await;
        assert!(matches!(result, Err(ModelError::Parse { .. })));
        let content = fs::read_to_string(store.path_for(&spec)).unwrap();
        assert_eq!(content, "{ not json");
    }

    #[tokio::test]
    async fn test_bad_download_leaves_cache_untouched() {
        let base = spawn_stub(
            Router::new().route("/lexicon.json", get(|| async { Html("<html>captive portal</html>") })),
        )
        .await;
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path().join("models"));
        let url = format!("{}/lexicon.json", base);
        let remote = ModelSpec::sentiment(SENTIMENT_LEXICON_FILE, Some(&url));

        let result: Result<LoadedModel<Lexicon>, _> = store.load_or_fetch(&remote).await;
        assert!(matches!(result, Err(ModelError::BadDownload { .. })));
        assert!(!store.path_for(&remote).exists());
        assert!(!tmp.path().join("models").join(".en-sentiment.json.part").exists());

        // Next start without the URL installs the bundled copy as usual
        let bundled = ModelSpec::sentiment(SENTIMENT_LEXICON_FILE, None);
        let loaded: LoadedModel<Lexicon> = store.load_or_fetch(&bundled).await.unwrap();
        assert!(loaded.fetched);
        assert!(!loaded.model.words.is_empty());
    }

    #[tokio::test]
    async fn test_remote_model_is_downloaded() {
        let base = spawn_stub(
            Router::new()
                .route("/gazetteer.json", get(|| async { BUNDLED_ENTITY_GAZETTEER }))
                .route("/gone.json", get(|| async { StatusCode::NOT_FOUND })),
        )
        .await;
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path().to_path_buf());

        let url = format!("{}/gazetteer.json", base);
        let spec = ModelSpec::entities(ENTITY_GAZETTEER_FILE, Some(&url));
        let loaded: LoadedModel<Gazetteer> = store.load_or_fetch(&spec).await.unwrap();
        assert!(loaded.fetched);
        assert_eq!(fs::read_to_string(&loaded.path).unwrap(), BUNDLED_ENTITY_GAZETTEER);

        let url = format!("{}/gone.json", base);
        let spec = ModelSpec::entities("other.json", Some(&url));
        let result: Result<LoadedModel<Gazetteer>, _> = store.load_or_fetch(&spec).await;
        assert!(matches!(result, Err(ModelError::FetchStatus { status: 404, .. })));
        assert!(!store.path_for(&spec).exists());
    }

    #[test]
    fn test_load_reports_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path().to_path_buf());
        let spec = ModelSpec::sentiment("absent.json", None);
        let result: Result<Lexicon, _> = store.load(&spec);
        assert!(matches!(result, Err(ModelError::Missing { .. })));
    }

    #[test]
    fn test_remote_url_selects_remote_source() {
        let spec = ModelSpec::entities(ENTITY_GAZETTEER_FILE, Some("https://example.invalid/g.json"));
        assert!(matches!(spec.source, FetchSource::Remote(_)));
        let spec = ModelSpec::entities(ENTITY_GAZETTEER_FILE, Some("  "));
        assert!(matches!(spec.source, FetchSource::Bundled(_)));
    }

    #[test]
    fn test_bundled_models_parse() {
        let lexicon: Lexicon = serde_json::from_str(BUNDLED_SENTIMENT_LEXICON).unwrap();
        assert!(!lexicon.words.is_empty());
        let gazetteer: Gazetteer = serde_json::from_str(BUNDLED_ENTITY_GAZETTEER).unwrap();
        assert!(!gazetteer.phrases.is_empty());
    }
}
