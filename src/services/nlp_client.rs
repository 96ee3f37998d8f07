// NLP Service Client
// Optional remote sentiment/entity service; callers fall back to the local models

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

use crate::models::{NamedEntity, SentimentScores};

const REQUEST_TIMEOUT_SECS: u64 = 30;

static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn get_client() -> &'static Client {
    HTTP_CLIENT.get_or_init(|| {
        Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default()
    })
}

#[derive(Debug, Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SentimentResponse {
    polarity: f64,
    subjectivity: f64,
}

#[derive(Debug, Deserialize)]
struct RemoteEntity {
    text: String,
    #[serde(default)]
    label: String,
    start: i64,
    end: i64,
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    entities: Vec<RemoteEntity>,
}

#[derive(Debug, Deserialize)]
struct ServiceHealth {
    status: String,
}

pub struct NlpServiceClient {
    base_url: String,
}

impl NlpServiceClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check whether the service answers its health probe
    pub async fn is_available(&self) -> bool {
        let probe = async {
            let resp = get_client().get(format!("{}/health", self.base_url)).send().await.ok()?;
            resp.json::<ServiceHealth>().await.ok()
        };
        probe.await.is_some_and(|h| h.status == "ok")
    }

    async fn post_text<T: DeserializeOwned>(&self, endpoint: &str, text: &str) -> Result<T, String> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let resp = get_client()
            .post(&url)
            .json(&TextRequest { text })
            .send()
            .await
            .map_err(|e| format!("NLP service unreachable at {}: {}", url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("NLP service {} answered {}", endpoint, status));
        }
        resp.json::<T>()
            .await
            .map_err(|e| format!("Malformed {} response: {}", endpoint, e))
    }

    pub async fn sentiment(&self, text: &str) -> Result<SentimentScores, String> {
        let scores: SentimentResponse = self.post_text("sentiment", text).await?;
        if !(scores.polarity.is_finite() && scores.subjectivity.is_finite()) {
            return Err("NLP service returned non-finite scores".to_string());
        }
        Ok(SentimentScores {
            polarity: scores.polarity.clamp(-1.0, 1.0),
            subjectivity: scores.subjectivity.clamp(0.0, 1.0),
        })
    }

    pub async fn entities(&self, text: &str) -> Result<Vec<NamedEntity>, String> {
        let found: EntitiesResponse = self.post_text("entities", text).await?;

        let mut entities = found
            .entities
            .into_iter()
            .map(|ent| {
                let (start, end) = normalize_entity_offsets(text, &ent.text, ent.start, ent.end)
                    .ok_or_else(|| format!("Invalid entity offsets for {:?}: {}..{}", ent.text, ent.start, ent.end))?;
                Ok(NamedEntity {
                    text: text[start..end].to_string(),
                    label: ent.label,
                    start,
                    end,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        entities.sort_by_key(|e| e.start);
        Ok(entities)
    }
}

/// Byte index of the `n`th char; `n == char count` maps to the end.
fn char_to_byte(text: &str, n: usize) -> Option<usize> {
    text.char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .nth(n)
}

/// Services differ on char vs byte offsets; accept whichever slices back to the entity text.
fn normalize_entity_offsets(text: &str, entity: &str, start: i64, end: i64) -> Option<(usize, usize)> {
    let start = usize::try_from(start).ok()?;
    let end = usize::try_from(end).ok()?;
    if end < start {
        return None;
    }

    if text.get(start..end).is_some_and(|s| entity.is_empty() || s == entity) {
        return Some((start, end));
    }

    let (start_b, end_b) = (char_to_byte(text, start)?, char_to_byte(text, end)?);
    text.get(start_b..end_b).map(|_| (start_b, end_b))
}
