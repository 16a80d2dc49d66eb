//! Client for the remote catalog and classification service.
//!
//! Endpoints:
//! - `GET /catalogo` returns an object mapping specimen id to a loosely typed record
//! - `POST /guardar_especimen` stores a new specimen (server assigns id and date)
//! - `DELETE /borrar_especimen/{id}` removes a specimen
//! - `POST /cangrejos` classifies an answer vector sent as `{"elementos": [...]}`
//!
//! Calls are never retried. Callers decide how a failure degrades.

use std::time::Duration;

use reqwest::Url;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::catalog::NewSpecimen;
use crate::quiz::AnswerVector;

const USER_AGENT: &str = concat!("porcelanidos-bot/", env!("CARGO_PKG_VERSION"));

/// Remote service errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Base URL could not be parsed or joined
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    /// Transport failure (connection refused, reset, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Service answered with a non-success status
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Request body of the classification endpoint.
#[derive(Debug, serde::Serialize)]
struct ClassifyRequest<'a> {
    elementos: &'a AnswerVector,
}

/// Typed access to the porcelain-crab service.
#[derive(Debug, Clone)]
pub struct CrabApi {
    http_client: reqwest::Client,
    base_url: Url,
}

impl CrabApi {
    /// Builds a client for `base_url`. Without a timeout the transport's
    /// defaults apply.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        // A trailing slash keeps `join` from replacing the last path segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Fetches the raw catalog, still loosely typed.
    pub async fn fetch_catalog(&self) -> Result<Map<String, Value>, ApiError> {
        let url = self.endpoint("catalogo")?;
        log::debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let response = check_status(response).await?;

        let catalog: Map<String, Value> = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        log::info!("Fetched catalog with {} records", catalog.len());
        Ok(catalog)
    }

    pub async fn save_specimen(&self, specimen: &NewSpecimen) -> Result<(), ApiError> {
        let url = self.endpoint("guardar_especimen")?;
        log::debug!("POST {} ({})", url, specimen.nombre_cientifico);

        let response = self
            .http_client
            .post(url)
            .json(specimen)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        check_status(response).await?;

        log::info!("Saved specimen {:?}", specimen.nombre_cientifico);
        Ok(())
    }

    pub async fn delete_specimen(&self, id: &str) -> Result<(), ApiError> {
        let mut url = self.endpoint("borrar_especimen/")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(id);
        log::debug!("DELETE {}", url);

        let response = self
            .http_client
            .delete(url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        check_status(response).await?;

        log::info!("Deleted specimen {:?}", id);
        Ok(())
    }

    /// Sends a finished answer vector to the classifier and returns the
    /// species label it picked.
    pub async fn classify(&self, vector: &AnswerVector) -> Result<String, ApiError> {
        let url = self.endpoint("cangrejos")?;
        log::debug!("POST {} {:?}", url, vector.as_slice());

        let response = self
            .http_client
            .post(url)
            .json(&ClassifyRequest { elementos: vector })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let response = check_status(response).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        let species = species_label(&body)?;

        log::info!("Classifier answered {:?}", species);
        Ok(species)
    }

    /// Classification that never fails: any error is logged and yields the
    /// empty label, so the results screen can still be shown.
    pub async fn classify_or_unknown(&self, vector: &AnswerVector) -> String {
        match self.classify(vector).await {
            Ok(species) => species,
            Err(e) => {
                log::error!("Classification failed: {}", e);
                String::new()
            }
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = if body.is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        body
    };
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Reads the label out of a classifier response.
fn species_label(body: &Value) -> Result<String, ApiError> {
    match body.get("cangrejo") {
        Some(Value::String(species)) => Ok(species.clone()),
        Some(Value::Null) | None => Err(ApiError::Parse(format!(
            "no species label in classifier response: {body}"
        ))),
        Some(other) => Ok(other.to_string()),
    }
}
