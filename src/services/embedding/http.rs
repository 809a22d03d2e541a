//! Embedding backend served over HTTP
//!
//! The embedding model runs as a separate service. Acquisition waits for the service to
//! report the model as loaded (`GET /health`), then text is embedded with `POST /embed`.

use std::sync::Arc;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use super::{BackendLoader, EmbeddingBackend};
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
    normalize: bool,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    model_loaded: Option<bool>,
}

/// Acquires an `HttpEmbeddingBackend` once the service is up
#[derive(Clone)]
pub struct HttpEmbeddingLoader {
    http_client: HttpClient,
    api_url: String,
    model: String,
}

impl HttpEmbeddingLoader {
    pub fn new(api_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }
}

#[async_trait::async_trait]
impl BackendLoader for HttpEmbeddingLoader {
    async fn load(&self) -> AppResult<Arc<dyn EmbeddingBackend>> {
        let url = format!("{}/health", self.api_url);
        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingUnavailable(format!(
                "Embedding service health check returned status {}: {}",
                status, body
            )));
        }

        let health: HealthResponse = response.json().await?;
        if health.model_loaded == Some(false) {
            return Err(AppError::EmbeddingUnavailable(format!(
                "Embedding service at {} has not loaded a model yet",
                self.api_url
            )));
        }

        Ok(Arc::new(HttpEmbeddingBackend {
            http_client: self.http_client.clone(),
            api_url: self.api_url.clone(),
            model: self.model.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Embedding model reached through the HTTP service
pub struct HttpEmbeddingBackend {
    http_client: HttpClient,
    api_url: String,
    model: String,
}

#[async_trait::async_trait]
impl EmbeddingBackend for HttpEmbeddingBackend {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}/embed", self.api_url);

        let response = self
            .http_client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input: text,
                normalize: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                "Embedding request failed"
            );
            return Err(AppError::EmbeddingUnavailable(format!(
                "Embedding service returned status {}: {}",
                status, body
            )));
        }

        let embedded: EmbedResponse = response.json().await?;
        tracing::debug!(dimension = embedded.embedding.len(), "Embedded text");

        Ok(embedded.embedding)
    }

    fn model(&self) -> String {
        self.model.clone()
    }
}
