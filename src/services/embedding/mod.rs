//! Query embedding gateway
//!
//! Text is turned into vectors by an external embedding backend. The backend is acquired
//! lazily through a `BackendHandle`: the first caller runs the (potentially slow) loader,
//! concurrent callers wait on the same initialization, and later callers reuse the result.
//! Embeddings of query text are optionally cached in Redis.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;

use crate::{
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
};

pub mod http;
pub mod tag_vectors;

pub use http::{HttpEmbeddingBackend, HttpEmbeddingLoader};
pub use tag_vectors::{load_tag_vectors, JsonTagVectorFile, TagVectorSource, TagVectors};

/// An acquired embedding model
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a single piece of text
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;

    /// Model identifier, used in cache keys and logs
    fn model(&self) -> String;
}

/// Performs the one-time acquisition of an embedding backend
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BackendLoader: Send + Sync {
    async fn load(&self) -> AppResult<Arc<dyn EmbeddingBackend>>;

    /// Loader name for logging
    fn name(&self) -> &'static str;
}

/// Owns the lazily-acquired embedding backend.
///
/// Acquisition succeeds at most once; concurrent first callers wait for the in-flight
/// attempt instead of starting another. A failed attempt leaves the handle empty so a
/// later request may try again.
pub struct BackendHandle {
    loader: Arc<dyn BackendLoader>,
    backend: OnceCell<Arc<dyn EmbeddingBackend>>,
}

impl BackendHandle {
    pub fn new(loader: Arc<dyn BackendLoader>) -> Self {
        Self {
            loader,
            backend: OnceCell::new(),
        }
    }

    /// Returns the backend, acquiring it first if nobody has yet
    pub async fn acquire(&self) -> AppResult<Arc<dyn EmbeddingBackend>> {
        let backend = self
            .backend
            .get_or_try_init(|| async {
                let start = Instant::now();
                tracing::info!(loader = self.loader.name(), "Acquiring embedding backend");

                let backend = self.loader.load().await.map_err(|e| {
                    tracing::error!(loader = self.loader.name(), error = %e, "Embedding backend acquisition failed");
                    unavailable(e)
                })?;

                tracing::info!(
                    loader = self.loader.name(),
                    model = %backend.model(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Embedding backend ready"
                );
                Ok::<_, AppError>(backend)
            })
            .await?;

        Ok(Arc::clone(backend))
    }

    /// Whether acquisition has completed
    pub fn is_ready(&self) -> bool {
        self.backend.initialized()
    }
}

/// Turns query text into vectors through the shared backend handle
pub struct EmbeddingGateway {
    backend: Arc<BackendHandle>,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl EmbeddingGateway {
    pub fn new(backend: Arc<BackendHandle>) -> Self {
        Self {
            backend,
            cache: None,
            cache_ttl: 0,
        }
    }

    /// Enables the Redis embedding cache
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    /// Embeds `text`, trimmed and lowercased like the tag vector keys.
    ///
    /// Blank text yields `Ok(None)` without touching the backend. Backend failures are
    /// reported as `AppError::EmbeddingUnavailable`.
    pub async fn embed(&self, text: &str) -> AppResult<Option<Vec<f32>>> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return Ok(None);
        }

        let backend = self.backend.acquire().await?;
        let key = CacheKey::QueryEmbedding {
            model: backend.model(),
            text: text.clone(),
        };

        if let Some(cached) = self.cached_vector(&key).await {
            tracing::debug!(cache_key = %key, "Embedding cache hit");
            return Ok(Some(cached));
        }

        let vector = backend.embed(&text).await.map_err(unavailable)?;

        if vector.is_empty() {
            return Err(AppError::EmbeddingUnavailable(
                "backend returned an empty vector".to_string(),
            ));
        }

        if let Some(cache) = &self.cache {
            cache.set_in_background(&key, &vector, self.cache_ttl);
        }

        Ok(Some(vector))
    }

    async fn cached_vector(&self, key: &CacheKey) -> Option<Vec<f32>> {
        let cache = self.cache.as_ref()?;
        match cache.get_from_cache::<Vec<f32>>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, "Embedding cache read failed");
                None
            }
        }
    }
}

/// Reports any backend failure as `EmbeddingUnavailable`, keeping one that already is
fn unavailable(err: AppError) -> AppError {
    match err {
        AppError::EmbeddingUnavailable(_) => err,
        other => AppError::EmbeddingUnavailable(other.to_string()),
    }
}
