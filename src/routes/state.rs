use std::sync::Arc;

use crate::{
    config::Config,
    db::{create_pool, create_redis_client, Cache, CacheWriterHandle},
    models::QueryLimits,
    services::{
        catalog::{load_catalog, CatalogSource, JsonCatalogFile, PgCatalogSource},
        embedding::{
            load_tag_vectors, BackendHandle, EmbeddingGateway, HttpEmbeddingLoader,
            JsonTagVectorFile,
        },
        RecommendationService, ScoringEngine,
    },
};

/// Shared, read-only state handed to every handler
pub struct AppState {
    pub recommender: Arc<RecommendationService>,
    pub query_limits: QueryLimits,
    /// Allowed CORS origin
    pub frontend_url: Option<String>,
}

impl AppState {
    pub fn new(recommender: RecommendationService, query_limits: QueryLimits) -> Self {
        Self {
            recommender: Arc::new(recommender),
            query_limits,
            frontend_url: None,
        }
    }

    /// Loads the catalog and tag vectors and wires up the embedding backend.
    ///
    /// Returns the cache writer handle when the Redis cache is enabled, so the caller can
    /// flush it on shutdown.
    pub async fn from_config(
        config: &Config,
    ) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        let catalog_source: Box<dyn CatalogSource> = match &config.database_url {
            Some(url) => Box::new(PgCatalogSource::new(create_pool(url).await?)),
            None => Box::new(JsonCatalogFile::new(&config.catalog_path)),
        };
        let catalog = load_catalog(catalog_source.as_ref()).await?;
        let tag_vectors =
            load_tag_vectors(&JsonTagVectorFile::new(&config.tag_vectors_path)).await?;

        let loader = HttpEmbeddingLoader::new(&config.embedding_api_url, &config.embedding_model);
        let mut gateway = EmbeddingGateway::new(Arc::new(BackendHandle::new(Arc::new(loader))));

        let mut cache_handle = None;
        if let Some(redis_url) = &config.redis_url {
            let (cache, handle) = Cache::new(create_redis_client(redis_url)?).await;
            gateway = gateway.with_cache(cache, config.embedding_cache_ttl_secs);
            cache_handle = Some(handle);
            tracing::info!("Query embedding cache enabled");
        }

        let recommender = RecommendationService::new(
            Arc::new(catalog),
            Arc::new(tag_vectors),
            Arc::new(gateway),
            ScoringEngine::new(config.scoring_weights()),
        )
        .with_embedding_timeout(config.embedding_timeout());

        let query_limits = QueryLimits {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        };

        let mut state = Self::new(recommender, query_limits);
        state.frontend_url = config.frontend_url.clone();

        Ok((state, cache_handle))
    }
}
