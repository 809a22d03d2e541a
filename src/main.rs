use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelvibe_api::{
    config::Config,
    routes::{create_router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelvibe_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        catalog = %config.catalog_path,
        postgres = config.database_url.is_some(),
        redis = config.redis_url.is_some(),
        embedding_api = %config.embedding_api_url,
        "Starting reelvibe-api"
    );

    let (state, cache_handle) = AppState::from_config(&config).await?;
    let state = Arc::new(state);

    // Acquire the embedding backend ahead of the first vibe query
    let warm_up = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = warm_up.recommender.embeddings().backend().acquire().await {
            tracing::warn!(error = %e, "Embedding backend not ready, will retry on first vibe query");
        }
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
