use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Creates the PostgreSQL pool used to read the catalog.
///
/// The catalog is read once at startup, so the pool stays small.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;

    tracing::info!("Connected to PostgreSQL");
    Ok(pool)
}
