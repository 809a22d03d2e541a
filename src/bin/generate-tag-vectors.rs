//! Precomputes the tag → vector table read by the server at startup.
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelvibe_api::{
    config::Config,
    models::normalize_tag,
    services::{
        catalog::{load_catalog, CatalogSource, JsonCatalogFile, PgCatalogSource},
        embedding::{BackendHandle, HttpEmbeddingLoader, JsonTagVectorFile},
    },
};

const PROGRESS_EVERY: usize = 50;

#[derive(Parser, Debug)]
#[command(about = "Embed every catalog tag and write the tag vector table")]
struct CliArgs {
    /// Catalog JSON to read tags from (defaults to CATALOG_PATH, or the database when DATABASE_URL is set)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Output file (defaults to TAG_VECTORS_PATH)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Embedding service base URL (defaults to EMBEDDING_API_URL)
    #[arg(long)]
    embedding_api_url: Option<String>,

    /// Stop after this many tags
    #[arg(long)]
    max_tags: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelvibe_api=info,generate_tag_vectors=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let config = Config::from_env()?;

    let catalog_source: Box<dyn CatalogSource> = match (&args.catalog, &config.database_url) {
        (Some(path), _) => Box::new(JsonCatalogFile::new(path)),
        (None, Some(url)) => Box::new(PgCatalogSource::new(
            reelvibe_api::db::create_pool(url).await?,
        )),
        (None, None) => Box::new(JsonCatalogFile::new(&config.catalog_path)),
    };
    let catalog = load_catalog(catalog_source.as_ref())
        .await
        .context("Failed to load catalog")?;

    let mut tags: Vec<String> = catalog
        .all()
        .iter()
        .flat_map(|movie| movie.tags.iter())
        .filter_map(|tag| normalize_tag(tag))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if let Some(max) = args.max_tags {
        tags.truncate(max);
    }
    tracing::info!(tags = tags.len(), "Collected unique tags");

    let api_url = args
        .embedding_api_url
        .unwrap_or_else(|| config.embedding_api_url.clone());
    let handle = BackendHandle::new(Arc::new(HttpEmbeddingLoader::new(
        api_url,
        &config.embedding_model,
    )));
    let backend = handle
        .acquire()
        .await
        .context("Embedding backend is not available")?;

    let start = Instant::now();
    let mut vectors = BTreeMap::new();
    let mut failed = 0usize;

    for (i, tag) in tags.iter().enumerate() {
        match backend.embed(tag).await {
            Ok(vector) if !vector.is_empty() => {
                vectors.insert(tag.clone(), vector);
            }
            Ok(_) => {
                failed += 1;
                tracing::error!(tag = %tag, "Embedding service returned an empty vector");
            }
            Err(e) => {
                failed += 1;
                tracing::error!(tag = %tag, error = %e, "Failed to embed tag");
            }
        }

        if (i + 1) % PROGRESS_EVERY == 0 {
            tracing::info!(
                done = i + 1,
                total = tags.len(),
                elapsed_secs = start.elapsed().as_secs(),
                "Embedding progress"
            );
        }
    }

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.tag_vectors_path));
    JsonTagVectorFile::new(&output)
        .save(&vectors)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        embedded = vectors.len(),
        failed,
        output = %output.display(),
        elapsed_secs = start.elapsed().as_secs(),
        "Tag vectors written"
    );

    Ok(())
}
