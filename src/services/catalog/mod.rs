//! In-memory movie catalog
//!
//! The catalog is produced by an external ETL step and loaded once at startup through a
//! `CatalogSource`. After loading it is read-only and shared by every request.

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet};

use crate::{
    error::{AppError, AppResult},
    models::{normalize_tag, Movie},
};

pub mod json;
pub mod postgres;

pub use json::JsonCatalogFile;
pub use postgres::PgCatalogSource;

const NO_GENRES_SENTINEL: &str = "(no genres listed)";

/// Where the normalized catalog comes from
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load(&self) -> AppResult<Vec<Movie>>;

    /// Human-readable location for logging
    fn describe(&self) -> String;
}

/// Read-only catalog with genre membership lookups
#[derive(Debug)]
pub struct CatalogIndex {
    movies: Vec<Movie>,
    genres: Vec<String>,
    loaded_at: DateTime<Utc>,
}

impl CatalogIndex {
    /// Builds the index, cleaning labels and checking the rating invariant.
    ///
    /// Genre labels are trimmed and empty labels dropped. Tags are trimmed, lowercased
    /// and deduplicated; tags of one character or less are dropped. A movie whose average
    /// rating disagrees with its rating count, or whose average is outside 0–10, is a
    /// configuration error.
    pub fn new(movies: Vec<Movie>) -> AppResult<Self> {
        let mut movies = movies;
        let mut genres = BTreeSet::new();

        for movie in &mut movies {
            if !movie.rating_is_consistent() {
                return Err(AppError::Configuration(format!(
                    "movie {} has avgRating {:?} with {} ratings",
                    movie.movie_id, movie.avg_rating, movie.num_ratings
                )));
            }
            if let Some(rating) = movie.avg_rating {
                if !(0.0..=10.0).contains(&rating) {
                    return Err(AppError::Configuration(format!(
                        "movie {} has avgRating {} outside 0-10",
                        movie.movie_id, rating
                    )));
                }
            }

            movie.genres = movie
                .genres
                .iter()
                .map(|g| g.trim())
                .filter(|g| !g.is_empty() && *g != NO_GENRES_SENTINEL)
                .map(str::to_string)
                .collect();

            let mut seen = HashSet::new();
            movie.tags = movie
                .tags
                .iter()
                .filter_map(|t| normalize_tag(t))
                .filter(|t| seen.insert(t.clone()))
                .collect();

            genres.extend(movie.genres.iter().cloned());
        }

        Ok(Self {
            movies,
            genres: genres.into_iter().collect(),
            loaded_at: Utc::now(),
        })
    }

    /// Every movie, in catalog order
    pub fn all(&self) -> &[Movie] {
        &self.movies
    }

    /// Movies sharing at least one genre with `categories`, in catalog order.
    /// An empty filter set passes the whole catalog through.
    pub fn filter_by_categories(&self, categories: &BTreeSet<String>) -> Vec<&Movie> {
        if categories.is_empty() {
            return self.movies.iter().collect();
        }

        self.movies
            .iter()
            .filter(|m| m.genres.iter().any(|g| categories.contains(g)))
            .collect()
    }

    /// Sorted, distinct genre labels across the catalog
    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Loads and indexes the catalog. Any failure here must stop startup.
pub async fn load_catalog(source: &dyn CatalogSource) -> AppResult<CatalogIndex> {
    let movies = source.load().await.map_err(|e| match e {
        AppError::Configuration(_) => e,
        other => AppError::Configuration(format!(
            "Failed to load catalog from {}: {}",
            source.describe(),
            other
        )),
    })?;

    let index = CatalogIndex::new(movies)?;

    if index.is_empty() {
        tracing::warn!(source = %source.describe(), "Catalog is empty");
    }

    tracing::info!(
        source = %source.describe(),
        movies = index.len(),
        genres = index.genres().len(),
        "Catalog loaded"
    );

    Ok(index)
}
