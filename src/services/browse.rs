//! Catalog browsing: paged listing, title search and genre listing

use std::cmp::Reverse;

use super::catalog::CatalogIndex;
use crate::{
    error::{AppError, AppResult},
    models::{GenrePage, Movie, MoviePage, Pagination, SearchPage},
};

/// Listing options for `browse_movies`
#[derive(Debug, Default, Clone)]
pub struct BrowseOptions {
    /// Case-insensitive genre filter
    pub genre: Option<String>,
    /// Only `"year"` changes the order; other values are echoed back
    pub sort_by: Option<String>,
    /// `"asc"` for oldest first, anything else newest first
    pub order: Option<String>,
}

/// Pages through the catalog, optionally filtered by genre and sorted by year.
/// Movies without a year sort as year 0.
pub fn browse_movies(
    catalog: &CatalogIndex,
    options: &BrowseOptions,
    pagination: Pagination,
) -> MoviePage {
    let genre = options
        .genre
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty());
    let sort_by = options
        .sort_by
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut movies: Vec<&Movie> = catalog
        .all()
        .iter()
        .filter(|m| genre.map_or(true, |g| m.has_genre_ignore_case(g)))
        .collect();

    if sort_by == Some("year") {
        if options.order.as_deref() == Some("asc") {
            movies.sort_by_key(|m| m.year.unwrap_or(0));
        } else {
            movies.sort_by_key(|m| Reverse(m.year.unwrap_or(0)));
        }
    }

    MoviePage {
        page: pagination.page,
        limit: pagination.limit,
        total_movies: movies.len(),
        total_pages: pagination.total_pages(movies.len()),
        genre: genre.unwrap_or("All").to_string(),
        sort_by: sort_by.unwrap_or("Default").to_string(),
        results: pagination.slice(&movies).iter().map(|m| (*m).clone()).collect(),
    }
}

/// Case-insensitive substring search over titles
pub fn search_titles(
    catalog: &CatalogIndex,
    title: Option<&str>,
    pagination: Pagination,
) -> AppResult<SearchPage> {
    let query = title.map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(AppError::InvalidRequest(
            "Missing 'title' query parameter".to_string(),
        ));
    }

    let needle = query.to_lowercase();
    let matches: Vec<&Movie> = catalog
        .all()
        .iter()
        .filter(|m| m.title.to_lowercase().contains(&needle))
        .collect();

    Ok(SearchPage {
        page: pagination.page,
        limit: pagination.limit,
        total_movies: matches.len(),
        total_pages: pagination.total_pages(matches.len()),
        query: query.to_string(),
        results: pagination.slice(&matches).iter().map(|m| (*m).clone()).collect(),
    })
}

/// Sorted distinct genres, paged
pub fn list_genres(catalog: &CatalogIndex, pagination: Pagination) -> GenrePage {
    let genres = catalog.genres();

    GenrePage {
        page: pagination.page,
        limit: pagination.limit,
        total_genres: genres.len(),
        total_pages: pagination.total_pages(genres.len()),
        results: pagination.slice(genres).to_vec(),
    }
}
