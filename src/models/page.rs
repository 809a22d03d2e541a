use serde::{Deserialize, Serialize};

use super::Movie;

const DEFAULT_PAGE: usize = 1;
const DEFAULT_PAGE_SIZE: usize = 20;

/// 1-based page window. Unreadable or zero values fall back to the defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(limit).unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    /// Items of `all` that fall on this page
    pub fn slice<'a, T>(&self, all: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.limit).min(all.len());
        let end = start.saturating_add(self.limit).min(all.len());
        &all[start..end]
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.limit)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v >= 1)
}

/// Common paging query string (`?page=&limit=`)
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::parse(self.page.as_deref(), self.limit.as_deref())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePage {
    pub page: usize,
    pub limit: usize,
    pub total_movies: usize,
    pub total_pages: usize,
    pub genre: String,
    pub sort_by: String,
    pub results: Vec<Movie>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub page: usize,
    pub limit: usize,
    pub total_movies: usize,
    pub total_pages: usize,
    pub query: String,
    pub results: Vec<Movie>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenrePage {
    pub page: usize,
    pub limit: usize,
    pub total_genres: usize,
    pub total_pages: usize,
    pub results: Vec<String>,
}
