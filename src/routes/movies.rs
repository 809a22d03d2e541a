use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{MoviePage, Pagination, SearchPage},
    routes::AppState,
    services::browse::{self, BrowseOptions},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseQuery {
    page: Option<String>,
    limit: Option<String>,
    genre: Option<String>,
    sort_by: Option<String>,
    order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    title: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

/// Handler for paged catalog browsing
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<BrowseQuery>,
) -> Json<MoviePage> {
    let pagination = Pagination::parse(params.page.as_deref(), params.limit.as_deref());
    let options = BrowseOptions {
        genre: params.genre,
        sort_by: params.sort_by,
        order: params.order,
    };

    let page = browse::browse_movies(state.recommender.catalog(), &options, pagination);

    tracing::info!(
        request_id = %request_id,
        genre = %page.genre,
        page = page.page,
        total = page.total_movies,
        "Listed movies"
    );

    Json(page)
}

/// Handler for title search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchPage>> {
    let pagination = Pagination::parse(params.page.as_deref(), params.limit.as_deref());
    let page = browse::search_titles(
        state.recommender.catalog(),
        params.title.as_deref(),
        pagination,
    )?;

    tracing::info!(
        request_id = %request_id,
        query = %page.query,
        matches = page.total_movies,
        "Searched titles"
    );

    Ok(Json(page))
}
