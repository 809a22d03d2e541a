use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::{
    models::{GenrePage, PageParams},
    routes::AppState,
    services::browse,
};

/// Handler for the genre listing
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Json<GenrePage> {
    Json(browse::list_genres(
        state.recommender.catalog(),
        params.pagination(),
    ))
}
