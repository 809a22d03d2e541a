use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{RecommendationRequest, Recommendations},
    routes::AppState,
};

/// Handler for the recommendation endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Recommendations>> {
    let query = request.into_query(state.query_limits).inspect_err(|e| {
        tracing::info!(request_id = %request_id, error = %e, "Rejected recommendation request");
    })?;

    tracing::info!(
        request_id = %request_id,
        mood = ?query.mood,
        genres = query.genres.len(),
        decade = ?query.decade,
        min_rating = ?query.min_rating,
        has_vibe = query.vibe.is_some(),
        limit = query.limit,
        "Processing recommendation request"
    );

    let recommendations = state.recommender.recommend(&query).await;

    tracing::info!(
        request_id = %request_id,
        mode = ?recommendations.mode,
        semantic = ?recommendations.semantic,
        returned = recommendations.results.len(),
        "Recommendations completed"
    );

    Ok(Json(recommendations))
}
