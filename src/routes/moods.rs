use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{routes::AppState, services::MoodTable};

/// Handler for the mood table
pub async fn list(State(state): State<Arc<AppState>>) -> Json<MoodTable> {
    Json(state.recommender.moods().clone())
}
