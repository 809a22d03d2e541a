use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod genres;
pub mod moods;
pub mod movies;
pub mod recommendations;
pub mod state;

pub use state::AppState;

/// Creates the application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.frontend_url.as_deref());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(cors),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", post(recommendations::recommend))
        .route("/movies", get(movies::list))
        .route("/movies/search", get(movies::search))
        .route("/genres", get(genres::list))
        .route("/moods", get(moods::list))
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let Some(origin) = frontend_url else {
        return CorsLayer::permissive();
    };

    match HeaderValue::from_str(origin.trim_end_matches('/')) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE]),
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "Invalid FRONTEND_URL, allowing any origin");
            CorsLayer::permissive()
        }
    }
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let recommender = &state.recommender;
    let catalog = recommender.catalog();
    let tag_vectors = recommender.tag_vectors();

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "catalog": {
                "movies": catalog.len(),
                "genres": catalog.genres().len(),
                "loadedAt": catalog.loaded_at(),
            },
            "tagVectors": {
                "count": tag_vectors.len(),
                "dimension": tag_vectors.dimension(),
            },
            "embeddingBackend": {
                "ready": recommender.embeddings().backend().is_ready(),
            },
        })),
    )
}
