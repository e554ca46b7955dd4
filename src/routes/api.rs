use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{batches, generate, tracks, voices};
use crate::state::AppState;
use std::sync::Arc;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/audio/generate", post(generate::generate_handler))
        .route("/audio/tracks", get(tracks::list_tracks))
        .route("/audio/batches/{id}", get(batches::get_batch))
        .route("/voices", get(voices::list_voices))
        .route("/voices/{voice}/reference", get(voices::voice_reference))
        .layer(TraceLayer::new_for_http())
}
