use axum::{
    extract::{Path, State},
    response::Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::batch::{BatchStore, GenerationBatch};
use crate::errors::AppError;
use crate::state::AppState;

/// Handler for GET /audio/batches/{id} - pollable progress counters
pub async fn get_batch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<GenerationBatch>, AppError> {
    let batch = state
        .batches
        .get(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("batch {id}")))?;

    Ok(Json(batch))
}
