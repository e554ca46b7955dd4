use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::core::generate::ReferenceSample;
use crate::core::tts::AudioFormat;
use crate::core::voices::{VoiceId, VoiceInfo, voice_catalog};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceInfo>,
}

/// Handler for GET /voices - returns the static voice catalog
pub async fn list_voices() -> Json<VoicesResponse> {
    Json(VoicesResponse {
        voices: voice_catalog(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ReferenceQuery {
    #[serde(default)]
    pub format: Option<String>,
}

/// Handler for GET /voices/{voice}/reference
///
/// Returns the per-voice reference sample, synthesizing and storing it on
/// first request and short-circuiting on the storage existence check after.
pub async fn voice_reference(
    State(state): State<Arc<AppState>>,
    Path(voice): Path<String>,
    Query(query): Query<ReferenceQuery>,
) -> Result<Json<ReferenceSample>, AppError> {
    let voice = VoiceId::from_str(&voice).map_err(AppError::BadRequest)?;
    let format = match &query.format {
        Some(raw) => AudioFormat::from_str(raw).map_err(AppError::BadRequest)?,
        None => AudioFormat::Mp3,
    };

    let sample = state.orchestrator.reference_sample(voice, format).await?;
    Ok(Json(sample))
}
