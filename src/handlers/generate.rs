use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::batch::BatchStore;
use crate::core::generate::{GenerationRequest, SectionInput, SectionResult};
use crate::core::tts::AudioFormat;
use crate::core::variant::Variant;
use crate::core::voices::VoiceId;
use crate::errors::AppError;
use crate::state::AppState;

/// Request body for the generate endpoint
#[derive(Debug, Deserialize)]
pub struct GenerateRequestBody {
    /// Authenticated owner id supplied by the surrounding system
    pub owner_id: String,
    /// Entity the sections belong to
    pub entity_id: String,
    pub sections: Vec<SectionInput>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub audio_set_id: Option<Uuid>,
    /// Pre-created batch for progress polling; one is created when absent
    #[serde(default)]
    pub batch_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub results: Vec<SectionResult>,
    pub batch_id: Uuid,
}

/// Handler for POST /audio/generate
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateRequestBody>,
) -> Result<Json<GenerateResponse>, AppError> {
    if body.owner_id.trim().is_empty() || body.entity_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "owner_id and entity_id are required".to_string(),
        ));
    }
    if body.sections.is_empty() {
        return Err(AppError::BadRequest(
            "at least one section is required".to_string(),
        ));
    }

    let voice = match &body.voice {
        Some(raw) => VoiceId::from_str(raw).map_err(AppError::BadRequest)?,
        None => VoiceId::Alloy,
    };
    let variant = match &body.variant {
        Some(raw) => Variant::from_str(raw).map_err(AppError::BadRequest)?,
        None => Variant::Standard,
    };
    let format = match &body.format {
        Some(raw) => AudioFormat::from_str(raw).map_err(AppError::BadRequest)?,
        None => AudioFormat::Mp3,
    };

    info!(
        owner_id = %body.owner_id,
        entity_id = %body.entity_id,
        %voice,
        %variant,
        sections = body.sections.len(),
        "generation request received"
    );

    // A pollable batch always exists: verify the supplied one or create one.
    let batch_id = match body.batch_id {
        Some(id) => {
            state
                .batches
                .get(id)
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?
                .ok_or_else(|| AppError::BadRequest(format!("unknown batch: {id}")))?;
            id
        }
        None => {
            state
                .batches
                .create(&body.owner_id, body.sections.len())
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?
                .id
        }
    };

    let request = GenerationRequest {
        owner_id: body.owner_id,
        entity_id: body.entity_id,
        sections: body.sections,
        voice,
        format,
        variant,
        force: body.force,
        audio_set_id: body.audio_set_id,
        batch_id: Some(batch_id),
    };

    let results = state.orchestrator.generate(request).await?;

    Ok(Json(GenerateResponse { results, batch_id }))
}
