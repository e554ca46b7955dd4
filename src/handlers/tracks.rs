use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::tracks::{AudioTrack, MixStatus, TrackStatus, TrackStore};
use crate::core::voices::VoiceId;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TracksQuery {
    pub owner_id: String,
    pub entity_id: String,
}

/// Per-section status row exposed to polling collaborators.
#[derive(Debug, Serialize)]
pub struct TrackSummary {
    pub id: Uuid,
    pub section_key: String,
    pub status: TrackStatus,
    pub mix_status: MixStatus,
    pub voice: VoiceId,
    pub content_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<AudioTrack> for TrackSummary {
    fn from(track: AudioTrack) -> Self {
        Self {
            id: track.id,
            section_key: track.section_key,
            status: track.status,
            mix_status: track.mix_status,
            voice: track.voice,
            content_hash: track.content_hash,
            url: track.url,
            error_message: track.error_message,
            updated_at: track.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TracksResponse {
    pub tracks: Vec<TrackSummary>,
}

/// Handler for GET /audio/tracks - per-section track statuses for an entity
pub async fn list_tracks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TracksQuery>,
) -> Result<Json<TracksResponse>, AppError> {
    let tracks = state
        .tracks
        .list_for_entity(&query.owner_id, &query.entity_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(TracksResponse {
        tracks: tracks.into_iter().map(TrackSummary::from).collect(),
    }))
}
