//! Generation orchestrator: the per-section narration pipeline.
//!
//! For every requested section the orchestrator hashes the text, reuses a
//! completed track when the hash matches (at most one synthesis per distinct
//! content), and otherwise runs the variant's pipeline: voice-only sections
//! are chunked, synthesized and uploaded; mix-variant sections reuse an
//! existing voice-only track and enqueue an asynchronous mix job. A mix
//! variant never re-synthesizes speech — a missing voice-only dependency is
//! a deliberate hard failure that keeps cross-variant voice consistency and
//! avoids duplicate billed synthesis.
//!
//! Failures are scoped to their section: the pipeline records them on the
//! track row and moves on. Only request-level validation aborts the call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::batch::BatchProgressTracker;
use crate::core::mix::{MixDispatcher, MixJob};
use crate::core::sets::{AudioSet, AudioSetManager};
use crate::core::storage::{self, AudioStorage, StorageError};
use crate::core::store::StoreError;
use crate::core::text::{DEFAULT_MAX_CHUNK_CHARS, chunk_text, content_hash, normalize_text};
use crate::core::tracks::{MixStatus, TrackKey, TrackStatus, TrackStore};
use crate::core::tts::{AudioFormat, SpeechSynthesizer, SynthesisError};
use crate::core::variant::Variant;
use crate::core::voices::{REFERENCE_TEXT, VoiceId};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Request-level validation failure; no side effects were performed.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A mix variant was requested without a completed voice-only track for
    /// the same section and voice. Never falls back to synthesis.
    #[error("missing voice-only track: {0}")]
    DependencyMissing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionInput {
    pub section_key: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Skipped,
    Generated,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionResult {
    pub section_key: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SectionResult {
    fn skipped(section_key: &str, url: Option<String>, storage_key: Option<String>) -> Self {
        Self {
            section_key: section_key.to_string(),
            outcome: Outcome::Skipped,
            url,
            storage_key,
            error: None,
        }
    }

    fn generated(section_key: &str, url: String, storage_key: String) -> Self {
        Self {
            section_key: section_key.to_string(),
            outcome: Outcome::Generated,
            url: Some(url),
            storage_key: Some(storage_key),
            error: None,
        }
    }

    fn failed(section_key: &str, error: impl ToString) -> Self {
        Self {
            section_key: section_key.to_string(),
            outcome: Outcome::Failed,
            url: None,
            storage_key: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub owner_id: String,
    pub entity_id: String,
    pub sections: Vec<SectionInput>,
    pub voice: VoiceId,
    pub format: AudioFormat,
    pub variant: Variant,
    pub force: bool,
    /// Generate into this existing set instead of resolving one from
    /// (entity, variant, voice). The set row's variant and voice win.
    pub audio_set_id: Option<Uuid>,
    /// Pre-created batch to report progress into.
    pub batch_id: Option<Uuid>,
}

/// Reference sample location for one voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSample {
    pub url: String,
    pub key: String,
}

/// Seam for stamping the entity's "last generated" timestamp; the
/// surrounding system owns the entity record.
#[async_trait]
pub trait EntityStamp: Send + Sync {
    async fn stamp_last_generated(&self, owner_id: &str, entity_id: &str, at: DateTime<Utc>);
}

/// Default stamp sink: logs the event for the surrounding system to consume.
#[derive(Debug, Default)]
pub struct TracingStamp;

#[async_trait]
impl EntityStamp for TracingStamp {
    async fn stamp_last_generated(&self, owner_id: &str, entity_id: &str, at: DateTime<Utc>) {
        info!(owner_id, entity_id, at = %at, "entity narration generated");
    }
}

pub struct GenerationOrchestrator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    storage: Arc<dyn AudioStorage>,
    tracks: Arc<dyn TrackStore>,
    sets: AudioSetManager,
    batches: BatchProgressTracker,
    mixer: MixDispatcher,
    entity_stamp: Arc<dyn EntityStamp>,
    max_chunk_chars: usize,
}

impl GenerationOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        storage: Arc<dyn AudioStorage>,
        tracks: Arc<dyn TrackStore>,
        sets: AudioSetManager,
        batches: BatchProgressTracker,
        mixer: MixDispatcher,
        entity_stamp: Arc<dyn EntityStamp>,
    ) -> Self {
        Self {
            synthesizer,
            storage,
            tracks,
            sets,
            batches,
            mixer,
            entity_stamp,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }

    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }

    /// Run the pipeline for every requested section.
    ///
    /// Raises only for request-level validation; every per-section outcome,
    /// including failures, is returned in the result list.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<Vec<SectionResult>, GenerationError> {
        if request.sections.is_empty() {
            return Err(GenerationError::Validation(
                "at least one section is required".to_string(),
            ));
        }

        let set = self.resolve_audio_set(&request).await?;
        let variant = set.variant;
        let voice = set.voice;
        let total = request.sections.len();

        info!(
            owner_id = %request.owner_id,
            entity_id = %request.entity_id,
            %variant,
            %voice,
            sections = total,
            force = request.force,
            "generation request started"
        );

        if let Some(batch_id) = request.batch_id {
            self.batches.attach_set(batch_id, set.id).await;
            self.batches.update(batch_id, 0, 0, total).await;
        }

        let mut results: Vec<SectionResult> = Vec::with_capacity(total);

        for section in &request.sections {
            let result = self
                .process_section(&request, &set, variant, voice, section)
                .await;
            results.push(result);

            if let Some(batch_id) = request.batch_id {
                let completed = results
                    .iter()
                    .filter(|r| matches!(r.outcome, Outcome::Generated | Outcome::Skipped))
                    .count();
                let failed = results
                    .iter()
                    .filter(|r| r.outcome == Outcome::Failed)
                    .count();
                self.batches.update(batch_id, completed, failed, total).await;
            }
        }

        let completed = results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Generated | Outcome::Skipped))
            .count();
        let failed = results
            .iter()
            .filter(|r| r.outcome == Outcome::Failed)
            .count();

        if let Some(batch_id) = request.batch_id {
            self.batches.finalize(batch_id, completed, failed, total).await;
        }

        self.entity_stamp
            .stamp_last_generated(&request.owner_id, &request.entity_id, Utc::now())
            .await;

        info!(
            entity_id = %request.entity_id,
            completed,
            failed,
            total,
            "generation request finished"
        );

        Ok(results)
    }

    async fn resolve_audio_set(
        &self,
        request: &GenerationRequest,
    ) -> Result<AudioSet, GenerationError> {
        match request.audio_set_id {
            Some(id) => {
                let set = self.sets.get(id).await.map_err(|e| match e {
                    StoreError::NotFound(_) => {
                        GenerationError::Validation(format!("unknown audio set: {id}"))
                    }
                    other => GenerationError::Store(other),
                })?;
                if set.variant != request.variant || set.voice != request.voice {
                    warn!(
                        set_id = %set.id,
                        set_variant = %set.variant,
                        set_voice = %set.voice,
                        "explicit audio set overrides requested variant/voice"
                    );
                }
                Ok(set)
            }
            None => Ok(self
                .sets
                .get_or_create(
                    &request.owner_id,
                    &request.entity_id,
                    request.variant,
                    request.voice,
                    None,
                )
                .await?),
        }
    }

    /// Run one section through the pipeline; never lets an error escape
    /// unrecorded.
    async fn process_section(
        &self,
        request: &GenerationRequest,
        set: &AudioSet,
        variant: Variant,
        voice: VoiceId,
        section: &SectionInput,
    ) -> SectionResult {
        let section_key = section.section_key.as_str();

        // Empty text fails the section before any row is written.
        if normalize_text(&section.text).is_empty() {
            warn!(section_key, "section rejected: empty text");
            return SectionResult::failed(section_key, "section text is empty");
        }

        let hash = content_hash(&section.text);
        let key = TrackKey {
            owner_id: &request.owner_id,
            entity_id: &request.entity_id,
            audio_set_id: set.id,
            section_key,
            content_hash: &hash,
        };

        // Cache hit: an identical completed track is reused as-is.
        match self.tracks.find_cached(&key).await {
            Ok(Some(existing))
                if existing.status == TrackStatus::Completed && !request.force =>
            {
                info!(section_key, url = ?existing.url, "skipping section, cached track found");
                return SectionResult::skipped(section_key, existing.url, existing.storage_key);
            }
            Ok(_) => {}
            Err(e) => {
                error!(section_key, error = %e, "track lookup failed");
                return SectionResult::failed(section_key, e);
            }
        }

        let track = match self.tracks.upsert_processing(&key, &section.text, voice).await {
            Ok(track) => track,
            Err(e) => {
                error!(section_key, error = %e, "track upsert failed");
                return SectionResult::failed(section_key, e);
            }
        };

        let outcome = if variant.is_mix() {
            self.process_mix_section(request, set, voice, section_key, track.id)
                .await
        } else {
            self.process_voice_section(request, variant, voice, section, &hash, track.id)
                .await
        };

        match outcome {
            Ok((storage_key, url)) => SectionResult::generated(section_key, url, storage_key),
            Err(e) => {
                error!(section_key, error = %e, "section generation failed");
                if let Err(store_err) = self.tracks.mark_failed(track.id, &e.to_string()).await {
                    error!(section_key, error = %store_err, "failed to record section failure");
                }
                SectionResult::failed(section_key, e)
            }
        }
    }

    /// Voice-only pipeline: pace, chunk, synthesize, concatenate, upload.
    async fn process_voice_section(
        &self,
        request: &GenerationRequest,
        variant: Variant,
        voice: VoiceId,
        section: &SectionInput,
        hash: &str,
        track_id: Uuid,
    ) -> Result<(String, String), GenerationError> {
        let paced = variant.apply_pacing(&section.text);
        let chunks = chunk_text(&paced, self.max_chunk_chars);

        let mut audio = Vec::new();
        for chunk in &chunks {
            let bytes = self
                .synthesizer
                .synthesize(chunk, voice, request.format)
                .await?;
            audio.extend_from_slice(&bytes);
        }

        let storage_key = storage::track_key(
            &request.owner_id,
            &request.entity_id,
            &section.section_key,
            hash,
            request.format,
        );
        let url = self
            .storage
            .put(&storage_key, audio.into(), request.format.content_type())
            .await?;

        self.tracks
            .mark_completed(track_id, &storage_key, &url, MixStatus::NotRequired)
            .await?;

        Ok((storage_key, url))
    }

    /// Mix pipeline: reuse the completed voice-only track for the same
    /// section and voice, then enqueue the blend for the external worker.
    async fn process_mix_section(
        &self,
        request: &GenerationRequest,
        set: &AudioSet,
        voice: VoiceId,
        section_key: &str,
        track_id: Uuid,
    ) -> Result<(String, String), GenerationError> {
        let standard_set = self
            .sets
            .find(&request.entity_id, Variant::Standard, voice)
            .await?
            .ok_or_else(|| {
                GenerationError::DependencyMissing(format!(
                    "no voice-only audio set exists for voice {voice}; generate voice-only tracks first"
                ))
            })?;

        let dependency = self
            .tracks
            .find_completed_in_set(
                &request.owner_id,
                &request.entity_id,
                standard_set.id,
                section_key,
            )
            .await?
            .ok_or_else(|| {
                GenerationError::DependencyMissing(format!(
                    "no completed voice-only track for section {section_key} with voice {voice}"
                ))
            })?;

        let (voice_key, voice_url) = match (dependency.storage_key, dependency.url) {
            (Some(key), Some(url)) => (key, url),
            _ => {
                return Err(GenerationError::DependencyMissing(format!(
                    "voice-only track for section {section_key} has no stored audio"
                )));
            }
        };

        // The mix track points at the voice audio until the worker replaces
        // it with the blended output.
        self.tracks
            .mark_completed(track_id, &voice_key, &voice_url, MixStatus::Pending)
            .await?;

        let (background_url, voice_volume, bg_volume) = self.mixer.resolve_parameters(set);
        self.mixer
            .dispatch(MixJob {
                track_id,
                voice_url: voice_url.clone(),
                background_url,
                output_key: storage::mixed_output_key(&voice_key),
                voice_volume,
                bg_volume,
            })
            .await;

        Ok((voice_key, voice_url))
    }

    /// Per-voice reference sample, memoized through the storage existence
    /// check: the first request synthesizes and stores, later requests
    /// short-circuit.
    pub async fn reference_sample(
        &self,
        voice: VoiceId,
        format: AudioFormat,
    ) -> Result<ReferenceSample, GenerationError> {
        let key = storage::reference_key(voice, format);

        if self.storage.exists(&key).await? {
            return Ok(ReferenceSample {
                url: self.storage.url_for(&key),
                key,
            });
        }

        let mut audio = Vec::new();
        for chunk in chunk_text(REFERENCE_TEXT, self.max_chunk_chars) {
            let bytes = self.synthesizer.synthesize(&chunk, voice, format).await?;
            audio.extend_from_slice(&bytes);
        }

        let url = self
            .storage
            .put(&key, audio.into(), format.content_type())
            .await?;

        info!(%voice, key, "reference sample generated");
        Ok(ReferenceSample { url, key })
    }
}
