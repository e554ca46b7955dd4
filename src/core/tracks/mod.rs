//! Per-section audio artifact records and their lifecycle.
//!
//! A track is the unit of caching: the tuple (owner, entity, audio set,
//! section key, content hash) identifies one synthesized artifact. A
//! completed row with a matching hash is reused unless regeneration is
//! forced; a regenerated row is updated in place, never duplicated.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::store::{StoreError, StoreResult};
use crate::core::voices::VoiceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixStatus {
    NotRequired,
    Pending,
    Mixed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioTrack {
    pub id: Uuid,
    pub owner_id: String,
    pub entity_id: String,
    pub audio_set_id: Uuid,
    pub section_key: String,
    pub content_hash: String,
    pub text: String,
    pub voice: VoiceId,
    pub storage_key: Option<String>,
    pub url: Option<String>,
    pub status: TrackStatus,
    pub mix_status: MixStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Composite cache key identifying one track row.
#[derive(Debug, Clone, Copy)]
pub struct TrackKey<'a> {
    pub owner_id: &'a str,
    pub entity_id: &'a str,
    pub audio_set_id: Uuid,
    pub section_key: &'a str,
    pub content_hash: &'a str,
}

impl TrackKey<'_> {
    fn matches(&self, track: &AudioTrack) -> bool {
        track.owner_id == self.owner_id
            && track.entity_id == self.entity_id
            && track.audio_set_id == self.audio_set_id
            && track.section_key == self.section_key
            && track.content_hash == self.content_hash
    }
}

/// Persistence seam for track rows.
#[async_trait]
pub trait TrackStore: Send + Sync {
    /// Row matching the composite cache key, if any.
    async fn find_cached(&self, key: &TrackKey<'_>) -> StoreResult<Option<AudioTrack>>;

    /// Atomic get-or-insert: returns the row for the cache key with status
    /// reset to processing, creating it when absent. Two retries of the same
    /// section never produce duplicate rows.
    async fn upsert_processing(
        &self,
        key: &TrackKey<'_>,
        text: &str,
        voice: VoiceId,
    ) -> StoreResult<AudioTrack>;

    async fn mark_completed(
        &self,
        id: Uuid,
        storage_key: &str,
        url: &str,
        mix_status: MixStatus,
    ) -> StoreResult<()>;

    async fn mark_failed(&self, id: Uuid, message: &str) -> StoreResult<()>;

    /// Mix lifecycle updates arrive out of band from the mixing worker.
    async fn set_mix_status(&self, id: Uuid, mix_status: MixStatus) -> StoreResult<()>;

    /// Completed track for a section inside a specific audio set, any hash.
    /// Used to resolve the voice-only dependency of mix variants.
    async fn find_completed_in_set(
        &self,
        owner_id: &str,
        entity_id: &str,
        audio_set_id: Uuid,
        section_key: &str,
    ) -> StoreResult<Option<AudioTrack>>;

    /// All rows for an entity, newest update first.
    async fn list_for_entity(
        &self,
        owner_id: &str,
        entity_id: &str,
    ) -> StoreResult<Vec<AudioTrack>>;
}

/// In-memory track store.
#[derive(Default)]
pub struct MemoryTrackStore {
    rows: RwLock<HashMap<Uuid, AudioTrack>>,
}

impl MemoryTrackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrackStore for MemoryTrackStore {
    async fn find_cached(&self, key: &TrackKey<'_>) -> StoreResult<Option<AudioTrack>> {
        let rows = self.rows.read();
        Ok(rows.values().find(|t| key.matches(t)).cloned())
    }

    async fn upsert_processing(
        &self,
        key: &TrackKey<'_>,
        text: &str,
        voice: VoiceId,
    ) -> StoreResult<AudioTrack> {
        let mut rows = self.rows.write();
        let now = Utc::now();

        if let Some(existing) = rows.values_mut().find(|t| key.matches(t)) {
            existing.status = TrackStatus::Processing;
            existing.error_message = None;
            existing.voice = voice;
            existing.text = text.to_string();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let track = AudioTrack {
            id: Uuid::new_v4(),
            owner_id: key.owner_id.to_string(),
            entity_id: key.entity_id.to_string(),
            audio_set_id: key.audio_set_id,
            section_key: key.section_key.to_string(),
            content_hash: key.content_hash.to_string(),
            text: text.to_string(),
            voice,
            storage_key: None,
            url: None,
            status: TrackStatus::Processing,
            mix_status: MixStatus::NotRequired,
            error_message: None,
            created_at: now,
            updated_at: now,
        };
        rows.insert(track.id, track.clone());
        Ok(track)
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        storage_key: &str,
        url: &str,
        mix_status: MixStatus,
    ) -> StoreResult<()> {
        let mut rows = self.rows.write();
        let track = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("track {id}")))?;
        track.storage_key = Some(storage_key.to_string());
        track.url = Some(url.to_string());
        track.status = TrackStatus::Completed;
        track.mix_status = mix_status;
        track.error_message = None;
        track.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, message: &str) -> StoreResult<()> {
        let mut rows = self.rows.write();
        let track = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("track {id}")))?;
        track.status = TrackStatus::Failed;
        track.error_message = Some(message.to_string());
        track.updated_at = Utc::now();
        Ok(())
    }

    async fn set_mix_status(&self, id: Uuid, mix_status: MixStatus) -> StoreResult<()> {
        let mut rows = self.rows.write();
        let track = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("track {id}")))?;
        track.mix_status = mix_status;
        track.updated_at = Utc::now();
        Ok(())
    }

    async fn find_completed_in_set(
        &self,
        owner_id: &str,
        entity_id: &str,
        audio_set_id: Uuid,
        section_key: &str,
    ) -> StoreResult<Option<AudioTrack>> {
        let rows = self.rows.read();
        Ok(rows
            .values()
            .find(|t| {
                t.owner_id == owner_id
                    && t.entity_id == entity_id
                    && t.audio_set_id == audio_set_id
                    && t.section_key == section_key
                    && t.status == TrackStatus::Completed
                    && t.url.is_some()
            })
            .cloned())
    }

    async fn list_for_entity(
        &self,
        owner_id: &str,
        entity_id: &str,
    ) -> StoreResult<Vec<AudioTrack>> {
        let rows = self.rows.read();
        let mut tracks: Vec<AudioTrack> = rows
            .values()
            .filter(|t| t.owner_id == owner_id && t.entity_id == entity_id)
            .cloned()
            .collect();
        tracks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key<'a>(set_id: Uuid, hash: &'a str) -> TrackKey<'a> {
        TrackKey {
            owner_id: "owner",
            entity_id: "entity",
            audio_set_id: set_id,
            section_key: "intro",
            content_hash: hash,
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_reuses_row() {
        let store = MemoryTrackStore::new();
        let set_id = Uuid::new_v4();
        let k = key(set_id, "hash-a");

        let first = store
            .upsert_processing(&k, "text", VoiceId::Alloy)
            .await
            .unwrap();
        assert_eq!(first.status, TrackStatus::Processing);

        store
            .mark_completed(first.id, "k.mp3", "https://m/k.mp3", MixStatus::NotRequired)
            .await
            .unwrap();

        let second = store
            .upsert_processing(&k, "text", VoiceId::Alloy)
            .await
            .unwrap();
        assert_eq!(second.id, first.id, "same cache key reuses the row");
        assert_eq!(second.status, TrackStatus::Processing);
        assert!(second.error_message.is_none());
    }

    #[tokio::test]
    async fn test_distinct_hashes_get_distinct_rows() {
        let store = MemoryTrackStore::new();
        let set_id = Uuid::new_v4();

        let a = store
            .upsert_processing(&key(set_id, "hash-a"), "text a", VoiceId::Alloy)
            .await
            .unwrap();
        let b = store
            .upsert_processing(&key(set_id, "hash-b"), "text b", VoiceId::Alloy)
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_find_cached_matches_full_key() {
        let store = MemoryTrackStore::new();
        let set_id = Uuid::new_v4();
        let k = key(set_id, "hash-a");
        store
            .upsert_processing(&k, "text", VoiceId::Alloy)
            .await
            .unwrap();

        assert!(store.find_cached(&k).await.unwrap().is_some());
        assert!(
            store
                .find_cached(&key(set_id, "hash-other"))
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .find_cached(&key(Uuid::new_v4(), "hash-a"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_find_completed_in_set_ignores_processing_rows() {
        let store = MemoryTrackStore::new();
        let set_id = Uuid::new_v4();
        let track = store
            .upsert_processing(&key(set_id, "hash-a"), "text", VoiceId::Alloy)
            .await
            .unwrap();

        assert!(
            store
                .find_completed_in_set("owner", "entity", set_id, "intro")
                .await
                .unwrap()
                .is_none()
        );

        store
            .mark_completed(track.id, "k.mp3", "https://m/k.mp3", MixStatus::NotRequired)
            .await
            .unwrap();

        let found = store
            .find_completed_in_set("owner", "entity", set_id, "intro")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, track.id);
    }

    #[tokio::test]
    async fn test_mix_status_updated_out_of_band() {
        let store = MemoryTrackStore::new();
        let track = store
            .upsert_processing(&key(Uuid::new_v4(), "hash-a"), "text", VoiceId::Alloy)
            .await
            .unwrap();
        store
            .mark_completed(track.id, "k.mp3", "https://m/k.mp3", MixStatus::Pending)
            .await
            .unwrap();

        store.set_mix_status(track.id, MixStatus::Mixed).await.unwrap();

        let rows = store.list_for_entity("owner", "entity").await.unwrap();
        assert_eq!(rows[0].mix_status, MixStatus::Mixed);
        assert_eq!(rows[0].status, TrackStatus::Completed);
    }

    #[tokio::test]
    async fn test_mark_failed_records_message() {
        let store = MemoryTrackStore::new();
        let track = store
            .upsert_processing(&key(Uuid::new_v4(), "hash-a"), "text", VoiceId::Alloy)
            .await
            .unwrap();
        store.mark_failed(track.id, "provider 500").await.unwrap();

        let rows = store.list_for_entity("owner", "entity").await.unwrap();
        assert_eq!(rows[0].status, TrackStatus::Failed);
        assert_eq!(rows[0].error_message.as_deref(), Some("provider 500"));
    }
}
