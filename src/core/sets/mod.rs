//! Audio sets: grouping of tracks sharing one (entity, variant, voice).
//!
//! At most one set exists per triple; the same variant may exist in several
//! voices concurrently, each with independent tracks and mixing. Sets are
//! created lazily with the variant's default name, description and volumes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::store::{StoreError, StoreResult};
use crate::core::variant::Variant;
use crate::core::voices::VoiceId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSet {
    pub id: Uuid,
    pub owner_id: String,
    pub entity_id: String,
    pub variant: Variant,
    pub voice: VoiceId,
    pub name: String,
    pub description: String,
    /// Narration volume, 0-100.
    pub voice_volume: u8,
    /// Background volume, 0-100.
    pub bg_volume: u8,
    /// Per-set background asset override; `None` resolves through the
    /// variant profile and the global default.
    pub background_track: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Persistence seam for audio sets.
#[async_trait]
pub trait SetStore: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<AudioSet>>;

    async fn find(
        &self,
        entity_id: &str,
        variant: Variant,
        voice: VoiceId,
    ) -> StoreResult<Option<AudioSet>>;

    /// Insert the set unless one already exists for its (entity, variant,
    /// voice) triple; returns the surviving row either way.
    async fn get_or_insert(&self, set: AudioSet) -> StoreResult<AudioSet>;
}

#[derive(Default)]
pub struct MemorySetStore {
    rows: RwLock<Vec<AudioSet>>,
}

impl MemorySetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SetStore for MemorySetStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<AudioSet>> {
        Ok(self.rows.read().iter().find(|s| s.id == id).cloned())
    }

    async fn find(
        &self,
        entity_id: &str,
        variant: Variant,
        voice: VoiceId,
    ) -> StoreResult<Option<AudioSet>> {
        Ok(self
            .rows
            .read()
            .iter()
            .find(|s| s.entity_id == entity_id && s.variant == variant && s.voice == voice)
            .cloned())
    }

    async fn get_or_insert(&self, set: AudioSet) -> StoreResult<AudioSet> {
        let mut rows = self.rows.write();
        if let Some(existing) = rows
            .iter()
            .find(|s| s.entity_id == set.entity_id && s.variant == set.variant && s.voice == set.voice)
        {
            return Ok(existing.clone());
        }
        rows.push(set.clone());
        Ok(set)
    }
}

/// Get-or-create front over the set store.
#[derive(Clone)]
pub struct AudioSetManager {
    store: Arc<dyn SetStore>,
}

impl AudioSetManager {
    pub fn new(store: Arc<dyn SetStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: Uuid) -> StoreResult<AudioSet> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("audio set {id}")))
    }

    pub async fn find(
        &self,
        entity_id: &str,
        variant: Variant,
        voice: VoiceId,
    ) -> StoreResult<Option<AudioSet>> {
        self.store.find(entity_id, variant, voice).await
    }

    /// Existing set for the triple, or a new one with variant defaults.
    pub async fn get_or_create(
        &self,
        owner_id: &str,
        entity_id: &str,
        variant: Variant,
        voice: VoiceId,
        name: Option<String>,
    ) -> StoreResult<AudioSet> {
        if let Some(existing) = self.store.find(entity_id, variant, voice).await? {
            tracing::debug!(set_id = %existing.id, %variant, %voice, "reusing audio set");
            return Ok(existing);
        }

        let profile = variant.mix_profile();
        let set = AudioSet {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            entity_id: entity_id.to_string(),
            variant,
            voice,
            name: name.unwrap_or_else(|| variant.default_set_name()),
            description: profile.description.to_string(),
            voice_volume: profile.voice_volume,
            bg_volume: profile.bg_volume,
            background_track: None,
            created_at: Utc::now(),
        };

        let created = self.store.get_or_insert(set).await?;
        tracing::info!(set_id = %created.id, %variant, %voice, "created audio set");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AudioSetManager {
        AudioSetManager::new(Arc::new(MemorySetStore::new()))
    }

    #[tokio::test]
    async fn test_get_or_create_is_unique_per_triple() {
        let manager = manager();
        let a = manager
            .get_or_create("owner", "entity", Variant::Sleep, VoiceId::Alloy, None)
            .await
            .unwrap();
        let b = manager
            .get_or_create("owner", "entity", Variant::Sleep, VoiceId::Alloy, None)
            .await
            .unwrap();
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_same_variant_different_voice_gets_own_set() {
        let manager = manager();
        let alloy = manager
            .get_or_create("owner", "entity", Variant::Sleep, VoiceId::Alloy, None)
            .await
            .unwrap();
        let nova = manager
            .get_or_create("owner", "entity", Variant::Sleep, VoiceId::Nova, None)
            .await
            .unwrap();
        assert_ne!(alloy.id, nova.id);
    }

    #[tokio::test]
    async fn test_new_set_carries_variant_defaults() {
        let manager = manager();
        let set = manager
            .get_or_create("owner", "entity", Variant::Sleep, VoiceId::Alloy, None)
            .await
            .unwrap();
        assert_eq!(set.name, "Sleep Version");
        assert_eq!(set.description, "10% voice, 90% background");
        assert_eq!(set.voice_volume, 10);
        assert_eq!(set.bg_volume, 90);
    }

    #[tokio::test]
    async fn test_explicit_name_is_kept() {
        let manager = manager();
        let set = manager
            .get_or_create(
                "owner",
                "entity",
                Variant::Standard,
                VoiceId::Alloy,
                Some("Morning Narration".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(set.name, "Morning Narration");
    }
}
