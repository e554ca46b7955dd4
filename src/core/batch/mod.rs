//! Generation batches and their progress counters.
//!
//! A batch spans the sections of one generation request and exists so
//! collaborators can poll progress. Counter updates are idempotent
//! overwrites recomputed from the per-section results, never increments, so
//! the tracker can be called repeatedly after every section. Failures inside
//! the tracker are logged and swallowed: progress reporting must never abort
//! section processing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::core::store::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    PartialSuccess,
    Completed,
    Failed,
}

impl BatchStatus {
    /// Terminal status for `completed` successes and `failed` failures out
    /// of `total` sections.
    pub fn terminal(completed: usize, failed: usize, total: usize) -> Self {
        if failed == total {
            BatchStatus::Failed
        } else if completed == total {
            BatchStatus::Completed
        } else if completed > 0 {
            BatchStatus::PartialSuccess
        } else {
            BatchStatus::Failed
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationBatch {
    pub id: Uuid,
    pub owner_id: String,
    pub total_sections: usize,
    pub tracks_completed: usize,
    pub tracks_failed: usize,
    pub tracks_pending: usize,
    pub audio_set_ids: Vec<Uuid>,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Persistence seam for batches.
#[async_trait]
pub trait BatchStore: Send + Sync {
    async fn create(&self, owner_id: &str, total_sections: usize) -> StoreResult<GenerationBatch>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<GenerationBatch>>;

    /// Overwrite progress counters.
    async fn update_counters(
        &self,
        id: Uuid,
        completed: usize,
        failed: usize,
        pending: usize,
    ) -> StoreResult<()>;

    /// Record an audio set this batch generated into.
    async fn attach_set(&self, id: Uuid, set_id: Uuid) -> StoreResult<()>;

    /// Set the terminal status and stamp completion.
    async fn finalize(
        &self,
        id: Uuid,
        status: BatchStatus,
        completed: usize,
        failed: usize,
    ) -> StoreResult<()>;
}

#[derive(Default)]
pub struct MemoryBatchStore {
    rows: RwLock<HashMap<Uuid, GenerationBatch>>,
}

impl MemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BatchStore for MemoryBatchStore {
    async fn create(&self, owner_id: &str, total_sections: usize) -> StoreResult<GenerationBatch> {
        let batch = GenerationBatch {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            total_sections,
            tracks_completed: 0,
            tracks_failed: 0,
            tracks_pending: total_sections,
            audio_set_ids: Vec::new(),
            status: BatchStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.rows.write().insert(batch.id, batch.clone());
        Ok(batch)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<GenerationBatch>> {
        Ok(self.rows.read().get(&id).cloned())
    }

    async fn update_counters(
        &self,
        id: Uuid,
        completed: usize,
        failed: usize,
        pending: usize,
    ) -> StoreResult<()> {
        let mut rows = self.rows.write();
        let batch = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("batch {id}")))?;
        batch.tracks_completed = completed;
        batch.tracks_failed = failed;
        batch.tracks_pending = pending;
        Ok(())
    }

    async fn attach_set(&self, id: Uuid, set_id: Uuid) -> StoreResult<()> {
        let mut rows = self.rows.write();
        let batch = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("batch {id}")))?;
        if !batch.audio_set_ids.contains(&set_id) {
            batch.audio_set_ids.push(set_id);
        }
        Ok(())
    }

    async fn finalize(
        &self,
        id: Uuid,
        status: BatchStatus,
        completed: usize,
        failed: usize,
    ) -> StoreResult<()> {
        let mut rows = self.rows.write();
        let batch = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("batch {id}")))?;
        batch.status = status;
        batch.tracks_completed = completed;
        batch.tracks_failed = failed;
        batch.tracks_pending = 0;
        batch.completed_at = Some(Utc::now());
        Ok(())
    }
}

/// Progress front over the batch store. All errors are logged and swallowed.
#[derive(Clone)]
pub struct BatchProgressTracker {
    store: Arc<dyn BatchStore>,
}

impl BatchProgressTracker {
    pub fn new(store: Arc<dyn BatchStore>) -> Self {
        Self { store }
    }

    /// Overwrite counters from the per-section results seen so far.
    pub async fn update(&self, batch_id: Uuid, completed: usize, failed: usize, total: usize) {
        let pending = total.saturating_sub(completed + failed);
        if let Err(e) = self
            .store
            .update_counters(batch_id, completed, failed, pending)
            .await
        {
            warn!(%batch_id, error = %e, "failed to update batch progress");
        }
    }

    pub async fn attach_set(&self, batch_id: Uuid, set_id: Uuid) {
        if let Err(e) = self.store.attach_set(batch_id, set_id).await {
            warn!(%batch_id, %set_id, error = %e, "failed to attach audio set to batch");
        }
    }

    /// Set the terminal status once every section has resolved.
    pub async fn finalize(&self, batch_id: Uuid, completed: usize, failed: usize, total: usize) {
        let status = BatchStatus::terminal(completed, failed, total);
        if let Err(e) = self.store.finalize(batch_id, status, completed, failed).await {
            warn!(%batch_id, error = %e, "failed to finalize batch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_status() {
        assert_eq!(BatchStatus::terminal(3, 0, 3), BatchStatus::Completed);
        assert_eq!(BatchStatus::terminal(0, 3, 3), BatchStatus::Failed);
        assert_eq!(BatchStatus::terminal(2, 1, 3), BatchStatus::PartialSuccess);
        assert_eq!(BatchStatus::terminal(0, 0, 3), BatchStatus::Failed);
    }

    #[tokio::test]
    async fn test_update_is_idempotent_overwrite() {
        let store = Arc::new(MemoryBatchStore::new());
        let tracker = BatchProgressTracker::new(store.clone());
        let batch = store.create("owner", 4).await.unwrap();

        tracker.update(batch.id, 1, 0, 4).await;
        tracker.update(batch.id, 1, 0, 4).await;
        tracker.update(batch.id, 2, 1, 4).await;

        let row = store.get(batch.id).await.unwrap().unwrap();
        assert_eq!(row.tracks_completed, 2);
        assert_eq!(row.tracks_failed, 1);
        assert_eq!(row.tracks_pending, 1);
    }

    #[tokio::test]
    async fn test_finalize_zeros_pending_and_stamps() {
        let store = Arc::new(MemoryBatchStore::new());
        let tracker = BatchProgressTracker::new(store.clone());
        let batch = store.create("owner", 2).await.unwrap();

        tracker.finalize(batch.id, 1, 1, 2).await;

        let row = store.get(batch.id).await.unwrap().unwrap();
        assert_eq!(row.status, BatchStatus::PartialSuccess);
        assert_eq!(row.tracks_pending, 0);
        assert!(row.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_tracker_swallows_unknown_batch() {
        let tracker = BatchProgressTracker::new(Arc::new(MemoryBatchStore::new()));
        // Must not panic or propagate.
        tracker.update(Uuid::new_v4(), 1, 0, 1).await;
        tracker.finalize(Uuid::new_v4(), 1, 0, 1).await;
    }
}
