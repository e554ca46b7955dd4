//! Durable blob storage for synthesized audio.
//!
//! Uploads go through the `AudioStorage` seam so tests can run against an
//! in-memory store. Track keys embed a base36 generation timestamp, which
//! makes duplicate writes harmless (at-least-once safe); reference-sample
//! keys are fixed per voice so the existence check can short-circuit
//! regeneration of idempotent assets.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{
    Attribute, Attributes, Error as ObjectStoreError, ObjectStore, PutOptions, PutPayload,
    path::Path as ObjectPath,
};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::core::tts::AudioFormat;
use crate::core::voices::VoiceId;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<ObjectStoreError> for StorageError {
    fn from(err: ObjectStoreError) -> Self {
        StorageError::Backend(err.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Blob storage seam used by the generation pipeline.
#[async_trait]
pub trait AudioStorage: Send + Sync {
    /// Upload bytes under `key` and return the stable public URL.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> StorageResult<String>;

    /// Whether an object already exists under `key`.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Public URL an object under `key` is served from.
    fn url_for(&self, key: &str) -> String;
}

/// `AudioStorage` over any `object_store` backend plus a public URL prefix
/// (typically a CDN in front of the bucket).
pub struct ObjectStorageClient {
    store: Arc<dyn ObjectStore>,
    public_base_url: String,
}

impl ObjectStorageClient {
    pub fn new(store: Arc<dyn ObjectStore>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into();
        Self {
            store,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AudioStorage for ObjectStorageClient {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> StorageResult<String> {
        let path = ObjectPath::parse(key).map_err(|e| StorageError::InvalidKey(e.to_string()))?;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        debug!(key, size = bytes.len(), content_type, "uploading audio object");

        self.store
            .put_opts(&path, PutPayload::from(bytes), opts)
            .await?;

        Ok(self.url_for(key))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = ObjectPath::parse(key).map_err(|e| StorageError::InvalidKey(e.to_string()))?;
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

/// Storage key for a generated narration track.
///
/// The base36 timestamp suffix keeps repeated generations of the same
/// content from overwriting each other mid-read.
pub fn track_key(
    owner_id: &str,
    entity_id: &str,
    section_key: &str,
    content_hash: &str,
    format: AudioFormat,
) -> String {
    let hash_prefix = &content_hash[..content_hash.len().min(12)];
    let ts = base36(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    );
    format!(
        "narration/{owner_id}/{entity_id}/{section_key}-{hash_prefix}-{ts}.{}",
        format.extension()
    )
}

/// Fixed storage key for a per-voice reference sample.
pub fn reference_key(voice: VoiceId, format: AudioFormat) -> String {
    format!("voice-reference/{voice}.{}", format.extension())
}

/// Output key the mixing worker writes to: the voice key with a `-mixed`
/// suffix before the extension.
pub fn mixed_output_key(voice_key: &str) -> String {
    match voice_key.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}-mixed.{ext}"),
        None => format!("{voice_key}-mixed"),
    }
}

fn base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    out.into_iter().rev().collect()
}
