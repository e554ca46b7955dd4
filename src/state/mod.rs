//! Application state: explicitly constructed, injected collaborators.

use object_store::{ObjectStore, aws::AmazonS3Builder, memory::InMemory};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::core::batch::{BatchProgressTracker, BatchStore, MemoryBatchStore};
use crate::core::generate::{GenerationOrchestrator, TracingStamp};
use crate::core::metering::TracingMeter;
use crate::core::mix::{HttpMixInvoker, MixDispatcher, MixError, MixInvoker, MixJob, spawn_mix_worker};
use crate::core::sets::{AudioSetManager, MemorySetStore};
use crate::core::storage::ObjectStorageClient;
use crate::core::tracks::{MemoryTrackStore, TrackStore};
use crate::core::tts::OpenAiSynthesizer;

/// Application state that can be shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    pub orchestrator: GenerationOrchestrator,
    pub tracks: Arc<dyn TrackStore>,
    pub batches: Arc<dyn BatchStore>,
}

/// Stand-in invoker used when no mix worker endpoint is configured; jobs are
/// logged and dropped so development setups still exercise the queue.
struct LoggingInvoker;

#[async_trait::async_trait]
impl MixInvoker for LoggingInvoker {
    async fn invoke(&self, job: &MixJob) -> Result<(), MixError> {
        tracing::warn!(
            track_id = %job.track_id,
            "no mix worker configured, job dropped"
        );
        Ok(())
    }
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        // Object storage: S3 when fully configured, in-memory otherwise.
        let (store, public_base_url): (Arc<dyn ObjectStore>, String) = if let (
            Some(bucket),
            Some(region),
            Some(access_key),
            Some(secret_key),
            Some(public_media_url),
        ) = (
            &config.storage_s3_bucket,
            &config.storage_s3_region,
            &config.storage_s3_access_key,
            &config.storage_s3_secret_key,
            &config.public_media_url,
        ) {
            let mut builder = AmazonS3Builder::new()
                .with_bucket_name(bucket)
                .with_region(region)
                .with_access_key_id(access_key)
                .with_secret_access_key(secret_key);
            if let Some(endpoint) = &config.storage_s3_endpoint {
                builder = builder.with_endpoint(endpoint);
            }
            (Arc::new(builder.build()?), public_media_url.clone())
        } else {
            tracing::warn!("S3 storage not configured, using in-memory object store");
            (
                Arc::new(InMemory::new()),
                format!("http://{}/media", config.address()),
            )
        };

        let storage = Arc::new(ObjectStorageClient::new(store, public_base_url));

        let meter = Arc::new(TracingMeter);
        let synthesizer = Arc::new(
            OpenAiSynthesizer::new(
                config.openai_api_key.clone(),
                Duration::from_secs(config.synthesis_timeout_seconds),
                meter,
            )
            .map_err(|e| e.to_string())?,
        );

        let tracks: Arc<dyn TrackStore> = Arc::new(MemoryTrackStore::new());
        let sets = AudioSetManager::new(Arc::new(MemorySetStore::new()));
        let batches: Arc<dyn BatchStore> = Arc::new(MemoryBatchStore::new());

        let (dispatcher, rx) =
            MixDispatcher::new(config.mix_queue_depth, config.default_background_url.clone());
        let invoker: Arc<dyn MixInvoker> = match &config.mix_worker_url {
            Some(url) => Arc::new(HttpMixInvoker::new(
                url.clone(),
                Duration::from_secs(config.mix_timeout_seconds),
            )),
            None => Arc::new(LoggingInvoker),
        };
        let _worker = spawn_mix_worker(rx, invoker);

        let orchestrator = GenerationOrchestrator::new(
            synthesizer,
            storage,
            tracks.clone(),
            sets,
            BatchProgressTracker::new(batches.clone()),
            dispatcher,
            Arc::new(TracingStamp),
        )
        .with_max_chunk_chars(config.max_chunk_chars);

        Ok(Arc::new(Self {
            config,
            orchestrator,
            tracks,
            batches,
        }))
    }
}
