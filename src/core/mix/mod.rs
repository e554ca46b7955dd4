//! Asynchronous mix dispatch.
//!
//! Mixing is a message-passing boundary: completed voice tracks of mix
//! variants are enqueued as explicit `MixJob`s and consumed by a worker task
//! that invokes the external mixing worker fire-and-forget. The orchestrator
//! never blocks on mixing completion; the worker updates mix status out of
//! band. Enqueue and invocation failures are logged, never raised into
//! section processing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::sets::AudioSet;

#[derive(Debug, Clone, thiserror::Error)]
pub enum MixError {
    #[error("mix worker request failed: {status} {message}")]
    Worker { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),
}

/// One outbound request to blend a voice track with a background asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixJob {
    pub track_id: Uuid,
    pub voice_url: String,
    pub background_url: String,
    pub output_key: String,
    /// Narration volume, 0-100.
    pub voice_volume: u8,
    /// Background volume, 0-100.
    pub bg_volume: u8,
}

/// Invocation seam to the external mixing worker.
#[async_trait]
pub trait MixInvoker: Send + Sync {
    async fn invoke(&self, job: &MixJob) -> Result<(), MixError>;
}

/// POSTs jobs to the external worker's HTTP endpoint.
pub struct HttpMixInvoker {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpMixInvoker {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MixInvoker for HttpMixInvoker {
    async fn invoke(&self, job: &MixJob) -> Result<(), MixError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(job)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| MixError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MixError::Worker {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

/// Resolves mix parameters and enqueues jobs for the worker task.
#[derive(Clone)]
pub struct MixDispatcher {
    tx: mpsc::Sender<MixJob>,
    default_background_url: String,
}

impl MixDispatcher {
    /// Build a dispatcher and the receiving end for its worker.
    pub fn new(
        queue_depth: usize,
        default_background_url: impl Into<String>,
    ) -> (Self, mpsc::Receiver<MixJob>) {
        let (tx, rx) = mpsc::channel(queue_depth);
        (
            Self {
                tx,
                default_background_url: default_background_url.into(),
            },
            rx,
        )
    }

    /// Resolve (background URL, voice volume, bg volume) for a set.
    ///
    /// Fallback chain: set-specific background override, then the variant's
    /// static profile, then the single global default asset. Volumes come
    /// from the set row, which was seeded from the variant profile at
    /// creation and may have been tuned since.
    pub fn resolve_parameters(&self, set: &AudioSet) -> (String, u8, u8) {
        let profile = set.variant.mix_profile();
        let background = set
            .background_track
            .clone()
            .or_else(|| profile.background.map(str::to_string))
            .unwrap_or_else(|| self.default_background_url.clone());
        (background, set.voice_volume, set.bg_volume)
    }

    /// Enqueue a job for the worker. Failures are logged and swallowed; a
    /// full or closed queue never fails the section that produced the job.
    pub async fn dispatch(&self, job: MixJob) {
        let track_id = job.track_id;
        match self.tx.try_send(job) {
            Ok(()) => {
                info!(%track_id, "mix job enqueued");
            }
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(%track_id, "mix queue full, awaiting capacity");
                if self.tx.send(job).await.is_err() {
                    error!(%track_id, "mix queue closed, job dropped");
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(%track_id, "mix queue closed, job dropped");
            }
        }
    }
}

/// Spawn the worker that drains the queue and invokes the external mixer.
///
/// Invocation is fire-and-forget: a failed invocation is logged with the job
/// fields and the worker moves on. The track keeps mix_status=pending until
/// the external worker reports back out of band.
pub fn spawn_mix_worker(
    mut rx: mpsc::Receiver<MixJob>,
    invoker: Arc<dyn MixInvoker>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            match invoker.invoke(&job).await {
                Ok(()) => {
                    info!(
                        track_id = %job.track_id,
                        output_key = %job.output_key,
                        voice_volume = job.voice_volume,
                        bg_volume = job.bg_volume,
                        "mix job handed to worker"
                    );
                }
                Err(e) => {
                    error!(
                        track_id = %job.track_id,
                        voice_url = %job.voice_url,
                        background_url = %job.background_url,
                        error = %e,
                        "mix invocation failed"
                    );
                }
            }
        }
        info!("mix worker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::variant::Variant;
    use crate::core::voices::VoiceId;
    use chrono::Utc;
    use parking_lot::Mutex;

    fn sleep_set() -> AudioSet {
        AudioSet {
            id: Uuid::new_v4(),
            owner_id: "owner".to_string(),
            entity_id: "entity".to_string(),
            variant: Variant::Sleep,
            voice: VoiceId::Alloy,
            name: "Sleep Version".to_string(),
            description: "10% voice, 90% background".to_string(),
            voice_volume: 10,
            bg_volume: 90,
            background_track: None,
            created_at: Utc::now(),
        }
    }

    fn job(track_id: Uuid) -> MixJob {
        MixJob {
            track_id,
            voice_url: "https://m/voice.mp3".to_string(),
            background_url: "https://m/bg.mp3".to_string(),
            output_key: "narration/o/e/intro-mixed.mp3".to_string(),
            voice_volume: 10,
            bg_volume: 90,
        }
    }

    struct RecordingInvoker {
        jobs: Mutex<Vec<MixJob>>,
    }

    #[async_trait]
    impl MixInvoker for RecordingInvoker {
        async fn invoke(&self, job: &MixJob) -> Result<(), MixError> {
            self.jobs.lock().push(job.clone());
            Ok(())
        }
    }

    #[test]
    fn test_resolve_uses_set_override_first() {
        let (dispatcher, _rx) = MixDispatcher::new(8, "https://m/global-default.mp3");
        let mut set = sleep_set();
        set.background_track = Some("https://m/custom.mp3".to_string());

        let (bg, voice_vol, bg_vol) = dispatcher.resolve_parameters(&set);
        assert_eq!(bg, "https://m/custom.mp3");
        assert_eq!((voice_vol, bg_vol), (10, 90));
    }

    #[test]
    fn test_resolve_falls_back_to_variant_profile() {
        let (dispatcher, _rx) = MixDispatcher::new(8, "https://m/global-default.mp3");
        let set = sleep_set();

        let (bg, _, _) = dispatcher.resolve_parameters(&set);
        assert_eq!(bg, Variant::Sleep.mix_profile().background.unwrap());
    }

    #[test]
    fn test_resolve_global_default_when_profile_has_none() {
        let (dispatcher, _rx) = MixDispatcher::new(8, "https://m/global-default.mp3");
        let mut set = sleep_set();
        // Standard has no profile background; a set row forced onto it must
        // still resolve somewhere.
        set.variant = Variant::Standard;

        let (bg, _, _) = dispatcher.resolve_parameters(&set);
        assert_eq!(bg, "https://m/global-default.mp3");
    }

    #[tokio::test]
    async fn test_dispatch_reaches_worker() {
        let (dispatcher, rx) = MixDispatcher::new(8, "https://m/default.mp3");
        let invoker = Arc::new(RecordingInvoker {
            jobs: Mutex::new(Vec::new()),
        });
        let handle = spawn_mix_worker(rx, invoker.clone());

        let track_id = Uuid::new_v4();
        dispatcher.dispatch(job(track_id)).await;

        // Drop the dispatcher so the worker drains and exits.
        drop(dispatcher);
        handle.await.unwrap();

        let jobs = invoker.jobs.lock();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].track_id, track_id);
    }

    #[tokio::test]
    async fn test_dispatch_on_closed_queue_does_not_panic() {
        let (dispatcher, rx) = MixDispatcher::new(1, "https://m/default.mp3");
        drop(rx);
        dispatcher.dispatch(job(Uuid::new_v4())).await;
    }
}
