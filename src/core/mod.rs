pub mod batch;
pub mod generate;
pub mod metering;
pub mod mix;
pub mod sets;
pub mod storage;
pub mod store;
pub mod text;
pub mod tracks;
pub mod tts;
pub mod variant;
pub mod voices;

// Re-export commonly used types for convenience
pub use batch::{BatchProgressTracker, BatchStatus, BatchStore, GenerationBatch, MemoryBatchStore};
pub use generate::{
    EntityStamp, GenerationError, GenerationOrchestrator, GenerationRequest, Outcome,
    ReferenceSample, SectionInput, SectionResult, TracingStamp,
};
pub use metering::{RecordingMeter, TracingMeter, UsageEvent, UsageMeter};
pub use mix::{HttpMixInvoker, MixDispatcher, MixError, MixInvoker, MixJob, spawn_mix_worker};
pub use sets::{AudioSet, AudioSetManager, MemorySetStore, SetStore};
pub use storage::{AudioStorage, ObjectStorageClient, StorageError};
pub use store::StoreError;
pub use text::{chunk_text, content_hash, normalize_text};
pub use tracks::{AudioTrack, MemoryTrackStore, MixStatus, TrackStatus, TrackStore};
pub use tts::{AudioFormat, OpenAiSynthesizer, SpeechSynthesizer, SynthesisError};
pub use variant::Variant;
pub use voices::{REFERENCE_TEXT, VoiceId, VoiceInfo, voice_catalog};
