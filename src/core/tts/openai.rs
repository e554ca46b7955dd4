//! OpenAI speech synthesis provider.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::base::{AudioFormat, SpeechSynthesizer, SynthesisError, SynthesisResult};
use crate::core::metering::{UsageEvent, UsageMeter};
use crate::core::voices::VoiceId;

pub const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

const DEFAULT_MODEL: &str = "tts-1";

/// HTTP synthesizer backed by the OpenAI speech endpoint.
///
/// Each call carries an explicit timeout; a timed-out chunk is a synthesis
/// failure scoped to its section, never a request-level abort.
pub struct OpenAiSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
    meter: Arc<dyn UsageMeter>,
}

impl OpenAiSynthesizer {
    pub fn new(
        api_key: impl Into<String>,
        timeout: Duration,
        meter: Arc<dyn UsageMeter>,
    ) -> SynthesisResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(SynthesisError::InvalidConfiguration(
                "OpenAI API key is required".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: OPENAI_SPEECH_URL.to_string(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            timeout,
            meter,
        })
    }

    /// Point the synthesizer at a different endpoint. Used by tests and
    /// self-hosted gateways.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: VoiceId,
        format: AudioFormat,
    ) -> SynthesisResult<Bytes> {
        let body = json!({
            "model": self.model,
            "voice": voice.as_str(),
            "input": text,
            "format": format.as_str(),
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout(self.timeout)
                } else {
                    SynthesisError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let audio = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                SynthesisError::Timeout(self.timeout)
            } else {
                SynthesisError::Network(e.to_string())
            }
        })?;

        // Usage is metered on every successful call, before the caller sees
        // the bytes.
        self.meter
            .record(UsageEvent::new(
                "openai",
                voice.to_string(),
                text.chars().count(),
            ))
            .await;

        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metering::RecordingMeter;

    #[test]
    fn test_rejects_empty_api_key() {
        let meter = Arc::new(RecordingMeter::new());
        let result = OpenAiSynthesizer::new("", Duration::from_secs(45), meter);
        assert!(matches!(
            result,
            Err(SynthesisError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_endpoint_override() {
        let meter = Arc::new(RecordingMeter::new());
        let synth = OpenAiSynthesizer::new("key", Duration::from_secs(45), meter)
            .unwrap()
            .with_endpoint("http://localhost:9000/v1/audio/speech");
        assert_eq!(synth.endpoint, "http://localhost:9000/v1/audio/speech");
    }
}
