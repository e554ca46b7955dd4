//! Base trait for speech synthesis providers.
//!
//! A synthesizer converts one bounded-length text chunk into audio bytes.
//! Chunking, caching and storage live above this seam, which keeps provider
//! implementations small and lets tests substitute fakes.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::core::voices::VoiceId;

/// Output encoding requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// Compressed output.
    Mp3,
    /// Lossless output.
    Wav,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        AudioFormat::Mp3
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "wav" => Ok(AudioFormat::Wav),
            other => Err(format!("unknown audio format: {other}")),
        }
    }
}

/// Synthesis error taxonomy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SynthesisError {
    /// The provider answered with a non-success status.
    #[error("provider request failed: {status} {message}")]
    Provider { status: u16, message: String },

    /// The request exceeded the configured per-chunk timeout.
    #[error("synthesis timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// A text-to-speech provider.
///
/// Implementations must report usage to their metering collaborator on every
/// successful call; that side effect is part of the contract, not an
/// optimization.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one bounded-length chunk of text.
    async fn synthesize(
        &self,
        text: &str,
        voice: VoiceId,
        format: AudioFormat,
    ) -> SynthesisResult<Bytes>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_content_types() {
        assert_eq!(AudioFormat::Mp3.content_type(), "audio/mpeg");
        assert_eq!(AudioFormat::Wav.content_type(), "audio/wav");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("MP3".parse::<AudioFormat>().unwrap(), AudioFormat::Mp3);
        assert_eq!("wav".parse::<AudioFormat>().unwrap(), AudioFormat::Wav);
        assert!("flac".parse::<AudioFormat>().is_err());
    }
}
