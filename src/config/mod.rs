//! Configuration module for the Resona server
//!
//! Configuration comes from environment variables (with `.env` support via
//! dotenvy). Defaults cover local development; the S3 settings are validated
//! as a group so a partially configured bucket fails at startup instead of
//! at the first upload.

mod env;
mod validation;

/// Server configuration
///
/// Contains everything needed to run the narration server:
/// - Server settings (host, port)
/// - Synthesis provider settings (API key, per-chunk timeout, chunk size)
/// - Object storage (S3) and the public media URL in front of it
/// - Mixing worker settings (endpoint, queue depth, global background asset)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Synthesis provider
    pub openai_api_key: String,
    pub synthesis_timeout_seconds: u64,
    pub max_chunk_chars: usize,

    // Object storage (all-or-none; an in-memory store is used when absent)
    pub storage_s3_bucket: Option<String>,
    pub storage_s3_region: Option<String>,
    pub storage_s3_endpoint: Option<String>,
    pub storage_s3_access_key: Option<String>,
    pub storage_s3_secret_key: Option<String>,
    /// Public URL prefix (CDN) objects are served from.
    pub public_media_url: Option<String>,

    // Mixing worker
    pub mix_worker_url: Option<String>,
    pub mix_queue_depth: usize,
    pub mix_timeout_seconds: u64,
    /// Global default background asset, the last stop of the fallback chain.
    pub default_background_url: String,
}

impl ServerConfig {
    /// Get the server address as a string in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether durable S3 storage is configured.
    pub fn has_s3_storage(&self) -> bool {
        self.storage_s3_bucket.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ServerConfig {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3001,
            openai_api_key: "key".to_string(),
            synthesis_timeout_seconds: 45,
            max_chunk_chars: 3000,
            storage_s3_bucket: None,
            storage_s3_region: None,
            storage_s3_endpoint: None,
            storage_s3_access_key: None,
            storage_s3_secret_key: None,
            public_media_url: None,
            mix_worker_url: None,
            mix_queue_depth: 64,
            mix_timeout_seconds: 30,
            default_background_url: "https://media.test/bg.mp3".to_string(),
        }
    }

    #[test]
    fn test_address() {
        let config = base_config();
        assert_eq!(config.address(), "0.0.0.0:3001");
    }

    #[test]
    fn test_has_s3_storage() {
        let mut config = base_config();
        assert!(!config.has_s3_storage());
        config.storage_s3_bucket = Some("bucket".to_string());
        assert!(config.has_s3_storage());
    }
}
