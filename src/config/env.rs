use std::env;

use super::ServerConfig;
use super::validation::validate_storage;

/// Global default background asset used when neither the audio set nor the
/// variant profile names one.
const DEFAULT_BACKGROUND_URL: &str =
    "https://media.resona.audio/site-assets/audio/mixing-tracks/ocean-waves-1.mp3";

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables with sensible
    /// defaults. Also loads from a `.env` file if present using dotenvy.
    ///
    /// # Errors
    /// Returns an error if:
    /// - `OPENAI_API_KEY` is missing
    /// - Numeric variables are malformed
    /// - The S3 storage settings are only partially configured
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        // Server configuration
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid port number: {e}"))?;

        // Synthesis provider
        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| "OPENAI_API_KEY is required".to_string())?;
        let synthesis_timeout_seconds = env::var("SYNTHESIS_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(45);
        let max_chunk_chars = env::var("MAX_CHUNK_CHARS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(crate::core::text::DEFAULT_MAX_CHUNK_CHARS);

        // Object storage configuration
        let storage_s3_bucket = env::var("STORAGE_S3_BUCKET").ok();
        let storage_s3_region = env::var("STORAGE_S3_REGION").ok();
        let storage_s3_endpoint = env::var("STORAGE_S3_ENDPOINT").ok();
        let storage_s3_access_key = env::var("STORAGE_S3_ACCESS_KEY").ok();
        let storage_s3_secret_key = env::var("STORAGE_S3_SECRET_KEY").ok();
        let public_media_url = env::var("PUBLIC_MEDIA_URL").ok();

        // Mixing worker configuration
        let mix_worker_url = env::var("MIX_WORKER_URL").ok();
        let mix_queue_depth = env::var("MIX_QUEUE_DEPTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(64);
        let mix_timeout_seconds = env::var("MIX_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);
        let default_background_url = env::var("DEFAULT_BACKGROUND_URL")
            .unwrap_or_else(|_| DEFAULT_BACKGROUND_URL.to_string());

        validate_storage(
            &storage_s3_bucket,
            &storage_s3_region,
            &storage_s3_access_key,
            &storage_s3_secret_key,
            &public_media_url,
        )?;

        Ok(Self {
            host,
            port,
            openai_api_key,
            synthesis_timeout_seconds,
            max_chunk_chars,
            storage_s3_bucket,
            storage_s3_region,
            storage_s3_endpoint,
            storage_s3_access_key,
            storage_s3_secret_key,
            public_media_url,
            mix_worker_url,
            mix_queue_depth,
            mix_timeout_seconds,
            default_background_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const S3_VARS: [&str; 6] = [
        "STORAGE_S3_BUCKET",
        "STORAGE_S3_REGION",
        "STORAGE_S3_ENDPOINT",
        "STORAGE_S3_ACCESS_KEY",
        "STORAGE_S3_SECRET_KEY",
        "PUBLIC_MEDIA_URL",
    ];

    fn clear_env() {
        for var in S3_VARS {
            unsafe { env::remove_var(var) };
        }
        unsafe {
            env::remove_var("PORT");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("SYNTHESIS_TIMEOUT_SECONDS");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_requires_api_key() {
        clear_env();
        assert!(ServerConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        unsafe { env::set_var("OPENAI_API_KEY", "test-key") };

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.synthesis_timeout_seconds, 45);
        assert_eq!(config.max_chunk_chars, 3000);
        assert_eq!(config.mix_queue_depth, 64);
        assert!(!config.has_s3_storage());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_partial_s3() {
        clear_env();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-key");
            env::set_var("STORAGE_S3_BUCKET", "bucket");
        }

        assert!(ServerConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        clear_env();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-key");
            env::set_var("PORT", "not-a-port");
        }

        assert!(ServerConfig::from_env().is_err());

        clear_env();
    }
}
