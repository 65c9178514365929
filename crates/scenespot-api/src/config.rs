//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use scenespot_ml_client::PollPolicy;
use scenespot_models::CacheKeyPolicy;
use tracing::warn;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size (uploads included)
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Directory holding one JSON index per video
    pub artifact_dir: PathBuf,
    /// Directory for in-flight upload files
    pub upload_temp_dir: PathBuf,
    /// Delay between analysis state checks
    pub poll_interval: Duration,
    /// Give up on an upload that is still processing after this long
    pub analysis_timeout: Duration,
    /// How uploads map to cache keys
    pub cache_key_policy: CacheKeyPolicy,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024 * 1024, // 1GB
            environment: "development".to_string(),
            artifact_dir: PathBuf::from("indices"),
            upload_temp_dir: std::env::temp_dir(),
            poll_interval: Duration::from_secs(1),
            analysis_timeout: Duration::from_secs(600),
            cache_key_policy: CacheKeyPolicy::Filename,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            artifact_dir: std::env::var("ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
            upload_temp_dir: std::env::var("UPLOAD_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_temp_dir),
            poll_interval: std::env::var("ANALYSIS_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            analysis_timeout: std::env::var("ANALYSIS_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.analysis_timeout),
            cache_key_policy: std::env::var("CACHE_KEY_POLICY")
                .ok()
                .and_then(|s| match s.parse() {
                    Ok(policy) => Some(policy),
                    Err(e) => {
                        warn!("Ignoring CACHE_KEY_POLICY: {}", e);
                        None
                    }
                })
                .unwrap_or(defaults.cache_key_policy),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Polling behavior for uploaded videos.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(self.poll_interval, self.analysis_timeout)
    }
}

/// Shorten a secret for logging: the first five characters, then an ellipsis.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(5).collect();
    format!("{}...", prefix)
}
