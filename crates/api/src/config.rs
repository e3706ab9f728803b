use std::time::Duration;

use resonant_blobstore::BlobConfig;
use resonant_core::onboarding::DEFAULT_MAX_SAMPLE_BYTES;

use crate::auth::identity::IdentityConfig;
use crate::services::onboarding::RegistryLimits;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long in-flight requests may drain after a shutdown signal (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Bound on every database query and outbound HTTP call (default: `10`).
    /// Must stay below half of `request_timeout_secs`.
    pub external_call_timeout_secs: u64,
    /// bcrypt cost used for new password hashes (default: `12`).
    pub password_hash_cost: u32,
    /// Largest accepted voice sample in bytes (default: 10 MiB).
    pub max_sample_bytes: usize,
    /// Lifetime of a voice-talent application, finished or not (default: `86400`).
    pub application_ttl_secs: u64,
    /// Applications one identity may hold at once (default: `3`).
    pub max_open_applications: usize,
    /// Simulated generation latency of the speech demo (default: `3000`).
    pub speech_demo_delay_ms: u64,
    /// Audio clip returned by every speech demo generation.
    pub speech_demo_audio_url: String,
    /// Identity provider verification settings.
    pub identity: IdentityConfig,
    /// Blob publisher endpoint used for voice samples.
    pub blob: BlobConfig,
}

/// Served by the frontend's static assets.
const DEFAULT_SPEECH_DEMO_AUDIO_URL: &str = "/audio/demo/sarah-sample.mp3";

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                        |
    /// |------------------------------|--------------------------------|
    /// | `HOST`                       | `0.0.0.0`                      |
    /// | `PORT`                       | `3000`                         |
    /// | `CORS_ORIGINS`               | `http://localhost:5173`        |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                           |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `30`                           |
    /// | `EXTERNAL_CALL_TIMEOUT_SECS` | `10`                           |
    /// | `PASSWORD_HASH_COST`         | `12`                           |
    /// | `MAX_SAMPLE_BYTES`           | `10485760`                     |
    /// | `APPLICATION_TTL_SECS`       | `86400`                        |
    /// | `MAX_OPEN_APPLICATIONS`      | `3`                            |
    /// | `SPEECH_DEMO_DELAY_MS`       | `3000`                         |
    /// | `SPEECH_DEMO_AUDIO_URL`      | `/audio/demo/sarah-sample.mp3` |
    ///
    /// See [`IdentityConfig::from_env`] and [`BlobConfig::from_env`] for the
    /// nested sections.
    ///
    /// Panics when the timeouts violate [`ServerConfig::check_timeouts`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let external_call_timeout_secs: u64 = std::env::var("EXTERNAL_CALL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("EXTERNAL_CALL_TIMEOUT_SECS must be a valid u64");

        let password_hash_cost: u32 = std::env::var("PASSWORD_HASH_COST")
            .unwrap_or_else(|_| "12".into())
            .parse()
            .expect("PASSWORD_HASH_COST must be a valid u32");

        let max_sample_bytes: usize = std::env::var("MAX_SAMPLE_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_SAMPLE_BYTES.to_string())
            .parse()
            .expect("MAX_SAMPLE_BYTES must be a valid usize");

        let application_ttl_secs: u64 = std::env::var("APPLICATION_TTL_SECS")
            .unwrap_or_else(|_| "86400".into())
            .parse()
            .expect("APPLICATION_TTL_SECS must be a valid u64");

        let max_open_applications: usize = std::env::var("MAX_OPEN_APPLICATIONS")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("MAX_OPEN_APPLICATIONS must be a valid usize");

        let speech_demo_delay_ms: u64 = std::env::var("SPEECH_DEMO_DELAY_MS")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("SPEECH_DEMO_DELAY_MS must be a valid u64");

        let speech_demo_audio_url = std::env::var("SPEECH_DEMO_AUDIO_URL")
            .unwrap_or_else(|_| DEFAULT_SPEECH_DEMO_AUDIO_URL.into());

        let config = Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            external_call_timeout_secs,
            password_hash_cost,
            max_sample_bytes,
            application_ttl_secs,
            max_open_applications,
            speech_demo_delay_ms,
            speech_demo_audio_url,
            identity: IdentityConfig::from_env(),
            blob: BlobConfig::from_env(),
        };
        if let Err(msg) = config.check_timeouts() {
            panic!("{msg}");
        }
        config
    }

    /// A submission makes two sequential external calls (ingestion, then the
    /// account update), so both must fit inside one request.
    pub fn check_timeouts(&self) -> Result<(), String> {
        if self.request_timeout_secs <= 2 * self.external_call_timeout_secs {
            return Err(format!(
                "REQUEST_TIMEOUT_SECS ({}) must exceed twice EXTERNAL_CALL_TIMEOUT_SECS ({})",
                self.request_timeout_secs, self.external_call_timeout_secs
            ));
        }
        Ok(())
    }

    pub fn registry_limits(&self) -> RegistryLimits {
        RegistryLimits {
            ttl: Duration::from_secs(self.application_ttl_secs),
            max_per_owner: self.max_open_applications,
        }
    }

    pub fn external_call_timeout(&self) -> Duration {
        Duration::from_secs(self.external_call_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
