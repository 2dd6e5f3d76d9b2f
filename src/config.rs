// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// PBKDF2 rounds for new password hashes.
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 100_000;

/// Which `Store` implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local maps; data is lost on restart.
    Memory,
    /// Google Cloud Firestore (or the emulator).
    Firestore,
}

/// Server configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dashboard URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Storage backend
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    /// JWT signing key for bearer tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// PBKDF2 iterations for newly hashed passwords
    pub password_iterations: u32,
}

impl Config {
    /// Config for tests: in-memory store and a cheap password hash.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 3000,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            password_iterations: 1_000,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            "firestore" => StoreBackend::Firestore,
            other => return Err(ConfigError::Invalid("STORE_BACKEND", other.to_string())),
        };

        let gcp_project_id = match store_backend {
            StoreBackend::Firestore => {
                env::var("GCP_PROJECT_ID").map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?
            }
            StoreBackend::Memory => {
                env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string())
            }
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            store_backend,
            gcp_project_id,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            password_iterations: env::var("PASSWORD_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_PASSWORD_ITERATIONS),
        })
    }
}

/// Configuration for the browser-side tracker host process.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Base URL of the API server
    pub api_url: String,
    /// Where the local aggregates, blocklist and credentials are kept
    pub state_path: PathBuf,
    /// How often an open interval is flushed into a sample
    pub flush_interval: Duration,
    /// How often the tracked tab is re-validated
    pub health_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            state_path: PathBuf::from("productivity-tracker-state.json"),
            flush_interval: Duration::from_secs(5),
            health_interval: Duration::from_secs(30),
        }
    }
}

impl TrackerConfig {
    /// Load tracker configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            api_url: env::var("TRACKER_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            state_path: env::var("TRACKER_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
            flush_interval: secs_from_env("TRACKER_FLUSH_SECS")?
                .unwrap_or(defaults.flush_interval),
            health_interval: secs_from_env("TRACKER_HEALTH_SECS")?
                .unwrap_or(defaults.health_interval),
        })
    }
}

fn secs_from_env(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
            _ => Err(ConfigError::Invalid(name, raw)),
        },
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
