//! Configuration schema definitions.
//!
//! This module defines the process configuration of the emulator.
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the emulator process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Service definition files (serverless.yml) to serve.
    pub services: Vec<PathBuf>,

    /// Base directory for relative service paths and `${file(...)}` fragments.
    /// Defaults to the process working directory.
    pub working_dir: Option<PathBuf>,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Request handling limits.
    pub http: HttpConfig,

    /// Bearer-token verification settings.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl EmulatorConfig {
    /// Directory that relative service paths and fragments resolve against.
    pub fn working_dir(&self) -> PathBuf {
        self.working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8180").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8180".to_string(),
        }
    }
}

impl ListenerConfig {
    /// Replace the port of the bind address, keeping the host.
    pub fn set_port(&mut self, port: u16) {
        let host = self
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        self.bind_address = format!("{}:{}", host, port);
    }
}

/// Request handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Total time allowed for one request, handler included, in seconds.
    pub request_timeout_secs: u64,

    /// Answer CORS preflights and add permissive CORS headers.
    pub cors_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 100 * 1024,
            request_timeout_secs: 30,
            cors_enabled: true,
        }
    }
}

/// Token issuer configuration for routes guarded by a user-pool authorizer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// AWS region of the user pool.
    pub region: Option<String>,

    /// User pool identifier; authentication is unavailable without it.
    pub user_pool_id: Option<String>,

    /// Overrides `https://cognito-idp.{region}.amazonaws.com`.
    pub authority: Option<String>,

    /// Expected `aud` claim. Audience is not checked when unset.
    pub audience: Option<String>,

    /// Timeout for the key-set download in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            region: None,
            user_pool_id: None,
            authority: None,
            audience: None,
            fetch_timeout_secs: 10,
        }
    }
}

impl AuthConfig {
    /// Base URL of the token authority, if one can be derived.
    pub fn authority(&self) -> Option<String> {
        match (&self.authority, &self.region) {
            (Some(authority), _) => Some(authority.trim_end_matches('/').to_string()),
            (None, Some(region)) => Some(format!("https://cognito-idp.{}.amazonaws.com", region)),
            (None, None) => None,
        }
    }

    /// Issuer URL: `{authority}/{user_pool_id}`.
    pub fn issuer(&self) -> Option<String> {
        let pool = self.user_pool_id.as_deref().filter(|p| !p.is_empty())?;
        Some(format!("{}/{}", self.authority()?, pool))
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9180".to_string(),
        }
    }
}
