//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration, then apply command-line overrides
//! - Initialize logging and metrics
//! - Load service files and bind routes
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast on configuration and bind errors
//! - Service file and handler errors are not fatal; they only skip routes
//! - Listener starts last (traffic only when routes are bound)

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::auth::AuthError;
use crate::cli::Cli;
use crate::config::{load_config_or_default, validate_config, ConfigError, EmulatorConfig, ValidationError};
use crate::handlers::HandlerRegistry;
use crate::http::EmulatorServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::observability::{init_logging, init_metrics};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("failed to set up token authorizer: {0}")]
    Auth(#[from] AuthError),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Resolve the effective configuration from the config file and `cli`.
pub fn resolve_config(cli: &Cli) -> Result<(EmulatorConfig, bool), StartupError> {
    let (mut config, found) = load_config_or_default(&cli.config)?;
    cli.apply_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok((config, found))
}

/// Run the emulator until a stop signal arrives.
pub async fn run(cli: Cli, registry: HandlerRegistry) -> Result<(), StartupError> {
    let (config, found) = resolve_config(&cli)?;

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("logging already initialized: {e}");
    }
    if !found {
        tracing::warn!(path = %cli.config.display(), "Config file not found, using defaults");
    }
    tracing::info!(
        services = config.services.len(),
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.http.max_body_bytes,
        "Configuration loaded"
    );
    if config.services.is_empty() {
        tracing::warn!("No service files given, every request will be answered with 404");
    }

    if registry.is_empty() {
        tracing::warn!("No handlers registered, every route will be skipped");
    }

    if config.observability.metrics_enabled {
        let raw = &config.observability.metrics_address;
        let addr: SocketAddr = raw
            .parse()
            .map_err(|_| ConfigError::Validation(vec![ValidationError::MetricsAddress(raw.clone())]))?;
        init_metrics(addr)?;
    }

    let server = EmulatorServer::new(config.clone(), &registry)?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;
    let local_addr = listener.local_addr().map_err(StartupError::Serve)?;
    tracing::info!("Listening at http://{}", local_addr);

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
