//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

use crate::config::EmulatorConfig;

#[derive(Debug, Parser)]
#[command(name = "lambda-local")]
#[command(version, about = "Serve serverless function definitions locally over HTTP", long_about = None)]
pub struct Cli {
    /// Service definition files (serverless.yml), served after those in the config file
    pub services: Vec<PathBuf>,

    /// Emulator config file; defaults apply when it does not exist
    #[arg(short, long, default_value = "lambda-local.toml")]
    pub config: PathBuf,

    /// Listen port
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// AWS region of the user pool
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// User pool id; enables token verification on authorizer routes
    #[arg(long, env = "COGNITO_POOL_ID")]
    pub user_pool_id: Option<String>,

    /// Token authority base URL, replacing the regional Cognito endpoint
    #[arg(long, env = "COGNITO_AUTHORITY")]
    pub authority: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Apply command-line and environment values on top of the file config.
    pub fn apply_overrides(&self, config: &mut EmulatorConfig) {
        config.services.extend(self.services.iter().cloned());

        if let Some(port) = self.port {
            config.listener.set_port(port);
        }
        if let Some(region) = &self.region {
            config.auth.region = Some(region.clone());
        }
        if let Some(pool) = &self.user_pool_id {
            config.auth.user_pool_id = Some(pool.clone());
        }
        if let Some(authority) = &self.authority {
            config.auth.authority = Some(authority.clone());
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}
