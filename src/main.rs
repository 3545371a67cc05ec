//! Local serverless emulator.
//!
//! # Architecture Overview
//!
//! ```text
//!     serverless.yml ──▶ service loader ──▶ route compiler ──▶ handler registry
//!                        (${file()} merge)   (sort, split)      (bind or skip)
//!                                                                     │
//!                                                                     ▼
//!     Client Request ──▶ axum + middleware ──▶ route table ──▶ token authenticator
//!                        (trace, timeout,      (first match)   (JWKS by kid)
//!                         request id, CORS)                           │
//!                                                                     ▼
//!     Client Response ◀── response adapter ◀── handler ◀── request adapter
//! ```

use clap::Parser;

use lambda_local::cli::Cli;
use lambda_local::handlers::{echo, HandlerRegistry};
use lambda_local::lifecycle;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut registry = HandlerRegistry::new();
    echo::register(&mut registry);

    lifecycle::run(cli, registry).await?;
    Ok(())
}
