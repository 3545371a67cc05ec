//! Local serverless emulator library.
//!
//! Serves the HTTP-triggered functions of one or more `serverless.yml` files
//! on a local port, routing each request to a handler registered in-process.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;
pub mod service;

// Request handling
pub mod auth;
pub mod handlers;

// Cross-cutting concerns
pub mod cli;
pub mod lifecycle;
pub mod observability;

pub use config::schema::EmulatorConfig;
pub use handlers::{Handler, HandlerRegistry, HandlerResult};
pub use http::{EmulatorServer, ProxyEvent, ProxyResponse};
pub use lifecycle::Shutdown;
