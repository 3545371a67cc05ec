//! Built-in handler that answers with the event it received.
//!
//! Registered by the binary as module `echo`, export `handler`, so a service
//! definition with `handler: echo.handler` (or `any/dir/echo.handler`) can be
//! served without writing any Rust.

use crate::handlers::{HandlerRegistry, HandlerResult};
use crate::http::{ProxyEvent, ProxyResponse};

pub const MODULE: &str = "echo";
pub const EXPORT: &str = "handler";

pub async fn handler(event: ProxyEvent) -> HandlerResult {
    Ok(ProxyResponse::json(200, &event)?)
}

/// Add the echo handler to `registry`.
pub fn register(registry: &mut HandlerRegistry) -> &mut HandlerRegistry {
    registry.register(MODULE, EXPORT, handler)
}
