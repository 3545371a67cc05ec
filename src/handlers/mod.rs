//! Handler subsystem.
//!
//! # Data Flow
//! ```text
//! embedding program
//!     → registry.rs (module key + export name → Handler)
//! RouteDescriptor (handler_module_path, exported_symbol)
//!     → registry.rs resolve (longest module-key suffix match, then export)
//!     → Arc<dyn Handler> bound into the route table
//! per request:
//!     ProxyEvent → Handler::invoke → ProxyResponse
//! ```
//!
//! # Design Decisions
//! - Handlers are registered explicitly; nothing is loaded by file path
//! - A missing module or export fails only that route

pub mod echo;
pub mod registry;

use std::future::Future;
use std::pin::Pin;

use crate::http::{ProxyEvent, ProxyResponse};

pub use registry::{HandlerRegistry, RegistrationError};

/// Error raised by a handler while serving a request.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler produces.
pub type HandlerResult = Result<ProxyResponse, HandlerError>;

/// Boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// An invocable unit of logic bound to a route.
pub trait Handler: Send + Sync {
    fn invoke(&self, event: ProxyEvent) -> BoxFuture<HandlerResult>;
}

/// Adapts an async function or closure into a [`Handler`].
#[derive(Clone)]
pub struct FnHandler<F>(F);

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(ProxyEvent) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn invoke(&self, event: ProxyEvent) -> BoxFuture<HandlerResult> {
        Box::pin((self.0)(event))
    }
}

/// Wrap `f` as a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(ProxyEvent) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler(f)
}
