//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route lookup)
//!     → [auth verifies bearer token on guarded routes]
//!     → event.rs (request → ProxyEvent)
//!     → [handler invoked]
//!     → response.rs (ProxyResponse → HTTP response)
//!     → error.rs (failures → JSON `{"message"}` with status)
//!     → Send to client
//! ```

pub mod error;
pub mod event;
pub mod response;
pub mod server;

pub use error::DispatchError;
pub use event::{AuthorizerContext, ProxyEvent, RequestContext};
pub use response::ProxyResponse;
pub use server::{build_route_table, EmulatorServer};
