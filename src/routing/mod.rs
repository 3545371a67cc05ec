//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup, per service file):
//!     FunctionMap
//!     → compiler.rs (http trigger → RouteDescriptor, handler reference split)
//!     → template.rs (`{id}` → `:id`, `{proxy+}` → `:proxy*`)
//!     → sort: route_path descending, method ascending
//!     → router.rs (bind handler, append to RouteTable)
//!
//! Incoming Request (method, path)
//!     → router.rs (scan in registration order)
//!     → matcher.rs (method, then path template)
//!     → Return: RouteMatch with path parameters, or no match
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by registration)

pub mod compiler;
pub mod matcher;
pub mod router;
pub mod template;

pub use compiler::{compile, compile_service, sort_routes, split_handler_reference, RouteDescriptor};
pub use router::{RouteEntry, RouteMatch, RouteTable};
pub use template::PathTemplate;
