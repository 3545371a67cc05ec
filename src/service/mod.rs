//! Service definition subsystem.
//!
//! # Data Flow
//! ```text
//! serverless.yml
//!     → loader.rs (YAML parse, `${file(...)}` fragment merge)
//!     → definition.rs (typed FunctionDefinition / HttpTrigger)
//!     → ServiceDefinition { source, functions }
//!     → routing::compiler (one route set per file)
//! ```

pub mod definition;
pub mod loader;

pub use definition::{
    Authorizer, FunctionDefinition, FunctionEvent, FunctionMap, HttpTrigger, ServiceDefinition,
    COGNITO_USER_POOLS,
};
pub use loader::{ServiceConfigError, ServiceLoader};
