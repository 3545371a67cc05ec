//! Process configuration subsystem.
//!
//! # Data Flow
//! ```text
//! lambda-local.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → cli overrides (PORT, AWS_REGION, COGNITO_POOL_ID, ...)
//!     → EmulatorConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the file is optional
//! - Validation separates syntactic (serde) from semantic checks
//! - Service definitions (serverless.yml) live in `crate::service`, not here

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_or_default, ConfigError};
pub use schema::{AuthConfig, EmulatorConfig, HttpConfig, ListenerConfig, ObservabilityConfig};
pub use validation::{validate_config, ValidationError};
