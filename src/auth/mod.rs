//! Bearer-token authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → authenticator.rs (strip scheme, read `kid` from the token header)
//!     → keys.rs (KeyCache: one-time JWKS download, kid → DecodingKey)
//!     → jsonwebtoken::decode (signature, exp, iss, optional aud)
//!     → claims (serde_json::Value) → requestContext.authorizer.claims
//! ```
//!
//! # Design Decisions
//! - One issuer per process, one cache per authenticator
//! - The key algorithm comes from the key set, never from the token alone

pub mod authenticator;
pub mod error;
pub mod keys;

pub use authenticator::{bearer_token, read_key_id, TokenAuthenticator};
pub use error::AuthError;
pub use keys::{CachedKey, KeyCache};
