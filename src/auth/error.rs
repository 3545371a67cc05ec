//! Authentication errors.

use thiserror::Error;

/// Why a bearer token was rejected.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization` header, or an empty one.
    #[error("missing bearer token")]
    MissingToken,

    /// The token is not three dot-separated segments with a JSON header.
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    /// The token header carries no `kid`.
    #[error("token header has no 'kid'")]
    MissingKeyId,

    /// The `kid` is not in the issuer's key set.
    #[error("unknown key id: {0}")]
    UnknownKeyId(String),

    /// The HTTP client for key-set downloads could not be built.
    #[error("cannot build key set client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Downloading the key set failed.
    #[error("key set fetch failed: {0}")]
    KeyFetch(#[from] reqwest::Error),

    /// Signature or claim validation failed.
    #[error("token verification failed: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// True when the caller's token is at fault rather than the key service.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, AuthError::KeyFetch(_) | AuthError::HttpClient(_))
    }
}
