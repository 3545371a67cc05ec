//! Bearer token verification.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use jsonwebtoken::Validation;
use serde::Deserialize;
use std::time::Duration;

use crate::auth::error::AuthError;
use crate::auth::keys::KeyCache;
use crate::config::AuthConfig;

/// Token segments are base64url; padding is tolerated.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Deserialize)]
struct TokenHeader {
    kid: Option<String>,
}

/// Verifies tokens issued by one user pool.
pub struct TokenAuthenticator {
    issuer: String,
    audience: Option<String>,
    keys: KeyCache,
}

impl TokenAuthenticator {
    pub fn new(
        issuer: impl Into<String>,
        audience: Option<String>,
        fetch_timeout: Duration,
    ) -> Result<Self, AuthError> {
        let issuer = issuer.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(AuthError::HttpClient)?;
        let keys = KeyCache::new(format!("{}/.well-known/jwks.json", issuer), http);
        Ok(Self { issuer, audience, keys })
    }

    /// Build from configuration; `None` when no user pool is configured.
    pub fn from_config(config: &AuthConfig) -> Result<Option<Self>, AuthError> {
        let Some(issuer) = config.issuer() else {
            return Ok(None);
        };
        let auth = Self::new(
            issuer,
            config.audience.clone(),
            Duration::from_secs(config.fetch_timeout_secs),
        )?;
        Ok(Some(auth))
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn key_cache(&self) -> &KeyCache {
        &self.keys
    }

    /// Verify a raw token and return its claims.
    pub async fn verify(&self, token: &str) -> Result<serde_json::Value, AuthError> {
        let kid = read_key_id(token)?;
        let key = self
            .keys
            .get(&kid)
            .await?
            .ok_or_else(|| AuthError::UnknownKeyId(kid.clone()))?;

        let mut validation = Validation::new(key.algorithm);
        validation.set_issuer(&[&self.issuer]);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = jsonwebtoken::decode::<serde_json::Value>(token, &key.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Verify the value of an `Authorization` header.
    pub async fn verify_header(&self, header: Option<&str>) -> Result<serde_json::Value, AuthError> {
        self.verify(bearer_token(header)?).await
    }
}

/// Token from an `Authorization` header; the `Bearer ` prefix is optional.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.unwrap_or_default().trim_start();
    let token = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest,
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    }
    .trim();
    if token.is_empty() {
        Err(AuthError::MissingToken)
    } else {
        Ok(token)
    }
}

/// Read `kid` from the token header without verifying anything.
pub fn read_key_id(token: &str) -> Result<String, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(AuthError::MalformedToken("expected three segments"));
    };
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(AuthError::MalformedToken("empty segment"));
    }

    let bytes = SEGMENT_ENGINE
        .decode(header)
        .map_err(|_| AuthError::MalformedToken("header is not base64url"))?;
    let header: TokenHeader =
        serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken("header is not JSON"))?;

    header.kid.ok_or(AuthError::MissingKeyId)
}
