//! Signing key cache for one issuer.
//!
//! # Responsibilities
//! - Download `{issuer}/.well-known/jwks.json` on first use
//! - Convert each JWK into a decoding key pinned to one algorithm
//! - Index keys by `kid`
//!
//! # Design Decisions
//! - Populated at most once; concurrent first callers share one download
//! - A failed download leaves the cache empty so a later call retries
//! - Never refreshed afterwards: a key rotated in later stays unknown

use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;

use crate::auth::error::AuthError;
use crate::observability::metrics;

/// A verification key from the issuer's key set.
#[derive(Clone)]
pub struct CachedKey {
    /// The key record as published.
    pub jwk: Jwk,
    pub decoding_key: DecodingKey,
    /// The only algorithm tokens signed with this key may use.
    pub algorithm: Algorithm,
}

impl std::fmt::Debug for CachedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedKey")
            .field("kid", &self.jwk.common.key_id)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Lazily populated `kid` → key map.
pub struct KeyCache {
    jwks_url: String,
    http: reqwest::Client,
    keys: OnceCell<HashMap<String, CachedKey>>,
    fetches: AtomicUsize,
}

impl KeyCache {
    pub fn new(jwks_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            http,
            keys: OnceCell::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    pub fn is_populated(&self) -> bool {
        self.keys.initialized()
    }

    /// Number of key-set downloads started so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// The key map, downloading it first if the cache is empty.
    pub async fn keys(&self) -> Result<&HashMap<String, CachedKey>, AuthError> {
        self.keys.get_or_try_init(|| self.fetch()).await
    }

    /// Look up one key, populating the cache if needed.
    pub async fn get(&self, kid: &str) -> Result<Option<&CachedKey>, AuthError> {
        Ok(self.keys().await?.get(kid))
    }

    async fn fetch(&self) -> Result<HashMap<String, CachedKey>, AuthError> {
        let attempt = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(url = %self.jwks_url, attempt, "Fetching signing keys");

        let set = match self.download().await {
            Ok(set) => set,
            Err(e) => {
                metrics::record_key_fetch(false);
                tracing::warn!(url = %self.jwks_url, error = %e, "Signing key download failed");
                return Err(e.into());
            }
        };
        metrics::record_key_fetch(true);

        let keys = index_key_set(&set);
        tracing::info!(url = %self.jwks_url, keys = keys.len(), "Signing keys cached");
        Ok(keys)
    }

    async fn download(&self) -> Result<JwkSet, reqwest::Error> {
        self.http
            .get(&self.jwks_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// Convert a key set into the `kid` index. Keys without a `kid` or with an
/// unsupported type are skipped.
pub fn index_key_set(set: &JwkSet) -> HashMap<String, CachedKey> {
    let mut keys = HashMap::new();
    for jwk in &set.keys {
        let Some(kid) = jwk.common.key_id.clone() else {
            tracing::warn!("Skipping signing key without 'kid'");
            continue;
        };
        let Some(algorithm) = key_algorithm(jwk) else {
            tracing::warn!(kid = %kid, "Skipping signing key with unsupported algorithm");
            continue;
        };
        match DecodingKey::from_jwk(jwk) {
            Ok(decoding_key) => {
                keys.insert(
                    kid,
                    CachedKey {
                        jwk: jwk.clone(),
                        decoding_key,
                        algorithm,
                    },
                );
            }
            Err(e) => tracing::warn!(kid = %kid, error = %e, "Skipping unusable signing key"),
        }
    }
    keys
}

/// Algorithm a key is used with: the JWK `alg`, or the usual one for its type.
/// Symmetric keys are never accepted from a published key set.
fn key_algorithm(jwk: &Jwk) -> Option<Algorithm> {
    if let Some(alg) = &jwk.common.key_algorithm {
        return match alg {
            KeyAlgorithm::RS256 => Some(Algorithm::RS256),
            KeyAlgorithm::RS384 => Some(Algorithm::RS384),
            KeyAlgorithm::RS512 => Some(Algorithm::RS512),
            KeyAlgorithm::PS256 => Some(Algorithm::PS256),
            KeyAlgorithm::PS384 => Some(Algorithm::PS384),
            KeyAlgorithm::PS512 => Some(Algorithm::PS512),
            KeyAlgorithm::ES256 => Some(Algorithm::ES256),
            KeyAlgorithm::ES384 => Some(Algorithm::ES384),
            KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
            _ => None,
        };
    }

    match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => Some(Algorithm::RS256),
        AlgorithmParameters::EllipticCurve(params) => match params.curve {
            EllipticCurve::P256 => Some(Algorithm::ES256),
            EllipticCurve::P384 => Some(Algorithm::ES384),
            _ => None,
        },
        AlgorithmParameters::OctetKeyPair(_) => Some(Algorithm::EdDSA),
        AlgorithmParameters::OctetKey(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MODULUS: &str = "yFED_LX2kM9Wg1jl8CzUN-1rPjDgMHwD9Wlmg3-g-gkaT1E6bh5UEaJJF0mw09GbXxIrR-ZAMPheznSKCdycy9i5ncbCX-BR3dWJBe7zEuGpSqskB1pSQ-G_3YUADV_8hWTxL8X5xlhfTslJa8O8MDKZocvsNr6Vz6oM8Nzm4Dx9_EWecoF5JfE2Q9kAeQ1bY6b2XUfm-TeoZ3pnQDwCbMKH73mXmnS2n22hBGiBn0N4Ar54-X-unaGN9ZtwSGbEsArp0JjQ0EMCSGk8w1KLLfp28vcuuAUdJpYkcspI55Tcb0VfS13ZRiW9Z3xa6RYPFRnwtlckERmp3l8qG5nYfQ";

    fn key_set(value: serde_json::Value) -> JwkSet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_index_by_kid() {
        let set = key_set(json!({"keys": [
            {"kty": "RSA", "kid": "k1", "alg": "RS256", "use": "sig", "n": MODULUS, "e": "AQAB"},
            {"kty": "RSA", "kid": "k2", "n": MODULUS, "e": "AQAB"},
        ]}));
        let keys = index_key_set(&set);
        assert_eq!(keys.len(), 2);
        assert_eq!(keys["k1"].algorithm, Algorithm::RS256);
        assert_eq!(keys["k2"].algorithm, Algorithm::RS256);
    }

    #[test]
    fn test_skips_keys_without_kid_or_symmetric() {
        let set = key_set(json!({"keys": [
            {"kty": "RSA", "n": MODULUS, "e": "AQAB"},
            {"kty": "oct", "kid": "secret", "k": "c2VjcmV0"},
        ]}));
        assert!(index_key_set(&set).is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_empty() {
        // Nothing listens on port 9 (discard) on test hosts.
        let cache = KeyCache::new("http://127.0.0.1:9/.well-known/jwks.json", reqwest::Client::new());
        assert!(matches!(cache.keys().await, Err(AuthError::KeyFetch(_))));
        assert!(!cache.is_populated());
        assert!(cache.keys().await.is_err());
        assert_eq!(cache.fetch_count(), 2);
    }
}
