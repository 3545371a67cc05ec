//! Shared utilities for integration tests.

use axum::{extract::State, routing::get, Json, Router};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;

use lambda_local::handlers::{HandlerRegistry, HandlerResult};
use lambda_local::{EmulatorConfig, EmulatorServer, ProxyEvent, ProxyResponse, Shutdown};

/// Modulus of `fixtures/keys/k1.pem`.
pub const K1_MODULUS: &str = "yFED_LX2kM9Wg1jl8CzUN-1rPjDgMHwD9Wlmg3-g-gkaT1E6bh5UEaJJF0mw09GbXxIrR-ZAMPheznSKCdycy9i5ncbCX-BR3dWJBe7zEuGpSqskB1pSQ-G_3YUADV_8hWTxL8X5xlhfTslJa8O8MDKZocvsNr6Vz6oM8Nzm4Dx9_EWecoF5JfE2Q9kAeQ1bY6b2XUfm-TeoZ3pnQDwCbMKH73mXmnS2n22hBGiBn0N4Ar54-X-unaGN9ZtwSGbEsArp0JjQ0EMCSGk8w1KLLfp28vcuuAUdJpYkcspI55Tcb0VfS13ZRiW9Z3xa6RYPFRnwtlckERmp3l8qG5nYfQ";

/// Modulus of `fixtures/keys/k2.pem`.
#[allow(dead_code)]
pub const K2_MODULUS: &str = "sGIqishYuGAFxQQhUXbze4bGMLZdfwUu3A5wm1z-6H1wyUVdepqaNlzIJ1ZaRvKXqko7TPl0FhjHTHUuV6XPQSYdDINaIPTOZsBfMQwaRQ7UxA57loEhMR1-l1T0OtS9Px998-OSmwJoIQ5emG2fQF_I32SHCU6l32_KGjc9jGjqWu5B3uneuV-kLtqfK9iqL_L-y_eVWZUVsLKxoUUQm017cvBT2Z5_0DaJGy8fzfxtS58xRcgMec5H2z5DR8VfuR3PwRI7LX3L3rJ7PZkP6M12T4q-VzztUyQhCCMqTtzKiGCGKcKcJSyiaaIzKoERvWE2Um-Zu3BCw1H3-D_0bw";

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Config serving `services` (relative to the fixtures directory) on an
/// ephemeral local port.
pub fn fixture_config(services: &[&str]) -> EmulatorConfig {
    let mut config = EmulatorConfig::default();
    config.working_dir = Some(fixtures_dir());
    config.services = services.iter().map(PathBuf::from).collect();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

async fn get_handler(event: ProxyEvent) -> HandlerResult {
    let response = ProxyResponse::new(200).with_header("Content-Type", "application/json");
    if event.http_method == "GET" {
        Ok(response.with_body(json!({ "text": "JSON response" })))
    } else {
        Ok(response)
    }
}

async fn post_handler(event: ProxyEvent) -> HandlerResult {
    let body: Value = event.json_body()?;
    Ok(ProxyResponse::default().with_body(json!({ "postBody": body })))
}

async fn delete_handler(_event: ProxyEvent) -> HandlerResult {
    Ok(ProxyResponse::new(204))
}

async fn text_handler(_event: ProxyEvent) -> HandlerResult {
    Ok(ProxyResponse::new(200).with_body("Test response"))
}

async fn echo_handler(event: ProxyEvent) -> HandlerResult {
    Ok(ProxyResponse::json(200, &event)?)
}

async fn active_handler(_event: ProxyEvent) -> HandlerResult {
    Ok(ProxyResponse::new(200).with_body(json!({ "route": "active" })))
}

async fn failing_handler(_event: ProxyEvent) -> HandlerResult {
    Err("handler exploded".into())
}

/// Handlers for every fixture, registered under module `handlers`.
pub fn test_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register("handlers", "getHandler", get_handler)
        .register("handlers", "postHandler", post_handler)
        .register("handlers", "putHandler", post_handler)
        .register("handlers", "deleteHandler", delete_handler)
        .register("handlers", "textHandler", text_handler)
        .register("handlers", "echo", echo_handler)
        .register("handlers", "active", active_handler)
        .register("handlers", "fail", failing_handler);
    registry
}

/// A running emulator, stopped on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub routes: usize,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start an emulator for `config` on an ephemeral port.
pub async fn start_server(config: EmulatorConfig, registry: &HandlerRegistry) -> TestServer {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = EmulatorServer::new(config, registry).unwrap();
    let routes = server.routes().len();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        routes,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// A mock token authority serving a fixed key set under `/pool`.
#[allow(dead_code)]
pub struct MockAuthority {
    pub addr: SocketAddr,
    pub fetches: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockAuthority {
    /// Base URL, usable as `auth.authority`.
    pub fn authority(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Issuer of tokens for user pool `pool`.
    pub fn issuer(&self) -> String {
        format!("http://{}/pool", self.addr)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct JwksState {
    keys: Value,
    delay: Duration,
    fetches: Arc<AtomicUsize>,
}

async fn jwks(State(state): State<JwksState>) -> Json<Value> {
    state.fetches.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(state.delay).await;
    Json(state.keys)
}

/// Start a mock authority answering each key-set request after `delay`.
#[allow(dead_code)]
pub async fn start_authority(keys: Value, delay: Duration) -> MockAuthority {
    let fetches = Arc::new(AtomicUsize::new(0));
    let state = JwksState {
        keys,
        delay,
        fetches: fetches.clone(),
    };
    let app = Router::new()
        .route("/pool/.well-known/jwks.json", get(jwks))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockAuthority { addr, fetches }
}

/// Public JWK for an RSA key with exponent 65537.
#[allow(dead_code)]
pub fn rsa_jwk(kid: &str, modulus: &str) -> Value {
    json!({
        "kty": "RSA",
        "alg": "RS256",
        "use": "sig",
        "kid": kid,
        "n": modulus,
        "e": "AQAB",
    })
}

#[allow(dead_code)]
pub fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

/// Claims accepted by an authority with `issuer`.
#[allow(dead_code)]
pub fn claims(issuer: &str) -> Value {
    json!({
        "sub": "user-1",
        "iss": issuer,
        "exp": now() + 600,
        "token_use": "id",
        "email": "user@example.com",
    })
}

/// Sign `claims` with `fixtures/keys/<key>.pem`, putting `kid` in the header.
#[allow(dead_code)]
pub fn sign(key: &str, kid: &str, claims: &Value) -> String {
    let pem = std::fs::read(fixtures_dir().join("keys").join(format!("{key}.pem"))).unwrap();
    let encoding_key = EncodingKey::from_rsa_pem(&pem).unwrap();
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    jsonwebtoken::encode(&header, claims, &encoding_key).unwrap()
}
