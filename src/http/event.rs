//! Request adaptation.
//!
//! # Responsibilities
//! - Turn an incoming HTTP request into the event a handler expects
//! - Copy query and path parameters, lower-cased headers, request ID
//! - Re-serialize the parsed JSON body to a string
//!
//! # Design Decisions
//! - Only JSON bodies are parsed; anything else adapts to `"{}"`
//! - Malformed JSON is rejected before the handler runs
//! - Repeated query keys keep the last value

use axum::http::{header, request::Parts, HeaderMap};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::routing::RouteDescriptor;

/// Event passed to a handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    /// Upper-case request method.
    pub http_method: String,
    /// Request path as received.
    pub path: String,
    /// Route the request matched, e.g. `/users/:id`.
    pub resource: String,
    pub headers: HashMap<String, String>,
    pub query_string_parameters: HashMap<String, String>,
    pub path_parameters: HashMap<String, String>,
    /// JSON text of the parsed request body.
    pub body: String,
    pub request_context: RequestContext,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorizer: Option<AuthorizerContext>,
}

/// Verified token claims, present on authorizer-guarded routes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizerContext {
    pub claims: serde_json::Value,
}

impl ProxyEvent {
    /// Parse `body` into `T`.
    pub fn json_body<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }

    /// Claims of the verified bearer token, if the route required one.
    pub fn claims(&self) -> Option<&serde_json::Value> {
        self.request_context.authorizer.as_ref().map(|a| &a.claims)
    }
}

/// True for `application/json` and `application/*+json` content types.
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let essence = v.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
            essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
        })
        .unwrap_or(false)
}

/// Body as handlers see it: the JSON text of the parsed body, `{}` when there is none.
pub fn adapt_body(headers: &HeaderMap, bytes: &[u8]) -> serde_json::Result<String> {
    if !is_json(headers) || bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok("{}".to_string());
    }
    let parsed: serde_json::Value = serde_json::from_slice(bytes)?;
    serde_json::to_string(&parsed)
}

/// Build the handler event for a matched route.
pub fn adapt_request(
    parts: &Parts,
    route: &RouteDescriptor,
    path_parameters: HashMap<String, String>,
    body: String,
    claims: Option<serde_json::Value>,
) -> ProxyEvent {
    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let query_string_parameters = parts
        .uri
        .query()
        .map(|query| url::form_urlencoded::parse(query.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let request_id = parts
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    ProxyEvent {
        http_method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        resource: route.route_path.clone(),
        headers,
        query_string_parameters,
        path_parameters,
        body,
        request_context: RequestContext {
            request_id,
            authorizer: claims.map(|claims| AuthorizerContext { claims }),
        },
    }
}
