//! Response adaptation.
//!
//! # Responsibilities
//! - Define the result shape handlers return (`statusCode`, `headers`, `body`)
//! - Turn it into an HTTP response
//!
//! # Design Decisions
//! - Missing `statusCode` means 200
//! - Object/array bodies are sent as JSON, string bodies as HTML text
//! - Handler headers are applied as given; framing headers belong to the server

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Headers that describe message framing and are computed by the server.
const FRAMING_HEADERS: [&str; 3] = ["content-length", "transfer-encoding", "connection"];

/// Result returned by a handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ProxyResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::default()
        }
    }

    /// Response whose body is `value` serialized to JSON.
    pub fn json<T: Serialize>(status_code: u16, value: &T) -> serde_json::Result<Self> {
        Ok(Self::new(status_code).with_body(serde_json::to_value(value)?))
    }

    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Effective status code.
    pub fn status(&self) -> StatusCode {
        match self.status_code {
            None => StatusCode::OK,
            Some(code) => StatusCode::from_u16(code).unwrap_or_else(|_| {
                tracing::warn!(status_code = code, "Handler returned an invalid status code");
                StatusCode::INTERNAL_SERVER_ERROR
            }),
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let status = self.status();

        let (content_type, bytes) = match self.body {
            _ if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED => (None, Vec::new()),
            None | Some(Value::Null) => (None, Vec::new()),
            Some(Value::String(text)) => (Some("text/html; charset=utf-8"), text.into_bytes()),
            Some(value) => (
                Some("application/json; charset=utf-8"),
                serde_json::to_vec(&value).unwrap_or_default(),
            ),
        };

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            if FRAMING_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                continue;
            }
            let Some(text) = header_text(value) else { continue };
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(text)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Skipping invalid response header"),
            }
        }
        if let Some(content_type) = content_type {
            if !headers.contains_key(header::CONTENT_TYPE) {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }

        response
    }
}

fn header_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(header_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Null | Value::Object(_) => None,
    }
}
