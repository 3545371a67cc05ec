//! Service definition types.
//!
//! Only the parts of a serverless service document the emulator acts on are
//! modelled; unknown keys are ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Function name → definition, ordered by name.
pub type FunctionMap = BTreeMap<String, FunctionDefinition>;

/// Authorizer type that requires a verified bearer token.
pub const COGNITO_USER_POOLS: &str = "COGNITO_USER_POOLS";

/// One service definition file after fragment resolution.
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    /// Path of the file the definition was loaded from.
    pub source: PathBuf,

    /// Functions declared by the file and its fragments.
    pub functions: FunctionMap,
}

impl ServiceDefinition {
    /// Directory handler references are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// A single function entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FunctionDefinition {
    /// Handler reference, `modulePath.exportedSymbol`. Absent for
    /// image-based functions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,

    /// Trigger events; only `http` events are served.
    #[serde(default)]
    pub events: Vec<FunctionEvent>,
}

impl FunctionDefinition {
    /// The first HTTP trigger. Later HTTP triggers are ignored.
    pub fn http_trigger(&self) -> Option<&HttpTrigger> {
        self.events.iter().find_map(|e| e.http.as_ref())
    }
}

/// One entry of a function's `events` list.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct FunctionEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpTrigger>,
}

/// An `http` event, in either long or `"METHOD path"` shorthand form.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HttpTrigger {
    Shorthand(String),
    Detailed {
        path: String,
        method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorizer: Option<Authorizer>,
    },
}

impl HttpTrigger {
    pub fn method(&self) -> String {
        match self {
            HttpTrigger::Shorthand(s) => s.split_whitespace().next().unwrap_or_default().to_lowercase(),
            HttpTrigger::Detailed { method, .. } => method.to_lowercase(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            HttpTrigger::Shorthand(s) => s
                .trim()
                .split_once(char::is_whitespace)
                .map(|(_, path)| path.trim())
                .unwrap_or(""),
            HttpTrigger::Detailed { path, .. } => path,
        }
    }

    pub fn authorizer(&self) -> Option<&Authorizer> {
        match self {
            HttpTrigger::Shorthand(_) => None,
            HttpTrigger::Detailed { authorizer, .. } => authorizer.as_ref(),
        }
    }

    /// True only for an authorizer whose `type` is exactly `COGNITO_USER_POOLS`.
    pub fn requires_authorizer(&self) -> bool {
        self.authorizer()
            .and_then(Authorizer::kind)
            .is_some_and(|kind| kind == COGNITO_USER_POOLS)
    }
}

/// Authorizer reference: a bare name/ARN or a mapping with a `type`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Authorizer {
    Named(String),
    Detailed {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl Authorizer {
    pub fn kind(&self) -> Option<&str> {
        match self {
            Authorizer::Named(_) => None,
            Authorizer::Detailed { kind, .. } => kind.as_deref(),
        }
    }
}
