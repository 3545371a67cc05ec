//! Handler registry and resolution.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::handlers::{handler_fn, Handler, HandlerResult};
use crate::http::ProxyEvent;
use crate::routing::RouteDescriptor;

/// Why a route could not be bound to a handler.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("no handler module registered for {0}")]
    ModuleNotFound(PathBuf),

    #[error("module '{module}' has no export named '{export}'")]
    ExportNotFound { module: String, export: String },

    #[error("route requires a token authorizer but no user pool is configured")]
    AuthorizerUnavailable,
}

type Exports = HashMap<String, Arc<dyn Handler>>;

/// Handlers keyed by module path and export name.
///
/// A module key is matched as a path suffix of the route's resolved module
/// path, so `src/users` serves `handler: src/users.get` from any service
/// directory.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    modules: HashMap<String, Exports>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async function under `module`/`export`.
    pub fn register<F, Fut>(&mut self, module: &str, export: &str, f: F) -> &mut Self
    where
        F: Fn(ProxyEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register_handler(module, export, Arc::new(handler_fn(f)))
    }

    /// Register a ready-made handler object.
    pub fn register_handler(&mut self, module: &str, export: &str, handler: Arc<dyn Handler>) -> &mut Self {
        self.modules
            .entry(normalize_module(module))
            .or_default()
            .insert(export.to_string(), handler);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Find the handler for a compiled route.
    pub fn resolve(&self, route: &RouteDescriptor) -> Result<Arc<dyn Handler>, RegistrationError> {
        let module_not_found = || RegistrationError::ModuleNotFound(route.handler_module_path.clone());
        if route.module_ref.is_empty() {
            return Err(module_not_found());
        }

        let (key, exports) = self
            .modules
            .iter()
            .filter(|(key, _)| !key.is_empty() && route.handler_module_path.ends_with(Path::new(key.as_str())))
            .max_by_key(|(key, _)| Path::new(key.as_str()).components().count())
            .ok_or_else(module_not_found)?;

        exports
            .get(&route.exported_symbol)
            .cloned()
            .ok_or_else(|| RegistrationError::ExportNotFound {
                module: key.clone(),
                export: route.exported_symbol.clone(),
            })
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (module, exports) in &self.modules {
            map.entry(module, &exports.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}

fn normalize_module(module: &str) -> String {
    module
        .trim()
        .trim_start_matches("./")
        .trim_end_matches('/')
        .to_string()
}
