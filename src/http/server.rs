//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Load service files and bind every route to its handler
//! - Create Axum Router with a single dispatching handler
//! - Wire up middleware (tracing, timeout, request ID, CORS)
//! - Authenticate guarded routes, adapt requests, invoke handlers
//! - Observability (metrics, request IDs)
//!
//! # Design Decisions
//! - A broken service file or unresolvable handler skips only itself
//! - Routing is done by our own ordered table behind an Axum catch-all,
//!   so registration order decides between overlapping routes

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{AuthError, TokenAuthenticator};
use crate::config::EmulatorConfig;
use crate::handlers::{HandlerRegistry, RegistrationError};
use crate::http::error::DispatchError;
use crate::http::event::{adapt_body, adapt_request};
use crate::http::response::ProxyResponse;
use crate::observability::metrics;
use crate::routing::{compile_service, RouteEntry, RouteTable};
use crate::service::ServiceLoader;

/// Application state injected into the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub authenticator: Option<Arc<TokenAuthenticator>>,
    pub max_body_bytes: usize,
}

/// HTTP server for the emulator.
pub struct EmulatorServer {
    router: Router,
    routes: Arc<RouteTable>,
    config: EmulatorConfig,
}

impl EmulatorServer {
    /// Load the configured service files and bind their routes.
    ///
    /// Fails only when the token authorizer cannot be set up; broken service
    /// files and handlers are skipped.
    pub fn new(config: EmulatorConfig, registry: &HandlerRegistry) -> Result<Self, AuthError> {
        let authenticator = TokenAuthenticator::from_config(&config.auth)?.map(Arc::new);
        if let Some(auth) = &authenticator {
            tracing::info!(issuer = %auth.issuer(), "Token authorizer enabled");
        }

        let loader = ServiceLoader::new(config.working_dir());
        let routes = Arc::new(build_route_table(
            &loader,
            &config.services,
            registry,
            authenticator.is_some(),
        ));

        if routes.is_empty() {
            tracing::warn!("No routes bound, every request will be answered with 404");
        }

        let state = AppState {
            routes: routes.clone(),
            authenticator,
            max_body_bytes: config.http.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            routes,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EmulatorConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(config.http.request_timeout_secs)));

        let router = Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(middleware);

        if config.http.cors_enabled {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// The bound routes, in match order.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.routes.len(), "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Load every service file and bind its routes, skipping what fails.
pub fn build_route_table(
    loader: &ServiceLoader,
    services: &[PathBuf],
    registry: &HandlerRegistry,
    authorizer_available: bool,
) -> RouteTable {
    let mut table = RouteTable::new();

    for (file, result) in loader.load_all(services) {
        let service = match result {
            Ok(service) => service,
            Err(e) => {
                tracing::error!(file = %file.display(), error = %e, "Failed to load service file, skipping");
                continue;
            }
        };

        let routes = compile_service(&service);
        tracing::info!(file = %file.display(), routes = routes.len(), "Service file loaded");

        for route in routes {
            let handler_ref = format!("{}.{}", route.module_ref, route.exported_symbol);
            let bound = if route.requires_authorizer && !authorizer_available {
                Err(RegistrationError::AuthorizerUnavailable)
            } else {
                registry.resolve(&route)
            };

            match bound {
                Ok(handler) => {
                    tracing::info!(
                        method = %route.method.to_uppercase(),
                        path = %route.route_path,
                        handler = %handler_ref,
                        params = ?route.template.param_names(),
                        authorizer = route.requires_authorizer,
                        "Route registered"
                    );
                    table.register(route, handler);
                }
                Err(e) => {
                    tracing::error!(
                        file = %file.display(),
                        method = %route.method.to_uppercase(),
                        path = %route.route_path,
                        handler = %handler_ref,
                        error = %e,
                        "Failed to register route, skipping"
                    );
                }
            }
        }
    }

    table
}

/// Single entry point for every request.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let Some(matched) = state.routes.match_request(&method, &path) else {
        tracing::debug!(method = %method, path = %path, "No route matched");
        metrics::record_invocation(method.as_str(), "none", 404, start);
        return DispatchError::NotFound {
            method: method.to_string(),
            path,
        }
        .into_response();
    };

    let entry = matched.entry;
    let response = match invoke(&state, entry, matched.path_parameters, request).await {
        Ok(response) => response.into_response(),
        Err(e) => e.into_response(),
    };

    metrics::record_invocation(
        method.as_str(),
        &entry.descriptor.route_path,
        response.status().as_u16(),
        start,
    );
    response
}

async fn invoke(
    state: &AppState,
    entry: &RouteEntry,
    path_parameters: std::collections::HashMap<String, String>,
    request: Request<Body>,
) -> Result<ProxyResponse, DispatchError> {
    let (parts, body) = request.into_parts();

    let claims = if entry.descriptor.requires_authorizer {
        let authenticator = state
            .authenticator
            .as_ref()
            .ok_or(DispatchError::AuthorizerUnavailable)?;
        let header = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        Some(
            authenticator
                .verify_header(header)
                .await
                .map_err(DispatchError::Unauthorized)?,
        )
    } else {
        None
    };

    let bytes = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "Request body rejected");
            DispatchError::PayloadTooLarge {
                limit: state.max_body_bytes,
            }
        })?;
    let body = adapt_body(&parts.headers, &bytes).map_err(DispatchError::InvalidBody)?;

    let event = adapt_request(&parts, &entry.descriptor, path_parameters, body, claims);
    tracing::debug!(
        request_id = %event.request_context.request_id,
        function = %entry.descriptor.function_name,
        "Invoking handler"
    );

    entry
        .handler
        .invoke(event)
        .await
        .map_err(DispatchError::Handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerResult;
    use crate::http::ProxyEvent;
    use std::fs;

    async fn ok(_event: ProxyEvent) -> HandlerResult {
        Ok(ProxyResponse::new(200))
    }

    const SERVICE: &str = "functions:
  list:
    handler: src/items.list
    events:
      - http: GET items
  show:
    handler: src/items.show
    events:
      - http:
          path: items/{id}
          method: get
  guarded:
    handler: src/items.list
    events:
      - http:
          path: private
          method: get
          authorizer:
            type: COGNITO_USER_POOLS
";

    #[test]
    fn test_build_route_table_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("serverless.yml"), SERVICE).unwrap();

        let mut registry = HandlerRegistry::new();
        registry.register("src/items", "list", ok);

        let loader = ServiceLoader::new(dir.path());
        let services = vec![PathBuf::from("missing.yml"), PathBuf::from("serverless.yml")];
        let table = build_route_table(&loader, &services, &registry, false);

        let paths: Vec<_> = table.iter().map(|e| e.descriptor.route_path.as_str()).collect();
        assert_eq!(paths, vec!["/items"]);
    }

    #[tokio::test]
    async fn test_server_exposes_routes_and_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("serverless.yml"), SERVICE).unwrap();

        let mut registry = HandlerRegistry::new();
        registry
            .register("src/items", "list", ok)
            .register("src/items", "show", ok);

        let mut config = EmulatorConfig::default();
        config.working_dir = Some(dir.path().to_path_buf());
        config.services = vec![PathBuf::from("serverless.yml")];
        config.auth.region = Some("us-east-1".into());
        config.auth.user_pool_id = Some("us-east-1_X".into());

        let server = EmulatorServer::new(config, &registry).unwrap();
        assert_eq!(server.routes().len(), 3);
        assert_eq!(server.config().services.len(), 1);
        // Descending path order: /private, /items/:id, /items.
        let first = server.routes().iter().next().unwrap();
        assert_eq!(first.descriptor.route_path, "/private");
    }
}
