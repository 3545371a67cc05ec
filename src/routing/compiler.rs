//! Route compilation.
//!
//! # Responsibilities
//! - Keep only functions with an HTTP trigger (first one wins) and a handler
//! - Derive path, method and authorizer requirement per function
//! - Split handler references into module path and exported symbol
//! - Order routes: `route_path` descending, then `method` ascending
//!
//! # Design Decisions
//! - Compilation never fails; unresolvable handlers are dropped at registration
//! - Duplicate (path, method) pairs are kept; the route table lets the later one win
//! - The descending sort puts `/users/active` ahead of `/users/:id`, which the
//!   first-match route table relies on

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::routing::template::PathTemplate;
use crate::service::{FunctionMap, ServiceDefinition};

/// Compiled, immutable binding of one function to one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Name of the function in the service definition.
    pub function_name: String,
    /// Module part of the handler reference, as written.
    pub module_ref: String,
    /// `module_ref` resolved against the service file's directory.
    pub handler_module_path: PathBuf,
    /// Name of the export inside the module.
    pub exported_symbol: String,
    /// Router form of the path, always starting with `/`.
    pub route_path: String,
    /// Lower-case HTTP verb, or `any`.
    pub method: String,
    pub requires_authorizer: bool,
    pub template: PathTemplate,
}

/// Split `modulePath.exportedSymbol` on the last `.`.
///
/// A reference without a `.` has an empty module path.
pub fn split_handler_reference(reference: &str) -> (&str, &str) {
    match reference.rfind('.') {
        Some(idx) => (&reference[..idx], &reference[idx + 1..]),
        None => ("", reference),
    }
}

/// Compile one loaded service definition.
pub fn compile_service(service: &ServiceDefinition) -> Vec<RouteDescriptor> {
    compile(&service.functions, service.base_dir())
}

/// Compile a function map whose handler paths are relative to `base_dir`.
pub fn compile(functions: &FunctionMap, base_dir: &Path) -> Vec<RouteDescriptor> {
    let mut routes: Vec<RouteDescriptor> = functions
        .iter()
        .filter_map(|(name, function)| {
            let trigger = function.http_trigger()?;
            let method = trigger.method();
            if method.is_empty() {
                tracing::warn!(function = %name, "HTTP trigger without a method, skipping");
                return None;
            }

            let Some(handler) = function.handler.as_deref() else {
                tracing::warn!(function = %name, "HTTP trigger without a handler, skipping");
                return None;
            };

            let template = PathTemplate::parse(trigger.path());
            let (module_ref, exported_symbol) = split_handler_reference(handler);

            Some(RouteDescriptor {
                function_name: name.clone(),
                module_ref: module_ref.to_string(),
                handler_module_path: base_dir.join(module_ref),
                exported_symbol: exported_symbol.to_string(),
                route_path: template.route_path(),
                method,
                requires_authorizer: trigger.requires_authorizer(),
                template,
            })
        })
        .collect();

    sort_routes(&mut routes);
    routes
}

/// Registration order: `route_path` descending, then `method` ascending. Stable.
pub fn sort_routes(routes: &mut [RouteDescriptor]) {
    routes.sort_by(route_order);
}

fn route_order(a: &RouteDescriptor, b: &RouteDescriptor) -> Ordering {
    b.route_path
        .cmp(&a.route_path)
        .then_with(|| a.method.cmp(&b.method))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn functions(yaml: &str) -> FunctionMap {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_non_http_functions_produce_no_routes() {
        let map = functions(
            r#"
worker:
  handler: src/worker.run
  events:
    - sqs: arn:aws:sqs:eu-west-1:1:queue
cron:
  handler: src/cron.tick
  events:
    - schedule: rate(1 hour)
bare:
  handler: src/bare.main
"#,
        );
        assert!(compile(&map, Path::new("/svc")).is_empty());
    }

    #[test]
    fn test_descriptor_fields() {
        let map = functions(
            r#"
getUser:
  handler: src/handlers/users.getUser
  events:
    - http:
        path: users/{id}
        method: GET
        authorizer:
          type: COGNITO_USER_POOLS
"#,
        );
        let routes = compile(&map, Path::new("/svc"));
        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        assert_eq!(route.function_name, "getUser");
        assert_eq!(route.module_ref, "src/handlers/users");
        assert_eq!(route.handler_module_path, PathBuf::from("/svc/src/handlers/users"));
        assert_eq!(route.exported_symbol, "getUser");
        assert_eq!(route.route_path, "/users/:id");
        assert_eq!(route.method, "get");
        assert!(route.requires_authorizer);
    }

    #[test]
    fn test_static_paths_sort_before_params() {
        let map = functions(
            r#"
byId:
  handler: h.byId
  events:
    - http: { path: "a/{id}", method: get }
active:
  handler: h.active
  events:
    - http: { path: a/active, method: get }
"#,
        );
        let routes = compile(&map, Path::new("."));
        let paths: Vec<_> = routes.iter().map(|r| r.route_path.as_str()).collect();
        assert_eq!(paths, vec!["/a/active", "/a/:id"]);
    }

    #[test]
    fn test_methods_ascend_within_a_path() {
        let map = functions(
            r#"
put:
  handler: h.put
  events: [{ http: { path: r, method: put } }]
delete:
  handler: h.delete
  events: [{ http: { path: r, method: delete } }]
get:
  handler: h.get
  events: [{ http: { path: r, method: get } }]
"#,
        );
        let methods: Vec<_> = compile(&map, Path::new("."))
            .into_iter()
            .map(|r| r.method)
            .collect();
        assert_eq!(methods, vec!["delete", "get", "put"]);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let map = functions(
            r#"
a: { handler: h.a, events: [{ http: { path: "x/{id}", method: get } }] }
b: { handler: h.b, events: [{ http: { path: x/list, method: get } }] }
c: { handler: h.c, events: [{ http: { path: y, method: post } }] }
"#,
        );
        assert_eq!(compile(&map, Path::new(".")), compile(&map, Path::new(".")));
    }

    #[test]
    fn test_http_function_without_handler_is_skipped() {
        let map = functions(
            r#"
image:
  image: api
  events:
    - http: GET from/image
listed:
  handler: h.listed
  events:
    - http: GET listed
"#,
        );
        let routes = compile(&map, Path::new("/svc"));
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].function_name, "listed");
    }

    #[test]
    fn test_split_handler_reference() {
        assert_eq!(split_handler_reference("src/a.b/users.get"), ("src/a.b/users", "get"));
        assert_eq!(split_handler_reference("handler"), ("", "handler"));
    }
}
