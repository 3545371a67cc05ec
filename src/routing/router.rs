//! Route lookup.
//!
//! # Responsibilities
//! - Store routes with their bound handlers, in registration order
//! - Look up the first route matching a request
//! - Return the match with its path parameters, or explicit no-match
//! - Prefer an explicit method over `any` on the same route path
//!
//! # Design Decisions
//! - Immutable once the server starts (shared through `Arc`, no locks)
//! - O(n) scan in registration order (acceptable for typical route counts)
//! - Registering the same (path, method) again replaces the earlier binding
//!   in place, keeping its position

use axum::http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::handlers::Handler;
use crate::routing::compiler::RouteDescriptor;
use crate::routing::matcher::{RouteMatcher, ANY_METHOD};

/// A route bound to its handler.
#[derive(Clone)]
pub struct RouteEntry {
    pub descriptor: RouteDescriptor,
    pub handler: Arc<dyn Handler>,
    matcher: RouteMatcher,
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.descriptor.method)
            .field("route_path", &self.descriptor.route_path)
            .field("function", &self.descriptor.function_name)
            .finish()
    }
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub entry: &'a RouteEntry,
    pub path_parameters: HashMap<String, String>,
}

/// Ordered route table.
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Returns the descriptor it replaced, if any.
    pub fn register(&mut self, descriptor: RouteDescriptor, handler: Arc<dyn Handler>) -> Option<RouteDescriptor> {
        let matcher = RouteMatcher::new(&descriptor.method, descriptor.template.clone());
        let entry = RouteEntry {
            descriptor,
            handler,
            matcher,
        };

        let existing = self.entries.iter_mut().find(|e| {
            e.descriptor.route_path == entry.descriptor.route_path
                && e.descriptor.method == entry.descriptor.method
        });

        match existing {
            Some(slot) => {
                let replaced = std::mem::replace(slot, entry);
                tracing::warn!(
                    method = %replaced.descriptor.method,
                    path = %replaced.descriptor.route_path,
                    previous = %replaced.descriptor.function_name,
                    current = %slot.descriptor.function_name,
                    "Route registered twice, later registration wins"
                );
                Some(replaced.descriptor)
            }
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    /// First route, in registration order, matching `method` and `path`.
    ///
    /// An `any` route yields to an explicit method registered on the same
    /// route path, wherever that one sits in the table.
    pub fn match_request(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let (index, matched) = self.find_from(0, method, path, |_| true)?;
        if matched.entry.descriptor.method != ANY_METHOD {
            return Some(matched);
        }

        let any_entry: &RouteEntry = matched.entry;
        self.find_from(index + 1, method, path, |e| {
            e.descriptor.method != ANY_METHOD && e.descriptor.route_path == any_entry.descriptor.route_path
        })
        .map(|(_, explicit)| explicit)
        .or(Some(matched))
    }

    fn find_from(
        &self,
        start: usize,
        method: &Method,
        path: &str,
        accept: impl Fn(&RouteEntry) -> bool,
    ) -> Option<(usize, RouteMatch<'_>)> {
        self.entries
            .iter()
            .enumerate()
            .skip(start)
            .filter(|(_, entry)| accept(entry))
            .find_map(|(index, entry)| {
                entry
                    .matcher
                    .matches(method, path)
                    .map(|path_parameters| (index, RouteMatch { entry, path_parameters }))
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::handler_fn;
    use crate::http::{ProxyEvent, ProxyResponse};
    use crate::routing::compiler::{compile, sort_routes};
    use crate::service::{FunctionDefinition, FunctionEvent, FunctionMap, HttpTrigger};
    use std::path::Path;

    fn function(handler: &str, method: &str, path: &str) -> FunctionDefinition {
        FunctionDefinition {
            handler: Some(handler.to_string()),
            events: vec![FunctionEvent {
                http: Some(HttpTrigger::Detailed {
                    path: path.to_string(),
                    method: method.to_string(),
                    authorizer: None,
                }),
            }],
        }
    }

    fn noop() -> Arc<dyn Handler> {
        Arc::new(handler_fn(|_: ProxyEvent| async { Ok(ProxyResponse::new(200)) }))
    }

    fn table(functions: FunctionMap) -> RouteTable {
        let mut table = RouteTable::new();
        for route in compile(&functions, Path::new("/srv")) {
            table.register(route, noop());
        }
        table
    }

    #[test]
    fn test_static_segment_beats_parameter() {
        let mut functions = FunctionMap::new();
        functions.insert("byId".into(), function("users.byId", "get", "a/{id}"));
        functions.insert("active".into(), function("users.active", "get", "a/active"));
        let table = table(functions);

        let matched = table.match_request(&Method::GET, "/a/active").unwrap();
        assert_eq!(matched.entry.descriptor.function_name, "active");
        assert!(matched.path_parameters.is_empty());

        let matched = table.match_request(&Method::GET, "/a/42").unwrap();
        assert_eq!(matched.entry.descriptor.function_name, "byId");
        assert_eq!(matched.path_parameters["id"], "42");
    }

    #[test]
    fn test_no_match() {
        let mut functions = FunctionMap::new();
        functions.insert("get".into(), function("h.get", "get", "items"));
        let table = table(functions);
        assert!(!table.is_empty());
        assert!(RouteTable::new().is_empty());

        assert!(table.match_request(&Method::POST, "/items").is_none());
        assert!(table.match_request(&Method::GET, "/other").is_none());
        assert!(table.match_request(&Method::HEAD, "/items").is_some());
    }

    #[test]
    fn test_duplicate_replaces_in_place() {
        let mut functions = FunctionMap::new();
        functions.insert("first".into(), function("h.first", "get", "dup"));
        functions.insert("other".into(), function("h.other", "get", "zzz"));
        let mut routes = compile(&functions, Path::new("/srv"));
        sort_routes(&mut routes);

        let mut table = RouteTable::new();
        for route in routes {
            assert!(table.register(route, noop()).is_none());
        }

        let mut functions = FunctionMap::new();
        functions.insert("second".into(), function("h.second", "GET", "/dup"));
        let replacement = compile(&functions, Path::new("/srv")).remove(0);
        let replaced = table.register(replacement, noop()).unwrap();

        assert_eq!(replaced.function_name, "first");
        assert_eq!(table.len(), 2);
        let names: Vec<_> = table.iter().map(|e| e.descriptor.function_name.as_str()).collect();
        assert_eq!(names, vec!["other", "second"]);
    }

    #[test]
    fn test_greedy_and_any() {
        let mut functions = FunctionMap::new();
        functions.insert("proxy".into(), function("h.proxy", "any", "files/{proxy+}"));
        let table = table(functions);

        let matched = table.match_request(&Method::DELETE, "/files/a/b/c.txt").unwrap();
        assert_eq!(matched.path_parameters["proxy"], "a/b/c.txt");
        assert!(table.match_request(&Method::GET, "/files").is_none());
    }

    #[test]
    fn test_explicit_method_beats_any_on_same_path() {
        let mut functions = FunctionMap::new();
        functions.insert("catchAll".into(), function("h.catchAll", "any", "x"));
        functions.insert("getX".into(), function("h.getX", "get", "x"));
        functions.insert("itemAny".into(), function("h.itemAny", "any", "x/{id}"));
        let table = table(functions);

        // Sorted method-ascending, `any` is registered first.
        let first = table.iter().find(|e| e.descriptor.route_path == "/x").unwrap();
        assert_eq!(first.descriptor.function_name, "catchAll");

        let matched = table.match_request(&Method::GET, "/x").unwrap();
        assert_eq!(matched.entry.descriptor.function_name, "getX");
        let matched = table.match_request(&Method::HEAD, "/x").unwrap();
        assert_eq!(matched.entry.descriptor.function_name, "getX");
        let matched = table.match_request(&Method::POST, "/x").unwrap();
        assert_eq!(matched.entry.descriptor.function_name, "catchAll");
        let matched = table.match_request(&Method::GET, "/x/1").unwrap();
        assert_eq!(matched.entry.descriptor.function_name, "itemAny");
    }
}
