//! Request matching logic.
//!
//! # Responsibilities
//! - Match the HTTP method (case-insensitive, `any` is a wildcard)
//! - Match the path against a route template (case-sensitive)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - A `get` route also answers `HEAD`
//! - Path matching is case-sensitive
//! - No regex: templates are matched segment by segment

use axum::http::Method;
use std::collections::HashMap;

use crate::routing::template::PathTemplate;

/// Method name that matches every verb.
pub const ANY_METHOD: &str = "any";

/// Matches the request method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMatcher {
    expected: String,
}

impl MethodMatcher {
    /// The method is normalized to lowercase.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            expected: method.into().to_lowercase(),
        }
    }

    pub fn matches(&self, method: &Method) -> bool {
        if self.expected == ANY_METHOD || method.as_str().eq_ignore_ascii_case(&self.expected) {
            return true;
        }
        *method == Method::HEAD && self.expected == "get"
    }
}

/// Method and path conditions of one route.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    method: MethodMatcher,
    template: PathTemplate,
}

impl RouteMatcher {
    pub fn new(method: &str, template: PathTemplate) -> Self {
        Self {
            method: MethodMatcher::new(method),
            template,
        }
    }

    /// Path parameters when both conditions hold.
    pub fn matches(&self, method: &Method, path: &str) -> Option<HashMap<String, String>> {
        if !self.method.matches(method) {
            return None;
        }
        self.template.capture(path)
    }
}
