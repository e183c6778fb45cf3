//! Discovers API routes from the host application's route registry and
//! normalizes them into [`RouteInfo`].
//!
//! Unlike the source-extracting analyzers in [`crate::analyzers`], this
//! analyzer never parses source text: the route registry is handed in
//! pre-structured as a sequence of [`RouteEntry`] values (see the external
//! interface contract), one per registered route.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{CollectedError, ErrorCollector, Severity};
use crate::model::{ParamLocation, ParamSchema, RouteInfo, RouteParameterInfo};

/// One route as reported by the host application's route registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub uri: String,
    pub http_methods: Vec<String>,
    /// `Controller::method`, or `Controller` alone for invokable controllers.
    pub action: String,
    pub middleware: Vec<String>,
    pub name: Option<String>,
    /// Route-level `where()` constraints, keyed by path-parameter name.
    pub where_constraints: BTreeMap<String, String>,
    /// `true` when the route is bound to a closure rather than a controller
    /// action; such routes carry no analyzable source and are skipped.
    pub is_closure: bool,
}

/// Configuration governing which routes are discovered and how.
#[derive(Debug, Clone)]
pub struct RouteAnalyzerConfig {
    /// URI glob patterns a route must match at least one of. Default `api/*`.
    pub include_patterns: Vec<String>,
    /// HTTP methods to drop from every route (commonly `HEAD`).
    pub excluded_methods: Vec<String>,
    /// Middleware names stripped from the recorded `middleware` list.
    pub excluded_middleware: Vec<String>,
}

impl Default for RouteAnalyzerConfig {
    fn default() -> Self {
        Self {
            include_patterns: vec!["api/*".to_string()],
            excluded_methods: vec!["HEAD".to_string()],
            excluded_middleware: vec![],
        }
    }
}

/// Stateless analyzer turning raw [`RouteEntry`] values into [`RouteInfo`].
pub struct RouteAnalyzer<'a> {
    config: &'a RouteAnalyzerConfig,
}

impl<'a> RouteAnalyzer<'a> {
    #[must_use]
    pub fn new(config: &'a RouteAnalyzerConfig) -> Self {
        Self { config }
    }

    /// Analyze every entry, collecting non-fatal faults into `errors`.
    /// Routes that don't match an include pattern, are closure-bound, or
    /// end up with no HTTP methods after exclusion are silently dropped
    /// (not an error); malformed actions and bad `where` patterns are
    /// recorded and the route is skipped.
    pub fn analyze(&self, entries: &[RouteEntry], errors: &mut ErrorCollector) -> Vec<RouteInfo> {
        entries
            .iter()
            .filter(|e| self.matches_include(&e.uri))
            .filter(|e| !e.is_closure)
            .filter_map(|e| self.analyze_one(e, errors))
            .collect()
    }

    fn matches_include(&self, uri: &str) -> bool {
        self.config
            .include_patterns
            .iter()
            .any(|pat| glob_match(pat, uri))
    }

    fn analyze_one(&self, entry: &RouteEntry, errors: &mut ErrorCollector) -> Option<RouteInfo> {
        let http_methods: Vec<String> = entry
            .http_methods
            .iter()
            .filter(|m| !self.config.excluded_methods.contains(m))
            .cloned()
            .collect();
        if http_methods.is_empty() {
            return None;
        }

        let (controller_class, method_name) = match resolve_action(&entry.action) {
            Ok(pair) => pair,
            Err(message) => {
                errors.push(
                    CollectedError::new("route.action", message, Severity::Error)
                        .with_context(entry.uri.clone()),
                );
                return None;
            }
        };

        let mut parameters = Vec::new();
        for placeholder in crate::model::path_placeholders(&entry.uri) {
            let required = !entry.uri.contains(&format!("{{{placeholder}?}}"));
            let schema = match entry.where_constraints.get(&placeholder) {
                Some(pattern) => where_constraint_to_schema(pattern),
                None => ParamSchema::string(),
            };
            parameters.push(RouteParameterInfo {
                name: placeholder,
                required,
                location: ParamLocation::Path,
                schema,
            });
        }

        let middleware = entry
            .middleware
            .iter()
            .filter(|m| !self.config.excluded_middleware.contains(m))
            .cloned()
            .collect();

        Some(RouteInfo::new(
            entry.uri.clone(),
            http_methods,
            controller_class,
            method_name,
            entry.name.clone(),
            middleware,
            parameters,
        ))
    }
}

/// Splits `Controller::method` into parts, collapsing an invokable
/// controller (`Controller` with no `::method`) to `__invoke`.
fn resolve_action(action: &str) -> Result<(String, String), String> {
    if action.is_empty() {
        return Err("empty route action".to_string());
    }
    match action.split_once("::") {
        Some((class, method)) if !class.is_empty() && !method.is_empty() => {
            Ok((class.to_string(), method.to_string()))
        }
        Some(_) => Err(format!("malformed action '{action}'")),
        None => Ok((action.to_string(), "__invoke".to_string())),
    }
}

/// Canonical UUID regex variants recognized for `{string, format: "uuid"}`.
const UUID_PATTERNS: &[&str] = &[
    r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
];

fn where_constraint_to_schema(pattern: &str) -> ParamSchema {
    if pattern == "[0-9]+" || pattern == r"\d+" {
        ParamSchema::integer()
    } else if UUID_PATTERNS.contains(&pattern) {
        ParamSchema::uuid()
    } else {
        ParamSchema::string_pattern(pattern.to_string())
    }
}

/// Minimal glob supporting a single trailing `*` segment, sufficient for
/// route-pattern matching (`api/*`, `api/v1/*`).
fn glob_match(pattern: &str, candidate: &str) -> bool {
    pattern.strip_suffix('*').map_or_else(
        || pattern == candidate,
        |prefix| candidate.starts_with(prefix),
    )
}
