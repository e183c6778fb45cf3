//! Core data transfer objects shared across analyzers, the schema generator,
//! and the OpenAPI assembler.
//!
//! These are plain immutable-after-construction DTOs: analyzers return them,
//! generators consume them, nothing downstream mutates a `RouteInfo` or
//! `ResourceInfo` in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where an HTTP parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
}

/// A single discovered route, normalized from the host application's route
/// registry (see `crate::route`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    uri: String,
    http_methods: Vec<String>,
    controller_class: String,
    method_name: String,
    name: Option<String>,
    middleware: Vec<String>,
    parameters: Vec<RouteParameterInfo>,
}

impl RouteInfo {
    /// Construct a `RouteInfo`. Panics if `http_methods` is empty or any
    /// `{name}` placeholder in `uri` has no matching entry in `parameters` —
    /// these are the two invariants `RouteAnalyzer` guarantees hold before a
    /// route is ever handed downstream.
    #[must_use]
    pub fn new(
        uri: String,
        http_methods: Vec<String>,
        controller_class: String,
        method_name: String,
        name: Option<String>,
        middleware: Vec<String>,
        parameters: Vec<RouteParameterInfo>,
    ) -> Self {
        assert!(
            !http_methods.is_empty(),
            "RouteInfo requires at least one HTTP method after exclusion filtering"
        );
        for placeholder in path_placeholders(&uri) {
            assert!(
                parameters.iter().any(|p| p.name == placeholder),
                "path placeholder {{{placeholder}}} in {uri} has no matching parameter"
            );
        }
        Self {
            uri,
            http_methods,
            controller_class,
            method_name,
            name,
            middleware,
            parameters,
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn http_methods(&self) -> &[String] {
        &self.http_methods
    }

    #[must_use]
    pub fn controller_class(&self) -> &str {
        &self.controller_class
    }

    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn middleware(&self) -> &[String] {
        &self.middleware
    }

    #[must_use]
    pub fn parameters(&self) -> &[RouteParameterInfo] {
        &self.parameters
    }
}

/// Extract `{name}` / `{name?}` placeholders from a URI template, in order.
#[must_use]
pub fn path_placeholders(uri: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = uri;
    while let Some(start) = rest.find('{') {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let raw = &rest[start + 1..start + end];
        out.push(raw.trim_end_matches('?').to_string());
        rest = &rest[start + end + 1..];
    }
    out
}

/// A path/query/header parameter attached to a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteParameterInfo {
    pub name: String,
    pub required: bool,
    pub location: ParamLocation,
    pub schema: ParamSchema,
}

/// The narrow schema shape a route/where-constraint parameter resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSchema {
    pub r#type: String,
    pub format: Option<String>,
    pub pattern: Option<String>,
}

impl ParamSchema {
    #[must_use]
    pub fn integer() -> Self {
        Self {
            r#type: "integer".to_string(),
            format: None,
            pattern: None,
        }
    }

    #[must_use]
    pub fn uuid() -> Self {
        Self {
            r#type: "string".to_string(),
            format: Some("uuid".to_string()),
            pattern: None,
        }
    }

    #[must_use]
    pub fn string_pattern(pattern: String) -> Self {
        Self {
            r#type: "string".to_string(),
            format: None,
            pattern: Some(format!("^{pattern}$")),
        }
    }

    #[must_use]
    pub fn string() -> Self {
        Self {
            r#type: "string".to_string(),
            format: None,
            pattern: None,
        }
    }
}

/// A single validation constraint. Source systems express these as either a
/// pipe-string token or a rule-builder object; both collapse to this tagged
/// variant before reaching the schema generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rule {
    /// An unparsed or already-atomic token, e.g. `"max:255"`.
    Token(String),
    /// `Rule::enum(Class)` / `new Enum(Class)`.
    Enum(String),
    /// `File::image()|types([...])->min|max`.
    File {
        mimes: Vec<String>,
        min_kb: Option<u64>,
        max_kb: Option<u64>,
        image_only: bool,
    },
    /// `Password::min(n)->mixedCase()->...`.
    Password {
        min: Option<u64>,
        mixed_case: bool,
        numbers: bool,
        symbols: bool,
    },
    /// `Rule::in([...])`.
    In(Vec<String>),
    /// `Rule::unique(table, column?)`.
    Unique { table: String, column: Option<String> },
    /// `regex:/.../`.
    Regex(String),
    /// `Rule::dimensions()->...`.
    Dimensions(BTreeMap<String, u64>),
    /// `Rule::requiredIf(...)` / `Rule::prohibitedIf(...)`.
    Conditional {
        predicate: String,
        inner: Box<Rule>,
    },
    /// A recognized but opaque rule-builder call we can't resolve further.
    Custom(String),
}

impl Rule {
    #[must_use]
    pub fn is_file(&self) -> bool {
        match self {
            Self::File { .. } => true,
            Self::Conditional { inner, .. } => inner.is_file(),
            Self::Token(t) => t == "file" || t == "image",
            _ => false,
        }
    }
}

/// An ordered, immutable multiset of validation rules for one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRuleCollection {
    rules: Vec<Rule>,
}

impl ValidationRuleCollection {
    /// Normalize a pipe-string (`"required|string|max:255"`) into tokens.
    #[must_use]
    pub fn from_pipe_string(s: &str) -> Self {
        let rules = s
            .split('|')
            .filter(|t| !t.is_empty())
            .map(|t| Rule::Token(t.to_string()))
            .collect();
        Self { rules }
    }

    #[must_use]
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn has_token(&self, name: &str) -> bool {
        self.rules
            .iter()
            .any(|r| matches!(r, Rule::Token(t) if t == name || t.starts_with(&format!("{name}:"))))
    }

    #[must_use]
    pub fn token_value(&self, name: &str) -> Option<&str> {
        self.rules.iter().find_map(|r| match r {
            Rule::Token(t) => t.strip_prefix(&format!("{name}:")),
            _ => None,
        })
    }

    /// Monotonic over subsets: once true for a collection, true for any
    /// superset containing the same rules plus more.
    #[must_use]
    pub fn has_file_rule(&self) -> bool {
        self.rules.iter().any(Rule::is_file)
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        !self.has_token("sometimes")
            && !self.has_token("nullable")
            && !self.rules.iter().any(|r| matches!(r, Rule::Token(t) if t.starts_with("exclude")))
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.has_token("nullable")
    }
}

/// The unified intermediate handed to `SchemaGenerator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    pub r#type: String,
    pub format: Option<String>,
    pub required: bool,
    pub nullable: bool,
    pub description: Option<String>,
    pub r#enum: Option<Vec<String>>,
    pub constraints: Constraints,
    pub example: Option<serde_json::Value>,
    pub validation_rules: ValidationRuleCollection,
}

/// Numeric/string/array bounds extracted from validation rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub multiple_of: Option<f64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

/// A single response-resource property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub r#type: String,
    pub format: Option<String>,
    pub example: Option<serde_json::Value>,
    pub items: Option<Box<PropertyInfo>>,
    pub properties: Option<BTreeMap<String, PropertyInfo>>,
    pub conditional: bool,
    pub condition: Option<String>,
    pub relation: Option<String>,
    pub source: Option<String>,
}

impl PropertyInfo {
    #[must_use]
    pub fn scalar(ty: &str) -> Self {
        Self {
            r#type: ty.to_string(),
            format: None,
            example: None,
            items: None,
            properties: None,
            conditional: false,
            condition: None,
            relation: None,
            source: None,
        }
    }
}

/// Analyzed output of a response-resource class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// The resource class this was analyzed from, when known. Used to key
    /// a shared `components.schemas` entry so routes sharing a resource
    /// share one schema instead of each inlining its own copy.
    pub class_name: Option<String>,
    pub properties: BTreeMap<String, PropertyInfo>,
    pub conditional_fields: Vec<String>,
    pub nested_resources: Vec<String>,
    pub is_collection: bool,
    pub with_extra_data: BTreeMap<String, PropertyInfo>,
    pub has_examples: bool,
    pub custom_example: Option<serde_json::Value>,
    pub custom_examples: Option<BTreeMap<String, serde_json::Value>>,
}

/// Transformer-based response metadata (Fractal-style).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractalInfo {
    pub transformer_class: String,
    pub is_collection: bool,
    pub r#type: ResourceInfo,
    pub has_includes: bool,
    pub default_includes: Vec<String>,
    pub available_includes: Vec<String>,
}

/// The backing representation of an enum's cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackingType {
    String,
    Integer,
    Unit,
}

/// Statically (or reflectively) extracted enum metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumInfo {
    pub class: String,
    pub values: Vec<String>,
    pub backing_type: BackingType,
}

/// Pagination envelope style detected by `PaginationAnalyzer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaginationStyle {
    LengthAware,
    Simple,
    Cursor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub style: PaginationStyle,
}

/// Requested OpenAPI output dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecVersion {
    V30,
    V31,
}

/// Serialized output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_extraction_strips_optional_marker() {
        let ph = path_placeholders("/api/users/{id}/posts/{postId?}");
        assert_eq!(ph, vec!["id".to_string(), "postId".to_string()]);
    }

    #[test]
    #[should_panic(expected = "has no matching parameter")]
    fn route_info_panics_on_unmatched_placeholder() {
        RouteInfo::new(
            "/api/users/{id}".to_string(),
            vec!["GET".to_string()],
            "UserController".to_string(),
            "show".to_string(),
            None,
            vec![],
            vec![],
        );
    }

    #[test]
    #[should_panic(expected = "at least one HTTP method")]
    fn route_info_panics_on_empty_methods() {
        RouteInfo::new(
            "/api/users".to_string(),
            vec![],
            "UserController".to_string(),
            "index".to_string(),
            None,
            vec![],
            vec![],
        );
    }

    #[test]
    fn required_discipline_sometimes_nullable_exclude() {
        assert!(!ValidationRuleCollection::from_pipe_string("sometimes|string").is_required());
        assert!(!ValidationRuleCollection::from_pipe_string("nullable|string").is_required());
        assert!(!ValidationRuleCollection::from_pipe_string("exclude_if:env,production")
            .is_required());
        assert!(ValidationRuleCollection::from_pipe_string("required|string").is_required());
    }

    #[test]
    fn has_file_rule_monotonic_over_subsets() {
        let base = ValidationRuleCollection::from_pipe_string("required");
        assert!(!base.has_file_rule());
        let with_file = ValidationRuleCollection::from_pipe_string("required|file|max:2048");
        assert!(with_file.has_file_rule());
    }
}
