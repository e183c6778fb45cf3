//! Assembles an [`OpenApiSpec`] from per-route analyzer output: request body
//! schema, query/header parameters, response shapes, and auth-aware status
//! codes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analyzers::auth::AuthRequirements;
use crate::analyzers::query_header::{DiscoveredParameter, Location};
use crate::model::{
    EnumInfo, FractalInfo, ParamLocation, ParameterInfo, PaginationInfo, PaginationStyle,
    PropertyInfo, ResourceInfo, RouteInfo,
};
use crate::schema::examples::ExampleProvider;
use crate::schema::generator::{ContentKind, SchemaGenerator};

/// The response body shape for a route, as determined by whichever
/// response-describing analyzer fired for its controller method.
pub enum ResponseSource {
    Resource(ResourceInfo),
    Fractal(FractalInfo),
    None,
}

/// Everything `OpenApiGenerator` needs for one route: the route itself plus
/// every analyzer's output for its controller method.
pub struct RouteDocumentation {
    pub route: RouteInfo,
    pub request_params: Vec<ParameterInfo>,
    pub query_header_params: Vec<DiscoveredParameter>,
    pub response: ResponseSource,
    pub pagination: Option<PaginationInfo>,
    pub auth: AuthRequirements,
    pub deprecated: bool,
    pub summary: Option<String>,
    pub description: Option<String>,
}

/// The final assembled document. Serializes to either JSON or YAML at the
/// CLI edge; [`crate::openapi31`] operates on its `serde_json::Value` form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiSpec {
    pub openapi: String,
    pub info: Value,
    pub servers: Vec<Value>,
    pub paths: Map<String, Value>,
    pub components: Value,
    pub security: Vec<Value>,
    pub tags: Vec<Value>,
    #[serde(rename = "x-tagGroups", skip_serializing_if = "Vec::is_empty")]
    pub x_tag_groups: Vec<Value>,
}

pub struct OpenApiGenerator<'a> {
    enums: &'a BTreeMap<String, EnumInfo>,
}

impl<'a> OpenApiGenerator<'a> {
    #[must_use]
    pub fn new(enums: &'a BTreeMap<String, EnumInfo>) -> Self {
        Self { enums }
    }

    pub fn generate(
        &self,
        docs: Vec<RouteDocumentation>,
        info: Value,
        servers: Vec<Value>,
        provider: &mut dyn ExampleProvider,
    ) -> OpenApiSpec {
        let mut paths: Map<String, Value> = Map::new();
        let mut schemas: Map<String, Value> = Map::new();
        let mut tags: Vec<String> = Vec::new();
        let mut operation_ids: std::collections::HashSet<String> = std::collections::HashSet::new();

        for doc in docs {
            let tag = doc.route.controller_class().to_string();
            if !tags.contains(&tag) {
                tags.push(tag.clone());
            }

            let path_key = laravel_uri_to_openapi(doc.route.uri());
            let path_item = paths.entry(path_key).or_insert_with(|| Value::Object(Map::new()));
            let Value::Object(path_item) = path_item else { unreachable!() };

            for method in doc.route.http_methods() {
                let mut operation = self.build_operation(&doc, &tag, method, provider, &mut schemas);
                let operation_id = operation["operationId"].as_str().unwrap_or_default().to_string();
                if !operation_id.is_empty() {
                    let unique_id = dedupe_operation_id(&mut operation_ids, operation_id);
                    operation["operationId"] = Value::String(unique_id);
                }
                path_item.insert(method.to_lowercase(), operation);
            }
        }

        let mut components = Map::new();
        components.insert("schemas".to_string(), Value::Object(schemas));
        components.insert("securitySchemes".to_string(), bearer_security_scheme());

        OpenApiSpec {
            openapi: "3.0.3".to_string(),
            info,
            servers,
            paths,
            components: Value::Object(components),
            security: vec![],
            tags: tags.into_iter().map(|t| serde_json::json!({"name": t})).collect(),
            x_tag_groups: vec![],
        }
    }

    fn build_operation(
        &self,
        doc: &RouteDocumentation,
        tag: &str,
        method: &str,
        provider: &mut dyn ExampleProvider,
        schemas: &mut Map<String, Value>,
    ) -> Value {
        let mut operation = Map::new();

        operation.insert(
            "operationId".to_string(),
            Value::String(operation_id(&doc.route, method)),
        );
        operation.insert(
            "summary".to_string(),
            Value::String(doc.summary.clone().unwrap_or_else(|| humanize_method(&doc.route, method))),
        );
        if let Some(description) = &doc.description {
            operation.insert("description".to_string(), Value::String(description.clone()));
        }
        operation.insert("tags".to_string(), serde_json::json!([tag]));
        if doc.deprecated {
            operation.insert("deprecated".to_string(), Value::Bool(true));
        }

        let parameters = self.build_parameters(doc);
        if !parameters.is_empty() {
            operation.insert("parameters".to_string(), Value::Array(parameters));
        }

        if needs_request_body(method) && !doc.request_params.is_empty() {
            let generator = SchemaGenerator::new(self.enums);
            let (schema, kind) = generator.build(&doc.request_params, provider);
            let content_type = match kind {
                ContentKind::Multipart => "multipart/form-data",
                ContentKind::Json => "application/json",
            };
            operation.insert(
                "requestBody".to_string(),
                serde_json::json!({
                    "required": true,
                    "content": { content_type: { "schema": schema } }
                }),
            );
        }

        operation.insert(
            "responses".to_string(),
            self.build_responses(doc, method, schemas),
        );

        Value::Object(operation)
    }

    fn build_parameters(&self, doc: &RouteDocumentation) -> Vec<Value> {
        let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
        let mut out = Vec::new();

        for param in doc.route.parameters() {
            seen.insert(param.name.clone());
            out.push(serde_json::json!({
                "name": param.name,
                "in": location_name(param.location),
                "required": param.required,
                "schema": {
                    "type": param.schema.r#type,
                    "format": param.schema.format,
                    "pattern": param.schema.pattern,
                },
            }));
        }

        for discovered in &doc.query_header_params {
            if seen.contains(&discovered.parameter.name) {
                continue;
            }
            seen.insert(discovered.parameter.name.clone());
            out.push(serde_json::json!({
                "name": discovered.parameter.name,
                "in": match discovered.location { Location::Query => "query", Location::Header => "header" },
                "required": discovered.parameter.required,
                "schema": { "type": discovered.parameter.r#type },
            }));
        }

        if let Some(pagination) = &doc.pagination {
            for implicit in PaginationAnalyzerExt::implicit_parameters(pagination.style) {
                if seen.contains(&implicit.name) {
                    continue;
                }
                seen.insert(implicit.name.clone());
                out.push(serde_json::json!({
                    "name": implicit.name,
                    "in": "query",
                    "required": false,
                    "schema": { "type": implicit.r#type },
                }));
            }
        }

        // strip nulls from schema objects (format/pattern absent)
        out.into_iter()
            .map(|mut v| {
                if let Some(schema) = v.get_mut("schema") {
                    if let Value::Object(map) = schema {
                        map.retain(|_, val| !val.is_null());
                    }
                }
                v
            })
            .collect()
    }

    fn build_responses(
        &self,
        doc: &RouteDocumentation,
        method: &str,
        schemas: &mut Map<String, Value>,
    ) -> Value {
        let mut responses = Map::new();

        let success_status = success_status(&doc.route, method);
        let body_schema = self.response_schema(doc, schemas);

        let success_response = if success_status == 204 {
            serde_json::json!({ "description": "No content" })
        } else {
            serde_json::json!({
                "description": "Successful response",
                "content": { "application/json": { "schema": body_schema } }
            })
        };
        responses.insert(success_status.to_string(), success_response);

        if !doc.request_params.is_empty() {
            responses.insert(
                "422".to_string(),
                serde_json::json!({
                    "description": "Validation error",
                    "content": { "application/json": { "schema": validation_error_schema() } }
                }),
            );
        }

        if doc.auth.needs_401 {
            responses.insert(
                "401".to_string(),
                serde_json::json!({ "description": "Unauthenticated" }),
            );
        }
        if doc.auth.needs_403 {
            responses.insert(
                "403".to_string(),
                serde_json::json!({ "description": "Forbidden" }),
            );
        }

        Value::Object(responses)
    }

    fn response_schema(&self, doc: &RouteDocumentation, schemas: &mut Map<String, Value>) -> Value {
        let base = match &doc.response {
            ResponseSource::Resource(resource) => {
                component_ref(schemas, resource.class_name.as_deref(), resource)
            }
            ResponseSource::Fractal(fractal) => {
                let mut schema =
                    component_ref(schemas, Some(&fractal.transformer_class), &fractal.r#type);
                if fractal.is_collection {
                    schema = serde_json::json!({ "type": "array", "items": schema });
                }
                schema
            }
            ResponseSource::None => Value::Object(Map::new()),
        };

        match doc.pagination.as_ref().map(|p| p.style) {
            Some(PaginationStyle::LengthAware | PaginationStyle::Simple) => {
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "data": { "type": "array", "items": base },
                        "meta": { "type": "object" },
                        "links": { "type": "object" },
                    }
                })
            }
            Some(PaginationStyle::Cursor) => {
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "data": { "type": "array", "items": base },
                        "meta": { "type": "object", "properties": { "next_cursor": { "type": "string", "nullable": true } } },
                    }
                })
            }
            None => base,
        }
    }
}

fn location_name(location: ParamLocation) -> &'static str {
    match location {
        ParamLocation::Path => "path",
        ParamLocation::Query => "query",
        ParamLocation::Header => "header",
    }
}

fn needs_request_body(method: &str) -> bool {
    matches!(method.to_uppercase().as_str(), "POST" | "PUT" | "PATCH")
}

fn success_status(route: &RouteInfo, method: &str) -> u16 {
    match method.to_uppercase().as_str() {
        "POST" if is_store_like(route.method_name()) => 201,
        "DELETE" => 204,
        _ => 200,
    }
}

fn is_store_like(method_name: &str) -> bool {
    matches!(method_name, "store" | "create")
}

fn operation_id(route: &RouteInfo, method: &str) -> String {
    format!("{}_{}_{}", method.to_lowercase(), route.controller_class(), route.method_name())
}

/// Renames `id` with a numeric suffix (`_2`, `_3`, ...) until it's unique
/// among `seen`, then records it there. Two distinct routes that alias to
/// the same `Controller::method` action otherwise produce the identical
/// `operationId`, which most OpenAPI tooling requires to be unique.
fn dedupe_operation_id(seen: &mut std::collections::HashSet<String>, id: String) -> String {
    if seen.insert(id.clone()) {
        return id;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{id}_{suffix}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

fn humanize_method(route: &RouteInfo, method: &str) -> String {
    format!("{} {}", method.to_uppercase(), route.uri())
}

fn laravel_uri_to_openapi(uri: &str) -> String {
    let mut out = format!("/{}", uri.trim_start_matches('/'));
    out = out.replace("?}", "}");
    out
}

fn validation_error_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "message": { "type": "string" },
            "errors": { "type": "object", "additionalProperties": { "type": "array", "items": { "type": "string" } } },
        },
        "required": ["message", "errors"],
    })
}

fn bearer_security_scheme() -> Value {
    serde_json::json!({
        "bearerAuth": { "type": "http", "scheme": "bearer" }
    })
}

/// Registers `resource` as a named entry under `components.schemas` (first
/// write wins, so every route sharing a resource/transformer class reuses
/// one entry) and returns a `$ref` pointing at it. Falls back to inlining
/// the schema when no class name is known, e.g. a route with no source
/// registry entry.
fn component_ref(schemas: &mut Map<String, Value>, class_name: Option<&str>, resource: &ResourceInfo) -> Value {
    let Some(class_name) = class_name else {
        return resource_to_schema(resource);
    };
    schemas
        .entry(class_name.to_string())
        .or_insert_with(|| resource_to_schema(resource));
    serde_json::json!({ "$ref": format!("#/components/schemas/{class_name}") })
}

fn resource_to_schema(resource: &ResourceInfo) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for (name, prop) in &resource.properties {
        properties.insert(name.clone(), property_to_schema(prop));
        if !prop.conditional {
            required.push(Value::String(name.clone()));
        }
    }
    for (name, prop) in &resource.with_extra_data {
        properties.insert(name.clone(), property_to_schema(prop));
    }

    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::String("object".to_string()));
    obj.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        obj.insert("required".to_string(), Value::Array(required));
    }

    if let Some(example) = &resource.custom_example {
        obj.insert("example".to_string(), example.clone());
    }

    Value::Object(obj)
}

fn property_to_schema(prop: &PropertyInfo) -> Value {
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::String(prop.r#type.clone()));
    if let Some(format) = &prop.format {
        obj.insert("format".to_string(), Value::String(format.clone()));
    }
    if let Some(example) = &prop.example {
        obj.insert("example".to_string(), example.clone());
    }
    if let Some(items) = &prop.items {
        obj.insert("items".to_string(), property_to_schema(items));
    }
    if let Some(properties) = &prop.properties {
        let nested: Map<String, Value> =
            properties.iter().map(|(k, v)| (k.clone(), property_to_schema(v))).collect();
        obj.insert("properties".to_string(), Value::Object(nested));
    }
    if prop.conditional {
        obj.insert("nullable".to_string(), Value::Bool(true));
        let condition = prop.condition.as_deref().unwrap_or("a condition");
        obj.insert(
            "description".to_string(),
            Value::String(format!("Conditional field, present only when {condition}.")),
        );
    }
    Value::Object(obj)
}

/// Thin re-export so `build_parameters` can call `implicit_parameters`
/// without importing the whole analyzer module path inline.
struct PaginationAnalyzerExt;
impl PaginationAnalyzerExt {
    fn implicit_parameters(style: PaginationStyle) -> Vec<ParameterInfo> {
        crate::analyzers::pagination::PaginationAnalyzer::implicit_parameters(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParamSchema, RouteParameterInfo, ValidationRuleCollection, Constraints};
    use crate::schema::examples::StaticValueProvider;

    fn route(uri: &str, methods: &[&str], controller: &str, method_name: &str) -> RouteInfo {
        RouteInfo::new(
            uri.to_string(),
            methods.iter().map(|m| m.to_string()).collect(),
            controller.to_string(),
            method_name.to_string(),
            None,
            vec![],
            vec![],
        )
    }

    fn param(name: &str) -> ParameterInfo {
        let rules = ValidationRuleCollection::from_pipe_string("required|string");
        ParameterInfo {
            name: name.to_string(),
            r#type: "string".to_string(),
            format: None,
            required: true,
            nullable: false,
            description: None,
            r#enum: None,
            constraints: Constraints::default(),
            example: None,
            validation_rules: rules,
        }
    }

    fn doc(route: RouteInfo, params: Vec<ParameterInfo>) -> RouteDocumentation {
        RouteDocumentation {
            route,
            request_params: params,
            query_header_params: vec![],
            response: ResponseSource::None,
            pagination: None,
            auth: AuthRequirements::default(),
            deprecated: false,
            summary: None,
            description: None,
        }
    }

    #[test]
    fn store_post_gets_201_and_validation_error() {
        let enums = BTreeMap::new();
        let gen = OpenApiGenerator::new(&enums);
        let mut provider = StaticValueProvider::default();
        let r = route("api/users", &["POST"], "UserController", "store");
        let spec = gen.generate(vec![doc(r, vec![param("name")])], serde_json::json!({}), vec![], &mut provider);
        let op = &spec.paths["/api/users"]["post"];
        assert!(op["responses"]["201"].is_object());
        assert!(op["responses"]["422"].is_object());
        assert!(op["requestBody"].is_object());
    }

    #[test]
    fn destroy_delete_gets_204_with_no_content_body() {
        let enums = BTreeMap::new();
        let gen = OpenApiGenerator::new(&enums);
        let mut provider = StaticValueProvider::default();
        let r = RouteInfo::new(
            "api/users/{id}".to_string(),
            vec!["DELETE".to_string()],
            "UserController".to_string(),
            "destroy".to_string(),
            None,
            vec![],
            vec![RouteParameterInfo {
                name: "id".to_string(),
                required: true,
                location: ParamLocation::Path,
                schema: ParamSchema::integer(),
            }],
        );
        let spec = gen.generate(vec![doc(r, vec![])], serde_json::json!({}), vec![], &mut provider);
        let op = &spec.paths["/api/users/{id}"]["delete"];
        assert_eq!(op["responses"]["204"]["description"], "No content");
        assert!(op["responses"]["204"].get("content").is_none());
    }

    #[test]
    fn auth_requirements_add_401_and_403_responses() {
        let enums = BTreeMap::new();
        let gen = OpenApiGenerator::new(&enums);
        let mut provider = StaticValueProvider::default();
        let r = route("api/users", &["GET"], "UserController", "index");
        let mut d = doc(r, vec![]);
        d.auth = AuthRequirements { needs_401: true, needs_403: true };
        let spec = gen.generate(vec![d], serde_json::json!({}), vec![], &mut provider);
        let op = &spec.paths["/api/users"]["get"];
        assert!(op["responses"]["401"].is_object());
        assert!(op["responses"]["403"].is_object());
    }

    #[test]
    fn operation_ids_are_unique_per_method_and_route() {
        let enums = BTreeMap::new();
        let gen = OpenApiGenerator::new(&enums);
        let mut provider = StaticValueProvider::default();
        let r1 = route("api/users", &["GET"], "UserController", "index");
        let r2 = route("api/users", &["POST"], "UserController", "store");
        let spec = gen.generate(vec![doc(r1, vec![]), doc(r2, vec![])], serde_json::json!({}), vec![], &mut provider);
        let get_id = spec.paths["/api/users"]["get"]["operationId"].as_str().unwrap();
        let post_id = spec.paths["/api/users"]["post"]["operationId"].as_str().unwrap();
        assert_ne!(get_id, post_id);
    }

    #[test]
    fn two_routes_aliased_to_the_same_action_get_a_numeric_suffix() {
        let enums = BTreeMap::new();
        let gen = OpenApiGenerator::new(&enums);
        let mut provider = StaticValueProvider::default();
        let r1 = route("api/users/{id}", &["GET"], "UserController", "show");
        let r2 = route("api/accounts/{id}", &["GET"], "UserController", "show");
        let spec = gen.generate(vec![doc(r1, vec![]), doc(r2, vec![])], serde_json::json!({}), vec![], &mut provider);
        let first_id = spec.paths["/api/users/{id}"]["get"]["operationId"].as_str().unwrap();
        let second_id = spec.paths["/api/accounts/{id}"]["get"]["operationId"].as_str().unwrap();
        assert_eq!(first_id, "get_UserController_show");
        assert_eq!(second_id, "get_UserController_show_2");
    }

    #[test]
    fn resource_response_becomes_a_named_component_with_a_ref() {
        let enums = BTreeMap::new();
        let gen = OpenApiGenerator::new(&enums);
        let mut provider = StaticValueProvider::default();
        let mut resource = ResourceInfo::default();
        resource.class_name = Some("UserResource".to_string());
        resource.properties.insert("id".to_string(), PropertyInfo::scalar("integer"));
        let r = route("api/users", &["GET"], "UserController", "index");
        let mut d = doc(r, vec![]);
        d.response = ResponseSource::Resource(resource);
        let spec = gen.generate(vec![d], serde_json::json!({}), vec![], &mut provider);
        let schema = &spec.paths["/api/users"]["get"]["responses"]["200"]["content"]["application/json"]["schema"];
        assert_eq!(schema["$ref"], "#/components/schemas/UserResource");
        assert!(spec.components["schemas"]["UserResource"]["properties"]["id"].is_object());
    }
}
