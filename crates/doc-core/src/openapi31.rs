//! Idempotent `OpenAPI` 3.0.x → 3.1.0 structural transform, operating on the
//! assembled document's `serde_json::Value` tree rather than a typed
//! [`crate::openapi::OpenApiSpec`] — the same tree-walk shape used to patch
//! a document after the fact instead of only at construction time.

use serde_json::{Map, Value};

const JSON_SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

pub struct OpenApi31Converter;

impl OpenApi31Converter {
    /// Convert `doc` in place. A no-op if `jsonSchemaDialect` is already
    /// present — that key marks the document as already converted.
    pub fn convert(doc: &mut Value) {
        let Value::Object(map) = doc else { return };
        if map.contains_key("jsonSchemaDialect") {
            return;
        }

        map.insert("openapi".to_string(), Value::String("3.1.0".to_string()));
        map.insert(
            "jsonSchemaDialect".to_string(),
            Value::String(JSON_SCHEMA_DIALECT.to_string()),
        );
        if !map.contains_key("webhooks") {
            map.insert("webhooks".to_string(), Value::Object(Map::new()));
        }

        for key in ["paths", "components"] {
            if let Some(section) = map.get_mut(key) {
                convert_schemas(section);
            }
        }
    }
}

/// Recurse through everything that can nest a schema object: path items,
/// operations, request/response bodies, parameters, and component
/// collections.
fn convert_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let is_schema_shaped = map.contains_key("type")
                || map.contains_key("nullable")
                || map.contains_key("properties")
                || map.contains_key("allOf")
                || map.contains_key("anyOf")
                || map.contains_key("oneOf");
            if is_schema_shaped {
                convert_nullable(value);
                apply_byte_encoding(value);
            }
            if let Value::Object(map) = value {
                for (_, v) in map.iter_mut() {
                    convert_schemas(v);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                convert_schemas(item);
            }
        }
        _ => {}
    }
}

/// `nullable: true` folds into `type`: a scalar `type:"X"` becomes
/// `type:["X","null"]`; an existing array type gains `"null"` if absent.
/// `nullable:false` is simply dropped — removal is itself idempotent.
fn convert_nullable(value: &mut Value) {
    let Value::Object(map) = value else { return };
    let Some(nullable) = map.remove("nullable") else { return };
    if nullable != Value::Bool(true) {
        return;
    }

    match map.remove("type") {
        Some(Value::String(t)) => {
            map.insert("type".to_string(), Value::Array(vec![Value::String(t), Value::String("null".to_string())]));
        }
        Some(Value::Array(mut types)) => {
            if !types.iter().any(|v| v == "null") {
                types.push(Value::String("null".to_string()));
            }
            map.insert("type".to_string(), Value::Array(types));
        }
        Some(other) => {
            map.insert("type".to_string(), other);
        }
        None => {}
    }
}

/// `{type:"string", format:"byte"}` without an explicit `contentEncoding`
/// gets `contentEncoding:"base64"` — supplements the nullable conversion
/// for binary-string fields our schema generator emits for file uploads.
fn apply_byte_encoding(value: &mut Value) {
    let Value::Object(map) = value else { return };
    let is_byte_string = map.get("type").and_then(Value::as_str) == Some("string")
        && map.get("format").and_then(Value::as_str) == Some("byte");
    if is_byte_string && !map.contains_key("contentEncoding") {
        map.insert("contentEncoding".to_string(), Value::String("base64".to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_version_and_dialect() {
        let mut doc = serde_json::json!({"openapi": "3.0.3", "paths": {}, "components": {}});
        OpenApi31Converter::convert(&mut doc);
        assert_eq!(doc["openapi"], "3.1.0");
        assert_eq!(doc["jsonSchemaDialect"], JSON_SCHEMA_DIALECT);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let mut doc = serde_json::json!({"openapi": "3.0.3", "paths": {}, "components": {}});
        OpenApi31Converter::convert(&mut doc);
        let once = doc.clone();
        OpenApi31Converter::convert(&mut doc);
        assert_eq!(doc, once);
    }

    #[test]
    fn nullable_true_folds_into_type_array() {
        let mut doc = serde_json::json!({
            "paths": {
                "/x": { "get": { "responses": { "200": { "content": { "application/json": {
                    "schema": { "type": "string", "nullable": true }
                }}}}}}
            },
            "components": {}
        });
        OpenApi31Converter::convert(&mut doc);
        let schema = &doc["paths"]["/x"]["get"]["responses"]["200"]["content"]["application/json"]["schema"];
        assert_eq!(schema["type"], serde_json::json!(["string", "null"]));
        assert!(schema.get("nullable").is_none());
    }

    #[test]
    fn nullable_false_is_removed_without_type_change() {
        let mut doc = serde_json::json!({
            "paths": {},
            "components": { "schemas": { "X": { "type": "string", "nullable": false } } }
        });
        OpenApi31Converter::convert(&mut doc);
        let schema = &doc["components"]["schemas"]["X"];
        assert_eq!(schema["type"], "string");
        assert!(schema.get("nullable").is_none());
    }

    #[test]
    fn byte_format_gets_base64_content_encoding() {
        let mut doc = serde_json::json!({
            "paths": {},
            "components": { "schemas": { "Avatar": { "type": "string", "format": "byte" } } }
        });
        OpenApi31Converter::convert(&mut doc);
        assert_eq!(doc["components"]["schemas"]["Avatar"]["contentEncoding"], "base64");
    }

    #[test]
    fn missing_webhooks_defaults_to_empty_object() {
        let mut doc = serde_json::json!({"openapi": "3.0.3", "paths": {}, "components": {}});
        OpenApi31Converter::convert(&mut doc);
        assert_eq!(doc["webhooks"], serde_json::json!({}));
    }
}
