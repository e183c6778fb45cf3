//! `export:postman` / `export:insomnia`: convert the assembled `OpenAPI`
//! document into an API-client collection format.

use std::path::Path;

use anyhow::Context;
use serde_json::{json, Value};

use crate::commands::generate::build_document_for_export;
use crate::config::ProjectConfig;

pub fn postman(config: &ProjectConfig, output: &Path) -> anyhow::Result<()> {
    let spec = build_document_for_export(config)?;
    let collection = to_postman_collection(&spec);
    write_json(output, &collection)
}

pub fn insomnia(config: &ProjectConfig, output: &Path) -> anyhow::Result<()> {
    let spec = build_document_for_export(config)?;
    let collection = to_insomnia_export(&spec);
    write_json(output, &collection)
}

fn write_json(path: &Path, value: &Value) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    std::fs::write(path, rendered)
        .with_context(|| format!("failed to write export to {}", path.display()))?;
    eprintln!("Collection written to {}", path.display());
    Ok(())
}

/// Postman Collection v2.1 schema: one folder-free flat list of requests,
/// one per `OpenAPI` operation, with the base server URL as a collection
/// variable.
fn to_postman_collection(spec: &Value) -> Value {
    let title = spec["info"]["title"].as_str().unwrap_or("API").to_string();
    let base_url = spec["servers"][0]["url"].as_str().unwrap_or("{{baseUrl}}").to_string();

    let mut items = Vec::new();
    if let Some(paths) = spec["paths"].as_object() {
        for (path, methods) in paths {
            let Some(methods) = methods.as_object() else { continue };
            for (method, operation) in methods {
                items.push(postman_item(method, path, operation, &base_url));
            }
        }
    }

    json!({
        "info": {
            "name": title,
            "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json",
        },
        "variable": [{"key": "baseUrl", "value": base_url}],
        "item": items,
    })
}

fn postman_item(method: &str, path: &str, operation: &Value, base_url: &str) -> Value {
    let name = operation["summary"]
        .as_str()
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("{} {}", method.to_uppercase(), path));

    let url = format!("{base_url}{}", postman_path(path));
    let mut request = json!({
        "method": method.to_uppercase(),
        "url": {"raw": url, "host": ["{{baseUrl}}"], "path": postman_path_segments(path)},
    });

    if let Some(body) = operation["requestBody"]["content"].as_object().and_then(|c| c.values().next()) {
        if let Some(schema) = body.get("schema") {
            request["body"] = json!({
                "mode": "raw",
                "raw": serde_json::to_string_pretty(&example_from_schema(schema)).unwrap_or_default(),
                "options": {"raw": {"language": "json"}},
            });
        }
    }

    json!({"name": name, "request": request})
}

/// `{id}` → `:id`, Postman's path-variable convention.
fn postman_path(path: &str) -> String {
    path.replace('{', ":").replace('}', "")
}

fn postman_path_segments(path: &str) -> Vec<String> {
    postman_path(path).split('/').filter(|s| !s.is_empty()).map(ToString::to_string).collect()
}

/// Insomnia v4 export format: a flat resource list with `_type: "request"`
/// entries under a single workspace resource.
fn to_insomnia_export(spec: &Value) -> Value {
    let title = spec["info"]["title"].as_str().unwrap_or("API").to_string();
    let base_url = spec["servers"][0]["url"].as_str().unwrap_or("").to_string();

    let workspace_id = "__WORKSPACE_1__";
    let mut resources = vec![json!({
        "_id": workspace_id,
        "_type": "workspace",
        "name": title,
    })];

    if let Some(paths) = spec["paths"].as_object() {
        let mut counter = 0;
        for (path, methods) in paths {
            let Some(methods) = methods.as_object() else { continue };
            for (method, operation) in methods {
                counter += 1;
                resources.push(insomnia_request(
                    &format!("__REQ_{counter}__"),
                    workspace_id,
                    method,
                    path,
                    operation,
                    &base_url,
                ));
            }
        }
    }

    json!({
        "_type": "export",
        "__export_format": 4,
        "resources": resources,
    })
}

fn insomnia_request(id: &str, workspace_id: &str, method: &str, path: &str, operation: &Value, base_url: &str) -> Value {
    let name = operation["summary"].as_str().map(ToString::to_string).unwrap_or_else(|| path.to_string());
    json!({
        "_id": id,
        "_type": "request",
        "parentId": workspace_id,
        "name": name,
        "method": method.to_uppercase(),
        "url": format!("{base_url}{path}"),
    })
}

/// Best-effort example body from a JSON-Schema-shaped request body, for
/// collection requests that ship a ready-to-edit payload.
fn example_from_schema(schema: &Value) -> Value {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return json!({});
    };
    let mut out = serde_json::Map::new();
    for (name, prop) in properties {
        let value = prop.get("example").cloned().unwrap_or(Value::Null);
        out.insert(name.clone(), value);
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec() -> Value {
        json!({
            "info": {"title": "Test API"},
            "servers": [{"url": "https://api.example.com"}],
            "paths": {
                "/users/{id}": {
                    "get": {"summary": "Show user"},
                },
            },
        })
    }

    #[test]
    fn postman_collection_has_one_item_per_operation() {
        let collection = to_postman_collection(&sample_spec());
        assert_eq!(collection["item"].as_array().unwrap().len(), 1);
        assert_eq!(collection["item"][0]["name"], "Show user");
    }

    #[test]
    fn postman_path_variables_use_colon_syntax() {
        assert_eq!(postman_path("/users/{id}/posts/{postId}"), "/users/:id/posts/:postId");
    }

    #[test]
    fn insomnia_export_has_workspace_and_request_resources() {
        let export = to_insomnia_export(&sample_spec());
        let resources = export["resources"].as_array().unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0]["_type"], "workspace");
        assert_eq!(resources[1]["_type"], "request");
    }
}
