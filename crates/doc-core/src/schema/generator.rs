//! Builds a JSON Schema object from a flat [`ParameterInfo`] list: dot-path
//! tree expansion, validation-rule-driven type/constraint inference, enum
//! merging, and required-field computation.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::model::{EnumInfo, ParameterInfo, Rule};
use crate::schema::examples::ExampleProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Multipart,
}

pub struct SchemaGenerator<'a> {
    enums: &'a BTreeMap<String, EnumInfo>,
}

impl<'a> SchemaGenerator<'a> {
    #[must_use]
    pub fn new(enums: &'a BTreeMap<String, EnumInfo>) -> Self {
        Self { enums }
    }

    /// Build the schema plus the content-type the request body should be
    /// tagged with (`multipart/form-data` iff any parameter has file
    /// semantics).
    pub fn build(&self, params: &[ParameterInfo], provider: &mut dyn ExampleProvider) -> (Value, ContentKind) {
        let content_kind = if params.iter().any(|p| p.validation_rules.has_file_rule()) {
            ContentKind::Multipart
        } else {
            ContentKind::Json
        };

        let mut root = TreeNode::default();
        for param in params {
            insert_path(&mut root, &split_path(&param.name), param, self.enums, provider);
        }

        (node_to_schema(&root), content_kind)
    }
}

/// Intermediate tree built from dot-paths (`a.b.c`, `tags.*`) before
/// flattening to a JSON Schema object/array nest.
#[derive(Default)]
struct TreeNode {
    leaf: Option<Value>,
    required: Vec<String>,
    children: BTreeMap<String, TreeNode>,
    is_array: bool,
}

fn split_path(name: &str) -> Vec<&str> {
    name.split('.').collect()
}

fn insert_path(
    node: &mut TreeNode,
    path: &[&str],
    param: &ParameterInfo,
    enums: &BTreeMap<String, EnumInfo>,
    provider: &mut dyn ExampleProvider,
) {
    match path {
        [] => {}
        [only] if *only != "*" => {
            let leaf = build_leaf_schema(param, enums, provider);
            node.children.entry((*only).to_string()).or_default().leaf = Some(leaf);
            if param.required {
                node.required.push((*only).to_string());
            }
        }
        [only] if *only == "*" => {
            node.is_array = true;
            node.leaf = Some(build_leaf_schema(param, enums, provider));
        }
        [head, rest @ ..] => {
            if *head == "*" {
                node.is_array = true;
                let entry = node.children.entry(String::new()).or_default();
                insert_path(entry, rest, param, enums, provider);
            } else {
                let entry = node.children.entry((*head).to_string()).or_default();
                insert_path(entry, rest, param, enums, provider);
            }
        }
    }
}

fn build_leaf_schema(
    param: &ParameterInfo,
    enums: &BTreeMap<String, EnumInfo>,
    provider: &mut dyn ExampleProvider,
) -> Value {
    let (mut r#type, mut format) = infer_type_format(&param.validation_rules);
    if param.format.is_some() {
        format = param.format.clone();
    }

    let mut schema = Map::new();

    let mut enum_values: Option<Vec<String>> = param.r#enum.clone();
    for rule in param.validation_rules.rules() {
        if let Rule::Enum(class) = rule {
            if let Some(info) = enums.get(class) {
                enum_values = Some(info.values.clone());
                r#type = match info.backing_type {
                    crate::model::BackingType::Integer => "integer".to_string(),
                    _ => "string".to_string(),
                };
            }
        }
        if let Rule::In(values) = rule {
            enum_values = Some(values.clone());
        }
    }

    schema.insert("type".to_string(), Value::String(r#type.clone()));
    if let Some(f) = &format {
        schema.insert("format".to_string(), Value::String(f.clone()));
    }
    if let Some(values) = &enum_values {
        schema.insert(
            "enum".to_string(),
            Value::Array(values.iter().map(|v| Value::String(v.clone())).collect()),
        );
    }
    if param.nullable {
        schema.insert("nullable".to_string(), Value::Bool(true));
    }

    apply_constraints(&mut schema, &r#type, &param.validation_rules);

    let example = provider.example_for(&param.name, &r#type, format.as_deref());
    schema.insert("example".to_string(), example);

    Value::Object(schema)
}

fn infer_type_format(rules: &crate::model::ValidationRuleCollection) -> (String, Option<String>) {
    for rule in rules.rules() {
        let Rule::Token(t) = rule else { continue };
        let base = t.split(':').next().unwrap_or(t);
        let mapped: Option<(&str, Option<&str>)> = match base {
            "string" => Some(("string", None)),
            "integer" => Some(("integer", None)),
            "numeric" => Some(("number", None)),
            "boolean" => Some(("boolean", None)),
            "array" => Some(("array", None)),
            "file" | "image" => Some(("string", Some("binary"))),
            "uuid" => Some(("string", Some("uuid"))),
            "email" => Some(("string", Some("email"))),
            "url" => Some(("string", Some("uri"))),
            "date" => Some(("string", Some("date"))),
            "ip" => Some(("string", Some("ipv4"))),
            _ => None,
        };
        if let Some((ty, fmt)) = mapped {
            return (ty.to_string(), fmt.map(ToString::to_string));
        }
    }
    if rules.has_file_rule() {
        return ("string".to_string(), Some("binary".to_string()));
    }
    ("string".to_string(), None)
}

fn apply_constraints(schema: &mut Map<String, Value>, r#type: &str, rules: &crate::model::ValidationRuleCollection) {
    let numeric_ish = matches!(r#type, "integer" | "number");
    let array_ish = r#type == "array";

    for rule in rules.rules() {
        let Rule::Token(t) = rule else {
            if let Rule::Regex(pattern) = rule {
                schema.insert("pattern".to_string(), Value::String(pattern.clone()));
            }
            continue;
        };
        if let Some(pattern) = t.strip_prefix("regex:") {
            let trimmed = pattern.trim_start_matches('/').trim_end_matches('/');
            schema.insert("pattern".to_string(), Value::String(format!("^{trimmed}$")));
        } else if let Some(n) = t.strip_prefix("min:").and_then(|v| v.parse::<f64>().ok()) {
            insert_bound(schema, r#type, "min", n, numeric_ish, array_ish);
        } else if let Some(n) = t.strip_prefix("max:").and_then(|v| v.parse::<f64>().ok()) {
            insert_bound(schema, r#type, "max", n, numeric_ish, array_ish);
        } else if let Some(range) = t.strip_prefix("between:") {
            if let Some((lo, hi)) = range.split_once(',') {
                if let (Ok(lo), Ok(hi)) = (lo.parse::<f64>(), hi.parse::<f64>()) {
                    insert_bound(schema, r#type, "min", lo, numeric_ish, array_ish);
                    insert_bound(schema, r#type, "max", hi, numeric_ish, array_ish);
                }
            }
        } else if let Some(list) = t.strip_prefix("in:") {
            let values: Vec<Value> = list.split(',').map(|v| Value::String(v.to_string())).collect();
            schema.insert("enum".to_string(), Value::Array(values));
        }
    }
}

fn insert_bound(
    schema: &mut Map<String, Value>,
    _type: &str,
    which: &str,
    value: f64,
    numeric_ish: bool,
    array_ish: bool,
) {
    let key = match (which, numeric_ish, array_ish) {
        ("min", true, _) => "minimum",
        ("max", true, _) => "maximum",
        ("min", _, true) => "minItems",
        ("max", _, true) => "maxItems",
        ("min", ..) => "minLength",
        _ => "maxLength",
    };
    let v = if numeric_ish { Value::from(value) } else { Value::from(value as u64) };
    schema.insert(key.to_string(), v);
}

fn node_to_schema(node: &TreeNode) -> Value {
    if let Some(leaf) = &node.leaf {
        if node.is_array && node.children.is_empty() {
            let mut obj = Map::new();
            obj.insert("type".to_string(), Value::String("array".to_string()));
            obj.insert("items".to_string(), leaf.clone());
            return Value::Object(obj);
        }
        if node.children.is_empty() {
            return leaf.clone();
        }
    }

    let mut properties = Map::new();
    for (key, child) in &node.children {
        if key.is_empty() {
            continue;
        }
        properties.insert(key.clone(), node_to_schema(child));
    }

    if node.is_array {
        let items = node
            .children
            .get("")
            .map(node_to_schema)
            .unwrap_or_else(|| Value::Object(Map::new()));
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::String("array".to_string()));
        obj.insert("items".to_string(), items);
        return Value::Object(obj);
    }

    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::String("object".to_string()));
    obj.insert("properties".to_string(), Value::Object(properties));
    if !node.required.is_empty() {
        obj.insert(
            "required".to_string(),
            Value::Array(node.required.iter().cloned().map(Value::String).collect()),
        );
    }
    Value::Object(obj)
}
