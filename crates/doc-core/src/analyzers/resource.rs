//! Analyzes response-resource classes: an associative-array-returning
//! `to_array()`-style method becomes a [`ResourceInfo`] tree.

use std::collections::BTreeMap;

use syn::{Expr, File, ImplItemFn, ItemImpl, Stmt};

use crate::model::{PropertyInfo, ResourceInfo};

pub struct ResourceAnalyzer;

impl ResourceAnalyzer {
    /// Analyze the `to_array()` method of `class_name`'s impl block.
    #[must_use]
    pub fn analyze(file: &File, class_name: &str) -> Option<ResourceInfo> {
        let imp = find_impl(file, class_name)?;
        let method = find_method(imp, "to_array")?;
        let array = return_array(method)?;

        let mut info = ResourceInfo::default();
        info.class_name = Some(class_name.to_string());
        for elem in &array.elems {
            let Expr::Tuple(t) = elem else { continue };
            let (Some(key_expr), Some(val_expr)) = (t.elems.first(), t.elems.get(1)) else { continue };
            let Some(key) = string_literal(key_expr) else { continue };
            if key == "meta" || key == "*with" {
                if let Some(PropertyInfo { properties: Some(props), .. }) = infer_property(val_expr) {
                    info.with_extra_data = props;
                }
                continue;
            }
            let prop = infer_property(val_expr).unwrap_or_else(|| PropertyInfo::scalar("string"));
            if let Some(nested) = &prop.relation {
                info.nested_resources.push(nested.clone());
            }
            if prop.conditional {
                info.conditional_fields.push(key.clone());
            }
            info.properties.insert(key, prop);
        }

        if let Some(custom) = find_method(imp, "custom_example") {
            info.custom_example = return_json_literal(custom);
            info.has_examples = info.custom_example.is_some();
        }

        Some(info)
    }
}

fn find_impl<'a>(file: &'a File, class_name: &str) -> Option<&'a ItemImpl> {
    file.items.iter().find_map(|item| match item {
        syn::Item::Impl(imp) => {
            if let syn::Type::Path(p) = &*imp.self_ty {
                if p.path.segments.last().is_some_and(|s| s.ident == class_name) {
                    return Some(imp);
                }
            }
            None
        }
        _ => None,
    })
}

fn find_method<'a>(imp: &'a ItemImpl, name: &str) -> Option<&'a ImplItemFn> {
    imp.items.iter().find_map(|item| match item {
        syn::ImplItem::Fn(f) if f.sig.ident == name => Some(f),
        _ => None,
    })
}

fn return_array(f: &ImplItemFn) -> Option<&syn::ExprArray> {
    f.block.stmts.iter().find_map(|stmt| match stmt {
        Stmt::Expr(Expr::Array(arr), _) => Some(arr),
        Stmt::Expr(Expr::Return(r), _) => {
            if let Some(Expr::Array(arr)) = r.expr.as_deref() {
                Some(arr)
            } else {
                None
            }
        }
        _ => None,
    })
}

/// Best-effort JSON literal extraction for a class-level custom-example
/// hook — only covers string/number/bool/array-of-tuples shapes, which
/// is all a static example needs.
fn return_json_literal(f: &ImplItemFn) -> Option<serde_json::Value> {
    let arr = return_array(f)?;
    Some(serde_json::Value::Object(
        arr.elems
            .iter()
            .filter_map(|elem| {
                let Expr::Tuple(t) = elem else { return None };
                let key = string_literal(t.elems.first()?)?;
                let value = expr_to_json(t.elems.get(1)?)?;
                Some((key, value))
            })
            .collect(),
    ))
}

fn expr_to_json(expr: &Expr) -> Option<serde_json::Value> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            syn::Lit::Str(s) => Some(serde_json::Value::String(s.value())),
            syn::Lit::Int(i) => i.base10_parse::<i64>().ok().map(|n| serde_json::Value::Number(n.into())),
            syn::Lit::Bool(b) => Some(serde_json::Value::Bool(b.value)),
            _ => None,
        },
        _ => None,
    }
}

fn string_literal(expr: &Expr) -> Option<String> {
    if let Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(s), .. }) = expr {
        Some(s.value())
    } else {
        None
    }
}

fn call_path_ident(expr: &Expr) -> Option<String> {
    if let Expr::Path(p) = expr {
        p.path.segments.last().map(|s| s.ident.to_string())
    } else {
        None
    }
}

/// Infer a [`PropertyInfo`] from a resource field's value expression.
///
/// Shared with [`super::transformer`]: a Fractal `transform()` array literal
/// is extracted identically to a Resource `to_array()` one.
pub(crate) fn infer_property(expr: &Expr) -> Option<PropertyInfo> {
    match expr {
        Expr::Cast(c) => Some(PropertyInfo::scalar(cast_type_name(&c.ty))),
        Expr::Lit(lit) => Some(match &lit.lit {
            syn::Lit::Str(_) => PropertyInfo::scalar("string"),
            syn::Lit::Int(_) => PropertyInfo::scalar("integer"),
            syn::Lit::Float(_) => PropertyInfo::scalar("number"),
            syn::Lit::Bool(_) => PropertyInfo::scalar("boolean"),
            _ => PropertyInfo::scalar("string"),
        }),
        Expr::Binary(b) if matches!(b.op, syn::BinOp::Add(_)) => Some(PropertyInfo::scalar("string")),
        Expr::MethodCall(mc) => infer_method_call(mc),
        Expr::Call(call) => infer_call(call),
        Expr::Field(field) => {
            if field_name(field) == "value" {
                Some(PropertyInfo::scalar("string"))
            } else {
                Some(PropertyInfo::scalar("string"))
            }
        }
        _ => None,
    }
}

fn field_expr_name(expr: &Expr) -> Option<String> {
    if let Expr::Field(f) = expr {
        Some(field_name(f))
    } else {
        None
    }
}

fn field_name(field: &syn::ExprField) -> String {
    match &field.member {
        syn::Member::Named(ident) => ident.to_string(),
        syn::Member::Unnamed(idx) => idx.index.to_string(),
    }
}

fn cast_type_name(ty: &syn::Type) -> &'static str {
    if let syn::Type::Path(p) = ty {
        let name = p.path.segments.last().map(|s| s.ident.to_string()).unwrap_or_default();
        return match name.as_str() {
            "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => "integer",
            "f32" | "f64" => "number",
            "bool" => "boolean",
            _ => "string",
        };
    }
    "string"
}

fn infer_method_call(mc: &syn::ExprMethodCall) -> Option<PropertyInfo> {
    match mc.method.to_string().as_str() {
        "to_iso8601_string" | "to_rfc3339" => {
            let mut p = PropertyInfo::scalar("string");
            p.format = Some("date-time".to_string());
            Some(p)
        }
        "count" | "len" => Some(PropertyInfo::scalar("integer")),
        "when" => {
            let args: Vec<&Expr> = mc.args.iter().collect();
            let cond_expr = *args.first()?;
            let mut p = infer_property(args.get(1)?).unwrap_or_else(|| PropertyInfo::scalar("string"));
            p.conditional = true;
            p.condition = Some(string_literal(cond_expr).unwrap_or_else(|| quote::quote!(#cond_expr).to_string()));
            Some(p)
        }
        "when_loaded" => {
            let args: Vec<&Expr> = mc.args.iter().collect();
            let mut p = args
                .get(1)
                .and_then(|e| infer_property(e))
                .unwrap_or_else(|| PropertyInfo::scalar("object"));
            p.conditional = true;
            p.relation = string_literal(args.first()?);
            Some(p)
        }
        "merge_when" => {
            let mut p = PropertyInfo::scalar("object");
            p.conditional = true;
            Some(p)
        }
        "collection" => {
            let receiver = &mc.receiver;
            let receiver_name = call_path_ident(receiver)
                .or_else(|| field_expr_name(receiver))
                .unwrap_or_else(|| quote::quote!(#receiver).to_string());
            let mut p = PropertyInfo::scalar("array");
            p.items = Some(Box::new(PropertyInfo::scalar("object")));
            p.relation = Some(receiver_name);
            Some(p)
        }
        _ => None,
    }
}

/// Matches both the bare tuple-call form `XResource(expr)` (a single path
/// segment) and the canonical associated-function forms `XResource::new(expr)`
/// / `XResource::collection(expr)` (the resource name sits ahead of the last
/// segment), so any segment naming a `*Resource`/`*Transformer` type counts.
fn infer_call(call: &syn::ExprCall) -> Option<PropertyInfo> {
    let syn::Expr::Path(p) = &*call.func else { return None };
    let last = p.path.segments.last()?.ident.to_string();
    let resource_name = p
        .path
        .segments
        .iter()
        .map(|s| s.ident.to_string())
        .find(|name| name.ends_with("Resource") || name.ends_with("Transformer"))?;

    let mut prop = if last == "collection" {
        let mut p = PropertyInfo::scalar("array");
        p.items = Some(Box::new(PropertyInfo::scalar("object")));
        p
    } else {
        PropertyInfo::scalar("object")
    };
    prop.relation = Some(resource_name);
    Some(prop)
}
