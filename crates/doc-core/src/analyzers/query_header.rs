//! Walks a controller method body for request-accessor calls
//! (`request.input(k, default)`, `request.query(k)`, `request.integer(k)`,
//! `request.filled(k)`, `request.header(k)`, `request.bearer_token()`, …)
//! and emits query/header [`ParameterInfo`] entries.

use syn::{Expr, ImplItemFn};

use crate::model::{Constraints, ParameterInfo, ValidationRuleCollection};

/// Where a discovered parameter was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Location {
    Query,
    Header,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredParameter {
    pub location: Location,
    pub parameter: ParameterInfo,
}

pub struct QueryHeaderAnalyzer;

impl QueryHeaderAnalyzer {
    /// `exclude` lists parameter names already covered by a form-request or
    /// inline-validation analyzer for the same method — those are skipped
    /// here to avoid duplicate entries.
    #[must_use]
    pub fn analyze(method: &ImplItemFn, exclude: &[String]) -> Vec<DiscoveredParameter> {
        struct Collector(Vec<DiscoveredParameter>);
        impl<'ast> syn::visit::Visit<'ast> for Collector {
            fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
                if let Some(found) = classify(node) {
                    self.0.push(found);
                }
                syn::visit::visit_expr_method_call(self, node);
            }
        }
        let mut collector = Collector(Vec::new());
        syn::visit::visit_impl_item_fn(&mut collector, method);

        let mut seen = std::collections::BTreeSet::new();
        collector
            .0
            .into_iter()
            .filter(|d| !exclude.contains(&d.parameter.name))
            .filter(|d| seen.insert((d.location, d.parameter.name.clone())))
            .collect()
    }
}

fn classify(mc: &syn::ExprMethodCall) -> Option<DiscoveredParameter> {
    let method = mc.method.to_string();
    let args: Vec<&Expr> = mc.args.iter().collect();

    match method.as_str() {
        "input" | "query" | "get" => {
            let name = string_literal(*args.first()?)?;
            Some(query_param(name, "string", false))
        }
        "integer" => Some(query_param(string_literal(*args.first()?)?, "integer", false)),
        "float" => Some(query_param(string_literal(*args.first()?)?, "number", false)),
        "boolean" => Some(query_param(string_literal(*args.first()?)?, "boolean", false)),
        "array" => Some(query_param(string_literal(*args.first()?)?, "array", false)),
        "string" if !args.is_empty() => Some(query_param(string_literal(*args.first()?)?, "string", false)),
        "filled" | "has" => Some(query_param(string_literal(*args.first()?)?, "string", true)),
        "header" => Some(header_param(string_literal(*args.first()?)?, false)),
        "has_header" => Some(header_param(string_literal(*args.first()?)?, true)),
        "bearer_token" => Some(header_param("Authorization".to_string(), false)),
        _ => None,
    }
}

fn query_param(name: String, ty: &str, required: bool) -> DiscoveredParameter {
    DiscoveredParameter {
        location: Location::Query,
        parameter: ParameterInfo {
            name,
            r#type: ty.to_string(),
            format: None,
            required,
            nullable: false,
            description: None,
            r#enum: None,
            constraints: Constraints::default(),
            example: None,
            validation_rules: ValidationRuleCollection::default(),
        },
    }
}

fn header_param(name: String, required: bool) -> DiscoveredParameter {
    DiscoveredParameter {
        location: Location::Header,
        parameter: ParameterInfo {
            name,
            r#type: "string".to_string(),
            format: None,
            required,
            nullable: false,
            description: None,
            r#enum: None,
            constraints: Constraints::default(),
            example: None,
            validation_rules: ValidationRuleCollection::default(),
        },
    }
}

fn string_literal(expr: &Expr) -> Option<String> {
    if let Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(s), .. }) = expr {
        Some(s.value())
    } else {
        None
    }
}
