//! Extracts validation rules from inline `validate([...])` /
//! `request().validate([...])` / `Validator::make(data, [...]).validate()`
//! calls inside a controller method body, including rule arrays built up
//! across straight-line assignments and simple conditionals.

use syn::{Expr, ExprMethodCall, ImplItemFn, Stmt};

use crate::analyzers::form_request::ConditionalRuleSet;
use crate::analyzers::rules::extract_field_rules;
use crate::model::{Constraints, ParameterInfo, ValidationRuleCollection};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineValidationInfo {
    pub parameters: Vec<ParameterInfo>,
    pub conditional_rule_sets: Vec<ConditionalRuleSet>,
}

pub struct InlineValidationAnalyzer;

impl InlineValidationAnalyzer {
    /// Walk `method`'s body. Returns `None` if no recognizable validate
    /// call is found (the common case: the method doesn't validate inline
    /// at all, which is not an error).
    #[must_use]
    pub fn analyze(method: &ImplItemFn) -> Option<InlineValidationInfo> {
        if !has_validate_call(method) {
            return None;
        }

        let mut info = InlineValidationInfo::default();
        let mut rules_var_name: Option<String> = None;

        for stmt in &method.block.stmts {
            match stmt {
                Stmt::Local(local) => {
                    if let Some(init) = &local.init {
                        if let Expr::Array(arr) = &*init.expr {
                            info.parameters = field_map_to_parameters(arr);
                            rules_var_name = local_ident(local);
                        }
                    }
                }
                Stmt::Expr(Expr::If(if_expr), _) => {
                    if let Some(var) = &rules_var_name {
                        if let Some(set) = conditional_insert_set(if_expr, var) {
                            info.conditional_rule_sets.push(set);
                        }
                    }
                }
                Stmt::Expr(Expr::MethodCall(mc), _) => {
                    if let Some(var) = &rules_var_name {
                        if method_call_is_insert_on(mc, var) {
                            if let Some(param) = insert_call_to_parameter(mc) {
                                info.parameters.push(param);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Some(info)
    }
}

fn local_ident(local: &syn::Local) -> Option<String> {
    if let syn::Pat::Ident(p) = &local.pat {
        Some(p.ident.to_string())
    } else {
        None
    }
}

fn has_validate_call(method: &ImplItemFn) -> bool {
    struct Finder(bool);
    impl<'ast> syn::visit::Visit<'ast> for Finder {
        fn visit_expr_method_call(&mut self, node: &'ast ExprMethodCall) {
            if node.method == "validate" {
                self.0 = true;
            }
            syn::visit::visit_expr_method_call(self, node);
        }
    }
    let mut finder = Finder(false);
    syn::visit::visit_impl_item_fn(&mut finder, method);
    finder.0
}

fn field_map_to_parameters(arr: &syn::ExprArray) -> Vec<ParameterInfo> {
    arr.elems
        .iter()
        .filter_map(|elem| {
            let Expr::Tuple(t) = elem else { return None };
            let name = string_literal(t.elems.first()?)?;
            let rules = extract_field_rules(t.elems.get(1)?);
            Some(param_from_rules(name, ValidationRuleCollection::from_rules(rules)))
        })
        .collect()
}

fn param_from_rules(name: String, rules: ValidationRuleCollection) -> ParameterInfo {
    ParameterInfo {
        required: rules.is_required(),
        nullable: rules.is_nullable(),
        name,
        r#type: "string".to_string(),
        format: None,
        description: None,
        r#enum: None,
        constraints: Constraints::default(),
        example: None,
        validation_rules: rules,
    }
}

fn string_literal(expr: &Expr) -> Option<String> {
    if let Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(s), .. }) = expr {
        Some(s.value())
    } else {
        None
    }
}

/// `rules.insert("field", "rule|string")` — the idiomatic-Rust stand-in
/// for PHP's `$rules['field'] = '...'` dynamic-array assignment.
fn method_call_is_insert_on(mc: &ExprMethodCall, var: &str) -> bool {
    mc.method == "insert"
        && matches!(&*mc.receiver, Expr::Path(p) if p.path.is_ident(var))
}

fn insert_call_to_parameter(mc: &ExprMethodCall) -> Option<ParameterInfo> {
    let args: Vec<&Expr> = mc.args.iter().collect();
    let name = string_literal(args.first()?)?;
    let rules = extract_field_rules(args.get(1)?);
    Some(param_from_rules(name, ValidationRuleCollection::from_rules(rules)))
}

fn conditional_insert_set(if_expr: &syn::ExprIf, var: &str) -> Option<ConditionalRuleSet> {
    let cond = &if_expr.cond;
    let predicate = quote::quote!(#cond).to_string();
    let mut parameters = Vec::new();
    for stmt in &if_expr.then_branch.stmts {
        let mc = match stmt {
            Stmt::Expr(Expr::MethodCall(mc), _) => mc,
            _ => continue,
        };
        if method_call_is_insert_on(mc, var) {
            if let Some(param) = insert_call_to_parameter(mc) {
                parameters.push(param);
            }
        }
    }
    if parameters.is_empty() {
        None
    } else {
        Some(ConditionalRuleSet { predicate, parameters })
    }
}
