//! Extracts validation rules, custom messages, attribute labels, and the
//! authorization hint from a form-request class's `rules()`/`messages()`/
//! `attributes()`/`authorize()` associated functions.

use std::collections::BTreeMap;

use syn::visit::{self, Visit};
use syn::{Expr, ExprIf, ExprMatch, File, ImplItemFn, ItemImpl, ReturnType, Stmt};

use crate::analyzers::rules::extract_field_rules;
use crate::model::{ParameterInfo, ValidationRuleCollection};

/// A rule set reached only under a detected predicate (`if`/`match` arm,
/// an `is_method("POST")`-style guard).
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalRuleSet {
    pub predicate: String,
    pub parameters: Vec<ParameterInfo>,
}

/// Output of [`FormRequestAnalyzer::analyze`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormRequestInfo {
    pub parameters: Vec<ParameterInfo>,
    pub conditional_rule_sets: Vec<ConditionalRuleSet>,
    pub messages: BTreeMap<String, String>,
    pub attributes: BTreeMap<String, String>,
    pub authorize_hint: Option<bool>,
}

/// Walks the AST of a form-request class's `rules()` body. Never returns
/// `Err`: an unresolvable rule expression collapses to [`crate::model::Rule::Custom`]
/// and the field is still emitted with a best-effort type.
pub struct FormRequestAnalyzer;

impl FormRequestAnalyzer {
    /// Analyze the `impl` block for `class_name` within `file`.
    #[must_use]
    pub fn analyze(file: &File, class_name: &str) -> Option<FormRequestInfo> {
        let target = find_impl_for(file, class_name)?;
        Some(analyze_impl(target))
    }
}

fn find_impl_for<'a>(file: &'a File, class_name: &str) -> Option<&'a ItemImpl> {
    file.items.iter().find_map(|item| match item {
        syn::Item::Impl(imp) if type_name_matches(imp, class_name) => Some(imp),
        _ => None,
    })
}

fn type_name_matches(imp: &ItemImpl, class_name: &str) -> bool {
    if let syn::Type::Path(p) = &*imp.self_ty {
        p.path.segments.last().is_some_and(|s| s.ident == class_name)
    } else {
        false
    }
}

fn analyze_impl(imp: &ItemImpl) -> FormRequestInfo {
    let mut info = FormRequestInfo::default();

    for item in &imp.items {
        let syn::ImplItem::Fn(f) = item else { continue };
        match f.sig.ident.to_string().as_str() {
            "rules" => {
                let (base, conditional) = extract_rules_body(f);
                info.parameters = base;
                info.conditional_rule_sets = conditional;
            }
            "messages" => info.messages = extract_string_map(f),
            "attributes" => info.attributes = extract_string_map(f),
            "authorize" => info.authorize_hint = extract_bool_return(f),
            _ => {}
        }
    }

    info
}

/// Returns the base (unconditional) rule set plus any rule sets reached
/// only under a detected `if`/`match`/method-predicate branch.
fn extract_rules_body(f: &ImplItemFn) -> (Vec<ParameterInfo>, Vec<ConditionalRuleSet>) {
    let mut base = Vec::new();
    let mut conditional = Vec::new();

    for stmt in &f.block.stmts {
        match stmt {
            Stmt::Expr(Expr::Array(arr), _) => {
                base.extend(field_map_to_parameters(arr));
            }
            Stmt::Expr(Expr::Return(ret), _) => {
                if let Some(Expr::Array(arr)) = ret.expr.as_deref() {
                    base.extend(field_map_to_parameters(arr));
                }
            }
            Stmt::Expr(Expr::If(if_expr), _) => {
                collect_conditional_branches(if_expr, &mut conditional);
            }
            Stmt::Expr(Expr::Match(match_expr), _) => {
                collect_match_branches(match_expr, &mut conditional);
            }
            Stmt::Local(local) => {
                if let Some(init) = &local.init {
                    if let Expr::Array(arr) = &*init.expr {
                        base.extend(field_map_to_parameters(arr));
                    }
                }
            }
            _ => {}
        }
    }

    (base, conditional)
}

fn field_map_to_parameters(arr: &syn::ExprArray) -> Vec<ParameterInfo> {
    arr.elems
        .iter()
        .filter_map(|elem| {
            if let Expr::Tuple(t) = elem {
                let (key_expr, value_expr) = (t.elems.first()?, t.elems.get(1)?);
                let name = string_literal(key_expr)?;
                let rules = extract_field_rules(value_expr);
                Some(parameter_from_rules(name, ValidationRuleCollection::from_rules(rules)))
            } else {
                None
            }
        })
        .collect()
}

fn parameter_from_rules(name: String, rules: ValidationRuleCollection) -> ParameterInfo {
    let required = rules.is_required();
    let nullable = rules.is_nullable();
    ParameterInfo {
        name,
        r#type: "string".to_string(),
        format: None,
        required,
        nullable,
        description: None,
        r#enum: None,
        constraints: crate::model::Constraints::default(),
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

fn collect_conditional_branches(if_expr: &ExprIf, out: &mut Vec<ConditionalRuleSet>) {
    let predicate = predicate_description(&if_expr.cond);
    let parameters = block_to_parameters(&if_expr.then_branch);
    if !parameters.is_empty() {
        out.push(ConditionalRuleSet { predicate, parameters });
    }
    if let Some((_, else_branch)) = &if_expr.else_branch {
        match &**else_branch {
            Expr::If(nested) => collect_conditional_branches(nested, out),
            Expr::Block(b) => {
                let parameters = block_to_parameters(&b.block);
                if !parameters.is_empty() {
                    out.push(ConditionalRuleSet { predicate: format!("not ({predicate})"), parameters });
                }
            }
            _ => {}
        }
    }
}

fn collect_match_branches(match_expr: &ExprMatch, out: &mut Vec<ConditionalRuleSet>) {
    for arm in &match_expr.arms {
        if let Expr::Array(arr) = &*arm.body {
            let pat = &arm.pat;
            let predicate = quote::quote!(#pat).to_string();
            let parameters = field_map_to_parameters(arr);
            if !parameters.is_empty() {
                out.push(ConditionalRuleSet { predicate, parameters });
            }
        }
    }
}

fn block_to_parameters(block: &syn::Block) -> Vec<ParameterInfo> {
    for stmt in &block.stmts {
        if let Stmt::Expr(Expr::Array(arr), _) = stmt {
            return field_map_to_parameters(arr);
        }
    }
    Vec::new()
}

/// Describes an `if` predicate well enough to label a conditional rule
/// set; not meant to be re-parsed, only displayed.
fn predicate_description(cond: &Expr) -> String {
    struct MethodCallCollector(Vec<String>);
    impl<'ast> Visit<'ast> for MethodCallCollector {
        fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
            self.0.push(node.method.to_string());
            visit::visit_expr_method_call(self, node);
        }
    }
    let mut collector = MethodCallCollector(Vec::new());
    collector.visit_expr(cond);
    if collector.0.is_empty() {
        quote::quote!(#cond).to_string()
    } else {
        collector.0.join(".")
    }
}

fn extract_string_map(f: &ImplItemFn) -> BTreeMap<String, String> {
    for stmt in &f.block.stmts {
        if let Stmt::Expr(Expr::Array(arr), _) = stmt {
            let mut map = BTreeMap::new();
            for elem in &arr.elems {
                if let Expr::Tuple(t) = elem {
                    if let (Some(k), Some(v)) = (t.elems.first(), t.elems.get(1)) {
                        if let (Some(k), Some(v)) = (string_literal(k), string_literal(v)) {
                            map.insert(k, v);
                        }
                    }
                }
            }
            return map;
        }
    }
    BTreeMap::new()
}

fn extract_bool_return(f: &ImplItemFn) -> Option<bool> {
    if matches!(f.sig.output, ReturnType::Default) {
        return None;
    }
    for stmt in &f.block.stmts {
        if let Stmt::Expr(Expr::Lit(syn::ExprLit { lit: syn::Lit::Bool(b), .. }), _) = stmt {
            return Some(b.value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn file_with(body: proc_macro2::TokenStream) -> File {
        syn::parse2(quote::quote! {
            impl FormRequest for StoreUserRequest {
                #body
            }
        })
        .unwrap()
    }

    #[test]
    fn base_rule_set_is_extracted() {
        let file = file_with(quote::quote! {
            fn rules() -> Vec<(&'static str, &'static str)> {
                [("email", "required|email"), ("name", "required|string|max:255")]
            }
        });
        let info = FormRequestAnalyzer::analyze(&file, "StoreUserRequest").unwrap();
        assert_eq!(info.parameters.len(), 2);
        assert!(info.parameters[0].required);
    }

    #[test]
    fn conditional_branch_becomes_named_rule_set() {
        let file = file_with(quote::quote! {
            fn rules() -> Vec<(&'static str, &'static str)> {
                if self.is_method("POST") {
                    [("password", "required|min:8")]
                } else {
                    [("password", "sometimes|min:8")]
                }
            }
        });
        let info = FormRequestAnalyzer::analyze(&file, "StoreUserRequest").unwrap();
        assert_eq!(info.conditional_rule_sets.len(), 2);
        assert!(info.conditional_rule_sets[0].predicate.contains("is_method"));
    }

    #[test]
    fn sometimes_suppresses_required() {
        let file = file_with(quote::quote! {
            fn rules() -> Vec<(&'static str, &'static str)> {
                [("nickname", "sometimes|string")]
            }
        });
        let info = FormRequestAnalyzer::analyze(&file, "StoreUserRequest").unwrap();
        assert!(!info.parameters[0].required);
    }

    #[test]
    fn messages_map_is_extracted() {
        let file = file_with(quote::quote! {
            fn messages() -> Vec<(&'static str, &'static str)> {
                [("email.required", "An email is required.")]
            }
        });
        let info = FormRequestAnalyzer::analyze(&file, "StoreUserRequest").unwrap();
        assert_eq!(info.messages.get("email.required").unwrap(), "An email is required.");
    }

    #[test]
    fn authorize_hint_captures_literal_bool() {
        let file = file_with(quote::quote! {
            fn authorize() -> bool {
                true
            }
        });
        let info = FormRequestAnalyzer::analyze(&file, "StoreUserRequest").unwrap();
        assert_eq!(info.authorize_hint, Some(true));
    }

    #[test]
    fn missing_class_returns_none() {
        let file: File = parse_quote! {
            impl FormRequest for Other {
                fn rules() -> Vec<(&'static str, &'static str)> { [] }
            }
        };
        assert!(FormRequestAnalyzer::analyze(&file, "StoreUserRequest").is_none());
    }
}
