//! Shared AST plumbing for the source-extracting analyzers
//! ([`super::form_request`], [`super::inline_validation`]).
//!
//! Validation rule sets in the analyzed source are expressed as either a
//! pipe string (`"required|string|max:255"`) or an array mixing plain
//! tokens with rule-builder calls (`Rule::unique("users", "email")`,
//! `Password::min(8).mixed_case()`). Both forms reduce to a
//! [`ValidationRuleCollection`].

use syn::{Expr, ExprArray, ExprCall, ExprMethodCall, Lit};

use crate::model::Rule;

/// Extract the rule list for one field from its value expression in a
/// `rules()`-shaped array literal.
pub fn extract_field_rules(expr: &Expr) -> Vec<Rule> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => pipe_string_to_rules(&s.value()),
            _ => vec![Rule::Custom(quote::quote!(#expr).to_string())],
        },
        Expr::Array(ExprArray { elems, .. }) => {
            elems.iter().map(extract_single_rule).collect()
        }
        Expr::Macro(m) if m.mac.path.is_ident("vec") => {
            match m.mac.parse_body::<ExprArrayLike>() {
                Ok(arr) => arr.elems.iter().map(extract_single_rule).collect(),
                Err(_) => vec![Rule::Custom(quote::quote!(#expr).to_string())],
            }
        }
        _ => vec![extract_single_rule(expr)],
    }
}

/// `vec![a, b, c]` body parses as a comma-separated expression list, which
/// `syn` has no dedicated AST node for outside an actual array literal —
/// reuse `ExprArray`'s element punctuation by wrapping it in brackets.
struct ExprArrayLike {
    elems: syn::punctuated::Punctuated<Expr, syn::Token![,]>,
}

impl syn::parse::Parse for ExprArrayLike {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        Ok(Self {
            elems: input.parse_terminated(Expr::parse, syn::Token![,])?,
        })
    }
}

fn pipe_string_to_rules(s: &str) -> Vec<Rule> {
    s.split('|').filter(|t| !t.is_empty()).map(|t| Rule::Token(t.to_string())).collect()
}

fn extract_single_rule(expr: &Expr) -> Rule {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => Rule::Token(s.value()),
            _ => Rule::Custom(quote::quote!(#expr).to_string()),
        },
        Expr::Call(call) => extract_call_rule(call),
        Expr::MethodCall(mc) => extract_chain_rule(mc),
        _ => Rule::Custom(quote::quote!(#expr).to_string()),
    }
}

fn call_path_ident(expr: &Expr) -> Option<String> {
    if let Expr::Path(p) = expr {
        p.path.segments.last().map(|s| s.ident.to_string())
    } else {
        None
    }
}

fn string_lit_arg(expr: &Expr) -> Option<String> {
    if let Expr::Lit(syn::ExprLit { lit: Lit::Str(s), .. }) = expr {
        Some(s.value())
    } else {
        None
    }
}

fn string_array_arg(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Array(a) => a.elems.iter().filter_map(string_lit_arg).collect(),
        Expr::Reference(r) => string_array_arg(&r.expr),
        _ => vec![],
    }
}

/// `Rule::unique("users", "email")`, `Rule::in_(&["a","b"])`,
/// `Rule::enum_("Status")`, `Rule::required_if("field", "value")`,
/// `Rule::prohibited_if(...)`, `RegexRule::new("...")`.
fn extract_call_rule(call: &ExprCall) -> Rule {
    let Some(func_name) = call_path_ident(&call.func) else {
        return Rule::Custom(quote::quote!(#call).to_string());
    };
    let args: Vec<&Expr> = call.args.iter().collect();
    match func_name.as_str() {
        "unique" => Rule::Unique {
            table: args.first().and_then(|e| string_lit_arg(e)).unwrap_or_default(),
            column: args.get(1).and_then(|e| string_lit_arg(e)),
        },
        "in_" => Rule::In(args.first().map(|e| string_array_arg(e)).unwrap_or_default()),
        "enum_" => Rule::Enum(args.first().and_then(|e| string_lit_arg(e)).unwrap_or_default()),
        "required_if" => Rule::Conditional {
            predicate: format_predicate(&args),
            inner: Box::new(Rule::Token("required".to_string())),
        },
        "prohibited_if" => Rule::Conditional {
            predicate: format_predicate(&args),
            inner: Box::new(Rule::Token("prohibited".to_string())),
        },
        "regex" | "new" => Rule::Regex(args.first().and_then(|e| string_lit_arg(e)).unwrap_or_default()),
        _ => Rule::Custom(quote::quote!(#call).to_string()),
    }
}

fn format_predicate(args: &[&Expr]) -> String {
    args.iter()
        .filter_map(|e| string_lit_arg(e))
        .collect::<Vec<_>>()
        .join(",")
}

/// Method-chain builders: `Password::min(8).mixed_case().numbers().symbols()`,
/// `File::image().mimes(&[...]).min_kb(10).max_kb(2048)`,
/// `Dimensions::new().max_width(4000).max_height(4000)`.
fn extract_chain_rule(mc: &ExprMethodCall) -> Rule {
    let mut segments = Vec::new();
    let mut cur = Expr::MethodCall(mc.clone());
    loop {
        match cur {
            Expr::MethodCall(m) => {
                segments.push((m.method.to_string(), m.args.iter().cloned().collect::<Vec<_>>()));
                cur = (*m.receiver).clone();
            }
            Expr::Call(c) => {
                if let Some(name) = call_path_ident(&c.func) {
                    segments.push((name, c.args.iter().cloned().collect::<Vec<_>>()));
                }
                break;
            }
            _ => break,
        }
    }
    segments.reverse();
    let Some((root, root_args)) = segments.first().cloned() else {
        return Rule::Custom(quote::quote!(#mc).to_string());
    };

    match root.as_str() {
        "min" if segments.iter().any(|(n, _)| n == "mixed_case" || n == "numbers" || n == "symbols") => {
            build_password_rule(&segments, &root_args)
        }
        "image" | "file" => build_file_rule(&segments, root == "image"),
        "new" if segments.iter().any(|(n, _)| n.starts_with("max_") || n.starts_with("min_")) => {
            build_dimensions_rule(&segments)
        }
        _ => Rule::Custom(quote::quote!(#mc).to_string()),
    }
}

fn build_password_rule(segments: &[(String, Vec<Expr>)], root_args: &[Expr]) -> Rule {
    Rule::Password {
        min: root_args.first().and_then(expr_as_u64),
        mixed_case: segments.iter().any(|(n, _)| n == "mixed_case"),
        numbers: segments.iter().any(|(n, _)| n == "numbers"),
        symbols: segments.iter().any(|(n, _)| n == "symbols"),
    }
}

fn build_file_rule(segments: &[(String, Vec<Expr>)], image_only: bool) -> Rule {
    let mut mimes = Vec::new();
    let mut min_kb = None;
    let mut max_kb = None;
    for (name, args) in segments {
        match name.as_str() {
            "mimes" | "types" => mimes = args.first().map(|e| string_array_arg(e)).unwrap_or_default(),
            "min_kb" => min_kb = args.first().and_then(expr_as_u64),
            "max_kb" => max_kb = args.first().and_then(expr_as_u64),
            _ => {}
        }
    }
    Rule::File { mimes, min_kb, max_kb, image_only }
}

fn build_dimensions_rule(segments: &[(String, Vec<Expr>)]) -> Rule {
    let mut dims = std::collections::BTreeMap::new();
    for (name, args) in segments {
        if let Some(key) = name.strip_prefix("max_").or_else(|| name.strip_prefix("min_")) {
            if let Some(v) = args.first().and_then(expr_as_u64) {
                let prefix = if name.starts_with("max_") { "max" } else { "min" };
                dims.insert(format!("{prefix}_{key}"), v);
            }
        }
    }
    Rule::Dimensions(dims)
}

fn expr_as_u64(expr: &Expr) -> Option<u64> {
    if let Expr::Lit(syn::ExprLit { lit: Lit::Int(i), .. }) = expr {
        i.base10_parse::<u64>().ok()
    } else {
        None
    }
}
