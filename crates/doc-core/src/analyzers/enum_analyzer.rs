//! Resolves an enum reference (short class name, rule expression, or a
//! rule-builder AST node — see [`crate::analyzers::rules`]) to an
//! [`EnumInfo`], reading either statically-declared backing values or, for
//! unit enums, the case names themselves.

use syn::{Expr, File, ImplItemFn, ItemEnum, Stmt};

use crate::model::{BackingType, EnumInfo};

pub struct EnumAnalyzer;

impl EnumAnalyzer {
    /// Resolve `class_name` against the enum declarations in `file`.
    #[must_use]
    pub fn analyze(file: &File, class_name: &str) -> Option<EnumInfo> {
        let item = find_enum(file, class_name)?;

        if let Some(discriminants) = integer_discriminants(item) {
            return Some(EnumInfo {
                class: class_name.to_string(),
                values: discriminants,
                backing_type: BackingType::Integer,
            });
        }

        if let Some(values) = find_companion_value_method(file, class_name) {
            return Some(EnumInfo {
                class: class_name.to_string(),
                values,
                backing_type: BackingType::String,
            });
        }

        Some(EnumInfo {
            class: class_name.to_string(),
            values: item.variants.iter().map(|v| v.ident.to_string()).collect(),
            backing_type: BackingType::Unit,
        })
    }
}

fn find_enum<'a>(file: &'a File, class_name: &str) -> Option<&'a ItemEnum> {
    file.items.iter().find_map(|item| match item {
        syn::Item::Enum(e) if e.ident == class_name => Some(e),
        _ => None,
    })
}

/// `enum Status { Active = 1, Inactive = 2 }` — explicit discriminants.
fn integer_discriminants(item: &ItemEnum) -> Option<Vec<String>> {
    if item.variants.iter().all(|v| v.discriminant.is_none()) {
        return None;
    }
    Some(
        item.variants
            .iter()
            .map(|v| match &v.discriminant {
                Some((_, Expr::Lit(syn::ExprLit { lit: syn::Lit::Int(i), .. }))) => i.to_string(),
                _ => v.ident.to_string(),
            })
            .collect(),
    )
}

/// `impl Status { fn value(&self) -> &'static str { match self { ... } } }`
/// — string-backed enums expose their wire value through a `value()`
/// method matching on `self`.
fn find_companion_value_method(file: &File, class_name: &str) -> Option<Vec<String>> {
    let imp = file.items.iter().find_map(|item| match item {
        syn::Item::Impl(imp) => {
            if let syn::Type::Path(p) = &*imp.self_ty {
                if p.path.segments.last().is_some_and(|s| s.ident == class_name) {
                    return Some(imp);
                }
            }
            None
        }
        _ => None,
    })?;

    let value_fn: &ImplItemFn = imp.items.iter().find_map(|item| match item {
        syn::ImplItem::Fn(f) if f.sig.ident == "value" => Some(f),
        _ => None,
    })?;

    value_fn.block.stmts.iter().find_map(|stmt| {
        let Stmt::Expr(Expr::Match(m), _) = stmt else { return None };
        Some(
            m.arms
                .iter()
                .filter_map(|arm| match &*arm.body {
                    Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(s), .. }) => Some(s.value()),
                    _ => None,
                })
                .collect(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_enum_uses_case_names() {
        let file: File = syn::parse2(quote::quote! {
            enum Status { Active, Inactive, Pending }
        })
        .unwrap();
        let info = EnumAnalyzer::analyze(&file, "Status").unwrap();
        assert_eq!(info.backing_type, BackingType::Unit);
        assert_eq!(info.values, vec!["Active", "Inactive", "Pending"]);
    }

    #[test]
    fn integer_backed_enum_uses_discriminants() {
        let file: File = syn::parse2(quote::quote! {
            enum Status { Active = 1, Inactive = 2 }
        })
        .unwrap();
        let info = EnumAnalyzer::analyze(&file, "Status").unwrap();
        assert_eq!(info.backing_type, BackingType::Integer);
        assert_eq!(info.values, vec!["1", "2"]);
    }

    #[test]
    fn string_backed_enum_uses_value_method() {
        let file: File = syn::parse2(quote::quote! {
            enum Status { Active, Inactive }
            impl Status {
                fn value(&self) -> &'static str {
                    match self {
                        Status::Active => "active",
                        Status::Inactive => "inactive",
                    }
                }
            }
        })
        .unwrap();
        let info = EnumAnalyzer::analyze(&file, "Status").unwrap();
        assert_eq!(info.backing_type, BackingType::String);
        assert_eq!(info.values, vec!["active".to_string(), "inactive".to_string()]);
    }

    #[test]
    fn missing_enum_returns_none() {
        let file: File = syn::parse2(quote::quote! {
            enum Other { A }
        })
        .unwrap();
        assert!(EnumAnalyzer::analyze(&file, "Status").is_none());
    }
}
