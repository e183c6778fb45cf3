//! Extracts Fractal-style transformer metadata: the `transform()` array
//! literal (reusing the same inference rules as [`super::resource`]) plus
//! `available_includes`/`default_includes`, and detects `item`/`collection`
//! wrapping in the calling controller method.

use syn::{Expr, File, ImplItemFn, ItemImpl, Stmt};

use crate::model::FractalInfo;

pub struct FractalTransformerAnalyzer;

impl FractalTransformerAnalyzer {
    /// Analyze `class_name`'s `transform()` impl, then inspect
    /// `controller_method` for `fractal().item(...)` / `.collection(...)`
    /// to determine whether the response is singular or plural.
    #[must_use]
    pub fn analyze(
        file: &File,
        class_name: &str,
        controller_method: Option<&ImplItemFn>,
    ) -> Option<FractalInfo> {
        let imp = find_impl(file, class_name)?;
        let transform_fn = find_method(imp, "transform")?;
        let array = return_array(transform_fn)?;

        let mut r#type = crate::model::ResourceInfo::default();
        r#type.class_name = Some(class_name.to_string());
        for elem in &array.elems {
            let Expr::Tuple(t) = elem else { continue };
            let (Some(key_expr), Some(val_expr)) = (t.elems.first(), t.elems.get(1)) else { continue };
            let Some(key) = string_literal(key_expr) else { continue };
            let prop = super::resource::infer_property(val_expr)
                .unwrap_or_else(|| crate::model::PropertyInfo::scalar("string"));
            if let Some(nested) = &prop.relation {
                r#type.nested_resources.push(nested.clone());
            }
            if prop.conditional {
                r#type.conditional_fields.push(key.clone());
            }
            r#type.properties.insert(key, prop);
        }

        let available_includes = find_string_array_return(imp, "available_includes");
        let default_includes = find_string_array_return(imp, "default_includes");
        let has_includes = !available_includes.is_empty();

        let is_collection = controller_method.is_some_and(fractal_call_is_collection);

        Some(FractalInfo {
            transformer_class: class_name.to_string(),
            is_collection,
            r#type,
            has_includes,
            default_includes,
            available_includes,
        })
    }
}

fn fractal_call_is_collection(method: &ImplItemFn) -> bool {
    struct Finder(Option<bool>);
    impl<'ast> syn::visit::Visit<'ast> for Finder {
        fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
            match node.method.to_string().as_str() {
                "collection" => self.0 = Some(true),
                "item" => self.0 = Some(false),
                _ => {}
            }
            syn::visit::visit_expr_method_call(self, node);
        }
    }
    let mut finder = Finder(None);
    syn::visit::visit_impl_item_fn(&mut finder, method);
    finder.0.unwrap_or(false)
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
        Stmt::Expr(Expr::Return(r), _) => match r.expr.as_deref() {
            Some(Expr::Array(arr)) => Some(arr),
            _ => None,
        },
        _ => None,
    })
}

fn find_string_array_return(imp: &ItemImpl, method_name: &str) -> Vec<String> {
    let Some(f) = find_method(imp, method_name) else { return Vec::new() };
    f.block
        .stmts
        .iter()
        .find_map(|stmt| match stmt {
            Stmt::Expr(Expr::Array(arr), _) => Some(arr),
            Stmt::Expr(Expr::Return(r), _) => match r.expr.as_deref() {
                Some(Expr::Array(arr)) => Some(arr),
                _ => None,
            },
            _ => None,
        })
        .map(|arr| arr.elems.iter().filter_map(string_literal).collect())
        .unwrap_or_default()
}

fn string_literal(expr: &Expr) -> Option<String> {
    if let Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(s), .. }) = expr {
        Some(s.value())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer_file() -> File {
        syn::parse2(quote::quote! {
            impl Transformer for UserTransformer {
                fn transform(&self, user: &User) -> Value {
                    [("id", user.id), ("name", user.name)]
                }
                fn available_includes() -> Vec<&'static str> {
                    ["posts", "roles"]
                }
                fn default_includes() -> Vec<&'static str> {
                    ["roles"]
                }
            }
        })
        .unwrap()
    }

    #[test]
    fn includes_are_extracted() {
        let file = transformer_file();
        let info = FractalTransformerAnalyzer::analyze(&file, "UserTransformer", None).unwrap();
        assert_eq!(info.available_includes, vec!["posts".to_string(), "roles".to_string()]);
        assert_eq!(info.default_includes, vec!["roles".to_string()]);
        assert!(info.has_includes);
    }

    #[test]
    fn transform_fields_are_inferred_like_a_resource() {
        let file: File = syn::parse2(quote::quote! {
            impl Transformer for UserTransformer {
                fn transform(&self, user: &User) -> Value {
                    [("id", user.id as u64), ("author", AuthorResource::new(user.author))]
                }
            }
        })
        .unwrap();
        let info = FractalTransformerAnalyzer::analyze(&file, "UserTransformer", None).unwrap();
        assert_eq!(info.r#type.properties["id"].r#type, "integer");
        assert_eq!(info.r#type.properties["author"].r#type, "object");
        assert!(info.r#type.nested_resources.contains(&"AuthorResource".to_string()));
    }

    #[test]
    fn collection_call_sets_is_collection() {
        let file = transformer_file();
        let controller: ImplItemFn = syn::parse2(quote::quote! {
            fn index(&self) -> Response {
                fractal().collection(users, UserTransformer::new())
            }
        })
        .unwrap();
        let info =
            FractalTransformerAnalyzer::analyze(&file, "UserTransformer", Some(&controller)).unwrap();
        assert!(info.is_collection);
    }
}
