//! Determines whether a route needs `401`/`403` responses: `401` from an
//! `auth*` middleware on the route, `403` from an authorization check
//! (`Gate::authorize`/`can()`/a form request's `authorize()` returning
//! something other than a bare `true`) in the controller method.

use syn::ImplItemFn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthRequirements {
    pub needs_401: bool,
    pub needs_403: bool,
}

pub struct AuthenticationAnalyzer;

impl AuthenticationAnalyzer {
    #[must_use]
    pub fn analyze(
        middleware: &[String],
        controller_method: Option<&ImplItemFn>,
        form_request_authorize_hint: Option<bool>,
    ) -> AuthRequirements {
        let needs_401 = middleware.iter().any(|m| m == "auth" || m.starts_with("auth:"));
        let needs_403 = form_request_authorize_hint == Some(false)
            || controller_method.is_some_and(has_authorization_check);
        AuthRequirements { needs_401, needs_403 }
    }
}

fn has_authorization_check(method: &ImplItemFn) -> bool {
    struct Finder(bool);
    impl<'ast> syn::visit::Visit<'ast> for Finder {
        fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
            if matches!(node.method.to_string().as_str(), "authorize" | "can" | "cannot") {
                self.0 = true;
            }
            syn::visit::visit_expr_method_call(self, node);
        }
    }
    let mut finder = Finder(false);
    syn::visit::visit_impl_item_fn(&mut finder, method);
    finder.0
}
