//! Detects pagination style from a controller method's return expression
//! and emits the implicit query parameters the chosen style adds.

use syn::ImplItemFn;

use crate::model::{Constraints, PaginationInfo, PaginationStyle, ParameterInfo, ValidationRuleCollection};

pub struct PaginationAnalyzer;

impl PaginationAnalyzer {
    #[must_use]
    pub fn analyze(method: &ImplItemFn) -> Option<PaginationInfo> {
        let style = find_pagination_call(method)?;
        Some(PaginationInfo { style })
    }

    /// Implicit query parameters the envelope adds: `page`/`per_page` for
    /// length-aware and simple pagination, `cursor` for cursor pagination.
    #[must_use]
    pub fn implicit_parameters(style: PaginationStyle) -> Vec<ParameterInfo> {
        let int_param = |name: &str| ParameterInfo {
            name: name.to_string(),
            r#type: "integer".to_string(),
            format: None,
            required: false,
            nullable: false,
            description: None,
            r#enum: None,
            constraints: Constraints::default(),
            example: None,
            validation_rules: ValidationRuleCollection::default(),
        };
        match style {
            PaginationStyle::LengthAware | PaginationStyle::Simple => {
                vec![int_param("page"), int_param("per_page")]
            }
            PaginationStyle::Cursor => {
                let mut cursor = int_param("cursor");
                cursor.r#type = "string".to_string();
                vec![cursor, int_param("per_page")]
            }
        }
    }
}

fn find_pagination_call(method: &ImplItemFn) -> Option<PaginationStyle> {
    struct Finder(Option<PaginationStyle>);
    impl<'ast> syn::visit::Visit<'ast> for Finder {
        fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
            match node.method.to_string().as_str() {
                "paginate" => self.0 = Some(PaginationStyle::LengthAware),
                "simple_paginate" => self.0 = Some(PaginationStyle::Simple),
                "cursor_paginate" => self.0 = Some(PaginationStyle::Cursor),
                _ => {}
            }
            syn::visit::visit_expr_method_call(self, node);
        }
    }
    let mut finder = Finder(None);
    syn::visit::visit_impl_item_fn(&mut finder, method);
    finder.0
}
