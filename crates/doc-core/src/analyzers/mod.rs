//! Source-extracting analyzers. Each walks a `syn::File` AST of an
//! analyzed source file and never aborts on a malformed or unrecognized
//! construct — worst case a field collapses to [`crate::model::Rule::Custom`]
//! and analysis continues.

pub mod auth;
pub mod enum_analyzer;
pub mod form_request;
pub mod inline_validation;
pub mod pagination;
pub mod query_header;
pub mod resource;
mod rules;
pub mod transformer;

pub use auth::{AuthRequirements, AuthenticationAnalyzer};
pub use enum_analyzer::EnumAnalyzer;
pub use form_request::{ConditionalRuleSet, FormRequestAnalyzer, FormRequestInfo};
pub use inline_validation::{InlineValidationAnalyzer, InlineValidationInfo};
pub use pagination::PaginationAnalyzer;
pub use query_header::{DiscoveredParameter, Location as ParamSourceLocation, QueryHeaderAnalyzer};
pub use resource::ResourceAnalyzer;
pub use transformer::FractalTransformerAnalyzer;
