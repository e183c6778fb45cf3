//! Top-level orchestration: route discovery → per-route source analysis →
//! schema generation → `OpenAPI` assembly → optional 3.1 conversion.

use std::collections::BTreeMap;
use std::path::PathBuf;

use syn::ImplItemFn;

use crate::analyzers::auth::AuthenticationAnalyzer;
use crate::analyzers::form_request::FormRequestAnalyzer;
use crate::analyzers::inline_validation::InlineValidationAnalyzer;
use crate::analyzers::pagination::PaginationAnalyzer;
use crate::analyzers::query_header::QueryHeaderAnalyzer;
use crate::analyzers::resource::ResourceAnalyzer;
use crate::analyzers::transformer::FractalTransformerAnalyzer;
use crate::errors::ErrorCollector;
use crate::exec::{ChunkProcessor, ExecutionOptions};
use crate::model::{EnumInfo, ParameterInfo, RouteInfo, SpecVersion};
use crate::openapi::{OpenApiGenerator, ResponseSource, RouteDocumentation};
use crate::openapi31::OpenApi31Converter;
use crate::route::{RouteAnalyzer, RouteAnalyzerConfig, RouteEntry};
use crate::schema::examples::ExampleProvider;

/// Everything known about a controller method's source: the `syn::File` it
/// lives in (for form-request/resource/transformer lookups within the same
/// file) plus the method body and the names of the response/validation
/// classes it references, resolved by the caller's framework adapter.
pub struct ControllerMethodSource {
    pub file_path: PathBuf,
    pub file: syn::File,
    pub method: ImplItemFn,
    pub form_request_class: Option<String>,
    pub resource_class: Option<String>,
    pub transformer_class: Option<String>,
}

/// Looks up a controller method's source by `Controller::method`.
#[derive(Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, ControllerMethodSource>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, controller_class: &str, method_name: &str, source: ControllerMethodSource) {
        self.sources.insert(format!("{controller_class}::{method_name}"), source);
    }

    #[must_use]
    pub fn get(&self, controller_class: &str, method_name: &str) -> Option<&ControllerMethodSource> {
        self.sources.get(&format!("{controller_class}::{method_name}"))
    }
}

pub struct Pipeline {
    route_config: RouteAnalyzerConfig,
    enums: BTreeMap<String, EnumInfo>,
}

impl Pipeline {
    #[must_use]
    pub fn new(route_config: RouteAnalyzerConfig, enums: BTreeMap<String, EnumInfo>) -> Self {
        Self { route_config, enums }
    }

    /// Run the full pipeline: discover routes, analyze each one's source
    /// against every registered analyzer, assemble the `OpenAPI` document,
    /// and convert to 3.1 if requested.
    pub fn generate(
        &self,
        entries: &[RouteEntry],
        registry: &SourceRegistry,
        errors: &mut ErrorCollector,
        info: serde_json::Value,
        servers: Vec<serde_json::Value>,
        provider: &mut dyn ExampleProvider,
        version: SpecVersion,
        exec: &ExecutionOptions,
    ) -> serde_json::Value {
        let routes = RouteAnalyzer::new(&self.route_config).analyze(entries, errors);
        let docs = self.document_routes(routes, registry, exec);

        let generator = OpenApiGenerator::new(&self.enums);
        let spec = generator.generate(docs, info, servers, provider);
        let mut value = serde_json::to_value(spec).unwrap_or(serde_json::Value::Null);

        if version == SpecVersion::V31 {
            OpenApi31Converter::convert(&mut value);
        }
        value
    }

    /// Fans the per-route source analysis across a worker pool in
    /// memory-bounded chunks, per spec.md §4.13: `ChunkProcessor` keeps at
    /// most one chunk's worth of parsed sources resident, sampling
    /// `MemoryManager` between chunks; within a chunk, `ParallelProcessor`
    /// decides (via `exec`'s activation rule) whether to fan out or just
    /// iterate sequentially.
    fn document_routes(
        &self,
        routes: Vec<RouteInfo>,
        registry: &SourceRegistry,
        exec: &ExecutionOptions,
    ) -> Vec<RouteDocumentation> {
        let processor = exec.processor(routes.len());
        let mut memory = exec.memory_manager();
        let chunker = ChunkProcessor::new(exec.chunk_size);

        chunker.process(routes, |chunk| {
            let docs = processor.map(chunk, |route| self.document_route(route, registry));
            if memory.over_budget() {
                tracing::warn!(
                    usage_bytes = memory.current_usage_bytes(),
                    "memory budget exceeded between chunks"
                );
            }
            docs
        })
    }

    fn document_route(&self, route: RouteInfo, registry: &SourceRegistry) -> RouteDocumentation {
        let source = registry.get(route.controller_class(), route.method_name());

        let form_request = source.and_then(|s| {
            s.form_request_class
                .as_deref()
                .and_then(|class| FormRequestAnalyzer::analyze(&s.file, class))
        });
        let inline = source.and_then(|s| InlineValidationAnalyzer::analyze(&s.method));

        let mut request_params: Vec<ParameterInfo> = Vec::new();
        if let Some(form_request) = &form_request {
            request_params.extend(form_request.parameters.clone());
            // A rule set reached only under a branch (`if method is POST`)
            // still documents the field; the first branch that mentions it
            // wins when no base (unconditional) rule exists for the field.
            for set in &form_request.conditional_rule_sets {
                for param in &set.parameters {
                    if !request_params.iter().any(|p| p.name == param.name) {
                        request_params.push(param.clone());
                    }
                }
            }
        }
        if let Some(inline) = &inline {
            for param in &inline.parameters {
                request_params.retain(|p| p.name != param.name);
                request_params.push(param.clone());
            }
        }

        let exclude_names: Vec<String> = request_params.iter().map(|p| p.name.clone()).collect();
        let query_header_params = source
            .map(|s| QueryHeaderAnalyzer::analyze(&s.method, &exclude_names))
            .unwrap_or_default();

        let pagination = source.and_then(|s| PaginationAnalyzer::analyze(&s.method));

        let response = source
            .and_then(|s| {
                if let Some(transformer_class) = &s.transformer_class {
                    FractalTransformerAnalyzer::analyze(&s.file, transformer_class, Some(&s.method))
                        .map(ResponseSource::Fractal)
                } else if let Some(resource_class) = &s.resource_class {
                    ResourceAnalyzer::analyze(&s.file, resource_class).map(ResponseSource::Resource)
                } else {
                    None
                }
            })
            .unwrap_or(ResponseSource::None);

        let authorize_hint = form_request.as_ref().and_then(|f| f.authorize_hint);
        let auth = AuthenticationAnalyzer::analyze(
            route.middleware(),
            source.map(|s| &s.method),
            authorize_hint,
        );

        RouteDocumentation {
            route,
            request_params,
            query_header_params,
            response,
            pagination,
            auth,
            deprecated: false,
            summary: None,
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::examples::StaticValueProvider;

    fn entry(uri: &str, action: &str) -> RouteEntry {
        RouteEntry {
            uri: uri.to_string(),
            http_methods: vec!["GET".to_string()],
            action: action.to_string(),
            middleware: vec![],
            name: None,
            where_constraints: BTreeMap::new(),
            is_closure: false,
        }
    }

    #[test]
    fn pipeline_produces_a_path_for_a_route_with_no_source() {
        let pipeline = Pipeline::new(RouteAnalyzerConfig::default(), BTreeMap::new());
        let registry = SourceRegistry::new();
        let mut errors = ErrorCollector::new();
        let mut provider = StaticValueProvider::default();
        let value = pipeline.generate(
            &[entry("api/ping", "PingController::index")],
            &registry,
            &mut errors,
            serde_json::json!({"title": "Test API", "version": "1.0"}),
            vec![],
            &mut provider,
            SpecVersion::V30,
            &ExecutionOptions::sequential(),
        );
        assert!(value["paths"]["/api/ping"]["get"].is_object());
    }

    #[test]
    fn v31_requested_sets_json_schema_dialect() {
        let pipeline = Pipeline::new(RouteAnalyzerConfig::default(), BTreeMap::new());
        let registry = SourceRegistry::new();
        let mut errors = ErrorCollector::new();
        let mut provider = StaticValueProvider::default();
        let value = pipeline.generate(
            &[entry("api/ping", "PingController::index")],
            &registry,
            &mut errors,
            serde_json::json!({}),
            vec![],
            &mut provider,
            SpecVersion::V31,
            &ExecutionOptions::sequential(),
        );
        assert_eq!(value["openapi"], "3.1.0");
        assert!(value.get("jsonSchemaDialect").is_some());
    }

    #[test]
    fn form_request_source_feeds_request_body_schema() {
        let mut registry = SourceRegistry::new();
        let file: syn::File = syn::parse2(quote::quote! {
            impl FormRequest for StoreUserRequest {
                fn rules(&self) -> RuleSet {
                    [("email", "required|email")]
                }
            }
        })
        .unwrap();
        let method: syn::ImplItemFn = syn::parse2(quote::quote! {
            fn store(&self, request: StoreUserRequest) -> Response {
                User::create(request.validated())
            }
        })
        .unwrap();
        registry.insert(
            "UserController",
            "store",
            ControllerMethodSource {
                file_path: PathBuf::from("UserController.rs"),
                file,
                method,
                form_request_class: Some("StoreUserRequest".to_string()),
                resource_class: None,
                transformer_class: None,
            },
        );

        let pipeline = Pipeline::new(RouteAnalyzerConfig::default(), BTreeMap::new());
        let mut errors = ErrorCollector::new();
        let mut provider = StaticValueProvider::default();
        let value = pipeline.generate(
            &[RouteEntry {
                uri: "api/users".to_string(),
                http_methods: vec!["POST".to_string()],
                action: "UserController::store".to_string(),
                middleware: vec![],
                name: None,
                where_constraints: BTreeMap::new(),
                is_closure: false,
            }],
            &registry,
            &mut errors,
            serde_json::json!({}),
            vec![],
            &mut provider,
            SpecVersion::V30,
            &ExecutionOptions::sequential(),
        );
        let schema = &value["paths"]["/api/users"]["post"]["requestBody"]["content"]["application/json"]["schema"];
        assert_eq!(schema["properties"]["email"]["format"], "email");
    }

    #[test]
    fn parallel_and_sequential_execution_produce_the_same_paths() {
        let entries: Vec<RouteEntry> = (0..60)
            .map(|i| entry(&format!("api/items/{i}"), "ItemController::show"))
            .collect();
        let registry = SourceRegistry::new();

        let sequential = Pipeline::new(RouteAnalyzerConfig::default(), BTreeMap::new()).generate(
            &entries,
            &registry,
            &mut ErrorCollector::new(),
            serde_json::json!({}),
            vec![],
            &mut StaticValueProvider::default(),
            SpecVersion::V30,
            &ExecutionOptions::sequential(),
        );
        let parallel = Pipeline::new(RouteAnalyzerConfig::default(), BTreeMap::new()).generate(
            &entries,
            &registry,
            &mut ErrorCollector::new(),
            serde_json::json!({}),
            vec![],
            &mut StaticValueProvider::default(),
            SpecVersion::V30,
            &ExecutionOptions { parallel: true, chunk_size: 16, ..ExecutionOptions::default() },
        );

        assert_eq!(sequential["paths"].as_object().unwrap().len(), 60);
        assert_eq!(sequential["paths"], parallel["paths"]);
    }
}
