//! Builds a [`doc_core::SourceRegistry`] by walking a project's source tree.
//!
//! Parses every `.rs` file under the configured source directory with `syn`,
//! then locates each controller's methods and, for each, the form-request,
//! resource, and transformer types it references by naming convention —
//! `Store{X}Request`/`Update{X}Request`-style parameter types, and
//! `{X}Resource`/`{X}Transformer` identifiers appearing in the method body.
//! This is the project's analogue of `tonic-rest-openapi`'s descriptor-based
//! `discover()`: there the metadata comes from a compiled proto descriptor,
//! here it comes from walking the AST directly.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use doc_core::{ControllerMethodSource, SourceRegistry};
use syn::visit::{self, Visit};
use syn::{File, ImplItemFn, ItemImpl};

/// Every parsed source file, kept around so a controller method's body can
/// be cross-referenced against a form-request/resource/transformer struct
/// defined in a different file.
pub struct ParsedProject {
    pub files: Vec<(PathBuf, File)>,
}

impl ParsedProject {
    /// Parse every `.rs` file under `root`. Files that fail to parse are
    /// skipped (not fatal — a project may contain generated or vendored
    /// source the scanner doesn't need).
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let mut files = Vec::new();
        for entry in walk_rust_files(root)? {
            let content = fs::read_to_string(&entry)?;
            if let Ok(parsed) = syn::parse_file(&content) {
                files.push((entry, parsed));
            } else {
                tracing::warn!(file = %entry.display(), "skipped file that failed to parse");
            }
        }
        Ok(Self { files })
    }

    #[must_use]
    pub fn dependency_paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|(p, _)| p.clone()).collect()
    }

    /// Build a [`SourceRegistry`] keyed by `Controller::method`, scanning
    /// every `impl ControllerNameController { .. }` block.
    #[must_use]
    pub fn build_registry(&self) -> SourceRegistry {
        let mut registry = SourceRegistry::new();
        for (path, file) in &self.files {
            for item in &file.items {
                let syn::Item::Impl(imp) = item else { continue };
                let Some(controller_class) = self_type_name(imp) else { continue };
                if !controller_class.ends_with("Controller") {
                    continue;
                }
                for impl_item in &imp.items {
                    let syn::ImplItem::Fn(method) = impl_item else { continue };
                    if method.sig.ident == "new" {
                        continue;
                    }
                    let method_name = method.sig.ident.to_string();
                    let form_request_class = first_request_param_type(method);
                    let mut refs = ReferencedTypeCollector::default();
                    refs.visit_impl_item_fn(method);

                    let resource_class = refs.resources.into_iter().next();
                    let transformer_class = refs.transformers.into_iter().next();

                    registry.insert(
                        &controller_class,
                        &method_name,
                        ControllerMethodSource {
                            file_path: path.clone(),
                            file: file.clone(),
                            method: method.clone(),
                            form_request_class,
                            resource_class,
                            transformer_class,
                        },
                    );
                }
            }
        }
        registry
    }
}

fn self_type_name(imp: &ItemImpl) -> Option<String> {
    if let syn::Type::Path(p) = &*imp.self_ty {
        p.path.segments.last().map(|s| s.ident.to_string())
    } else {
        None
    }
}

/// The type name of the first non-`self` parameter whose type ends in
/// `Request` — the form-request convention.
fn first_request_param_type(method: &ImplItemFn) -> Option<String> {
    method.sig.inputs.iter().find_map(|arg| {
        let syn::FnArg::Typed(pat_type) = arg else { return None };
        let syn::Type::Path(type_path) = &*pat_type.ty else { return None };
        let ident = type_path.path.segments.last()?.ident.to_string();
        ident.ends_with("Request").then_some(ident)
    })
}

/// Collects identifiers used as a type in the method body that end in
/// `Resource` or `Transformer` — the response-shape convention.
#[derive(Default)]
struct ReferencedTypeCollector {
    resources: Vec<String>,
    transformers: Vec<String>,
}

impl<'ast> Visit<'ast> for ReferencedTypeCollector {
    fn visit_path(&mut self, path: &'ast syn::Path) {
        if let Some(segment) = path.segments.last() {
            let name = segment.ident.to_string();
            if name.ends_with("Resource") && !self.resources.contains(&name) {
                self.resources.push(name);
            } else if name.ends_with("Transformer") && !self.transformers.contains(&name) {
                self.transformers.push(name);
            }
        }
        visit::visit_path(self, path);
    }
}

fn walk_rust_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|e| e == "rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

/// Loads a route table serialized as a JSON array of
/// `doc_core::route::RouteEntry` values.
pub fn load_routes(path: &Path) -> anyhow::Result<Vec<doc_core::route::RouteEntry>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Loads enum descriptors for `EnumAnalyzer`'s reflection-bound path,
/// serialized as a JSON object keyed by enum name.
pub fn load_enums(path: &Path) -> anyhow::Result<BTreeMap<String, doc_core::model::EnumInfo>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
