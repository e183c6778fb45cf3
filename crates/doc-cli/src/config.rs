//! Project-level generator configuration loaded from YAML.
//!
//! Externalizes project-specific knobs (route table location, source tree
//! to scan, include/exclude patterns, `OpenAPI` version, cache location) so
//! they live next to the project instead of being hardcoded as CLI flags.
//!
//! # File format
//!
//! ```yaml
//! # doc-spectrum.yaml
//! routes_file: routes.json
//! source_dir: src
//!
//! include_patterns:
//!   - "api/*"
//! excluded_methods:
//!   - HEAD
//! excluded_middleware:
//!   - throttle:api
//!
//! openapi_version: "3.1"
//! output: openapi.json
//! cache_dir: .doc-spectrum-cache
//!
//! info:
//!   title: My API
//!   version: "1.0.0"
//! servers:
//!   - url: https://api.example.com
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Path to the route table (a JSON array of `doc_core::route::RouteEntry`).
    pub routes_file: PathBuf,

    /// Root of the source tree the project scanner walks for controller,
    /// form-request, resource, and transformer definitions.
    pub source_dir: PathBuf,

    /// URI glob patterns a route must match at least one of.
    pub include_patterns: Vec<String>,

    /// HTTP methods stripped from every route.
    pub excluded_methods: Vec<String>,

    /// Middleware names stripped from the recorded middleware list.
    pub excluded_middleware: Vec<String>,

    /// `"3.0"` or `"3.1"`.
    pub openapi_version: String,

    /// Output file path for `generate`/`generate:optimized`.
    pub output: PathBuf,

    /// Output format, inferred from `output`'s extension when omitted.
    pub output_format: Option<OutputFormatConfig>,

    /// Directory backing the on-disk cache used by `generate:optimized`
    /// and the `watch` daemon.
    pub cache_dir: PathBuf,

    /// `OpenAPI` `info` block.
    pub info: InfoConfig,

    /// `OpenAPI` `servers` block.
    pub servers: Vec<ServerConfig>,

    /// Use a seeded faker provider instead of static example values.
    pub seed: Option<u64>,

    /// Port the `watch`/`mock` HTTP servers bind to.
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum OutputFormatConfig {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InfoConfig {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    pub description: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            routes_file: PathBuf::from("routes.json"),
            source_dir: PathBuf::from("src"),
            include_patterns: vec!["api/*".to_string()],
            excluded_methods: vec!["HEAD".to_string()],
            excluded_middleware: vec![],
            openapi_version: "3.1".to_string(),
            output: PathBuf::from("openapi.json"),
            output_format: None,
            cache_dir: PathBuf::from(".doc-spectrum-cache"),
            info: InfoConfig { title: "API".to_string(), version: "1.0.0".to_string(), description: None },
            servers: Vec::new(),
            seed: None,
            port: 4400,
        }
    }
}

impl ProjectConfig {
    /// Load config from a YAML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    #[must_use]
    pub fn route_config(&self) -> doc_core::route::RouteAnalyzerConfig {
        doc_core::route::RouteAnalyzerConfig {
            include_patterns: self.include_patterns.clone(),
            excluded_methods: self.excluded_methods.clone(),
            excluded_middleware: self.excluded_middleware.clone(),
        }
    }

    #[must_use]
    pub fn spec_version(&self) -> doc_core::model::SpecVersion {
        if self.openapi_version.starts_with("3.1") {
            doc_core::model::SpecVersion::V31
        } else {
            doc_core::model::SpecVersion::V30
        }
    }

    #[must_use]
    pub fn output_format(&self) -> OutputFormatConfig {
        self.output_format.unwrap_or_else(|| {
            match self.output.extension().and_then(|e| e.to_str()) {
                Some("yaml" | "yml") => OutputFormatConfig::Yaml,
                _ => OutputFormatConfig::Json,
            }
        })
    }

    #[must_use]
    pub fn info_value(&self) -> serde_json::Value {
        let mut info = serde_json::json!({
            "title": self.info.title,
            "version": self.info.version,
        });
        if let Some(description) = &self.info.description {
            info["description"] = serde_json::Value::String(description.clone());
        }
        info
    }

    #[must_use]
    pub fn servers_value(&self) -> Vec<serde_json::Value> {
        self.servers
            .iter()
            .map(|s| {
                let mut v = serde_json::json!({"url": s.url});
                if let Some(description) = &s.description {
                    v["description"] = serde_json::Value::String(description.clone());
                }
                v
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_defaults() {
        let config: ProjectConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(config.include_patterns, vec!["api/*".to_string()]);
        assert_eq!(config.excluded_methods, vec!["HEAD".to_string()]);
        assert_eq!(config.openapi_version, "3.1");
        assert_eq!(config.port, 4400);
    }

    #[test]
    fn spec_version_parses_3_0() {
        let mut config = ProjectConfig::default();
        config.openapi_version = "3.0.3".to_string();
        assert_eq!(config.spec_version(), doc_core::model::SpecVersion::V30);
    }

    #[test]
    fn output_format_inferred_from_extension() {
        let mut config = ProjectConfig::default();
        config.output = PathBuf::from("spec.yaml");
        assert_eq!(config.output_format(), OutputFormatConfig::Yaml);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc-spectrum.yaml");
        std::fs::write(&path, "routes_file: custom-routes.json\nport: 9000\n").unwrap();
        let config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.routes_file, PathBuf::from("custom-routes.json"));
        assert_eq!(config.port, 9000);
        // Defaults still apply
        assert_eq!(config.openapi_version, "3.1");
    }
}
