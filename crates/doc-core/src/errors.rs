//! Typed error enum for the pipeline's library API, plus the non-fatal
//! fault accumulator (`ErrorCollector`) analyzers report into instead of
//! returning `Err`.
//!
//! Library consumers match on specific variants. `doc-cli` converts these
//! to `anyhow::Error` at the binary boundary and maps them to the exit
//! codes documented for the `generate` subcommand.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Errors that abort a pipeline run outright — as opposed to the
/// recoverable, per-entity faults collected in [`ErrorCollector`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File I/O failure (reading source, route registry, or cache files).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// A source file failed to parse as valid Rust syntax.
    #[error("failed to parse {path}: {source}")]
    SourceParse {
        /// The file that failed to parse.
        path: PathBuf,
        /// Underlying `syn` error.
        #[source]
        source: syn::Error,
    },

    /// The route registry referenced a controller/action that does not
    /// exist in the analyzed source tree.
    #[error("action '{action}' referenced by route '{uri}' was not found in source")]
    ActionNotFound {
        /// The route URI that referenced the missing action.
        uri: String,
        /// The unresolved `Controller::method` action string.
        action: String,
    },

    /// Cache store corruption or version mismatch.
    #[error("cache store error: {0}")]
    Cache(String),

    /// Too many non-fatal faults accumulated; run aborted per
    /// `--fail-on-errors` or the fatal-severity threshold.
    #[error("{count} error(s) accumulated during analysis")]
    TooManyErrors {
        /// Number of faults collected.
        count: usize,
    },
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;

/// Severity of a non-fatal fault recorded by [`ErrorCollector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational; degraded output but analysis continued normally.
    Warning,
    /// An entity was skipped or fell back to a default.
    Error,
    /// The run cannot produce a trustworthy spec and should abort.
    Fatal,
}

/// A single recoverable fault raised by an analyzer, generator, or cache
/// layer. Analyzers never propagate `Result::Err` for domain-level
/// problems (a malformed rule, an unresolvable `$ref`) — they push a
/// `CollectedError` and continue with a best-effort fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedError {
    pub kind: String,
    pub message: String,
    pub context: Option<String>,
    pub severity: Severity,
}

impl CollectedError {
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            context: None,
            severity,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Accumulates non-fatal faults across a pipeline run. Every analyzer and
/// generator is handed a `&mut ErrorCollector` (or a clone of a shared
/// handle) rather than returning early on the first problem, so a single
/// malformed resource doesn't blank out the rest of the spec.
#[derive(Debug, Default, Clone)]
pub struct ErrorCollector {
    errors: Vec<CollectedError>,
}

impl ErrorCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: CollectedError) {
        if error.severity >= Severity::Error {
            tracing::warn!(kind = %error.kind, message = %error.message, "analysis fault");
        } else {
            tracing::debug!(kind = %error.kind, message = %error.message, "analysis warning");
        }
        self.errors.push(error);
    }

    #[must_use]
    pub fn errors(&self) -> &[CollectedError] {
        &self.errors
    }

    #[must_use]
    pub fn has_fatal(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Fatal)
    }

    #[must_use]
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.errors.iter().filter(|e| e.severity >= severity).count()
    }

    pub fn merge(&mut self, other: ErrorCollector) {
        self.errors.extend(other.errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time assertion that `Error` is `Send + Sync`.
    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    };

    #[test]
    fn severity_ordering_is_ascending() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn collector_detects_fatal() {
        let mut c = ErrorCollector::new();
        assert!(!c.has_fatal());
        c.push(CollectedError::new("resource", "bad transform", Severity::Fatal));
        assert!(c.has_fatal());
    }

    #[test]
    fn collector_counts_at_or_above_threshold() {
        let mut c = ErrorCollector::new();
        c.push(CollectedError::new("a", "warn", Severity::Warning));
        c.push(CollectedError::new("b", "err", Severity::Error));
        c.push(CollectedError::new("c", "fatal", Severity::Fatal));
        assert_eq!(c.count_at_least(Severity::Error), 2);
        assert_eq!(c.count_at_least(Severity::Warning), 3);
    }

    #[test]
    fn merge_combines_both_sets() {
        let mut a = ErrorCollector::new();
        a.push(CollectedError::new("a", "1", Severity::Warning));
        let mut b = ErrorCollector::new();
        b.push(CollectedError::new("b", "2", Severity::Error));
        a.merge(b);
        assert_eq!(a.errors().len(), 2);
    }
}
