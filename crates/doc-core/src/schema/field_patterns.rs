//! Maps normalized field names to a default `{type, format, static_value}`
//! via exact match first, then suffix/prefix fallback (`_id`, `_at`,
//! `is_`, `has_`, `_url`, …). Consulted by [`super::examples`] when a
//! resource or parameter doesn't carry its own example.

use serde_json::Value;

#[derive(Debug, Clone)]
pub struct FieldPattern {
    pub r#type: &'static str,
    pub format: Option<&'static str>,
    pub static_value: Value,
}

/// Exact-name patterns, checked before any suffix/prefix fallback.
const EXACT: &[(&str, &str, Option<&str>, &str)] = &[
    ("id", "integer", None, "1"),
    ("uuid", "string", Some("uuid"), "\"9d1f5f6a-bd9b-4b4f-9b2e-9a9c9f0e6a11\""),
    ("email", "string", Some("email"), "\"user@example.com\""),
    ("url", "string", Some("uri"), "\"https://example.com\""),
    ("password", "string", Some("password"), "\"********\""),
    ("name", "string", None, "\"Jane Doe\""),
    ("slug", "string", None, "\"my-article-slug\""),
    ("description", "string", None, "\"A short description.\""),
    ("status", "string", None, "\"active\""),
];

/// Suffix → pattern, longest suffix first so `_id` doesn't shadow `_uuid`.
const SUFFIXES: &[(&str, &str, Option<&str>, &str)] = &[
    ("_uuid", "string", Some("uuid"), "\"9d1f5f6a-bd9b-4b4f-9b2e-9a9c9f0e6a11\""),
    ("_id", "integer", None, "1"),
    ("_at", "string", Some("date-time"), "\"2024-01-15T10:30:00Z\""),
    ("_url", "string", Some("uri"), "\"https://example.com/resource\""),
    ("_count", "integer", None, "0"),
    ("_email", "string", Some("email"), "\"user@example.com\""),
];

/// Prefix → pattern.
const PREFIXES: &[(&str, &str, Option<&str>, &str)] = &[
    ("is_", "boolean", None, "false"),
    ("has_", "boolean", None, "false"),
    ("can_", "boolean", None, "false"),
];

#[derive(Debug, Default)]
pub struct FieldPatternRegistry;

impl FieldPatternRegistry {
    #[must_use]
    pub fn lookup(&self, field_name: &str) -> Option<FieldPattern> {
        let normalized = normalize(field_name);

        if let Some(&(_, ty, format, value)) = EXACT.iter().find(|&&(n, ..)| n == normalized) {
            return Some(pattern(ty, format, value));
        }
        if let Some(&(_, ty, format, value)) =
            SUFFIXES.iter().find(|&&(suffix, ..)| normalized.ends_with(suffix))
        {
            return Some(pattern(ty, format, value));
        }
        if let Some(&(_, ty, format, value)) =
            PREFIXES.iter().find(|&&(prefix, ..)| normalized.starts_with(prefix))
        {
            return Some(pattern(ty, format, value));
        }
        None
    }
}

fn pattern(ty: &'static str, format: Option<&'static str>, raw_json: &str) -> FieldPattern {
    FieldPattern {
        r#type: ty,
        format,
        static_value: serde_json::from_str(raw_json).unwrap_or(Value::Null),
    }
}

/// Strips array/dot-path notation (`tags.*` → `tags`, `profile.bio` → `bio`)
/// and lowercases, so `_at`/`_id` suffixes match regardless of nesting.
fn normalize(field_name: &str) -> String {
    field_name
        .rsplit('.')
        .find(|s| *s != "*")
        .unwrap_or(field_name)
        .to_lowercase()
}
