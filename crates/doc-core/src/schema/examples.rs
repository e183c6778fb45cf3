//! Chooses example values for generated schemas. A custom resource-level
//! example (§ResourceInfo::custom_example/custom_examples) always wins;
//! otherwise a configured [`ExampleProvider`] strategy is consulted,
//! itself falling back to [`FieldPatternRegistry`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::schema::field_patterns::FieldPatternRegistry;

/// Value-generation strategy, selected by the project config.
pub trait ExampleProvider {
    fn example_for(&mut self, field_name: &str, r#type: &str, format: Option<&str>) -> Value;
}

/// Deterministic: always the field pattern's static value, or a fixed
/// per-type default when no pattern matches. Used in `--deterministic`
/// mode and in snapshot tests, where a stable diff matters more than
/// variety.
#[derive(Debug, Default)]
pub struct StaticValueProvider {
    registry: FieldPatternRegistry,
}

impl ExampleProvider for StaticValueProvider {
    fn example_for(&mut self, field_name: &str, r#type: &str, format: Option<&str>) -> Value {
        if let Some(p) = self.registry.lookup(field_name) {
            return p.static_value;
        }
        default_for_type(r#type, format)
    }
}

/// Seeded RNG: varies values across fields and runs while staying
/// reproducible given the same seed (`--seed` / `DOC_SPECTRUM_SEED`).
pub struct FakerValueProvider {
    registry: FieldPatternRegistry,
    rng: StdRng,
}

impl FakerValueProvider {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { registry: FieldPatternRegistry::default(), rng: StdRng::seed_from_u64(seed) }
    }
}

impl ExampleProvider for FakerValueProvider {
    fn example_for(&mut self, field_name: &str, r#type: &str, format: Option<&str>) -> Value {
        if let Some(p) = self.registry.lookup(field_name) {
            return vary(&p.static_value, p.r#type, &mut self.rng);
        }
        vary(&default_for_type(r#type, format), r#type, &mut self.rng)
    }
}

fn vary(base: &Value, r#type: &str, rng: &mut StdRng) -> Value {
    match (r#type, base) {
        ("integer", Value::Number(n)) => {
            let base = n.as_i64().unwrap_or(0);
            Value::from(base + rng.gen_range(0..1000))
        }
        ("string", Value::String(s)) if s.chars().all(|c| c.is_ascii_digit() || c == '-') => {
            base.clone()
        }
        ("string", Value::String(_)) => Value::String(format!("example-{}", rng.gen_range(1000..9999))),
        _ => base.clone(),
    }
}

fn default_for_type(r#type: &str, format: Option<&str>) -> Value {
    match (r#type, format) {
        ("string", Some("date-time")) => Value::String("2024-01-15T10:30:00Z".to_string()),
        ("string", Some("date")) => Value::String("2024-01-15".to_string()),
        ("string", Some("uuid")) => Value::String("9d1f5f6a-bd9b-4b4f-9b2e-9a9c9f0e6a11".to_string()),
        ("string", Some("email")) => Value::String("user@example.com".to_string()),
        ("string", Some("binary")) => Value::Null,
        ("string", _) => Value::String("string".to_string()),
        ("integer", _) => Value::from(1),
        ("number", _) => Value::from(1.0),
        ("boolean", _) => Value::Bool(true),
        ("array", _) => Value::Array(vec![]),
        ("object", _) => Value::Object(serde_json::Map::new()),
        _ => Value::Null,
    }
}

/// `ExampleGenerator` wires a resource's custom example (if any) together
/// with the configured provider strategy.
pub struct ExampleGenerator<P: ExampleProvider> {
    provider: P,
}

impl<P: ExampleProvider> ExampleGenerator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn generate(
        &mut self,
        field_name: &str,
        r#type: &str,
        format: Option<&str>,
        custom: Option<&Value>,
    ) -> Value {
        custom.cloned().unwrap_or_else(|| self.provider.example_for(field_name, r#type, format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_provider_is_deterministic() {
        let mut p1 = StaticValueProvider::default();
        let mut p2 = StaticValueProvider::default();
        assert_eq!(p1.example_for("user_id", "integer", None), p2.example_for("user_id", "integer", None));
    }

    #[test]
    fn faker_provider_same_seed_same_output() {
        let mut a = FakerValueProvider::new(42);
        let mut b = FakerValueProvider::new(42);
        assert_eq!(a.example_for("count", "integer", None), b.example_for("count", "integer", None));
    }

    #[test]
    fn custom_example_overrides_provider() {
        let mut gen = ExampleGenerator::new(StaticValueProvider::default());
        let custom = Value::String("override".to_string());
        let v = gen.generate("name", "string", None, Some(&custom));
        assert_eq!(v, Value::String("override".to_string()));
    }

    #[test]
    fn unknown_field_falls_back_to_type_default() {
        let mut gen = ExampleGenerator::new(StaticValueProvider::default());
        let v = gen.generate("frobnicate", "boolean", None, None);
        assert_eq!(v, Value::Bool(true));
    }
}
