//! Schema synthesis: dot-path tree expansion, rule-driven type inference,
//! and example-value generation.

pub mod examples;
pub mod field_patterns;
pub mod generator;

pub use examples::{ExampleGenerator, ExampleProvider, FakerValueProvider, StaticValueProvider};
pub use field_patterns::FieldPatternRegistry;
pub use generator::{ContentKind, SchemaGenerator};
