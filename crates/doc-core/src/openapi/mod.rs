//! `OpenAPI` 3.0.x document assembly.

pub mod generator;

pub use generator::{OpenApiGenerator, OpenApiSpec, ResponseSource, RouteDocumentation};
