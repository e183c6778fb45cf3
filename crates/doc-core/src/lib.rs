#![forbid(unsafe_code)]
//! Static analysis engine for zero-annotation `OpenAPI` generation: turns a
//! host application's route table plus its source tree into an assembled
//! `OpenAPI` 3.0.x/3.1.0 document without requiring developer annotations.

pub mod analyzers;
pub mod cache;
pub mod errors;
pub mod exec;
pub mod model;
pub mod openapi;
pub mod openapi31;
pub mod pipeline;
pub mod route;
pub mod schema;

pub use errors::{Error, Result};
pub use pipeline::{ControllerMethodSource, Pipeline, SourceRegistry};
