//! Controller configuration: values, schema and classification.
//!
//! - [`OptionValue`] / [`ValueShape`] - what a field holds
//! - [`Configuration`] - the declarative options object
//! - [`OptionSchema`] - which fields a controller understands, with defaults
//! - [`Classification`] - the fields partitioned by update semantics

mod classify;
mod config;
mod schema;
mod value;

pub use classify::{Classification, OptionKind};
pub use config::Configuration;
pub use schema::{FieldSpec, OptionSchema, OptionSchemaBuilder};
pub use value::{Callback, OptionValue, ValueShape};
