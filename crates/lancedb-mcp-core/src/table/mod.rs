//! Table naming and schema validation.

pub mod naming;
pub mod schema_spec;
