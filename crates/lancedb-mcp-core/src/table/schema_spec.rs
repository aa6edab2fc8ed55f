//! Validation of user-supplied table schemas.
//!
//! A schema arrives as a JSON object mapping field names to type names, e.g.
//! `{"doc": "str", "vector": "Vector(384)", "category": "str"}`. Field order is
//! preserved. The `doc` text field and the `vector` field are mandatory, and
//! the vector width must equal the embedding model's output width.

use serde_json::{Map, Value};

use lancedb_mcp_types::error::OperationError;
use lancedb_mcp_types::table::{FieldType, TEXT_FIELD, VECTOR_FIELD};

/// A validated, ordered table schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchemaSpec {
    fields: Vec<(String, FieldType)>,
}

impl TableSchemaSpec {
    /// The default schema: `doc: Utf8, vector: Vector(dimension)`.
    pub fn default_for(dimension: usize) -> Self {
        Self {
            fields: vec![
                (TEXT_FIELD.to_string(), FieldType::Utf8),
                (VECTOR_FIELD.to_string(), FieldType::Vector(dimension)),
            ],
        }
    }

    /// Parse and validate a user schema against the model's vector width.
    pub fn from_json(schema: &Map<String, Value>, dimension: usize) -> Result<Self, OperationError> {
        if !schema.contains_key(TEXT_FIELD) {
            return Err(OperationError::invalid(format!(
                "custom schema must include '{TEXT_FIELD}' field of type str"
            )));
        }
        if !schema.contains_key(VECTOR_FIELD) {
            return Err(OperationError::invalid(format!(
                "custom schema must include '{VECTOR_FIELD}' field of type Vector"
            )));
        }

        let mut fields = Vec::with_capacity(schema.len());

        for (name, value) in schema {
            validate_field_name(name)?;

            let type_name = value.as_str().ok_or_else(|| {
                OperationError::invalid(format!(
                    "type of field '{name}' must be a string such as \"str\" or \"int\""
                ))
            })?;

            let field_type = match name.as_str() {
                VECTOR_FIELD => vector_type(type_name, dimension)?,
                TEXT_FIELD => match FieldType::parse(type_name) {
                    Some(FieldType::Utf8) => FieldType::Utf8,
                    _ => {
                        return Err(OperationError::invalid(format!(
                            "field '{TEXT_FIELD}' must be of type str, got '{type_name}'"
                        )));
                    }
                },
                _ => match FieldType::parse(type_name) {
                    Some(FieldType::Vector(_)) => {
                        return Err(OperationError::invalid(format!(
                            "only the '{VECTOR_FIELD}' field may be a Vector, got '{name}'"
                        )));
                    }
                    Some(t) => t,
                    None => {
                        return Err(OperationError::invalid(format!(
                            "unknown type '{type_name}' for field '{name}' (expected str, int, int32, float, float32 or bool)"
                        )));
                    }
                },
            };

            fields.push((name.clone(), field_type));
        }

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[(String, FieldType)] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Width of the vector field.
    pub fn vector_dimension(&self) -> usize {
        self.fields
            .iter()
            .find_map(|(_, t)| match t {
                FieldType::Vector(d) => Some(*d),
                _ => None,
            })
            .unwrap_or(0)
    }
}

fn validate_field_name(name: &str) -> Result<(), OperationError> {
    if name.trim().is_empty() {
        return Err(OperationError::invalid("field names must not be empty"));
    }
    if name.starts_with('_') {
        return Err(OperationError::invalid(format!(
            "field name '{name}' is reserved (names starting with '_' are used by LanceDB)"
        )));
    }
    Ok(())
}

/// Resolve the vector field's type. `"Vector(n)"` must match the model;
/// a bare `"Vector"` takes the model's width.
fn vector_type(type_name: &str, dimension: usize) -> Result<FieldType, OperationError> {
    if type_name.trim().eq_ignore_ascii_case("vector") {
        return Ok(FieldType::Vector(dimension));
    }
    match FieldType::parse(type_name) {
        Some(FieldType::Vector(n)) if n != dimension => Err(OperationError::invalid(format!(
            "vector field declares {n} dimensions but the embedding model produces {dimension}"
        ))),
        Some(FieldType::Vector(n)) => Ok(FieldType::Vector(n)),
        Some(other) => Err(OperationError::invalid(format!(
            "field '{VECTOR_FIELD}' must be a Vector, got {other:?}"
        ))),
        None => Err(OperationError::invalid(format!(
            "unknown type '{type_name}' for field '{VECTOR_FIELD}', expected Vector or Vector(n)"
        ))),
    }
}
