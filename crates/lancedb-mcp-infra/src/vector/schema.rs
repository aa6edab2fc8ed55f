//! Arrow schema construction and inspection for LanceDB tables.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for lancedb 0.26).

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

use lancedb_mcp_core::table::schema_spec::TableSchemaSpec;
use lancedb_mcp_types::table::{FieldCategory, FieldInfo, FieldType, TEXT_FIELD};

/// Column names treated as text even when not first among the Utf8 columns.
const TEXT_FIELD_NAMES: &[&str] = &["doc", "document", "text", "content"];

/// Build the Arrow schema for a validated table schema.
///
/// The text and vector columns are non-nullable; metadata columns are
/// nullable so tables written by other tools can omit them.
pub fn arrow_schema(spec: &TableSchemaSpec) -> Schema {
    let fields: Vec<Field> = spec
        .fields()
        .iter()
        .map(|(name, field_type)| {
            let nullable = !matches!(field_type, FieldType::Vector(_)) && name != TEXT_FIELD;
            Field::new(name, data_type(*field_type), nullable)
        })
        .collect();
    Schema::new(fields)
}

fn data_type(field_type: FieldType) -> DataType {
    match field_type {
        FieldType::Utf8 => DataType::Utf8,
        FieldType::Int32 => DataType::Int32,
        FieldType::Int64 => DataType::Int64,
        FieldType::Float32 => DataType::Float32,
        FieldType::Float64 => DataType::Float64,
        FieldType::Boolean => DataType::Boolean,
        FieldType::Vector(dimension) => DataType::FixedSizeList(
            Arc::new(Field::new("item", DataType::Float32, true)),
            dimension as i32,
        ),
    }
}

/// The first fixed-size-list column and its width.
pub fn vector_column(schema: &Schema) -> Option<(String, usize)> {
    schema.fields().iter().find_map(|field| match field.data_type() {
        DataType::FixedSizeList(_, width) => Some((field.name().clone(), *width as usize)),
        _ => None,
    })
}

/// The column holding document text: `doc` if present, otherwise the first
/// string column with a text-like name, otherwise the first string column.
pub fn text_column(schema: &Schema) -> Option<String> {
    let strings: Vec<&Field> = schema
        .fields()
        .iter()
        .map(|f| f.as_ref())
        .filter(|f| is_string(f.data_type()))
        .collect();

    strings
        .iter()
        .find(|f| f.name() == TEXT_FIELD)
        .or_else(|| {
            strings
                .iter()
                .find(|f| TEXT_FIELD_NAMES.contains(&f.name().to_ascii_lowercase().as_str()))
        })
        .or_else(|| strings.first())
        .map(|f| f.name().clone())
}

pub fn is_string(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

/// Classify a column for `table_details` and `table_stats`.
pub fn describe_field(field: &Field) -> FieldInfo {
    let data_type = field.data_type();
    let name = field.name();

    let (category, vector_dimensions, description) = match data_type {
        DataType::FixedSizeList(_, width) => (
            FieldCategory::Vector,
            Some(*width as usize),
            format!("Vector embeddings ({width} dimensions)"),
        ),
        dt if is_string(dt) => {
            let description = if TEXT_FIELD_NAMES.contains(&name.to_ascii_lowercase().as_str()) {
                "Document text content".to_string()
            } else {
                "Text metadata".to_string()
            };
            (FieldCategory::Text, None, description)
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => (FieldCategory::Integer, None, "Integer value".to_string()),
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            (FieldCategory::Float, None, "Floating-point value".to_string())
        }
        DataType::Boolean => (FieldCategory::Boolean, None, "Boolean flag".to_string()),
        other => (FieldCategory::Other, None, format!("{other} value")),
    };

    FieldInfo {
        name: name.clone(),
        data_type: data_type.to_string(),
        nullable: field.is_nullable(),
        category,
        vector_dimensions,
        description,
    }
}

/// Whether a column can carry a BTree scalar index.
pub fn is_scalar_indexable(data_type: &DataType) -> bool {
    is_string(data_type)
        || matches!(
            data_type,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64
                | DataType::Boolean
        )
}
