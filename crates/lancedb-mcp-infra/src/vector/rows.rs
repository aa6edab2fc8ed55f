//! Conversion between documents and Arrow record batches.
//!
//! Ingest builds one column per table field: the text column from the
//! documents, the vector column from their embeddings, and every other
//! column from the per-document metadata (or a type default when absent).
//! Query results go the other way, into JSON rows without the vector column.

use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::{
    Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type, UInt32Type,
    UInt64Type, UInt8Type,
};
use arrow_array::{
    new_null_array, Array, ArrayRef, BooleanArray, FixedSizeListArray, Float32Array, Float64Array,
    Int32Array, Int64Array, LargeStringArray, RecordBatch, StringArray,
};
use arrow_schema::{DataType, Field, SchemaRef};
use serde_json::{Map, Number, Value};

use lancedb_mcp_types::error::OperationError;

/// One document ready to be written.
#[derive(Debug, Clone)]
pub struct PendingDocument {
    pub text: String,
    pub vector: Vec<f32>,
    pub metadata: Map<String, Value>,
}

/// Reject metadata keys the table has no column for.
///
/// The text and vector columns are filled by ingest and cannot be set
/// through metadata either.
pub fn check_metadata_keys(
    schema: &SchemaRef,
    text_column: &str,
    vector_column: &str,
    metadata: &Map<String, Value>,
) -> Result<(), OperationError> {
    for key in metadata.keys() {
        if key == text_column || key == vector_column {
            return Err(OperationError::invalid(format!(
                "metadata cannot set the '{key}' column; it is filled from the document"
            )));
        }
        if schema.field_with_name(key).is_err() {
            let columns: Vec<&str> = schema
                .fields()
                .iter()
                .map(|f| f.name().as_str())
                .filter(|n| *n != text_column && *n != vector_column)
                .collect();
            return Err(OperationError::invalid(format!(
                "metadata field '{key}' is not a column of this table (metadata columns: [{}])",
                columns.join(", ")
            )));
        }
    }
    Ok(())
}

/// Build a record batch matching `schema` for the given documents.
pub fn build_batch(
    schema: SchemaRef,
    text_column: &str,
    vector_column: &str,
    documents: &[PendingDocument],
) -> Result<RecordBatch, OperationError> {
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let name = field.name().as_str();
        let column: ArrayRef = if name == text_column {
            text_array(field.data_type(), documents.iter().map(|d| d.text.as_str()))?
        } else if name == vector_column {
            vector_array(field, documents)?
        } else {
            metadata_array(field, documents)?
        };
        columns.push(column);
    }

    RecordBatch::try_new(schema, columns)
        .map_err(|e| OperationError::database("failed to build record batch", e))
}

fn text_array<'a>(
    data_type: &DataType,
    texts: impl Iterator<Item = &'a str>,
) -> Result<ArrayRef, OperationError> {
    match data_type {
        DataType::Utf8 => Ok(Arc::new(StringArray::from_iter_values(texts))),
        DataType::LargeUtf8 => Ok(Arc::new(LargeStringArray::from_iter_values(texts))),
        other => Err(OperationError::invalid(format!(
            "text column has unsupported type {other}"
        ))),
    }
}

fn vector_array(field: &Field, documents: &[PendingDocument]) -> Result<ArrayRef, OperationError> {
    let DataType::FixedSizeList(item, width) = field.data_type() else {
        return Err(OperationError::invalid(format!(
            "column '{}' is not a vector column",
            field.name()
        )));
    };

    let mut values = Vec::with_capacity(documents.len() * *width as usize);
    for doc in documents {
        if doc.vector.len() != *width as usize {
            return Err(OperationError::Embedding(format!(
                "embedding has {} dimensions but column '{}' holds {width}",
                doc.vector.len(),
                field.name()
            )));
        }
        values.extend_from_slice(&doc.vector);
    }

    let list = FixedSizeListArray::try_new(
        item.clone(),
        *width,
        Arc::new(Float32Array::from(values)),
        None,
    )
    .map_err(|e| OperationError::database("failed to build vector column", e))?;
    Ok(Arc::new(list))
}

fn metadata_array(field: &Field, documents: &[PendingDocument]) -> Result<ArrayRef, OperationError> {
    let name = field.name();
    let values = documents.iter().map(|d| d.metadata.get(name.as_str()));

    let array: ArrayRef = match field.data_type() {
        DataType::Utf8 => Arc::new(StringArray::from(
            values.map(|v| as_text(name, v)).collect::<Result<Vec<_>, _>>()?,
        )),
        DataType::LargeUtf8 => Arc::new(LargeStringArray::from(
            values.map(|v| as_text(name, v)).collect::<Result<Vec<_>, _>>()?,
        )),
        DataType::Int32 => Arc::new(Int32Array::from(
            values
                .map(|v| {
                    as_i64(name, v).and_then(|n| {
                        i32::try_from(n).map_err(|_| {
                            OperationError::invalid(format!(
                                "metadata field '{name}' value {n} does not fit in int32"
                            ))
                        })
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        )),
        DataType::Int64 => Arc::new(Int64Array::from(
            values.map(|v| as_i64(name, v)).collect::<Result<Vec<_>, _>>()?,
        )),
        DataType::Float32 => Arc::new(Float32Array::from(
            values
                .map(|v| as_f64(name, v).map(|f| f as f32))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            values.map(|v| as_f64(name, v)).collect::<Result<Vec<_>, _>>()?,
        )),
        DataType::Boolean => Arc::new(BooleanArray::from(
            values.map(|v| as_bool(name, v)).collect::<Result<Vec<_>, _>>()?,
        )),
        other => {
            if documents.iter().any(|d| d.metadata.contains_key(name.as_str())) {
                return Err(OperationError::invalid(format!(
                    "metadata field '{name}' has unsupported column type {other}"
                )));
            }
            if !field.is_nullable() {
                return Err(OperationError::invalid(format!(
                    "column '{name}' of type {other} cannot be filled automatically"
                )));
            }
            new_null_array(other, documents.len())
        }
    };

    Ok(array)
}

fn type_error(name: &str, expected: &str, value: &Value) -> OperationError {
    OperationError::invalid(format!(
        "metadata field '{name}' expects {expected}, got {value}"
    ))
}

/// Missing and null values become `""`; other scalars are stringified.
fn as_text(name: &str, value: Option<&Value>) -> Result<String, OperationError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(type_error(name, "a string", other)),
    }
}

/// Missing and null values become `0`.
fn as_i64(name: &str, value: Option<&Value>) -> Result<i64, OperationError> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| type_error(name, "an integer", &Value::Number(n.clone()))),
        Some(Value::Bool(b)) => Ok(i64::from(*b)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| type_error(name, "an integer", &Value::String(s.clone()))),
        Some(other) => Err(type_error(name, "an integer", other)),
    }
}

/// Missing and null values become `0.0`.
fn as_f64(name: &str, value: Option<&Value>) -> Result<f64, OperationError> {
    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| type_error(name, "a number", &Value::Number(n.clone()))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| type_error(name, "a number", &Value::String(s.clone()))),
        Some(other) => Err(type_error(name, "a number", other)),
    }
}

/// Missing and null values become `false`.
fn as_bool(name: &str, value: Option<&Value>) -> Result<bool, OperationError> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(type_error(name, "a boolean", &Value::String(s.clone()))),
        },
        Some(other) => Err(type_error(name, "a boolean", other)),
    }
}

/// Convert record batches to JSON rows, dropping vector columns.
pub fn batches_to_rows(batches: &[RecordBatch]) -> Vec<Map<String, Value>> {
    let mut rows = Vec::new();

    for batch in batches {
        let schema = batch.schema();
        for i in 0..batch.num_rows() {
            let mut row = Map::new();
            for (field, column) in schema.fields().iter().zip(batch.columns()) {
                if matches!(field.data_type(), DataType::FixedSizeList(..)) {
                    continue;
                }
                row.insert(field.name().clone(), cell_to_json(column.as_ref(), i));
            }
            rows.push(row);
        }
    }

    rows
}

fn float_json(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

fn cell_to_json(array: &dyn Array, i: usize) -> Value {
    if array.is_null(i) {
        return Value::Null;
    }

    match array.data_type() {
        DataType::Utf8 => Value::String(array.as_string::<i32>().value(i).to_string()),
        DataType::LargeUtf8 => Value::String(array.as_string::<i64>().value(i).to_string()),
        DataType::Utf8View => Value::String(array.as_string_view().value(i).to_string()),
        DataType::Boolean => Value::Bool(array.as_boolean().value(i)),
        DataType::Int8 => Value::from(array.as_primitive::<Int8Type>().value(i)),
        DataType::Int16 => Value::from(array.as_primitive::<Int16Type>().value(i)),
        DataType::Int32 => Value::from(array.as_primitive::<Int32Type>().value(i)),
        DataType::Int64 => Value::from(array.as_primitive::<Int64Type>().value(i)),
        DataType::UInt8 => Value::from(array.as_primitive::<UInt8Type>().value(i)),
        DataType::UInt16 => Value::from(array.as_primitive::<UInt16Type>().value(i)),
        DataType::UInt32 => Value::from(array.as_primitive::<UInt32Type>().value(i)),
        DataType::UInt64 => Value::from(array.as_primitive::<UInt64Type>().value(i)),
        DataType::Float32 => float_json(array.as_primitive::<Float32Type>().value(i) as f64),
        DataType::Float64 => float_json(array.as_primitive::<Float64Type>().value(i)),
        other => Value::String(format!("<{other}>")),
    }
}
