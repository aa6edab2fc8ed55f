//! Table-level domain types: column types accepted in user schemas and the
//! reports returned by table management and maintenance operations.

use serde::{Deserialize, Serialize};

/// Name of the text column every table created by this server carries.
pub const TEXT_FIELD: &str = "doc";

/// Name of the embedding column every table created by this server carries.
pub const VECTOR_FIELD: &str = "vector";

/// Column type accepted in a user-supplied schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Utf8,
    Int32,
    Int64,
    Float32,
    Float64,
    Boolean,
    /// Fixed-width float32 vector of the given dimension.
    Vector(usize),
}

impl FieldType {
    /// Parse a schema type name such as `"str"`, `"int64"`, or `"Vector(384)"`.
    ///
    /// Returns `None` for unknown names.
    pub fn parse(type_name: &str) -> Option<Self> {
        let trimmed = type_name.trim();
        let lower = trimmed.to_ascii_lowercase();

        if let Some(inner) = lower
            .strip_prefix("vector(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return inner.trim().parse::<usize>().ok().map(FieldType::Vector);
        }

        match lower.as_str() {
            "str" | "string" | "utf8" | "text" => Some(FieldType::Utf8),
            "int" | "integer" | "int64" => Some(FieldType::Int64),
            "int32" => Some(FieldType::Int32),
            "float" | "double" | "float64" => Some(FieldType::Float64),
            "float32" => Some(FieldType::Float32),
            "bool" | "boolean" => Some(FieldType::Boolean),
            _ => None,
        }
    }
}

/// Coarse classification of a column, used by `table_stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    Vector,
    Text,
    Integer,
    Float,
    Boolean,
    Other,
}

/// Description of one column of a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub category: FieldCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_dimensions: Option<usize>,
    pub description: String,
}

/// One entry of `list_tables`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_rows: Option<u64>,
    /// Set when the table is listed but could not be opened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableList {
    pub tables: Vec<TableSummary>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCount {
    pub count: usize,
    pub message: String,
}

impl TableCount {
    pub fn new(count: usize) -> Self {
        let plural = if count == 1 { "" } else { "s" };
        Self {
            count,
            message: format!("Database contains {count} table{plural}"),
        }
    }
}

/// Result of `table_details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDetails {
    /// Name as requested by the caller.
    pub name: String,
    /// Name the table is stored under after sanitization.
    pub stored_name: String,
    pub num_rows: u64,
    pub fields: Vec<FieldInfo>,
    pub summary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldSummary {
    pub total_fields: usize,
    pub vector_fields: usize,
    pub text_fields: usize,
    pub other_fields: usize,
}

/// Result of `table_stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStats {
    pub table_name: String,
    pub stored_name: String,
    pub row_count: u64,
    pub version: u64,
    pub fields: Vec<FieldInfo>,
    pub vector_fields: Vec<String>,
    pub text_fields: Vec<String>,
    pub other_fields: Vec<String>,
    pub field_summary: FieldSummary,
}

/// Result of `create_table`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTableReport {
    pub table_name: String,
    pub stored_name: String,
    pub vector_dimension: usize,
    pub fields: Vec<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<MaintenanceReport>,
}

/// Result of `delete_table`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTableReport {
    pub table_name: String,
    pub stored_name: String,
    pub rows_deleted: u64,
    pub message: String,
}

/// Outcome of a best-effort maintenance pass (`optimize_table`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub table_name: String,
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Result of `table_versions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionReport {
    pub table_name: String,
    pub current_version: u64,
    pub version_count: usize,
    pub versions_pruned: u64,
    pub message: String,
}

/// One index of a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub index_type: String,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_indexed_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_unindexed_rows: Option<usize>,
}

/// Result of `index_stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatsReport {
    pub table_name: String,
    pub row_count: u64,
    pub indices: Vec<IndexInfo>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_parse_aliases() {
        assert_eq!(FieldType::parse("str"), Some(FieldType::Utf8));
        assert_eq!(FieldType::parse("String"), Some(FieldType::Utf8));
        assert_eq!(FieldType::parse("int"), Some(FieldType::Int64));
        assert_eq!(FieldType::parse("int32"), Some(FieldType::Int32));
        assert_eq!(FieldType::parse("double"), Some(FieldType::Float64));
        assert_eq!(FieldType::parse("float32"), Some(FieldType::Float32));
        assert_eq!(FieldType::parse("BOOL"), Some(FieldType::Boolean));
        assert_eq!(FieldType::parse("uuid"), None);
    }

    #[test]
    fn test_field_type_parse_vector() {
        assert_eq!(FieldType::parse("Vector(384)"), Some(FieldType::Vector(384)));
        assert_eq!(FieldType::parse("vector( 768 )"), Some(FieldType::Vector(768)));
        assert_eq!(FieldType::parse("Vector(abc)"), None);
        assert_eq!(FieldType::parse("Vector"), None);
    }

    #[test]
    fn test_table_count_message() {
        assert_eq!(TableCount::new(0).message, "Database contains 0 tables");
        assert_eq!(TableCount::new(1).message, "Database contains 1 table");
        assert_eq!(TableCount::new(7).message, "Database contains 7 tables");
    }

    #[test]
    fn test_field_info_serializes_type_key() {
        let info = FieldInfo {
            name: "vector".to_string(),
            data_type: "FixedSizeList(384)".to_string(),
            nullable: false,
            category: FieldCategory::Vector,
            vector_dimensions: Some(384),
            description: "Vector field with 384 dimensions".to_string(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "FixedSizeList(384)");
        assert_eq!(json["category"], "vector");
        assert_eq!(json["vector_dimensions"], 384);
    }
}
