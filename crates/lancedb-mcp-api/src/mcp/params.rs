//! Tool parameter types.
//!
//! Field docs become the JSON Schema descriptions MCP clients show to the
//! model, so they are written for that audience.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateTableParams {
    /// Name of the table to create. Stored in CamelCase form.
    pub table_name: String,
    /// Optional schema as `{"field": "type"}`. Must include `doc` (text) and
    /// `vector` (`Vector` or `Vector(n)`). Other types: str, int, int32,
    /// float, float32, bool.
    #[serde(default)]
    pub schema: Option<Map<String, Value>>,
}

/// Parameters for tools that take an optional table name.
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct OptionalTableParams {
    /// Table to inspect. Defaults to the server's configured table.
    #[serde(default)]
    pub table_name: Option<String>,
}

/// Parameters for tools that require a table name.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TableParams {
    /// Name of the table.
    pub table_name: String,
}

/// One document or a list of documents.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum DocsInput {
    One(String),
    Many(Vec<String>),
}

impl DocsInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            DocsInput::One(doc) => vec![doc],
            DocsInput::Many(docs) => docs,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngestDocsParams {
    /// Text to embed and store: a string or a list of strings.
    pub docs: DocsInput,
    /// Target table. Defaults to the server's configured table.
    #[serde(default)]
    pub table_name: Option<String>,
    /// Create the table with the default schema when it does not exist.
    #[serde(default = "default_true")]
    pub auto_create_table: bool,
    /// Optional list of objects, one per document, filling extra columns.
    #[serde(default)]
    pub metadata: Option<Vec<Map<String, Value>>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateDocumentsParams {
    /// Table containing the rows.
    pub table_name: String,
    /// SQL filter selecting rows to update, e.g. `category = 'news'`.
    pub filter_expr: String,
    /// Column values to set, e.g. `{"category": "archive"}`.
    pub updates: Map<String, Value>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteDocumentsParams {
    /// Table containing the rows.
    pub table_name: String,
    /// SQL filter selecting rows to delete.
    pub filter_expr: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct QueryTableParams {
    /// Text to search for.
    pub query: String,
    /// Table to search. Defaults to the server's configured table.
    #[serde(default)]
    pub table_name: Option<String>,
    /// Number of results. `0` only checks whether anything exists.
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    /// Create the table when it does not exist and return no results.
    #[serde(default)]
    pub auto_create_table: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HybridSearchParams {
    /// Text to search for.
    pub query: String,
    /// Table to search. Defaults to the server's configured table.
    #[serde(default)]
    pub table_name: Option<String>,
    /// SQL filter on metadata columns. Clauses such as `_distance < 0.5`
    /// set the distance threshold.
    #[serde(default)]
    pub filter_expr: Option<String>,
    /// Number of results. `0` only checks whether anything exists.
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    /// Distance metric: cosine, dot, euclidean or l2.
    #[serde(default = "default_metric")]
    pub metric: String,
    /// Drop results farther than this. A distance clause in `filter_expr`
    /// takes precedence.
    #[serde(default)]
    pub distance_threshold: Option<f32>,
    /// Create the table when it does not exist and return no results.
    #[serde(default)]
    pub auto_create_table: bool,
}

fn default_true() -> bool {
    true
}

fn default_top_k() -> i64 {
    5
}

fn default_metric() -> String {
    "cosine".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_docs_accepts_string_or_list() {
        let one: IngestDocsParams = serde_json::from_value(json!({"docs": "hello"})).unwrap();
        assert_eq!(one.docs.into_vec(), vec!["hello"]);
        assert!(one.auto_create_table);

        let many: IngestDocsParams =
            serde_json::from_value(json!({"docs": ["a", "b"], "auto_create_table": false}))
                .unwrap();
        assert_eq!(many.docs.into_vec(), vec!["a", "b"]);
        assert!(!many.auto_create_table);
    }

    #[test]
    fn test_search_defaults() {
        let params: HybridSearchParams = serde_json::from_value(json!({"query": "q"})).unwrap();
        assert_eq!(params.top_k, 5);
        assert_eq!(params.metric, "cosine");
        assert!(params.filter_expr.is_none());
        assert!(!params.auto_create_table);
    }

    #[test]
    fn test_missing_required_field_fails() {
        let result = serde_json::from_value::<UpdateDocumentsParams>(json!({"table_name": "t"}));
        assert!(result.is_err());
    }
}
