//! Rendering of JSON update values as SQL literals.
//!
//! `update_documents` receives `{"column": value}` pairs; LanceDB's update
//! builder takes SQL expressions, so each JSON value is rendered as a literal.

use serde_json::Value;

use lancedb_mcp_types::error::OperationError;

/// Render a JSON scalar as a SQL literal.
///
/// Strings are single-quoted with embedded quotes doubled. Arrays and
/// objects have no literal form and are rejected.
pub fn to_sql_literal(column: &str, value: &Value) -> Result<String, OperationError> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(quote(s)),
        Value::Array(_) | Value::Object(_) => Err(OperationError::invalid(format!(
            "update value for '{column}' must be a string, number, boolean or null"
        ))),
    }
}

/// Single-quote a string for use in a filter or update expression.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_literals() {
        assert_eq!(to_sql_literal("a", &json!(null)).unwrap(), "NULL");
        assert_eq!(to_sql_literal("a", &json!(true)).unwrap(), "true");
        assert_eq!(to_sql_literal("a", &json!(42)).unwrap(), "42");
        assert_eq!(to_sql_literal("a", &json!(-1.5)).unwrap(), "-1.5");
        assert_eq!(to_sql_literal("a", &json!("news")).unwrap(), "'news'");
    }

    #[test]
    fn test_quotes_are_escaped() {
        assert_eq!(
            to_sql_literal("doc", &json!("it's")).unwrap(),
            "'it''s'"
        );
    }

    #[test]
    fn test_compound_values_rejected() {
        let err = to_sql_literal("tags", &json!(["a", "b"])).unwrap_err();
        assert!(err.to_string().contains("tags"));
        assert!(to_sql_literal("meta", &json!({"k": 1})).is_err());
    }
}
