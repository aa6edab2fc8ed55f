//! Table name sanitization.
//!
//! Stored table names are CamelCase ASCII alphanumerics. Names that already
//! have that shape are kept verbatim; anything else is split on
//! non-alphanumeric characters and the words are joined in CamelCase, so
//! `my_docs-v2` is stored as `MyDocsV2`.

use lancedb_mcp_types::error::OperationError;

/// Sanitize a user-supplied table name into the stored form.
///
/// Fails when the name is blank or contains no ASCII alphanumerics.
pub fn sanitize_table_name(table_name: &str) -> Result<String, OperationError> {
    let original = table_name.trim();
    if original.is_empty() {
        return Err(OperationError::invalid("table name must not be empty"));
    }

    if is_camel_case(original) {
        return Ok(original.to_string());
    }

    let camel: String = original
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect();

    if camel.is_empty() {
        return Err(OperationError::invalid(format!(
            "table name '{original}' must contain at least one letter or digit"
        )));
    }

    if camel != original {
        tracing::debug!(original, sanitized = %camel, "table name sanitized");
    }

    Ok(camel)
}

/// `^[A-Z][A-Za-z0-9]*$`
fn is_camel_case(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => chars.all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}

/// Uppercase the first character and lowercase the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(word.len());
            out.push(first.to_ascii_uppercase());
            out.extend(chars.map(|c| c.to_ascii_lowercase()));
            out
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_names_are_kept() {
        assert_eq!(sanitize_table_name("Documents").unwrap(), "Documents");
        assert_eq!(sanitize_table_name("MyDocsV2").unwrap(), "MyDocsV2");
        assert_eq!(sanitize_table_name("  Notes  ").unwrap(), "Notes");
    }

    #[test]
    fn test_separators_become_word_boundaries() {
        assert_eq!(
            sanitize_table_name("lancedb-mcp-table").unwrap(),
            "LancedbMcpTable"
        );
        assert_eq!(sanitize_table_name("my_docs-v2").unwrap(), "MyDocsV2");
        assert_eq!(sanitize_table_name("a.b c").unwrap(), "ABC");
    }

    #[test]
    fn test_words_are_recased() {
        assert_eq!(sanitize_table_name("my_TABLE").unwrap(), "MyTable");
        assert_eq!(sanitize_table_name("myTable").unwrap(), "Mytable");
        assert_eq!(sanitize_table_name("docs").unwrap(), "Docs");
    }

    #[test]
    fn test_digit_leading_names() {
        assert_eq!(sanitize_table_name("2024_logs").unwrap(), "2024Logs");
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(matches!(
            sanitize_table_name("   "),
            Err(OperationError::InvalidArgument(_))
        ));
        assert!(matches!(
            sanitize_table_name("--__--"),
            Err(OperationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for name in ["lancedb-mcp-table", "my_TABLE", "x", "Docs 2"] {
            let once = sanitize_table_name(name).unwrap();
            assert_eq!(sanitize_table_name(&once).unwrap(), once);
        }
    }
}
