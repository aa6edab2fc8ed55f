use thiserror::Error;

/// Broad category of an [`OperationError`].
///
/// Tool responses and log lines use this to tell caller mistakes apart from
/// failures of the database or the embedding model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Upstream,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::Upstream => "upstream_failure",
        };
        write!(f, "{s}")
    }
}

/// Errors returned by table, document, and search operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    #[error("table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error(
        "table '{table}' stores {table_dimension}-dimensional vectors but the embedding model produces {model_dimension}"
    )]
    DimensionMismatch {
        table: String,
        table_dimension: usize,
        model_dimension: usize,
    },

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("database error: {0}")]
    Database(String),
}

impl OperationError {
    /// Shorthand for [`OperationError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        OperationError::InvalidArgument(message.into())
    }

    /// Shorthand for [`OperationError::Database`] with a context prefix.
    pub fn database(context: &str, err: impl std::fmt::Display) -> Self {
        OperationError::Database(format!("{context}: {err}"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OperationError::InvalidArgument(_) | OperationError::DimensionMismatch { .. } => {
                ErrorKind::InvalidArgument
            }
            OperationError::TableNotFound(_) => ErrorKind::NotFound,
            OperationError::TableAlreadyExists(_) => ErrorKind::AlreadyExists,
            OperationError::Embedding(_) | OperationError::Database(_) => ErrorKind::Upstream,
        }
    }
}

/// Errors raised while assembling the server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config file '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("invalid value '{value}' for {key}: {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_display() {
        let err = OperationError::TableAlreadyExists("Docs".to_string());
        assert_eq!(err.to_string(), "table 'Docs' already exists");

        let err = OperationError::TableNotFound("Missing".to_string());
        assert_eq!(err.to_string(), "table 'Missing' does not exist");
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = OperationError::DimensionMismatch {
            table: "Docs".to_string(),
            table_dimension: 768,
            model_dimension: 384,
        };
        let msg = err.to_string();
        assert!(msg.contains("768"));
        assert!(msg.contains("384"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(OperationError::invalid("x").kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            OperationError::TableNotFound("t".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            OperationError::TableAlreadyExists("t".into()).kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            OperationError::Embedding("boom".into()).kind(),
            ErrorKind::Upstream
        );
        assert_eq!(
            OperationError::database("open table", "io").kind(),
            ErrorKind::Upstream
        );
        assert_eq!(ErrorKind::Upstream.to_string(), "upstream_failure");
    }
}
