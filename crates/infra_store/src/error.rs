//! Store error types
//!
//! SQLx failures are classified here first and then converted into the
//! `PortError` that callers of the `DocumentStore` port see.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Document not found
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl StoreError {
    /// Creates a not found error for a document type and name
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_store::StoreError;
    ///
    /// let error = StoreError::not_found("Insurance Policy", "POL-2026-1");
    /// assert!(error.to_string().contains("Insurance Policy"));
    /// ```
    pub fn not_found(doctype: &str, name: impl std::fmt::Display) -> Self {
        StoreError::NotFound(format!("{} '{}' not found", doctype, name))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            StoreError::ConnectionFailed(_) | StoreError::PoolExhausted
        )
    }
}

/// Converts SQLx errors to more specific StoreError variants
///
/// The mapping is based on the PostgreSQL error code.
impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => StoreError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            sqlx::Error::Io(e) => StoreError::ConnectionFailed(e.to_string()),
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                match db_err.code().as_deref() {
                    Some("23505") => StoreError::DuplicateEntry(db_err.message().to_string()),
                    Some("23514") => StoreError::ConstraintViolation(db_err.message().to_string()),
                    _ => StoreError::QueryFailed(db_err.message().to_string()),
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::SerializationError(error.to_string())
            }
            _ => StoreError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(error.to_string())
    }
}

impl From<StoreError> for PortError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(message) => PortError::NotFound {
                entity_type: "Document".to_string(),
                id: message,
            },
            StoreError::DuplicateEntry(message) => PortError::Conflict { message },
            StoreError::ConstraintViolation(message) => PortError::validation(message),
            StoreError::ConnectionFailed(message) => PortError::connection(message),
            StoreError::PoolExhausted => PortError::ServiceUnavailable {
                service: "database pool".to_string(),
            },
            StoreError::SerializationError(message) => PortError::Transformation { message },
            other => PortError::Internal {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}
