//! Error types for loading, executing and introspecting schemas.

use std::path::PathBuf;

/// Errors that can occur while running compiled statements.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The compiler rejected the schema or statement.
    #[error(transparent)]
    Compile(#[from] polysql_core::Error),

    /// Database error during execution.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading schema files, writing scripts).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a schema document.
    #[error("Failed to parse schema file '{path}': {source}")]
    SchemaFile {
        /// Path to the schema document.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A bound value has no SQLite representation.
    #[error("Cannot bind parameter {position}: {reason}")]
    Bind {
        /// Zero-based parameter position.
        position: usize,
        /// Why the value was rejected.
        reason: String,
    },

    /// A catalog entry could not be mapped back to the schema model.
    #[error("Cannot introspect '{table}': {message}")]
    Introspection {
        /// Table being read.
        table: String,
        /// What went wrong.
        message: String,
    },
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
