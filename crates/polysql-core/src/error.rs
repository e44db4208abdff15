//! Error types for schema validation and SQL compilation.

/// Structural problems found in a schema model.
///
/// Any of these aborts compilation of the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A concrete table declares no primary key.
    #[error("Table '{0}' must declare a PRIMARY KEY")]
    MissingPrimaryKey(String),

    /// A primary key was declared more than once along an inheritance chain.
    #[error("Table '{0}' declares its PRIMARY KEY more than once")]
    DuplicatePrimaryKey(String),

    /// Two tables share a name.
    #[error("Duplicate table definition: '{0}'")]
    DuplicateTable(String),

    /// Two columns of a flattened table share a name.
    #[error("Duplicate column definition: '{table}.{column}'")]
    DuplicateColumn {
        /// Table being flattened.
        table: String,
        /// Column declared twice.
        column: String,
    },

    /// An `extends` chain revisits a table.
    #[error("Circular table dependency detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),

    /// A table or parent table name does not resolve.
    #[error("Table '{0}' is not defined")]
    UnknownTable(String),

    /// A constraint, index or foreign key names a missing column.
    #[error("Column '{table}.{column}' is not defined")]
    UnknownColumn {
        /// Table the lookup ran against.
        table: String,
        /// Missing column.
        column: String,
    },

    /// A primary key column is nullable.
    #[error("Column '{table}.{column}' must be NOT NULL to be a PRIMARY KEY")]
    NullablePrimaryKey {
        /// Owning table.
        table: String,
        /// Nullable key column.
        column: String,
    },

    /// A foreign key targets a table declared after the referencing one.
    #[error("Table '{table}' references '{references}' which is declared after it")]
    ForwardReference {
        /// Referencing table.
        table: String,
        /// Referenced table.
        references: String,
    },

    /// A name is not a valid SQL identifier.
    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    /// A default value does not match the column kind.
    #[error("Default value of '{table}.{column}' does not match its {expected} type")]
    DefaultTypeMismatch {
        /// Owning table.
        table: String,
        /// Column with the bad default.
        column: String,
        /// Kind name of the column.
        expected: String,
    },
}

/// Errors raised while compiling a schema or a statement.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The schema model is unusable.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A numeric value falls outside the declared bounds of its column.
    #[error("Value {value} of '{table}.{column}' is out of range: {reason}")]
    RangeViolation {
        /// Owning table.
        table: String,
        /// Offending column.
        column: String,
        /// Rendered value.
        value: String,
        /// Which bound was exceeded.
        reason: String,
    },

    /// A char or binary value exceeds the declared length of its column.
    #[error("Value of '{table}.{column}' has length {actual}, exceeding {length}")]
    LengthViolation {
        /// Owning table.
        table: String,
        /// Offending column.
        column: String,
        /// Declared length.
        length: u32,
        /// Actual length.
        actual: usize,
    },

    /// An identifier collides with a reserved word in strict mode.
    #[error("'{name}' is a reserved word in {}", .standards.join(", "))]
    ReservedWord {
        /// Offending identifier.
        name: String,
        /// Standards or vendors reserving the word.
        standards: Vec<String>,
    },

    /// The target dialect cannot express a construct.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// No dialect is registered under the requested name.
    #[error("Unsupported vendor: {0}")]
    UnsupportedVendor(String),

    /// Branches of a CASE expression have no common type.
    #[error("Incompatible CASE branch types: {left} and {right}")]
    IncompatibleCaseTypes {
        /// Type accumulated so far.
        left: String,
        /// Type of the offending branch.
        right: String,
    },

    /// A result value could not be decoded into its expected kind.
    #[error("Cannot decode column {position} as {expected}: found {found}")]
    Decode {
        /// Zero-based result position.
        position: usize,
        /// Expected kind.
        expected: String,
        /// Description of the raw value.
        found: String,
    },
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_table_and_column() {
        let err = Error::from(SchemaError::NullablePrimaryKey {
            table: "account".into(),
            column: "id".into(),
        });
        assert_eq!(
            err.to_string(),
            "Column 'account.id' must be NOT NULL to be a PRIMARY KEY"
        );
    }

    #[test]
    fn test_circular_dependency_message() {
        let err = SchemaError::CircularDependency(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "Circular table dependency detected: a -> b -> a");
    }

    #[test]
    fn test_reserved_word_message() {
        let err = Error::ReservedWord {
            name: "select".into(),
            standards: vec!["SQL-92".into(), "SQL-99".into()],
        };
        assert_eq!(err.to_string(), "'select' is a reserved word in SQL-92, SQL-99");
    }
}
