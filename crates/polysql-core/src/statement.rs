//! Compiled statements handed to the execution layer.

use std::fmt;

use crate::dml::RowPlan;
use crate::types::Value;

/// What a compiled statement does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// `CREATE TABLE`.
    CreateTable,
    /// `DROP TABLE`.
    DropTable,
    /// `CREATE INDEX`.
    CreateIndex,
    /// `CREATE SEQUENCE`.
    CreateSequence,
    /// `DROP SEQUENCE`.
    DropSequence,
    /// `CREATE TRIGGER`.
    CreateTrigger,
    /// `DROP TRIGGER`.
    DropTrigger,
    /// `CREATE TYPE`.
    CreateType,
    /// `DROP TYPE`.
    DropType,
    /// `SELECT`.
    Select,
    /// `INSERT`, including upserts compiled as INSERT.
    Insert,
    /// `UPDATE`.
    Update,
    /// `DELETE`.
    Delete,
    /// `MERGE`.
    Merge,
}

impl StatementKind {
    /// Whether the statement removes a schema object.
    #[must_use]
    pub const fn is_drop(self) -> bool {
        matches!(
            self,
            Self::DropTable | Self::DropSequence | Self::DropTrigger | Self::DropType
        )
    }

    /// Whether the statement creates a schema object.
    #[must_use]
    pub const fn is_create(self) -> bool {
        matches!(
            self,
            Self::CreateTable
                | Self::CreateIndex
                | Self::CreateSequence
                | Self::CreateTrigger
                | Self::CreateType
        )
    }
}

/// SQL text with its parameters in bind order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Statement kind.
    pub kind: StatementKind,
    /// SQL text.
    pub sql: String,
    /// Bound parameters in placeholder order.
    pub params: Vec<Value>,
    /// Row-decoding plan, for SELECT.
    pub plan: Option<RowPlan>,
    /// Columns whose values the database generates on insert.
    pub generated_keys: Vec<String>,
    /// Clauses dropped or degraded while compiling.
    pub warnings: Vec<String>,
}

impl Statement {
    /// A parameterless statement.
    #[must_use]
    pub fn new(kind: StatementKind, sql: impl Into<String>) -> Self {
        Self {
            kind,
            sql: sql.into(),
            params: Vec::new(),
            plan: None,
            generated_keys: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// An ordered batch of statements plus the warnings raised producing it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatementBatch {
    /// Statements in execution order.
    pub statements: Vec<Statement>,
    /// Advisory messages, e.g. dropped referential actions.
    pub warnings: Vec<String>,
}

impl StatementBatch {
    /// Iterates over the SQL text of each statement.
    pub fn sql(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().map(|s| s.sql.as_str())
    }

    /// Number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the batch has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Renders the batch as a script, one statement per paragraph.
    ///
    /// Statements ending in a PL/SQL block get a `/` terminator line.
    #[must_use]
    pub fn to_script(&self) -> String {
        let mut script = String::new();
        for statement in &self.statements {
            script.push_str(&statement.sql);
            if statement.sql.trim_end().ends_with("END;") {
                script.push_str("\n/\n\n");
            } else {
                script.push_str(";\n\n");
            }
        }
        script
    }
}

impl IntoIterator for StatementBatch {
    type Item = Statement;
    type IntoIter = std::vec::IntoIter<Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_terminators() {
        let batch = StatementBatch {
            statements: vec![
                Statement::new(StatementKind::DropTable, "DROP TABLE t"),
                Statement::new(
                    StatementKind::CreateTrigger,
                    "CREATE TRIGGER x BEFORE INSERT ON t FOR EACH ROW BEGIN NULL; END;",
                ),
            ],
            warnings: Vec::new(),
        };
        assert_eq!(
            batch.to_script(),
            "DROP TABLE t;\n\nCREATE TRIGGER x BEFORE INSERT ON t FOR EACH ROW BEGIN NULL; END;\n/\n\n"
        );
    }

    #[test]
    fn test_kind_classification() {
        assert!(StatementKind::DropSequence.is_drop());
        assert!(StatementKind::CreateIndex.is_create());
        assert!(!StatementKind::Select.is_drop());
    }
}
