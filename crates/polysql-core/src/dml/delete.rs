//! DELETE statements.

use super::update::key_filter;
use crate::context::Compilation;
use crate::error::Result;
use crate::expr::{compile, Expr};
use crate::schema::FlatTable;
use crate::types::Value;

/// A DELETE from one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    table: String,
    filter: Option<Expr>,
}

impl Delete {
    /// Deletes every row of `table` unless filtered.
    #[must_use]
    pub fn new(table: &FlatTable) -> Self {
        Self {
            table: table.name.clone(),
            filter: None,
        }
    }

    /// Deletes the row whose primary key matches `values`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedOperation`] when a primary key
    /// column has no value.
    pub fn row<I, S, V>(table: &FlatTable, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let values: Vec<(String, Value)> = values
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .collect();
        Ok(Self::new(table).filter(key_filter(table, &values)?))
    }

    /// Adds a WHERE predicate, AND-ed with any existing one.
    #[must_use]
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub(super) fn compile(&self, ctx: &mut Compilation<'_>) -> Result<()> {
        ctx.enter_scope();
        ctx.register(&self.table, None);
        ctx.push("DELETE FROM ");
        ctx.push_ident(&self.table);
        let result = match &self.filter {
            Some(filter) => {
                ctx.push(" WHERE ");
                compile(ctx, filter)
            }
            None => Ok(()),
        };
        ctx.exit_scope();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{OracleDialect, SqliteDialect};
    use crate::dml::DmlCompiler;
    use crate::schema::{Column, Schema, Table};
    use crate::types::Kind;

    fn pair() -> FlatTable {
        Schema::new()
            .table(
                Table::new("pair")
                    .column(Column::new("left_id", Kind::int()).not_null())
                    .column(Column::new("right_id", Kind::int()).not_null())
                    .primary_key(["left_id", "right_id"]),
            )
            .flatten()
            .unwrap()
            .tables
            .remove(0)
    }

    #[test]
    fn test_delete_all() {
        let statement = DmlCompiler::new(&SqliteDialect::new())
            .delete(&Delete::new(&pair()))
            .unwrap();
        assert_eq!(statement.sql, "DELETE FROM \"pair\"");
        assert!(statement.params.is_empty());
    }

    #[test]
    fn test_delete_row_by_composite_key() {
        let delete = Delete::row(&pair(), [("right_id", 2), ("left_id", 1)]).unwrap();
        let statement = DmlCompiler::new(&OracleDialect::new()).delete(&delete).unwrap();
        assert_eq!(
            statement.sql,
            "DELETE FROM \"pair\" WHERE (\"left_id\" = ? AND \"right_id\" = ?)"
        );
        assert_eq!(statement.params, vec![Value::Integer(1), Value::Integer(2)]);
    }
}
