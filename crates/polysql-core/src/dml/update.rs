//! UPDATE statements.

use crate::context::Compilation;
use crate::error::{Error, Result, SchemaError};
use crate::expr::{compile, Expr};
use crate::schema::{FlatTable, GenerateOnUpdate};
use crate::types::{validate_value, Value};

/// What a SET entry assigns.
#[derive(Debug, Clone, PartialEq)]
enum Assignment {
    Value(Value),
    Expr(Expr),
}

/// An UPDATE of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    table: FlatTable,
    sets: Vec<(String, Assignment)>,
    filter: Option<Expr>,
}

impl Update {
    /// Starts an UPDATE of `table`.
    #[must_use]
    pub fn new(table: &FlatTable) -> Self {
        Self {
            table: table.clone(),
            sets: Vec::new(),
            filter: None,
        }
    }

    /// Updates one row: every non-key column in `values` is set and the
    /// key columns select the row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] when a primary key column
    /// has no value.
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
        let mut update = Self::new(table);
        update.filter = Some(key_filter(table, &values)?);
        for (column, value) in values {
            if !table.is_primary(&column) {
                update = update.set_value(column, value);
            }
        }
        Ok(update)
    }

    /// Sets a column to a value, checked against the column bounds.
    #[must_use]
    pub fn set_value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sets.push((column.into(), Assignment::Value(value.into())));
        self
    }

    /// Sets a column to an expression.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, expr: Expr) -> Self {
        self.sets.push((column.into(), Assignment::Expr(expr)));
        self
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
        ctx.register(&self.table.name, None);
        let result = self.compile_scoped(ctx);
        ctx.exit_scope();
        result
    }

    fn compile_scoped(&self, ctx: &mut Compilation<'_>) -> Result<()> {
        let dialect = ctx.dialect();
        ctx.push("UPDATE ");
        ctx.push_ident(&self.table.name);
        ctx.push(" SET ");
        let mut first = true;
        for (name, assignment) in &self.sets {
            let column = self.table.column(name).ok_or_else(|| SchemaError::UnknownColumn {
                table: self.table.name.clone(),
                column: name.clone(),
            })?;
            if !std::mem::take(&mut first) {
                ctx.push(", ");
            }
            ctx.push_ident(name);
            ctx.push(" = ");
            match assignment {
                Assignment::Value(value) if value.is_null() => ctx.push("NULL"),
                Assignment::Value(value) => {
                    validate_value(&self.table.name, column, value, dialect)?;
                    ctx.bind(Some(&column.kind), value.clone());
                }
                Assignment::Expr(expr) => compile(ctx, expr)?,
            }
        }
        for column in &self.table.columns {
            if self.sets.iter().any(|(name, _)| *name == column.name) {
                continue;
            }
            let Some(policy) = column.generate_on_update else {
                continue;
            };
            if !std::mem::take(&mut first) {
                ctx.push(", ");
            }
            let quoted = ctx.quote(&column.name);
            match policy {
                GenerateOnUpdate::Timestamp => {
                    ctx.push(&format!("{quoted} = CURRENT_TIMESTAMP"));
                }
                GenerateOnUpdate::Increment => ctx.push(&format!("{quoted} = {quoted} + 1")),
            }
        }
        if first {
            return Err(Error::UnsupportedOperation(format!(
                "UPDATE of '{}' sets no columns",
                self.table.name
            )));
        }
        if let Some(filter) = &self.filter {
            ctx.push(" WHERE ");
            compile(ctx, filter)?;
        }
        Ok(())
    }
}

/// `k1 = ? AND k2 = ?` over the primary key of `table`.
pub(super) fn key_filter(table: &FlatTable, values: &[(String, Value)]) -> Result<Expr> {
    let mut filter: Option<Expr> = None;
    for key in &table.primary_key {
        let Some((_, value)) = values.iter().find(|(c, _)| c == key) else {
            return Err(Error::UnsupportedOperation(format!(
                "row of '{}' has no value for primary key column '{key}'",
                table.name
            )));
        };
        let predicate = table.col(key)?.eq(Expr::lit(value.clone()));
        filter = Some(match filter {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
    }
    filter.ok_or_else(|| {
        Error::UnsupportedOperation(format!("table '{}' has no primary key", table.name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect};
    use crate::dml::DmlCompiler;
    use crate::schema::{Column, Schema, Table};
    use crate::types::Kind;

    fn document() -> FlatTable {
        Schema::new()
            .table(
                Table::new("document")
                    .column(Column::new("id", Kind::bigint()).primary())
                    .column(Column::new("title", Kind::varchar(40)))
                    .column(
                        Column::new("version", Kind::int())
                            .not_null()
                            .generate_on_update(GenerateOnUpdate::Increment),
                    )
                    .column(
                        Column::new("modified", Kind::datetime())
                            .generate_on_update(GenerateOnUpdate::Timestamp),
                    ),
            )
            .flatten()
            .unwrap()
            .tables
            .remove(0)
    }

    #[test]
    fn test_row_update_keys_on_primary_key() {
        let update = Update::row(&document(), [("id", Value::from(7)), ("title", Value::from("t"))])
            .unwrap();
        let statement = DmlCompiler::new(&PostgresDialect::new()).update(&update).unwrap();
        assert_eq!(
            statement.sql,
            "UPDATE \"document\" SET \"title\" = $1, \"version\" = \"version\" + 1, \
             \"modified\" = CURRENT_TIMESTAMP WHERE \"id\" = $2"
        );
        assert_eq!(statement.params, vec![Value::from("t"), Value::Integer(7)]);
    }

    #[test]
    fn test_row_without_key_fails() {
        assert!(Update::row(&document(), [("title", "t")]).is_err());
    }

    #[test]
    fn test_set_expression() {
        let table = document();
        let update = Update::new(&table)
            .set("title", Expr::string(crate::expr::StringOp::Upper, table.col("title").unwrap()))
            .filter(table.col("id").unwrap().gt(Expr::lit(10)));
        let statement = DmlCompiler::new(&MySqlDialect::mysql()).update(&update).unwrap();
        assert_eq!(
            statement.sql,
            "UPDATE `document` SET `title` = UPPER(`title`), `version` = `version` + 1, \
             `modified` = CURRENT_TIMESTAMP WHERE `id` > ?"
        );
    }

    #[test]
    fn test_unknown_column() {
        let update = Update::new(&document()).set_value("nope", 1);
        assert!(DmlCompiler::new(&MySqlDialect::mysql()).update(&update).is_err());
    }
}
