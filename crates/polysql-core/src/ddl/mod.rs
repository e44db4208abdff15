//! Schema definition statements.
//!
//! [`DdlCompiler`] flattens a [`Schema`] and emits, for one dialect, the
//! statements that drop and recreate every concrete table: drops first in
//! reverse declaration order, then creates in declaration order so foreign
//! keys always point at tables that already exist.

mod table;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{Compilation, QuotePolicy};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::reserved;
use crate::schema::{FlatSchema, Schema};
use crate::statement::StatementBatch;
use crate::types::{validate_default, validate_value};

/// How reserved identifiers are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compliance {
    /// Reserved identifiers are errors.
    Strict,
    /// Reserved identifiers are reported as warnings.
    #[default]
    Lenient,
}

/// Options for a DDL compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DdlOptions {
    /// Reserved-word handling.
    pub compliance: Compliance,
    /// Identifier quoting.
    pub quoting: QuotePolicy,
}

impl DdlOptions {
    /// Lenient options with every identifier quoted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets reserved-word handling.
    #[must_use]
    pub const fn compliance(mut self, compliance: Compliance) -> Self {
        self.compliance = compliance;
        self
    }

    /// Sets identifier quoting.
    #[must_use]
    pub const fn quoting(mut self, quoting: QuotePolicy) -> Self {
        self.quoting = quoting;
        self
    }
}

/// Compiles schemas into DROP and CREATE statements.
#[derive(Debug, Clone, Copy)]
pub struct DdlCompiler<'a> {
    dialect: &'a dyn Dialect,
    options: DdlOptions,
}

impl<'a> DdlCompiler<'a> {
    /// Creates a compiler for `dialect`.
    #[must_use]
    pub fn new(dialect: &'a dyn Dialect, options: DdlOptions) -> Self {
        Self { dialect, options }
    }

    /// Compiles `schema` into an ordered batch.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::SchemaError`] when the schema is invalid,
    /// [`Error::ReservedWord`] for reserved identifiers under
    /// [`Compliance::Strict`], and range or length violations for column
    /// defaults.
    pub fn compile(&self, schema: &Schema) -> Result<StatementBatch> {
        let flat = schema.flatten()?;
        self.compile_flat(&flat)
    }

    /// Compiles an already flattened schema.
    ///
    /// # Errors
    ///
    /// See [`DdlCompiler::compile`].
    pub fn compile_flat(&self, flat: &FlatSchema) -> Result<StatementBatch> {
        let mut ctx = Compilation::new(self.dialect, self.options.quoting);

        for table in flat.emitted() {
            self.check_reserved(&mut ctx, &table.name)?;
            for column in &table.columns {
                self.check_reserved(&mut ctx, &column.name)?;
                validate_default(&table.name, column, self.dialect)?;
                for bound in [&column.min, &column.max].into_iter().flatten() {
                    validate_value(&table.name, column, bound, self.dialect)?;
                }
            }
        }

        let mut statements = Vec::new();
        for table in flat.emitted().rev() {
            statements.extend(self.dialect.drop_table(&mut ctx, table));
        }
        for table in flat.emitted() {
            statements.extend(self.dialect.create_prelude(&mut ctx, table));
            statements.push(table::create_table(&mut ctx, table)?);
            statements.extend(self.dialect.create_epilogue(&mut ctx, table));
            statements.extend(table::create_indexes(&mut ctx, table));
        }

        debug!(
            dialect = self.dialect.name(),
            statements = statements.len(),
            "Compiled schema"
        );
        Ok(StatementBatch {
            statements,
            warnings: ctx.into_warnings(),
        })
    }

    fn check_reserved(&self, ctx: &mut Compilation<'_>, name: &str) -> Result<()> {
        let mut standards: Vec<String> = reserved::lookup(name)
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect();
        if self
            .dialect
            .reserved_words()
            .iter()
            .any(|w| w.eq_ignore_ascii_case(name))
        {
            standards.push(self.dialect.name().to_string());
        }
        if standards.is_empty() {
            return Ok(());
        }
        match self.options.compliance {
            Compliance::Strict => Err(Error::ReservedWord {
                name: name.to_string(),
                standards,
            }),
            Compliance::Lenient => {
                ctx.warn(format!(
                    "'{name}' is a reserved word in {}",
                    standards.join(", ")
                ));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, OracleDialect, PostgresDialect, SqliteDialect};
    use crate::schema::{Column, Table};
    use crate::types::{IntegerWidth, Kind};

    fn orders() -> Schema {
        Schema::new().table(
            Table::new("order")
                .column(Column::new("id", Kind::bigint()).primary())
                .column(Column::new("select", Kind::varchar(10))),
        )
    }

    #[test]
    fn test_lenient_reserved_words_warn() {
        let batch = DdlCompiler::new(&SqliteDialect::new(), DdlOptions::new())
            .compile(&orders())
            .unwrap();
        assert_eq!(batch.warnings.len(), 2);
        assert!(batch.warnings[0].contains("'order'"));
        assert!(batch.warnings[0].contains("SQL-92"));
    }

    #[test]
    fn test_strict_reserved_words_fail() {
        let options = DdlOptions::new().compliance(Compliance::Strict);
        let err = DdlCompiler::new(&PostgresDialect::new(), options)
            .compile(&orders())
            .unwrap_err();
        match err {
            Error::ReservedWord { name, standards } => {
                assert_eq!(name, "order");
                assert!(standards.iter().any(|s| s == "SQL-92"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_drops_precede_creates() {
        let schema = Schema::new()
            .table(Table::new("parent").column(Column::new("id", Kind::int()).primary()))
            .table(Table::new("child").column(Column::new("id", Kind::int()).primary()));
        let batch = DdlCompiler::new(&MySqlDialect::mysql(), DdlOptions::new())
            .compile(&schema)
            .unwrap();
        let kinds: Vec<_> = batch.statements.iter().map(|s| s.kind).collect();
        assert!(kinds[..2].iter().all(|k| k.is_drop()));
        assert!(kinds[2..].iter().all(|k| k.is_create()));
        assert!(batch.statements[0].sql.contains("`child`"));
        assert!(batch.statements[1].sql.contains("`parent`"));
        assert!(batch.statements[2].sql.starts_with("CREATE TABLE `parent`"));
    }

    #[test]
    fn test_skipped_tables_emit_nothing() {
        let schema = Schema::new()
            .table(Table::new("legacy").skip().column(Column::new("id", Kind::int()).primary()));
        let batch = DdlCompiler::new(&SqliteDialect::new(), DdlOptions::new())
            .compile(&schema)
            .unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_options_deserialize() {
        let options: DdlOptions =
            serde_json::from_str(r#"{"compliance": "strict", "quoting": "reserved"}"#).unwrap();
        assert_eq!(options.compliance, Compliance::Strict);
        assert_eq!(options.quoting, QuotePolicy::Reserved);
    }

    #[test]
    fn test_undeclarable_column_fails() {
        let schema = Schema::new().table(
            Table::new("note")
                .column(Column::new("id", Kind::int()).primary())
                .column(Column::new("body", Kind::char(3000))),
        );
        let err = DdlCompiler::new(&OracleDialect::new(), DdlOptions::new())
            .compile(&schema)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)), "{err}");
    }

    #[test]
    fn test_bounds_outside_kind_fail() {
        let tiny = Kind::Integer {
            width: IntegerWidth::Tiny,
            precision: Some(3),
            unsigned: false,
        };
        let schema = Schema::new()
            .table(Table::new("dial").column(Column::new("level", tiny).max(1000)));
        let err = DdlCompiler::new(&MySqlDialect::mysql(), DdlOptions::new())
            .compile(&schema)
            .unwrap_err();
        assert!(matches!(err, Error::RangeViolation { .. }), "{err}");

        let stock = Column::new("count", Kind::int().unsigned()).min(-1);
        let schema = Schema::new().table(Table::new("stock").column(stock));
        let err = DdlCompiler::new(&MySqlDialect::mysql(), DdlOptions::new())
            .compile(&schema)
            .unwrap_err();
        assert!(matches!(err, Error::RangeViolation { .. }), "{err}");
    }
}
