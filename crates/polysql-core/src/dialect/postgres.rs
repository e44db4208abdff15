//! PostgreSQL dialect.

use super::{canonical_parts, check_decimal_precision, AutoIncrement, Dialect, EnumStrategy};
use crate::context::Compilation;
use crate::error::Result;
use crate::expr::{Function, TemporalOp};
use crate::schema::FlatTable;
use crate::statement::{Statement, StatementKind};
use crate::types::{IntegerWidth, Interval, IntervalUnit, Kind, Value};
use crate::vendor::Vendor;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn enum_columns(table: &FlatTable) -> impl Iterator<Item = (&str, &[String])> {
        table.columns.iter().filter_map(|c| match &c.kind {
            Kind::Enum { values } => Some((c.name.as_str(), values.as_slice())),
            _ => None,
        })
    }
}

impl Dialect for PostgresDialect {
    fn vendor(&self) -> Vendor {
        Vendor::PostgreSql
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        &[
            "ANALYSE", "ANALYZE", "ILIKE", "LIMIT", "OFFSET", "PLACING", "RETURNING",
            "SIMILAR", "VARIADIC", "VERBOSE",
        ]
    }

    fn enum_strategy(&self) -> EnumStrategy {
        EnumStrategy::NamedType
    }

    fn declare(&self, kind: &Kind) -> Result<String> {
        Ok(match kind {
            Kind::Integer {
                width, unsigned, ..
            } => {
                let width = if *unsigned { width.widen() } else { Some(*width) };
                match width {
                    Some(IntegerWidth::Tiny | IntegerWidth::Small) => "SMALLINT".to_string(),
                    Some(IntegerWidth::Int) => "INTEGER".to_string(),
                    Some(IntegerWidth::Big) => "BIGINT".to_string(),
                    None => "NUMERIC(20)".to_string(),
                }
            }
            Kind::Float { .. } => "REAL".to_string(),
            Kind::Double { .. } => "DOUBLE PRECISION".to_string(),
            Kind::Decimal {
                precision, scale, ..
            } => {
                check_decimal_precision(self.vendor(), *precision, 255)?;
                format!("DECIMAL({precision}, {scale})")
            }
            Kind::Char {
                length,
                varying: false,
            } => format!("CHAR({length})"),
            Kind::Char {
                length,
                varying: true,
            } => format!("VARCHAR({length})"),
            Kind::Clob { .. } => "TEXT".to_string(),
            Kind::Binary { .. } | Kind::Blob { .. } => "BYTEA".to_string(),
            Kind::Date => "DATE".to_string(),
            Kind::Time { precision } => format!("TIME({precision})"),
            Kind::Datetime { precision } => format!("TIMESTAMP({precision})"),
            Kind::Boolean => "BOOLEAN".to_string(),
            Kind::Enum { values } => format!("VARCHAR({})", Kind::enum_width(values)),
        })
    }

    fn auto_increment(&self) -> AutoIncrement {
        AutoIncrement::Serial
    }

    fn create_prelude(&self, ctx: &mut Compilation<'_>, table: &FlatTable) -> Vec<Statement> {
        Self::enum_columns(table)
            .map(|(column, values)| {
                let values: Vec<String> = values
                    .iter()
                    .map(|v| self.literal(&Value::from(v.as_str())))
                    .collect();
                Statement::new(
                    StatementKind::CreateType,
                    format!(
                        "CREATE TYPE {} AS ENUM ({})",
                        ctx.quote(&self.enum_type_name(&table.name, column)),
                        values.join(", ")
                    ),
                )
            })
            .collect()
    }

    fn drop_table(&self, ctx: &mut Compilation<'_>, table: &FlatTable) -> Vec<Statement> {
        let mut statements = vec![Statement::new(
            StatementKind::DropTable,
            format!("DROP TABLE IF EXISTS {}", ctx.quote(&table.name)),
        )];
        for (column, _) in Self::enum_columns(table) {
            statements.push(Statement::new(
                StatementKind::DropType,
                format!(
                    "DROP TYPE IF EXISTS {}",
                    ctx.quote(&self.enum_type_name(&table.name, column))
                ),
            ));
        }
        statements
    }

    fn literal(&self, value: &Value) -> String {
        match value {
            Value::Binary(b) => format!("'\\x{}'::bytea", crate::types::hex(b)),
            Value::Boolean(b) => self.boolean_literal(*b).to_string(),
            _ => value.to_sql_inline(),
        }
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn function(&self, func: Function, args: &[String]) -> Result<String> {
        Ok(match func {
            Function::Pi => String::from("PI()"),
            Function::CurrentDate => String::from("CURRENT_DATE"),
            Function::CurrentTime => String::from("CURRENT_TIME"),
            Function::CurrentTimestamp => String::from("CURRENT_TIMESTAMP"),
            Function::Log => match args {
                [base, x] => format!("(LN({x}) / LN({base}))"),
                _ => format!("LOG({})", args.join(", ")),
            },
            Function::Log2 => format!("(LN({}) / LN(2))", args.join(", ")),
            Function::Log10 => format!("LOG({})", args.join(", ")),
            _ => format!("{}({})", func.sql_name(), args.join(", ")),
        })
    }

    fn temporal(
        &self,
        op: TemporalOp,
        operand: &str,
        kind: &Kind,
        interval: &Interval,
    ) -> Result<String> {
        let parts: Vec<String> = canonical_parts(interval)
            .into_iter()
            .map(|(amount, unit)| {
                let keyword = match unit {
                    IntervalUnit::Microseconds => "MICROSECONDS",
                    other => other.keyword(),
                };
                format!("{amount} {keyword}")
            })
            .collect();
        let sign = match op {
            TemporalOp::Add => "+",
            TemporalOp::Sub => "-",
        };
        let sql = format!("({operand} {sign} INTERVAL '{}')", parts.join(" "));
        Ok(if *kind == Kind::Date {
            format!("CAST({sql} AS DATE)")
        } else {
            sql
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_widens() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.declare(&Kind::tinyint()).unwrap(), "SMALLINT");
        assert_eq!(dialect.declare(&Kind::int().unsigned()).unwrap(), "BIGINT");
        assert_eq!(dialect.declare(&Kind::bigint().unsigned()).unwrap(), "NUMERIC(20)");
    }

    #[test]
    fn test_binary_literal() {
        assert_eq!(
            PostgresDialect::new().literal(&Value::Binary(vec![0xab, 0x01])),
            "'\\xAB01'::bytea"
        );
    }

    #[test]
    fn test_date_interval_casts_back() {
        let sql = PostgresDialect::new()
            .temporal(
                TemporalOp::Sub,
                "a.\"d\"",
                &Kind::Date,
                &Interval::new(3, IntervalUnit::Days),
            )
            .unwrap();
        assert_eq!(sql, "CAST((a.\"d\" - INTERVAL '3 DAY') AS DATE)");
    }
}
