//! Apache Derby dialect.

use super::{
    canonical_parts, check_decimal_precision, check_length, AutoIncrement, Dialect, Pagination,
    Upsert,
};
use crate::context::Compilation;
use crate::dml::{JoinKind, Lock, LockStrength, LockWait};
use crate::error::{Error, Result};
use crate::expr::{Function, TemporalOp};
use crate::schema::{FlatTable, IndexType};
use crate::statement::{Statement, StatementKind};
use crate::types::{IntegerWidth, Interval, IntervalUnit, Kind, Value};
use crate::vendor::Vendor;

/// Apache Derby dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerbyDialect;

impl DerbyDialect {
    /// Creates a new Derby dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn bit_data(&self, length: u32, varying: bool) -> Result<String> {
        if varying {
            check_length(self.vendor(), "VARCHAR FOR BIT DATA", length, 32_672)?;
            Ok(format!("VARCHAR({length}) FOR BIT DATA"))
        } else {
            check_length(self.vendor(), "CHAR FOR BIT DATA", length, 254)?;
            Ok(format!("CHAR({length}) FOR BIT DATA"))
        }
    }
}

/// Whether a compiled fragment carries a `?` placeholder.
fn binds(fragment: &str) -> bool {
    fragment.contains('?')
}

impl Dialect for DerbyDialect {
    fn vendor(&self) -> Vendor {
        Vendor::Derby
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        &["BOOLEAN", "CALL", "CURRENT_ROLE", "EXPLAIN", "LTRIM", "RTRIM", "XMLEXISTS"]
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
                    None => "DECIMAL(20)".to_string(),
                }
            }
            Kind::Float { .. } => "REAL".to_string(),
            Kind::Double { .. } => "DOUBLE".to_string(),
            Kind::Decimal {
                precision, scale, ..
            } => {
                check_decimal_precision(self.vendor(), *precision, 31)?;
                format!("DECIMAL({precision}, {scale})")
            }
            Kind::Char {
                length,
                varying: false,
            } => {
                check_length(self.vendor(), "CHAR", *length, 254)?;
                format!("CHAR({length})")
            }
            Kind::Char {
                length,
                varying: true,
            } => {
                check_length(self.vendor(), "VARCHAR", *length, 32_672)?;
                format!("VARCHAR({length})")
            }
            Kind::Clob { .. } => "CLOB".to_string(),
            Kind::Binary { length, varying } => self.bit_data(*length, *varying)?,
            Kind::Blob { .. } => "BLOB".to_string(),
            Kind::Date => "DATE".to_string(),
            Kind::Time { .. } => "TIME".to_string(),
            Kind::Datetime { .. } => "TIMESTAMP".to_string(),
            Kind::Boolean => "BOOLEAN".to_string(),
            Kind::Enum { values } => format!("VARCHAR({})", Kind::enum_width(values)),
        })
    }

    fn auto_increment(&self) -> AutoIncrement {
        AutoIncrement::Keyword("GENERATED BY DEFAULT AS IDENTITY")
    }

    fn declares_null(&self) -> bool {
        false
    }

    fn index_type_clause(&self, _index_type: IndexType) -> Option<&'static str> {
        None
    }

    fn drop_table(&self, ctx: &mut Compilation<'_>, table: &FlatTable) -> Vec<Statement> {
        vec![Statement::new(
            StatementKind::DropTable,
            format!("DROP TABLE {}", ctx.quote(&table.name)),
        )]
    }

    fn literal(&self, value: &Value) -> String {
        match value {
            Value::Boolean(b) => self.boolean_literal(*b).to_string(),
            Value::Date(d) => format!("DATE('{}')", d.format("%Y-%m-%d")),
            Value::Time(t) => format!("TIME('{}')", t.format("%H:%M:%S")),
            Value::Datetime(dt) => {
                format!("TIMESTAMP('{}')", dt.format("%Y-%m-%d %H:%M:%S%.f"))
            }
            _ => value.to_sql_inline(),
        }
    }

    fn pagination(&self) -> Pagination {
        Pagination::OffsetFetch
    }

    fn upsert(&self) -> Upsert {
        Upsert::Merge
    }

    fn native_boolean_projection(&self) -> bool {
        false
    }

    fn dummy_table(&self) -> Option<&'static str> {
        Some("SYSIBM.SYSDUMMY1")
    }

    fn supports_join(&self, kind: JoinKind) -> bool {
        kind != JoinKind::Full
    }

    fn lock_clause(&self, lock: &Lock, _of: &[String]) -> Option<String> {
        match (lock.strength, lock.wait) {
            (LockStrength::Update, LockWait::Wait) => Some(" FOR UPDATE".to_string()),
            _ => None,
        }
    }

    fn merge_derived_source(&self) -> bool {
        false
    }

    fn supports_return_generated_keys_batch(&self) -> bool {
        false
    }

    fn function(&self, func: Function, args: &[String]) -> Result<String> {
        Ok(match (func, args) {
            (Function::Log, [base, x]) if binds(base) && binds(x) => {
                return Err(Error::UnsupportedOperation(
                    "Derby LOG with a bound base and argument would swap their parameters"
                        .to_string(),
                ))
            }
            (Function::Log, [base, x]) => format!("(LN({x}) / LN({base}))"),
            (Function::Log2, [x]) => format!("(LN({x}) / LN(2))"),
            (Function::Log10, [x]) => format!("LOG10({x})"),
            (Function::Power, [x, y]) => format!("EXP(LN({x}) * {y})"),
            (Function::Round, [x]) if binds(x) => {
                return Err(Error::UnsupportedOperation(
                    "Derby ROUND repeats its argument, which cannot be a bound parameter"
                        .to_string(),
                ))
            }
            (Function::Round, [x]) => format!("(SIGN({x}) * FLOOR(ABS({x}) + 0.5))"),
            (Function::Round, _) => {
                return Err(Error::UnsupportedOperation(
                    "Derby cannot round to a number of digits".to_string(),
                ))
            }
            (Function::Pi, _) => String::from("PI()"),
            (Function::CurrentDate, _) => String::from("CURRENT_DATE"),
            (Function::CurrentTime, _) => String::from("CURRENT_TIME"),
            (Function::CurrentTimestamp, _) => String::from("CURRENT_TIMESTAMP"),
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
        let interval = match op {
            TemporalOp::Add => interval.clone(),
            TemporalOp::Sub => interval.negate(),
        };
        let mut sql = operand.to_string();
        for (amount, unit) in canonical_parts(&interval) {
            let (amount, unit) = match unit {
                IntervalUnit::Microseconds => (amount * 1_000, "FRAC_SECOND"),
                IntervalUnit::Seconds => (amount, "SECOND"),
                IntervalUnit::Minutes => (amount, "MINUTE"),
                IntervalUnit::Hours => (amount, "HOUR"),
                IntervalUnit::Months => (amount, "MONTH"),
                IntervalUnit::Years => (amount, "YEAR"),
                _ => (amount, "DAY"),
            };
            sql = format!("{{fn TIMESTAMPADD(SQL_TSI_{unit}, {amount}, {sql})}}");
        }
        Ok(match kind {
            Kind::Date => format!("CAST({sql} AS DATE)"),
            Kind::Time { .. } => format!("CAST({sql} AS TIME)"),
            _ => sql,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_for_bit_data() {
        let dialect = DerbyDialect::new();
        assert_eq!(
            dialect
                .declare(&Kind::Binary {
                    length: 16,
                    varying: false
                })
                .unwrap(),
            "CHAR(16) FOR BIT DATA"
        );
        assert!(dialect.declare(&Kind::char(255)).is_err());
    }

    #[test]
    fn test_nested_timestampadd() {
        let interval = Interval::new(1, IntervalUnit::Years).and(5, IntervalUnit::Milliseconds);
        assert_eq!(
            DerbyDialect::new()
                .temporal(TemporalOp::Add, "a.\"t\"", &Kind::datetime(), &interval)
                .unwrap(),
            "{fn TIMESTAMPADD(SQL_TSI_FRAC_SECOND, 5000000, {fn TIMESTAMPADD(SQL_TSI_YEAR, 1, a.\"t\")})}"
        );
    }

    #[test]
    fn test_emulated_functions() {
        let dialect = DerbyDialect::new();
        let args = ["x".to_string(), "3".to_string()];
        assert_eq!(
            dialect.function(Function::Power, &args).unwrap(),
            "EXP(LN(x) * 3)"
        );
        assert_eq!(
            dialect.function(Function::Round, &args[..1]).unwrap(),
            "(SIGN(x) * FLOOR(ABS(x) + 0.5))"
        );
        assert!(dialect.function(Function::Round, &args).is_err());
    }

    #[test]
    fn test_emulations_keep_parameter_order() {
        let dialect = DerbyDialect::new();
        let column = "a.\"n\"".to_string();
        let bound = "?".to_string();

        assert_eq!(
            dialect.function(Function::Log, &[bound.clone(), column.clone()]).unwrap(),
            "(LN(a.\"n\") / LN(?))"
        );
        assert!(matches!(
            dialect.function(Function::Log, &[bound.clone(), bound.clone()]),
            Err(Error::UnsupportedOperation(_))
        ));
        assert!(matches!(
            dialect.function(Function::Round, &[bound]),
            Err(Error::UnsupportedOperation(_))
        ));
        assert_eq!(
            dialect.function(Function::Round, &[column]).unwrap(),
            "(SIGN(a.\"n\") * FLOOR(ABS(a.\"n\") + 0.5))"
        );
    }

    #[test]
    fn test_no_null_keyword() {
        assert!(!DerbyDialect::new().declares_null());
    }
}
