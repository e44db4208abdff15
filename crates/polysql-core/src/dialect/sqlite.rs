//! SQLite dialect.

use rust_decimal::Decimal;

use super::{canonical_parts, temporal_as_text, AutoIncrement, Dialect};
use crate::dml::Lock;
use crate::error::Result;
use crate::expr::{Function, TemporalOp};
use crate::schema::IndexType;
use crate::types::{IntegerWidth, Interval, IntervalUnit, Kind, Value};
use crate::vendor::Vendor;

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn modifier(amount: i64, unit: IntervalUnit) -> String {
        let (amount, name) = match unit {
            IntervalUnit::Microseconds => {
                let seconds = Decimal::new(amount, 6).normalize();
                let sign = if seconds.is_sign_negative() { "" } else { "+" };
                return format!("'{sign}{seconds} seconds'");
            }
            IntervalUnit::Seconds => (amount, "seconds"),
            IntervalUnit::Minutes => (amount, "minutes"),
            IntervalUnit::Hours => (amount, "hours"),
            IntervalUnit::Months => (amount, "months"),
            IntervalUnit::Years => (amount, "years"),
            _ => (amount, "days"),
        };
        format!("'{amount:+} {name}'")
    }
}

impl Dialect for SqliteDialect {
    fn vendor(&self) -> Vendor {
        Vendor::Sqlite
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        &[
            "ABORT", "AUTOINCREMENT", "GLOB", "INDEXED", "ISNULL", "NOTNULL", "PRAGMA",
            "RAISE", "REGEXP", "REINDEX", "VACUUM",
        ]
    }

    fn declare(&self, kind: &Kind) -> Result<String> {
        Ok(match kind {
            Kind::Integer { width, .. } => match width {
                IntegerWidth::Tiny => "TINYINT",
                IntegerWidth::Small => "SMALLINT",
                IntegerWidth::Int => "INT",
                IntegerWidth::Big => "BIGINT",
            }
            .to_string(),
            Kind::Float { .. } => "FLOAT".to_string(),
            Kind::Double { .. } => "DOUBLE".to_string(),
            Kind::Decimal {
                precision, scale, ..
            } => format!("DECIMAL({precision}, {scale})"),
            Kind::Char {
                length,
                varying: false,
            } => format!("CHAR({length})"),
            Kind::Char {
                length,
                varying: true,
            } => format!("VARCHAR({length})"),
            Kind::Clob { .. } => "TEXT".to_string(),
            Kind::Binary { .. } | Kind::Blob { .. } => "BLOB".to_string(),
            Kind::Date => "DATE".to_string(),
            Kind::Time { .. } => "TIME".to_string(),
            Kind::Datetime { .. } => "DATETIME".to_string(),
            Kind::Boolean => "BOOLEAN".to_string(),
            Kind::Enum { values } => format!("VARCHAR({})", Kind::enum_width(values)),
        })
    }

    fn auto_increment(&self) -> AutoIncrement {
        AutoIncrement::InlinePrimaryKey
    }

    fn index_type_clause(&self, _index_type: IndexType) -> Option<&'static str> {
        None
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn literal(&self, value: &Value) -> String {
        match value {
            Value::Boolean(b) => self.boolean_literal(*b).to_string(),
            Value::Date(_) | Value::Time(_) | Value::Datetime(_) => {
                temporal_as_text(value.clone()).to_sql_inline()
            }
            _ => value.to_sql_inline(),
        }
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    fn upsert_select_needs_where(&self) -> bool {
        true
    }

    fn lock_clause(&self, _lock: &Lock, _of: &[String]) -> Option<String> {
        None
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn modulo(&self, left: &str, right: &str) -> String {
        format!("({left} % {right})")
    }

    fn function(&self, func: Function, args: &[String]) -> Result<String> {
        Ok(match func {
            Function::Pi => String::from("PI()"),
            Function::CurrentDate => String::from("CURRENT_DATE"),
            Function::CurrentTime => String::from("CURRENT_TIME"),
            Function::CurrentTimestamp => String::from("CURRENT_TIMESTAMP"),
            Function::Log2 => format!("LOG2({})", args.join(", ")),
            Function::Log10 => format!("LOG10({})", args.join(", ")),
            _ => format!("{}({})", func.sql_name(), args.join(", ")),
        })
    }

    fn cast_type(&self, kind: &Kind) -> Result<String> {
        Ok(match kind {
            Kind::Integer { .. } | Kind::Boolean => "INTEGER",
            Kind::Float { .. } | Kind::Double { .. } => "REAL",
            Kind::Decimal { .. } => "NUMERIC",
            Kind::Binary { .. } | Kind::Blob { .. } => "BLOB",
            _ => "TEXT",
        }
        .to_string())
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
        let mut args = vec![operand.to_string()];
        args.extend(
            canonical_parts(&interval)
                .into_iter()
                .map(|(amount, unit)| Self::modifier(amount, unit)),
        );
        Ok(match kind {
            Kind::Date => format!("DATE({})", args.join(", ")),
            Kind::Time { .. } => format!("TIME({})", args.join(", ")),
            Kind::Datetime { precision } if *precision > 0 => {
                format!("STRFTIME('%Y-%m-%d %H:%M:%f', {})", args.join(", "))
            }
            _ => format!("DATETIME({})", args.join(", ")),
        })
    }

    fn bind_value(&self, _kind: Option<&Kind>, value: Value) -> Value {
        match value {
            Value::Boolean(b) => Value::Integer(i128::from(b)),
            Value::Decimal(d) => Value::Text(d.to_string()),
            other => temporal_as_text(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dml::{LockStrength, LockWait};
    use chrono::NaiveDate;

    #[test]
    fn test_interval_modifiers() {
        let dialect = SqliteDialect::new();
        let interval = Interval::new(1, IntervalUnit::Months).and(2, IntervalUnit::Days);
        assert_eq!(
            dialect
                .temporal(TemporalOp::Add, "a.\"d\"", &Kind::Date, &interval)
                .unwrap(),
            "DATE(a.\"d\", '+1 months', '+2 days')"
        );
        assert_eq!(
            dialect
                .temporal(TemporalOp::Sub, "x", &Kind::datetime(), &Interval::new(3, IntervalUnit::Hours))
                .unwrap(),
            "DATETIME(x, '-3 hours')"
        );
    }

    #[test]
    fn test_offset_without_limit() {
        assert_eq!(
            SqliteDialect::new().limit_offset(None, Some(5)),
            " LIMIT -1 OFFSET 5"
        );
    }

    #[test]
    fn test_binds_store_classes() {
        let dialect = SqliteDialect::new();
        assert_eq!(dialect.bind_value(None, Value::Boolean(true)), Value::Integer(1));
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            dialect.bind_value(None, Value::Date(date)),
            Value::from("2024-02-29")
        );
        assert_eq!(
            dialect.bind_value(None, Value::Decimal(Decimal::new(1050, 2))),
            Value::from("10.50")
        );
    }

    #[test]
    fn test_no_row_locks() {
        let lock = Lock {
            strength: LockStrength::Update,
            wait: LockWait::Wait,
            of: Vec::new(),
        };
        assert_eq!(SqliteDialect::new().lock_clause(&lock, &[]), None);
    }

    #[test]
    fn test_date_literal_is_text() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(SqliteDialect::new().literal(&Value::Date(date)), "'2024-01-05'");
    }
}
