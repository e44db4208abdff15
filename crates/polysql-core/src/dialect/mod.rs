//! Per-vendor SQL policy.
//!
//! A [`Dialect`] answers every question where vendors disagree: how to
//! quote identifiers, how to spell a type, how to paginate, how to upsert,
//! which referential actions exist, how intervals and literals are
//! written, and how values are bound and decoded. Defaults follow ANSI SQL;
//! each vendor overrides what it does differently.

mod derby;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;

pub use derby::DerbyDialect;
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::context::Compilation;
use crate::dml::{JoinKind, Lock, LockStrength, LockWait};
use crate::error::{Error, Result};
use crate::expr::{Function, TemporalOp};
use crate::schema::{ChangeRule, FlatTable, IndexType};
use crate::statement::{Statement, StatementKind};
use crate::types::{IntegerWidth, Interval, IntervalUnit, Kind, Value};
use crate::vendor::Vendor;

/// How LIMIT/OFFSET is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// `LIMIT n OFFSET m`.
    LimitOffset,
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`.
    OffsetFetch,
    /// Nested sub-query filtered on `ROWNUM`.
    RowNum,
}

/// How insert-or-update is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// `ON CONFLICT (...) DO UPDATE SET ...`.
    OnConflict,
    /// `ON DUPLICATE KEY UPDATE ...`.
    OnDuplicateKey,
    /// `MERGE INTO ... USING ... WHEN MATCHED ... WHEN NOT MATCHED ...`.
    Merge,
}

/// How enum columns are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumStrategy {
    /// Inline `ENUM('a', 'b')` column type.
    Native,
    /// A separate `CREATE TYPE ... AS ENUM`.
    NamedType,
    /// A character column constrained by `CHECK (col IN (...))`.
    Check,
}

/// How auto-increment columns are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoIncrement {
    /// A keyword after the column definition.
    Keyword(&'static str),
    /// A serial pseudo-type replacing the integer type.
    Serial,
    /// `INTEGER PRIMARY KEY AUTOINCREMENT` on a sole key column.
    InlinePrimaryKey,
    /// A sequence plus a `BEFORE INSERT` trigger.
    Sequence,
}

/// Vendor-specific SQL generation.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// The vendor this dialect serves.
    fn vendor(&self) -> Vendor;

    /// Returns the dialect name.
    fn name(&self) -> &'static str {
        self.vendor().name()
    }

    /// Quotes an identifier.
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Words reserved by this vendor beyond the SQL standards.
    fn reserved_words(&self) -> &'static [&'static str] {
        &[]
    }

    // ---- types --------------------------------------------------------

    /// Whether numeric types can be declared `UNSIGNED`.
    fn allows_unsigned_numeric(&self) -> bool {
        false
    }

    /// How enum columns are declared.
    fn enum_strategy(&self) -> EnumStrategy {
        EnumStrategy::Check
    }

    /// Spells a column type.
    ///
    /// Unsigned kinds on dialects without unsigned types return a type
    /// wide enough for the unsigned range; the DDL compiler adds the
    /// `CHECK (col >= 0)` separately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] for kinds the vendor cannot
    /// store.
    fn declare(&self, kind: &Kind) -> Result<String>;

    /// Name of the type created for an enum column under
    /// [`EnumStrategy::NamedType`].
    fn enum_type_name(&self, table: &str, column: &str) -> String {
        format!("{table}_{column}")
    }

    /// How auto-increment is declared.
    fn auto_increment(&self) -> AutoIncrement;

    /// Spelling of the serial pseudo-type for [`AutoIncrement::Serial`].
    fn serial_type(&self, width: IntegerWidth) -> &'static str {
        match width {
            IntegerWidth::Tiny | IntegerWidth::Small => "SMALLSERIAL",
            IntegerWidth::Int => "SERIAL",
            IntegerWidth::Big => "BIGSERIAL",
        }
    }

    /// Whether nullable columns are declared with an explicit `NULL`.
    fn declares_null(&self) -> bool {
        true
    }

    /// Whether a referential action can be declared.
    fn supports_change_rule(&self, rule: ChangeRule, on_update: bool) -> bool {
        let _ = (rule, on_update);
        true
    }

    /// Whether CHECK and PRIMARY KEY clauses get constraint names.
    fn names_constraints(&self) -> bool {
        false
    }

    /// `USING` clause for a non-default index type, if supported.
    fn index_type_clause(&self, index_type: IndexType) -> Option<&'static str> {
        match index_type {
            IndexType::BTree => None,
            IndexType::Hash => Some("HASH"),
        }
    }

    /// Whether `USING` follows the column list in `CREATE INDEX`.
    fn index_type_after_columns(&self) -> bool {
        false
    }

    /// Statements creating vendor objects a table depends on.
    fn create_prelude(&self, ctx: &mut Compilation<'_>, table: &FlatTable) -> Vec<Statement> {
        let _ = (ctx, table);
        Vec::new()
    }

    /// Statements emulating vendor features after `CREATE TABLE`.
    fn create_epilogue(&self, ctx: &mut Compilation<'_>, table: &FlatTable) -> Vec<Statement> {
        let _ = (ctx, table);
        Vec::new()
    }

    /// Statements dropping a table and the objects it owns.
    fn drop_table(&self, ctx: &mut Compilation<'_>, table: &FlatTable) -> Vec<Statement> {
        vec![Statement::new(
            StatementKind::DropTable,
            format!("DROP TABLE IF EXISTS {}", ctx.quote(&table.name)),
        )]
    }

    // ---- literals -----------------------------------------------------

    /// Spelling of a boolean literal.
    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Inline literal for DDL defaults and CHECK operands.
    fn literal(&self, value: &Value) -> String {
        match value {
            Value::Boolean(b) => self.boolean_literal(*b).to_string(),
            _ => value.to_sql_inline(),
        }
    }

    // ---- DML ----------------------------------------------------------

    /// Placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String {
        let _ = index;
        String::from("?")
    }

    /// Pagination style.
    fn pagination(&self) -> Pagination {
        Pagination::LimitOffset
    }

    /// `LIMIT`/`OFFSET` tail for [`Pagination::LimitOffset`].
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let mut sql = String::new();
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        sql
    }

    /// Upsert style.
    fn upsert(&self) -> Upsert {
        Upsert::OnConflict
    }

    /// Whether predicates may appear directly in a SELECT list.
    fn native_boolean_projection(&self) -> bool {
        true
    }

    /// Whether every SELECT item gets a positional alias.
    fn aliases_select_items(&self) -> bool {
        false
    }

    /// Table to select from when a query has no FROM clause.
    fn dummy_table(&self) -> Option<&'static str> {
        None
    }

    /// Whether the join kind is available.
    fn supports_join(&self, kind: JoinKind) -> bool {
        let _ = kind;
        true
    }

    /// Row-locking clause, or `None` if the lock cannot be expressed.
    fn lock_clause(&self, lock: &Lock, of: &[String]) -> Option<String> {
        let mut sql = String::from(match lock.strength {
            LockStrength::Update => " FOR UPDATE",
            LockStrength::Share => " FOR SHARE",
        });
        if !of.is_empty() {
            sql.push_str(" OF ");
            sql.push_str(&of.join(", "));
        }
        match lock.wait {
            LockWait::Wait => {}
            LockWait::NoWait => sql.push_str(" NOWAIT"),
            LockWait::SkipLocked => sql.push_str(" SKIP LOCKED"),
        }
        Some(sql)
    }

    /// Whether an upsert fed by a SELECT needs a WHERE clause to keep
    /// `ON CONFLICT` from parsing as a join constraint.
    fn upsert_select_needs_where(&self) -> bool {
        false
    }

    /// Whether a MERGE reads its source row from a derived
    /// `(SELECT ... FROM dummy)` table. Otherwise the dummy table is the
    /// source and values are bound directly in the ON and WHEN clauses.
    fn merge_derived_source(&self) -> bool {
        true
    }

    /// Whether `INSERT ... RETURNING` is available.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Whether generated keys can be retrieved for a multi-row batch.
    fn supports_return_generated_keys_batch(&self) -> bool {
        true
    }

    /// String concatenation.
    fn concat(&self, parts: &[String]) -> String {
        format!("({})", parts.join(" || "))
    }

    /// Remainder of integer division.
    fn modulo(&self, left: &str, right: &str) -> String {
        format!("MOD({left}, {right})")
    }

    /// Function call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] for functions the vendor
    /// lacks.
    fn function(&self, func: Function, args: &[String]) -> Result<String> {
        Ok(match func {
            Function::Pi => String::from("PI()"),
            Function::CurrentDate => String::from("CURRENT_DATE"),
            Function::CurrentTime => String::from("CURRENT_TIME"),
            Function::CurrentTimestamp => String::from("CURRENT_TIMESTAMP"),
            Function::Log2 => format!("LOG(2, {})", args.join(", ")),
            Function::Log10 => format!("LOG(10, {})", args.join(", ")),
            _ => format!("{}({})", func.sql_name(), args.join(", ")),
        })
    }

    /// Name of the substring function.
    fn substring_function(&self) -> &'static str {
        "SUBSTR"
    }

    /// Name of the character length function.
    fn length_function(&self) -> &'static str {
        "LENGTH"
    }

    /// Target type of a CAST.
    ///
    /// # Errors
    ///
    /// Propagates [`Dialect::declare`] failures.
    fn cast_type(&self, kind: &Kind) -> Result<String> {
        self.declare(kind)
    }

    /// Adds or subtracts an interval.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] for intervals the vendor
    /// cannot express.
    fn temporal(
        &self,
        op: TemporalOp,
        operand: &str,
        kind: &Kind,
        interval: &Interval,
    ) -> Result<String>;

    /// Coerces a value before binding.
    fn bind_value(&self, kind: Option<&Kind>, value: Value) -> Value {
        let _ = kind;
        value
    }

    /// Decodes a raw driver value into the expected kind.
    fn decode_value(&self, kind: &Kind, raw: Value) -> Option<Value> {
        coerce(kind, raw)
    }
}

/// Splits an interval into canonical units: microseconds, seconds,
/// minutes, hours, days, months and years.
#[must_use]
pub fn canonical_parts(interval: &Interval) -> Vec<(i64, IntervalUnit)> {
    interval
        .parts()
        .iter()
        .map(|&(amount, unit)| match unit {
            IntervalUnit::Milliseconds => (amount * 1_000, IntervalUnit::Microseconds),
            IntervalUnit::Weeks => (amount * 7, IntervalUnit::Days),
            IntervalUnit::Quarters => (amount * 3, IntervalUnit::Months),
            IntervalUnit::Decades => (amount * 10, IntervalUnit::Years),
            IntervalUnit::Centuries => (amount * 100, IntervalUnit::Years),
            IntervalUnit::Millennia => (amount * 1_000, IntervalUnit::Years),
            other => (amount, other),
        })
        .collect()
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Converts a driver value into the native representation of `kind`.
///
/// Drivers report what the vendor stores: booleans as integers, dates and
/// decimals as text, and so on. Returns `None` when no sensible
/// conversion exists.
#[must_use]
pub fn coerce(kind: &Kind, raw: Value) -> Option<Value> {
    if raw.is_null() {
        return Some(Value::Null);
    }
    match kind {
        Kind::Integer { .. } => match raw {
            Value::Integer(_) => Some(raw),
            Value::Boolean(b) => Some(Value::Integer(i128::from(b))),
            Value::Float(f) if f.fract() == 0.0 => Decimal::from_f64(f)?.to_i128().map(Value::Integer),
            Value::Decimal(d) if d.fract().is_zero() => d.to_i128().map(Value::Integer),
            Value::Text(s) => s.trim().parse().ok().map(Value::Integer),
            _ => None,
        },
        Kind::Float { .. } | Kind::Double { .. } => match raw {
            Value::Text(s) => s.trim().parse().ok().map(Value::Float),
            other => other.as_f64().map(Value::Float),
        },
        Kind::Decimal { scale, .. } => {
            let d = match raw {
                Value::Text(s) => Decimal::from_str(s.trim()).ok()?,
                Value::Float(f) => Decimal::from_f64(f)?.round_dp(u32::from(*scale)),
                other => other.as_decimal()?,
            };
            Some(Value::Decimal(d))
        }
        Kind::Char { .. } | Kind::Clob { .. } | Kind::Enum { .. } => match raw {
            Value::Text(_) => Some(raw),
            Value::Binary(b) => String::from_utf8(b).ok().map(Value::Text),
            Value::Integer(n) => Some(Value::Text(n.to_string())),
            Value::Decimal(d) => Some(Value::Text(d.to_string())),
            _ => None,
        },
        Kind::Binary { .. } | Kind::Blob { .. } => match raw {
            Value::Binary(_) => Some(raw),
            Value::Text(s) => Some(Value::Binary(s.into_bytes())),
            _ => None,
        },
        Kind::Date => match raw {
            Value::Date(_) => Some(raw),
            Value::Datetime(dt) => Some(Value::Date(dt.date())),
            Value::Text(s) => parse_datetime(&s).map(|dt| Value::Date(dt.date())),
            _ => None,
        },
        Kind::Time { .. } => match raw {
            Value::Time(_) => Some(raw),
            Value::Datetime(dt) => Some(Value::Time(dt.time())),
            Value::Text(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
                .ok()
                .map(Value::Time),
            _ => None,
        },
        Kind::Datetime { .. } => match raw {
            Value::Datetime(_) => Some(raw),
            Value::Date(d) => Some(Value::Datetime(d.and_time(NaiveTime::MIN))),
            Value::Text(s) => parse_datetime(&s).map(Value::Datetime),
            _ => None,
        },
        Kind::Boolean => match raw {
            Value::Boolean(_) => Some(raw),
            Value::Integer(n) => Some(Value::Boolean(n != 0)),
            Value::Decimal(d) => Some(Value::Boolean(!d.is_zero())),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "t" | "true" | "y" | "yes" => Some(Value::Boolean(true)),
                "0" | "f" | "false" | "n" | "no" => Some(Value::Boolean(false)),
                _ => None,
            },
            _ => None,
        },
    }
}

/// Renders temporal values as ISO text for vendors that store them so.
#[must_use]
pub fn temporal_as_text(value: Value) -> Value {
    match value {
        Value::Date(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => Value::Text(t.format("%H:%M:%S%.f").to_string()),
        Value::Datetime(dt) => Value::Text(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        other => other,
    }
}

fn decimal_precision_error(vendor: Vendor, precision: u8, max: u8) -> Error {
    Error::UnsupportedOperation(format!(
        "{vendor} supports DECIMAL precision up to {max}, got {precision}"
    ))
}

/// Checks a decimal precision against a vendor maximum.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOperation`] when `precision` exceeds `max`.
pub fn check_decimal_precision(vendor: Vendor, precision: u8, max: u8) -> Result<()> {
    if precision > max {
        Err(decimal_precision_error(vendor, precision, max))
    } else {
        Ok(())
    }
}

/// Checks a char or binary length against a vendor maximum.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOperation`] when `length` exceeds `max`.
pub fn check_length(vendor: Vendor, type_name: &str, length: u32, max: u32) -> Result<()> {
    if length > max {
        Err(Error::UnsupportedOperation(format!(
            "{vendor} supports {type_name} length up to {max}, got {length}"
        )))
    } else {
        Ok(())
    }
}
