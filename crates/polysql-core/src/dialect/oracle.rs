//! Oracle dialect.
//!
//! Oracle differs from the other vendors in most places the compiler
//! cares about: no auto-increment (sequence plus trigger instead), no
//! `IF EXISTS` (drops are wrapped in PL/SQL that swallows "does not
//! exist"), no LIMIT (ROWNUM sub-query), no boolean type, no ON UPDATE
//! referential actions, and empty strings are NULL.

use chrono::NaiveTime;
use rust_decimal::Decimal;

use super::{
    canonical_parts, check_decimal_precision, check_length, coerce, AutoIncrement, Dialect,
    Pagination, Upsert,
};
use crate::context::Compilation;
use crate::dml::{Lock, LockStrength, LockWait};
use crate::error::{Error, Result};
use crate::expr::{Function, TemporalOp};
use crate::schema::{ChangeRule, FlatTable, GenerateOnInsert, IndexType};
use crate::statement::{Statement, StatementKind};
use crate::types::{Interval, IntervalUnit, Kind, Value};
use crate::vendor::Vendor;

/// ORA-00942: table or view does not exist.
const TABLE_NOT_FOUND: i32 = -942;
/// ORA-02289: sequence does not exist.
const SEQUENCE_NOT_FOUND: i32 = -2289;
/// ORA-04080: trigger does not exist.
const TRIGGER_NOT_FOUND: i32 = -4080;

/// Oracle dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl OracleDialect {
    /// Creates a new Oracle dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Name of the sequence backing an auto-increment column.
    #[must_use]
    pub fn sequence_name(table: &str, column: &str) -> String {
        format!("{table}_{column}_seq")
    }

    /// Name of the trigger filling an auto-increment column.
    #[must_use]
    pub fn trigger_name(table: &str, column: &str) -> String {
        format!("{table}_{column}_trg")
    }

    fn auto_columns(table: &FlatTable) -> impl Iterator<Item = &str> {
        table
            .columns
            .iter()
            .filter(|c| c.generate_on_insert == Some(GenerateOnInsert::AutoIncrement))
            .map(|c| c.name.as_str())
    }

    /// Wraps a DDL statement so a missing object is not an error.
    fn guarded(sql: &str, code: i32) -> String {
        format!(
            "BEGIN EXECUTE IMMEDIATE '{}'; EXCEPTION WHEN OTHERS THEN IF SQLCODE != {code} THEN RAISE; END IF; END;",
            sql.replace('\'', "''")
        )
    }

    fn interval_literal(time: NaiveTime) -> String {
        format!("+00 {}", time.format("%H:%M:%S%.6f"))
    }
}

impl Dialect for OracleDialect {
    fn vendor(&self) -> Vendor {
        Vendor::Oracle
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        &[
            "ACCESS", "AUDIT", "CLUSTER", "COMMENT", "COMPRESS", "EXCLUSIVE", "FILE",
            "IDENTIFIED", "LEVEL", "LONG", "MINUS", "MODE", "NUMBER", "OFFLINE", "ONLINE",
            "PCTFREE", "PRIOR", "RAW", "RESOURCE", "ROWID", "ROWNUM", "SESSION", "SHARE",
            "SYNONYM", "SYSDATE", "UID", "VALIDATE", "VARCHAR2",
        ]
    }

    fn declare(&self, kind: &Kind) -> Result<String> {
        Ok(match kind {
            Kind::Integer {
                width,
                precision,
                unsigned,
            } => format!(
                "NUMBER({})",
                precision.unwrap_or_else(|| width.max_precision(*unsigned))
            ),
            Kind::Float { .. } => "BINARY_FLOAT".to_string(),
            Kind::Double { .. } => "BINARY_DOUBLE".to_string(),
            Kind::Decimal {
                precision, scale, ..
            } => {
                check_decimal_precision(self.vendor(), *precision, 38)?;
                format!("NUMBER({precision}, {scale})")
            }
            Kind::Char {
                length,
                varying: false,
            } => {
                check_length(self.vendor(), "CHAR", *length, 2000)?;
                format!("CHAR({length})")
            }
            Kind::Char {
                length,
                varying: true,
            } => {
                check_length(self.vendor(), "VARCHAR2", *length, 4000)?;
                format!("VARCHAR2({length})")
            }
            Kind::Clob { .. } => "CLOB".to_string(),
            Kind::Binary { length, .. } => {
                check_length(self.vendor(), "RAW", *length, 2000)?;
                format!("RAW({length})")
            }
            Kind::Blob { .. } => "BLOB".to_string(),
            Kind::Date => "DATE".to_string(),
            Kind::Time { precision } => format!("INTERVAL DAY(0) TO SECOND({precision})"),
            Kind::Datetime { precision } => format!("TIMESTAMP({precision})"),
            Kind::Boolean => "NUMBER(1)".to_string(),
            Kind::Enum { values } => format!("VARCHAR2({})", Kind::enum_width(values)),
        })
    }

    fn auto_increment(&self) -> AutoIncrement {
        AutoIncrement::Sequence
    }

    fn supports_change_rule(&self, rule: ChangeRule, on_update: bool) -> bool {
        !on_update && matches!(rule, ChangeRule::Cascade | ChangeRule::SetNull)
    }

    fn names_constraints(&self) -> bool {
        true
    }

    fn index_type_clause(&self, _index_type: IndexType) -> Option<&'static str> {
        None
    }

    fn create_epilogue(&self, ctx: &mut Compilation<'_>, table: &FlatTable) -> Vec<Statement> {
        let mut statements = Vec::new();
        for column in Self::auto_columns(table) {
            let sequence = ctx.quote(&Self::sequence_name(&table.name, column));
            statements.push(Statement::new(
                StatementKind::CreateSequence,
                format!("CREATE SEQUENCE {sequence} START WITH 1"),
            ));
            let trigger = ctx.quote(&Self::trigger_name(&table.name, column));
            let column = ctx.quote(column);
            statements.push(Statement::new(
                StatementKind::CreateTrigger,
                format!(
                    "CREATE TRIGGER {trigger} BEFORE INSERT ON {} FOR EACH ROW WHEN (new.{column} IS NULL) BEGIN SELECT {sequence}.NEXTVAL INTO :new.{column} FROM dual; END;",
                    ctx.quote(&table.name),
                ),
            ));
        }
        statements
    }

    fn drop_table(&self, ctx: &mut Compilation<'_>, table: &FlatTable) -> Vec<Statement> {
        let mut statements = Vec::new();
        for column in Self::auto_columns(table) {
            statements.push(Statement::new(
                StatementKind::DropTrigger,
                Self::guarded(
                    &format!(
                        "DROP TRIGGER {}",
                        ctx.quote(&Self::trigger_name(&table.name, column))
                    ),
                    TRIGGER_NOT_FOUND,
                ),
            ));
            statements.push(Statement::new(
                StatementKind::DropSequence,
                Self::guarded(
                    &format!(
                        "DROP SEQUENCE {}",
                        ctx.quote(&Self::sequence_name(&table.name, column))
                    ),
                    SEQUENCE_NOT_FOUND,
                ),
            ));
        }
        statements.push(Statement::new(
            StatementKind::DropTable,
            Self::guarded(
                &format!("DROP TABLE {}", ctx.quote(&table.name)),
                TABLE_NOT_FOUND,
            ),
        ));
        statements
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
            Value::Binary(b) => format!("HEXTORAW('{}')", crate::types::hex(b)),
            Value::Date(d) => format!("TO_DATE('{}', 'YYYY-MM-DD')", d.format("%Y-%m-%d")),
            Value::Datetime(dt) => format!(
                "TO_TIMESTAMP('{}', 'YYYY-MM-DD HH24:MI:SS.FF')",
                dt.format("%Y-%m-%d %H:%M:%S%.6f")
            ),
            Value::Time(t) => format!("INTERVAL '{}' DAY TO SECOND", Self::interval_literal(*t)),
            _ => value.to_sql_inline(),
        }
    }

    fn pagination(&self) -> Pagination {
        Pagination::RowNum
    }

    fn upsert(&self) -> Upsert {
        Upsert::Merge
    }

    fn native_boolean_projection(&self) -> bool {
        false
    }

    fn aliases_select_items(&self) -> bool {
        true
    }

    fn dummy_table(&self) -> Option<&'static str> {
        Some("dual")
    }

    /// Oracle's `OF` takes columns rather than tables, so table lists are
    /// not emitted; the lock covers every joined table.
    fn lock_clause(&self, lock: &Lock, _of: &[String]) -> Option<String> {
        if lock.strength == LockStrength::Share {
            return None;
        }
        let mut sql = String::from(" FOR UPDATE");
        match lock.wait {
            LockWait::Wait => {}
            LockWait::NoWait => sql.push_str(" NOWAIT"),
            LockWait::SkipLocked => sql.push_str(" SKIP LOCKED"),
        }
        Some(sql)
    }

    fn supports_return_generated_keys_batch(&self) -> bool {
        false
    }

    fn function(&self, func: Function, args: &[String]) -> Result<String> {
        Ok(match func {
            Function::Pi => String::from("ACOS(-1)"),
            Function::CurrentDate => String::from("TRUNC(CURRENT_DATE)"),
            Function::CurrentTimestamp => String::from("CURRENT_TIMESTAMP"),
            Function::CurrentTime => {
                return Err(Error::UnsupportedOperation(
                    "Oracle has no CURRENT_TIME".to_string(),
                ))
            }
            Function::Log2 => format!("LOG(2, {})", args.join(", ")),
            Function::Log10 => format!("LOG(10, {})", args.join(", ")),
            _ => format!("{}({})", func.sql_name(), args.join(", ")),
        })
    }

    fn temporal(
        &self,
        op: TemporalOp,
        operand: &str,
        _kind: &Kind,
        interval: &Interval,
    ) -> Result<String> {
        let parts = canonical_parts(interval);
        let [(amount, unit)] = parts.as_slice() else {
            return Err(Error::UnsupportedOperation(format!(
                "Oracle cannot add multi-unit interval '{interval}'"
            )));
        };
        let amount = *amount;
        let function = match unit {
            IntervalUnit::Months => format!("NUMTOYMINTERVAL({amount}, 'MONTH')"),
            IntervalUnit::Years => format!("NUMTOYMINTERVAL({amount}, 'YEAR')"),
            IntervalUnit::Microseconds => {
                format!("NUMTODSINTERVAL({}, 'SECOND')", Decimal::new(amount, 6))
            }
            other => format!("NUMTODSINTERVAL({amount}, '{}')", other.keyword()),
        };
        let sign = match op {
            TemporalOp::Add => "+",
            TemporalOp::Sub => "-",
        };
        Ok(format!("({operand} {sign} {function})"))
    }

    fn bind_value(&self, kind: Option<&Kind>, value: Value) -> Value {
        match (kind, value) {
            (_, Value::Boolean(b)) => Value::Integer(i128::from(b)),
            (_, Value::Time(t)) => Value::Text(Self::interval_literal(t)),
            (Some(Kind::Char { .. } | Kind::Clob { .. }), Value::Text(s))
                if s.is_empty() || s.starts_with(' ') =>
            {
                Value::Text(format!(" {s}"))
            }
            (_, value) => value,
        }
    }

    fn decode_value(&self, kind: &Kind, raw: Value) -> Option<Value> {
        match (kind, raw) {
            (Kind::Time { .. }, Value::Text(s)) if s.starts_with('+') || s.starts_with('-') => {
                let clock = s.split_once(' ').map_or(s.as_str(), |(_, t)| t);
                NaiveTime::parse_from_str(clock, "%H:%M:%S%.f")
                    .ok()
                    .map(Value::Time)
            }
            (Kind::Char { .. } | Kind::Clob { .. }, Value::Text(s)) if s.starts_with(' ') => {
                Some(Value::Text(s[1..].to_string()))
            }
            (kind, raw) => coerce(kind, raw),
        }
    }
}
