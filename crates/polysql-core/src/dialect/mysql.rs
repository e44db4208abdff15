//! MySQL and MariaDB dialect.

use super::{
    canonical_parts, check_decimal_precision, check_length, AutoIncrement, Dialect, EnumStrategy,
    Upsert,
};
use crate::dml::{JoinKind, Lock, LockStrength, LockWait};
use crate::error::Result;
use crate::expr::{Function, TemporalOp};
use crate::schema::{ChangeRule, IndexType};
use crate::types::{IntegerWidth, Interval, IntervalUnit, Kind, Value};
use crate::vendor::Vendor;

/// Which server the dialect targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    MySql,
    MariaDb,
}

/// MySQL-family dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySqlDialect {
    flavor: Flavor,
}

impl Default for MySqlDialect {
    fn default() -> Self {
        Self::mysql()
    }
}

impl MySqlDialect {
    /// Creates a MySQL dialect.
    #[must_use]
    pub const fn mysql() -> Self {
        Self {
            flavor: Flavor::MySql,
        }
    }

    /// Creates a MariaDB dialect.
    #[must_use]
    pub const fn mariadb() -> Self {
        Self {
            flavor: Flavor::MariaDb,
        }
    }

    fn unsigned(sql: String, unsigned: bool) -> String {
        if unsigned {
            format!("{sql} UNSIGNED")
        } else {
            sql
        }
    }
}

impl Dialect for MySqlDialect {
    fn vendor(&self) -> Vendor {
        match self.flavor {
            Flavor::MySql => Vendor::MySql,
            Flavor::MariaDb => Vendor::MariaDb,
        }
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        &[
            "ACCESSIBLE", "ANALYZE", "DATABASE", "DATABASES", "DIV", "DUAL", "ENCLOSED",
            "EXPLAIN", "FULLTEXT", "IGNORE", "INTERVAL", "KEYS", "KILL", "LIMIT", "LINES",
            "LOAD", "LOCK", "OPTIMIZE", "REGEXP", "RENAME", "REPLACE", "RLIKE", "SCHEMA",
            "SHOW", "SPATIAL", "STRAIGHT_JOIN", "UNSIGNED", "USE", "XOR", "ZEROFILL",
        ]
    }

    fn allows_unsigned_numeric(&self) -> bool {
        true
    }

    fn enum_strategy(&self) -> EnumStrategy {
        EnumStrategy::Native
    }

    fn declare(&self, kind: &Kind) -> Result<String> {
        Ok(match kind {
            Kind::Integer {
                width,
                precision,
                unsigned,
            } => {
                let name = match width {
                    IntegerWidth::Tiny => "TINYINT",
                    IntegerWidth::Small => "SMALLINT",
                    IntegerWidth::Int => "INT",
                    IntegerWidth::Big => "BIGINT",
                };
                let sql = precision.map_or_else(|| name.to_string(), |p| format!("{name}({p})"));
                Self::unsigned(sql, *unsigned)
            }
            Kind::Float { unsigned } => Self::unsigned("FLOAT".to_string(), *unsigned),
            Kind::Double { unsigned } => Self::unsigned("DOUBLE".to_string(), *unsigned),
            Kind::Decimal {
                precision,
                scale,
                unsigned,
            } => {
                check_decimal_precision(self.vendor(), *precision, 65)?;
                Self::unsigned(format!("DECIMAL({precision}, {scale})"), *unsigned)
            }
            Kind::Char {
                length,
                varying: false,
            } => {
                check_length(self.vendor(), "CHAR", *length, 255)?;
                format!("CHAR({length})")
            }
            Kind::Char {
                length,
                varying: true,
            } => {
                check_length(self.vendor(), "VARCHAR", *length, 65_535)?;
                format!("VARCHAR({length})")
            }
            Kind::Clob { length } => match length {
                Some(n) if *n <= 65_535 => "TEXT".to_string(),
                Some(n) if *n <= 16_777_215 => "MEDIUMTEXT".to_string(),
                _ => "LONGTEXT".to_string(),
            },
            Kind::Binary {
                length,
                varying: false,
            } => {
                check_length(self.vendor(), "BINARY", *length, 255)?;
                format!("BINARY({length})")
            }
            Kind::Binary {
                length,
                varying: true,
            } => format!("VARBINARY({length})"),
            Kind::Blob { length } => match length {
                Some(n) if *n <= 65_535 => "BLOB".to_string(),
                Some(n) if *n <= 16_777_215 => "MEDIUMBLOB".to_string(),
                _ => "LONGBLOB".to_string(),
            },
            Kind::Date => "DATE".to_string(),
            Kind::Time { precision } => format!("TIME({precision})"),
            Kind::Datetime { precision } => format!("DATETIME({precision})"),
            Kind::Boolean => "BOOLEAN".to_string(),
            Kind::Enum { values } => {
                let values: Vec<String> = values
                    .iter()
                    .map(|v| self.literal(&Value::from(v.as_str())))
                    .collect();
                format!("ENUM({})", values.join(", "))
            }
        })
    }

    fn auto_increment(&self) -> AutoIncrement {
        AutoIncrement::Keyword("AUTO_INCREMENT")
    }

    fn supports_change_rule(&self, rule: ChangeRule, _on_update: bool) -> bool {
        // InnoDB parses SET DEFAULT but rejects the table.
        rule != ChangeRule::SetDefault
    }

    fn index_type_clause(&self, index_type: IndexType) -> Option<&'static str> {
        Some(index_type.as_sql())
    }

    fn index_type_after_columns(&self) -> bool {
        true
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            (None, Some(offset)) => format!(" LIMIT {} OFFSET {offset}", u64::MAX),
            (None, None) => String::new(),
        }
    }

    fn upsert(&self) -> Upsert {
        Upsert::OnDuplicateKey
    }

    fn supports_join(&self, kind: JoinKind) -> bool {
        kind != JoinKind::Full
    }

    fn lock_clause(&self, lock: &Lock, of: &[String]) -> Option<String> {
        if self.flavor == Flavor::MariaDb && lock.strength == LockStrength::Share {
            return Some(" LOCK IN SHARE MODE".to_string());
        }
        let mut sql = String::from(match lock.strength {
            LockStrength::Update => " FOR UPDATE",
            LockStrength::Share => " FOR SHARE",
        });
        if !of.is_empty() && self.flavor == Flavor::MySql {
            sql.push_str(" OF ");
            sql.push_str(&of.join(", "));
        }
        sql.push_str(match lock.wait {
            LockWait::Wait => "",
            LockWait::NoWait => " NOWAIT",
            LockWait::SkipLocked => " SKIP LOCKED",
        });
        Some(sql)
    }

    fn supports_returning(&self) -> bool {
        self.flavor == Flavor::MariaDb
    }

    fn concat(&self, parts: &[String]) -> String {
        format!("CONCAT({})", parts.join(", "))
    }

    fn function(&self, func: Function, args: &[String]) -> Result<String> {
        Ok(match func {
            Function::Log2 => format!("LOG2({})", args.join(", ")),
            Function::Log10 => format!("LOG10({})", args.join(", ")),
            Function::Pi => String::from("PI()"),
            Function::CurrentDate => String::from("CURRENT_DATE"),
            Function::CurrentTime => String::from("CURRENT_TIME"),
            Function::CurrentTimestamp => String::from("CURRENT_TIMESTAMP"),
            _ => format!("{}({})", func.sql_name(), args.join(", ")),
        })
    }

    fn substring_function(&self) -> &'static str {
        "SUBSTRING"
    }

    fn length_function(&self) -> &'static str {
        "CHAR_LENGTH"
    }

    fn cast_type(&self, kind: &Kind) -> Result<String> {
        Ok(match kind {
            Kind::Integer { unsigned: true, .. } => "UNSIGNED".to_string(),
            Kind::Integer { .. } | Kind::Boolean => "SIGNED".to_string(),
            Kind::Float { .. } => "FLOAT".to_string(),
            Kind::Double { .. } => "DOUBLE".to_string(),
            Kind::Decimal {
                precision, scale, ..
            } => format!("DECIMAL({precision}, {scale})"),
            Kind::Char { length, .. } => format!("CHAR({length})"),
            Kind::Clob { .. } | Kind::Enum { .. } => "CHAR".to_string(),
            Kind::Binary { length, .. } => format!("BINARY({length})"),
            Kind::Blob { .. } => "BINARY".to_string(),
            Kind::Date => "DATE".to_string(),
            Kind::Time { precision } => format!("TIME({precision})"),
            Kind::Datetime { precision } => format!("DATETIME({precision})"),
        })
    }

    fn temporal(
        &self,
        op: TemporalOp,
        operand: &str,
        _kind: &Kind,
        interval: &Interval,
    ) -> Result<String> {
        let function = match op {
            TemporalOp::Add => "DATE_ADD",
            TemporalOp::Sub => "DATE_SUB",
        };
        let mut sql = operand.to_string();
        for (amount, unit) in canonical_parts(interval) {
            let keyword = match unit {
                IntervalUnit::Microseconds => "MICROSECOND",
                other => other.keyword(),
            };
            sql = format!("{function}({sql}, INTERVAL {amount} {keyword})");
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_unsigned() {
        let dialect = MySqlDialect::mysql();
        assert_eq!(
            dialect.declare(&Kind::decimal(10, 2).unsigned()).unwrap(),
            "DECIMAL(10, 2) UNSIGNED"
        );
        assert_eq!(
            dialect
                .declare(&Kind::Integer {
                    width: IntegerWidth::Tiny,
                    precision: Some(3),
                    unsigned: true
                })
                .unwrap(),
            "TINYINT(3) UNSIGNED"
        );
    }

    #[test]
    fn test_declare_enum() {
        let dialect = MySqlDialect::mysql();
        assert_eq!(
            dialect.declare(&Kind::enumeration(["new", "o'ld"])).unwrap(),
            "ENUM('new', 'o''ld')"
        );
    }

    #[test]
    fn test_char_too_long() {
        assert!(MySqlDialect::mysql().declare(&Kind::char(300)).is_err());
    }

    #[test]
    fn test_interval() {
        let dialect = MySqlDialect::mysql();
        let interval = Interval::new(1, IntervalUnit::Years).and(2, IntervalUnit::Weeks);
        assert_eq!(
            dialect
                .temporal(TemporalOp::Add, "`d`", &Kind::Date, &interval)
                .unwrap(),
            "DATE_ADD(DATE_ADD(`d`, INTERVAL 1 YEAR), INTERVAL 14 DAY)"
        );
    }

    #[test]
    fn test_offset_without_limit() {
        assert_eq!(
            MySqlDialect::mysql().limit_offset(None, Some(5)),
            " LIMIT 18446744073709551615 OFFSET 5"
        );
    }

    #[test]
    fn test_mariadb_flags() {
        assert!(MySqlDialect::mariadb().supports_returning());
        assert!(!MySqlDialect::mysql().supports_returning());
        assert_eq!(MySqlDialect::mariadb().vendor(), Vendor::MariaDb);
    }
}
