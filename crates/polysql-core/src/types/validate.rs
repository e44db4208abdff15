//! Value checks against declared column bounds.

use rust_decimal::Decimal;

use super::{Kind, Value};
use crate::dialect::Dialect;
use crate::error::{Error, Result, SchemaError};
use crate::schema::Column;
use crate::vendor::Vendor;

fn digits(mut n: u128) -> u32 {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

fn range_violation(table: &str, column: &Column, value: &Value, reason: String) -> Error {
    Error::RangeViolation {
        table: table.to_string(),
        column: column.name.clone(),
        value: value.to_sql_inline(),
        reason,
    }
}

fn length_violation(table: &str, column: &Column, length: u64, actual: usize) -> Error {
    Error::LengthViolation {
        table: table.to_string(),
        column: column.name.clone(),
        length: u32::try_from(length).unwrap_or(u32::MAX),
        actual,
    }
}

/// Whether a value can be stored in a column of `kind` at all.
fn accepts(kind: &Kind, value: &Value) -> bool {
    match (kind, value) {
        (_, Value::Null) => true,
        (Kind::Integer { .. }, Value::Integer(_)) => true,
        (
            Kind::Float { .. } | Kind::Double { .. } | Kind::Decimal { .. },
            Value::Integer(_) | Value::Float(_) | Value::Decimal(_),
        ) => true,
        (Kind::Char { .. } | Kind::Clob { .. } | Kind::Enum { .. }, Value::Text(_)) => true,
        (Kind::Binary { .. } | Kind::Blob { .. }, Value::Binary(_)) => true,
        (Kind::Date, Value::Date(_)) => true,
        (Kind::Time { .. }, Value::Time(_)) => true,
        (Kind::Datetime { .. }, Value::Datetime(_) | Value::Date(_)) => true,
        (Kind::Boolean, Value::Boolean(_)) => true,
        _ => false,
    }
}

/// Checks a value against the bounds of its column: signedness, integer
/// width and precision, decimal precision and scale, char and binary
/// length, and enum membership.
///
/// Values of an unexpected type pass; the database rejects them.
///
/// # Errors
///
/// Returns [`Error::RangeViolation`] or [`Error::LengthViolation`].
pub fn validate_value(
    table: &str,
    column: &Column,
    value: &Value,
    dialect: &dyn Dialect,
) -> Result<()> {
    match (&column.kind, value) {
        (
            Kind::Integer {
                width,
                precision,
                unsigned,
            },
            Value::Integer(v),
        ) => {
            let (min, max) = if *unsigned {
                // SQLite integers are 64-bit signed whatever the declaration.
                let max = if dialect.vendor() == Vendor::Sqlite {
                    i128::from(i64::MAX)
                } else {
                    width.unsigned_max()
                };
                (0, max)
            } else {
                width.signed_range()
            };
            if *v < min || *v > max {
                return Err(range_violation(
                    table,
                    column,
                    value,
                    format!("{} accepts {min} to {max}", column.kind),
                ));
            }
            if let Some(p) = precision {
                if digits(v.unsigned_abs()) > u32::from(*p) {
                    return Err(range_violation(
                        table,
                        column,
                        value,
                        format!("more than {p} digits"),
                    ));
                }
            }
        }
        (Kind::Float { unsigned: true } | Kind::Double { unsigned: true }, _) => {
            if value.as_f64().is_some_and(|f| f < 0.0) {
                return Err(range_violation(
                    table,
                    column,
                    value,
                    "negative value for unsigned column".to_string(),
                ));
            }
        }
        (
            Kind::Decimal {
                precision,
                scale,
                unsigned,
            },
            _,
        ) => {
            let Some(d) = value.as_decimal() else {
                return Ok(());
            };
            if *unsigned && d.is_sign_negative() && !d.is_zero() {
                return Err(range_violation(
                    table,
                    column,
                    value,
                    "negative value for unsigned column".to_string(),
                ));
            }
            if d.normalize().scale() > u32::from(*scale) {
                return Err(range_violation(
                    table,
                    column,
                    value,
                    format!("more than {scale} fractional digits"),
                ));
            }
            let whole = d.trunc().abs();
            let allowed = u32::from(precision.saturating_sub(*scale));
            if whole > Decimal::ZERO && digits(whole.mantissa().unsigned_abs()) > allowed {
                return Err(range_violation(
                    table,
                    column,
                    value,
                    format!("more than {allowed} integer digits"),
                ));
            }
        }
        (Kind::Char { length, .. }, Value::Text(s)) => {
            let actual = s.chars().count();
            if actual > *length as usize {
                return Err(length_violation(table, column, u64::from(*length), actual));
            }
        }
        (Kind::Clob { length: Some(length) }, Value::Text(s)) => {
            let actual = s.chars().count();
            if actual as u64 > *length {
                return Err(length_violation(table, column, *length, actual));
            }
        }
        (Kind::Binary { length, .. }, Value::Binary(b)) => {
            if b.len() > *length as usize {
                return Err(length_violation(table, column, u64::from(*length), b.len()));
            }
        }
        (Kind::Blob { length: Some(length) }, Value::Binary(b)) => {
            if b.len() as u64 > *length {
                return Err(length_violation(table, column, *length, b.len()));
            }
        }
        (Kind::Enum { values }, Value::Text(s)) => {
            if !values.iter().any(|v| v == s) {
                return Err(range_violation(
                    table,
                    column,
                    value,
                    format!("not one of {}", values.join(", ")),
                ));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Checks a column's default value against its kind and bounds.
///
/// # Errors
///
/// Returns [`SchemaError::DefaultTypeMismatch`] when the default cannot be
/// stored in the column at all, otherwise whatever [`validate_value`]
/// reports.
pub fn validate_default(table: &str, column: &Column, dialect: &dyn Dialect) -> Result<()> {
    let Some(default) = &column.default else {
        return Ok(());
    };
    if !accepts(&column.kind, default) {
        return Err(SchemaError::DefaultTypeMismatch {
            table: table.to_string(),
            column: column.name.clone(),
            expected: column.kind.name().to_string(),
        }
        .into());
    }
    validate_value(table, column, default, dialect)
}
