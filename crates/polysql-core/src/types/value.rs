//! Native values bound as parameters and decoded from result rows.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A typed SQL value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean.
    Boolean(bool),
    /// Any integer, wide enough for unsigned BIGINT.
    Integer(i128),
    /// Floating point.
    Float(f64),
    /// Exact decimal.
    Decimal(Decimal),
    /// Character data, also used for enum values.
    Text(String),
    /// Byte string.
    Binary(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time of day.
    Datetime(NaiveDateTime),
}

impl Value {
    /// Whether this is SQL NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name of the variant, for messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Datetime(_) => "datetime",
        }
    }

    /// Returns the value as a decimal if it is numeric.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(n) => Decimal::from_i128(*n),
            Self::Float(f) => Decimal::from_f64(*f),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the value as a float if it is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Returns the boolean, treating NULL as unknown.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Compares two non-null values of compatible types.
    ///
    /// Numbers compare across integer, float and decimal. Dates promote to
    /// midnight when compared with datetimes. Returns `None` for NULL or
    /// for incomparable types.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => None,
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Float(_), _) | (_, Self::Float(_)) if self.is_number() && other.is_number() => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (a, b) if a.is_number() && b.is_number() => Some(a.as_decimal()?.cmp(&b.as_decimal()?)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Binary(a), Self::Binary(b)) => Some(a.cmp(b)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::Datetime(a), Self::Datetime(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Datetime(b)) => Some(a.and_time(NaiveTime::MIN).cmp(b)),
            (Self::Datetime(a), Self::Date(b)) => Some(a.cmp(&b.and_time(NaiveTime::MIN))),
            _ => None,
        }
    }

    const fn is_number(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_) | Self::Decimal(_))
    }

    /// Returns the ANSI SQL literal for inline use.
    ///
    /// Dialects override the spelling of binary, temporal and boolean
    /// literals where their syntax differs.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Boolean(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Integer(n) => format!("{n}"),
            Self::Float(f) => format!("{f:?}"),
            Self::Decimal(d) => d.to_string(),
            Self::Text(s) => quote_text(s),
            Self::Binary(b) => format!("X'{}'", hex(b)),
            Self::Date(d) => format!("DATE '{}'", d.format("%Y-%m-%d")),
            Self::Time(t) => format!("TIME '{}'", t.format("%H:%M:%S%.f")),
            Self::Datetime(dt) => format!("TIMESTAMP '{}'", dt.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

/// Quotes a string literal, doubling embedded quotes.
#[must_use]
pub(crate) fn quote_text(s: &str) -> String {
    let escaped = s.replace('\'', "''");
    format!("'{escaped}'")
}

/// Uppercase hex encoding.
#[must_use]
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect()
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i128::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(i128::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Integer(i128::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Binary(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Self::Time(t)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Self::Datetime(dt)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}
