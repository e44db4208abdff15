//! Column kinds and native values.
//!
//! Every column carries exactly one [`Kind`], a tag plus the attributes
//! that matter for that tag (precision, scale, length, signedness, enum
//! values). Values flowing in and out of the compiler are [`Value`]s.

mod interval;
mod validate;
mod value;

pub use interval::{Interval, IntervalUnit};
pub use validate::{validate_default, validate_value};
pub use value::Value;
pub(crate) use value::hex;

use serde::{Deserialize, Serialize};

/// Width of an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegerWidth {
    /// 8-bit integer.
    Tiny,
    /// 16-bit integer.
    Small,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Big,
}

impl IntegerWidth {
    /// Inclusive bounds of a signed integer of this width.
    #[must_use]
    pub const fn signed_range(self) -> (i128, i128) {
        match self {
            Self::Tiny => (i8::MIN as i128, i8::MAX as i128),
            Self::Small => (i16::MIN as i128, i16::MAX as i128),
            Self::Int => (i32::MIN as i128, i32::MAX as i128),
            Self::Big => (i64::MIN as i128, i64::MAX as i128),
        }
    }

    /// Largest value of an unsigned integer of this width.
    #[must_use]
    pub const fn unsigned_max(self) -> i128 {
        match self {
            Self::Tiny => u8::MAX as i128,
            Self::Small => u16::MAX as i128,
            Self::Int => u32::MAX as i128,
            Self::Big => u64::MAX as i128,
        }
    }

    /// Number of decimal digits needed for the widest value.
    #[must_use]
    pub const fn max_precision(self, unsigned: bool) -> u8 {
        match (self, unsigned) {
            (Self::Tiny, _) => 3,
            (Self::Small, _) => 5,
            (Self::Int, _) => 10,
            (Self::Big, false) => 19,
            (Self::Big, true) => 20,
        }
    }

    /// The next wider width, used when a dialect has no unsigned types.
    #[must_use]
    pub const fn widen(self) -> Option<Self> {
        match self {
            Self::Tiny => Some(Self::Small),
            Self::Small => Some(Self::Int),
            Self::Int => Some(Self::Big),
            Self::Big => None,
        }
    }
}

/// The kind of a column or expression, with kind-specific attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Kind {
    /// Exact integer.
    Integer {
        /// Storage width.
        width: IntegerWidth,
        /// Declared number of decimal digits.
        #[serde(default)]
        precision: Option<u8>,
        /// Whether negative values are excluded.
        #[serde(default)]
        unsigned: bool,
    },
    /// Single-precision floating point.
    Float {
        /// Whether negative values are excluded.
        #[serde(default)]
        unsigned: bool,
    },
    /// Double-precision floating point.
    Double {
        /// Whether negative values are excluded.
        #[serde(default)]
        unsigned: bool,
    },
    /// Exact decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Digits after the decimal point.
        #[serde(default)]
        scale: u8,
        /// Whether negative values are excluded.
        #[serde(default)]
        unsigned: bool,
    },
    /// Fixed or varying character string.
    Char {
        /// Maximum length in characters.
        length: u32,
        /// `VARCHAR` when true, `CHAR` otherwise.
        #[serde(default)]
        varying: bool,
    },
    /// Character large object.
    Clob {
        /// Optional maximum length.
        #[serde(default)]
        length: Option<u64>,
    },
    /// Fixed or varying byte string.
    Binary {
        /// Maximum length in bytes.
        length: u32,
        /// `VARBINARY` when true, `BINARY` otherwise.
        #[serde(default)]
        varying: bool,
    },
    /// Binary large object.
    Blob {
        /// Optional maximum length.
        #[serde(default)]
        length: Option<u64>,
    },
    /// Calendar date.
    Date,
    /// Time of day.
    Time {
        /// Fractional second digits.
        #[serde(default)]
        precision: u8,
    },
    /// Date and time of day.
    Datetime {
        /// Fractional second digits.
        #[serde(default)]
        precision: u8,
    },
    /// Boolean.
    Boolean,
    /// One of a closed set of string values.
    Enum {
        /// Permitted values in declaration order.
        values: Vec<String>,
    },
}

impl Kind {
    /// Signed `TINYINT`.
    #[must_use]
    pub const fn tinyint() -> Self {
        Self::integer(IntegerWidth::Tiny)
    }

    /// Signed `SMALLINT`.
    #[must_use]
    pub const fn smallint() -> Self {
        Self::integer(IntegerWidth::Small)
    }

    /// Signed `INT`.
    #[must_use]
    pub const fn int() -> Self {
        Self::integer(IntegerWidth::Int)
    }

    /// Signed `BIGINT`.
    #[must_use]
    pub const fn bigint() -> Self {
        Self::integer(IntegerWidth::Big)
    }

    /// Signed integer of the given width with no declared precision.
    #[must_use]
    pub const fn integer(width: IntegerWidth) -> Self {
        Self::Integer {
            width,
            precision: None,
            unsigned: false,
        }
    }

    /// `DECIMAL(precision, scale)`.
    #[must_use]
    pub const fn decimal(precision: u8, scale: u8) -> Self {
        Self::Decimal {
            precision,
            scale,
            unsigned: false,
        }
    }

    /// `CHAR(length)`.
    #[must_use]
    pub const fn char(length: u32) -> Self {
        Self::Char {
            length,
            varying: false,
        }
    }

    /// `VARCHAR(length)`.
    #[must_use]
    pub const fn varchar(length: u32) -> Self {
        Self::Char {
            length,
            varying: true,
        }
    }

    /// `DATETIME` without fractional seconds.
    #[must_use]
    pub const fn datetime() -> Self {
        Self::Datetime { precision: 0 }
    }

    /// Enum over the given values.
    #[must_use]
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Short uppercase name used in messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Integer { width, .. } => match width {
                IntegerWidth::Tiny => "TINYINT",
                IntegerWidth::Small => "SMALLINT",
                IntegerWidth::Int => "INT",
                IntegerWidth::Big => "BIGINT",
            },
            Self::Float { .. } => "FLOAT",
            Self::Double { .. } => "DOUBLE",
            Self::Decimal { .. } => "DECIMAL",
            Self::Char { varying: false, .. } => "CHAR",
            Self::Char { varying: true, .. } => "VARCHAR",
            Self::Clob { .. } => "CLOB",
            Self::Binary { varying: false, .. } => "BINARY",
            Self::Binary { varying: true, .. } => "VARBINARY",
            Self::Blob { .. } => "BLOB",
            Self::Date => "DATE",
            Self::Time { .. } => "TIME",
            Self::Datetime { .. } => "DATETIME",
            Self::Boolean => "BOOLEAN",
            Self::Enum { .. } => "ENUM",
        }
    }

    /// Whether the kind holds numbers.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Integer { .. } | Self::Float { .. } | Self::Double { .. } | Self::Decimal { .. }
        )
    }

    /// Whether the kind holds dates or times.
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time { .. } | Self::Datetime { .. })
    }

    /// Whether the kind holds character data.
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(self, Self::Char { .. } | Self::Clob { .. } | Self::Enum { .. })
    }

    /// Whether the kind is declared unsigned.
    #[must_use]
    pub const fn is_unsigned(&self) -> bool {
        match self {
            Self::Integer { unsigned, .. }
            | Self::Float { unsigned }
            | Self::Double { unsigned }
            | Self::Decimal { unsigned, .. } => *unsigned,
            _ => false,
        }
    }

    /// Returns a copy with the unsigned flag set, for numeric kinds.
    #[must_use]
    pub fn unsigned(self) -> Self {
        match self {
            Self::Integer {
                width, precision, ..
            } => Self::Integer {
                width,
                precision,
                unsigned: true,
            },
            Self::Float { .. } => Self::Float { unsigned: true },
            Self::Double { .. } => Self::Double { unsigned: true },
            Self::Decimal {
                precision, scale, ..
            } => Self::Decimal {
                precision,
                scale,
                unsigned: true,
            },
            other => other,
        }
    }

    /// Longest text an enum value can have.
    #[must_use]
    pub fn enum_width(values: &[String]) -> u32 {
        values
            .iter()
            .map(|v| u32::try_from(v.chars().count()).unwrap_or(u32::MAX))
            .max()
            .unwrap_or(1)
            .max(1)
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer {
                precision: Some(p),
                unsigned,
                ..
            } => {
                write!(f, "{}({p})", self.name())?;
                if *unsigned {
                    f.write_str(" UNSIGNED")?;
                }
                Ok(())
            }
            Self::Decimal {
                precision,
                scale,
                unsigned,
            } => {
                write!(f, "DECIMAL({precision}, {scale})")?;
                if *unsigned {
                    f.write_str(" UNSIGNED")?;
                }
                Ok(())
            }
            Self::Char { length, .. } | Self::Binary { length, .. } => {
                write!(f, "{}({length})", self.name())
            }
            _ => {
                f.write_str(self.name())?;
                if self.is_unsigned() {
                    f.write_str(" UNSIGNED")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_bounds() {
        assert_eq!(IntegerWidth::Tiny.signed_range(), (-128, 127));
        assert_eq!(IntegerWidth::Tiny.unsigned_max(), 255);
        assert_eq!(IntegerWidth::Big.unsigned_max(), 18_446_744_073_709_551_615);
    }

    #[test]
    fn test_widen() {
        assert_eq!(IntegerWidth::Tiny.widen(), Some(IntegerWidth::Small));
        assert_eq!(IntegerWidth::Big.widen(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Kind::decimal(10, 2).unsigned().to_string(), "DECIMAL(10, 2) UNSIGNED");
        assert_eq!(Kind::varchar(32).to_string(), "VARCHAR(32)");
        assert_eq!(Kind::Boolean.to_string(), "BOOLEAN");
    }

    #[test]
    fn test_enum_width() {
        assert_eq!(
            Kind::enum_width(&["a".to_string(), "three".to_string()]),
            5
        );
        assert_eq!(Kind::enum_width(&[]), 1);
    }

    #[test]
    fn test_kind_from_json() {
        let kind: Kind =
            serde_json::from_str(r#"{"type":"integer","width":"tiny","precision":3}"#).unwrap();
        assert_eq!(
            kind,
            Kind::Integer {
                width: IntegerWidth::Tiny,
                precision: Some(3),
                unsigned: false
            }
        );
    }
}
