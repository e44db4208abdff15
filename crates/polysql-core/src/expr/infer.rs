//! Result-type inference.

use super::{Aggregate, Case, Expr, Function, StringOp};
use crate::error::{Error, Result};
use crate::types::{IntegerWidth, Kind, Value};

/// Kind of a literal, `None` for an untyped NULL.
fn literal_kind(value: &Value) -> Option<Kind> {
    Some(match value {
        Value::Null => return None,
        Value::Boolean(_) => Kind::Boolean,
        Value::Integer(_) => Kind::bigint(),
        Value::Float(_) => Kind::Double { unsigned: false },
        Value::Decimal(d) => {
            let scale = u8::try_from(d.scale()).unwrap_or(u8::MAX);
            let digits = d.mantissa().unsigned_abs().to_string().len();
            let precision = u8::try_from(digits).unwrap_or(u8::MAX).max(scale).max(1);
            Kind::decimal(precision, scale)
        }
        Value::Text(s) => Kind::varchar(u32::try_from(s.chars().count()).unwrap_or(u32::MAX)),
        Value::Binary(b) => Kind::Binary {
            length: u32::try_from(b.len()).unwrap_or(u32::MAX),
            varying: true,
        },
        Value::Date(_) => Kind::Date,
        Value::Time(_) => Kind::Time { precision: 0 },
        Value::Datetime(_) => Kind::datetime(),
    })
}

const fn numeric_rank(kind: &Kind) -> Option<u8> {
    match kind {
        Kind::Integer { .. } => Some(0),
        Kind::Float { .. } => Some(1),
        Kind::Double { .. } => Some(2),
        Kind::Decimal { .. } => Some(3),
        _ => None,
    }
}

/// Widest kind that holds values of both `a` and `b`.
///
/// Integers widen by width, then integer → FLOAT → DOUBLE → DECIMAL.
/// Temporal kinds widen to DATETIME, CHAR to CLOB, BINARY to BLOB, and
/// enums to CHAR.
#[must_use]
pub fn unify(a: &Kind, b: &Kind) -> Option<Kind> {
    if a == b {
        return Some(a.clone());
    }
    match (a, b) {
        (
            Kind::Integer {
                width: wa,
                unsigned: ua,
                ..
            },
            Kind::Integer {
                width: wb,
                unsigned: ub,
                ..
            },
        ) => Some(Kind::Integer {
            width: (*wa).max(*wb),
            precision: None,
            unsigned: *ua && *ub,
        }),
        (
            Kind::Decimal {
                precision: pa,
                scale: sa,
                unsigned: ua,
            },
            Kind::Decimal {
                precision: pb,
                scale: sb,
                unsigned: ub,
            },
        ) => {
            let scale = (*sa).max(*sb);
            let whole = pa.saturating_sub(*sa).max(pb.saturating_sub(*sb));
            Some(Kind::Decimal {
                precision: whole.saturating_add(scale),
                scale,
                unsigned: *ua && *ub,
            })
        }
        _ if numeric_rank(a).is_some() && numeric_rank(b).is_some() => {
            let wider = if numeric_rank(a) >= numeric_rank(b) { a } else { b };
            Some(match wider {
                Kind::Float { .. } => Kind::Float { unsigned: false },
                Kind::Double { .. } => Kind::Double { unsigned: false },
                other => other.clone(),
            })
        }
        (Kind::Date | Kind::Time { .. } | Kind::Datetime { .. }, _)
            if b.is_temporal() =>
        {
            let precision = |k: &Kind| match k {
                Kind::Time { precision } | Kind::Datetime { precision } => *precision,
                _ => 0,
            };
            Some(Kind::Datetime {
                precision: precision(a).max(precision(b)),
            })
        }
        (Kind::Clob { .. }, _) if b.is_textual() => Some(a.clone()),
        (_, Kind::Clob { .. }) if a.is_textual() => Some(b.clone()),
        _ if a.is_textual() && b.is_textual() => {
            let length = |k: &Kind| match k {
                Kind::Char { length, .. } => *length,
                Kind::Enum { values } => Kind::enum_width(values),
                _ => 0,
            };
            Some(Kind::varchar(length(a).max(length(b))))
        }
        (Kind::Blob { .. }, Kind::Binary { .. } | Kind::Blob { .. }) => Some(a.clone()),
        (Kind::Binary { .. }, Kind::Blob { .. }) => Some(b.clone()),
        (
            Kind::Binary { length: la, .. },
            Kind::Binary { length: lb, .. },
        ) => Some(Kind::Binary {
            length: (*la).max(*lb),
            varying: true,
        }),
        _ => None,
    }
}

fn unify_all<'a>(kinds: impl IntoIterator<Item = &'a Expr>) -> Result<Option<Kind>> {
    let mut acc: Option<Kind> = None;
    for expr in kinds {
        let Some(kind) = expr.infer()? else {
            continue;
        };
        acc = Some(match acc {
            None => kind,
            Some(prev) => unify(&prev, &kind).ok_or_else(|| Error::IncompatibleCaseTypes {
                left: prev.to_string(),
                right: kind.to_string(),
            })?,
        });
    }
    Ok(acc)
}

fn case_kind(case: &Case) -> Result<Option<Kind>> {
    unify_all(
        case.whens
            .iter()
            .map(|(_, then)| then)
            .chain(case.otherwise.iter()),
    )
}

impl Expr {
    /// The kind this expression evaluates to.
    ///
    /// An untyped NULL literal reports `None`; use [`Expr::null`] to give
    /// a NULL a kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleCaseTypes`] when CASE branches have no
    /// common kind.
    pub fn infer(&self) -> Result<Option<Kind>> {
        Ok(Some(match self {
            Self::Literal(value) => return Ok(literal_kind(value)),
            Self::Null(kind) | Self::Cast { kind, .. } => kind.clone(),
            Self::Column(column) => column.kind.clone(),
            Self::Arithmetic { left, right, .. } => {
                return unify_all([left.as_ref(), right.as_ref()]);
            }
            Self::String { op, args } => match op {
                StringOp::Length => Kind::int(),
                StringOp::Concat => {
                    let mut total: u32 = 0;
                    for arg in args {
                        match arg.infer()? {
                            Some(Kind::Char { length, .. }) => {
                                total = total.saturating_add(length);
                            }
                            Some(Kind::Enum { values }) => {
                                total = total.saturating_add(Kind::enum_width(&values));
                            }
                            Some(Kind::Integer { width, unsigned, .. }) => {
                                total = total
                                    .saturating_add(u32::from(width.max_precision(unsigned)) + 1);
                            }
                            None => {}
                            Some(_) => return Ok(Some(Kind::Clob { length: None })),
                        }
                    }
                    Kind::varchar(total)
                }
                _ => match args.first() {
                    Some(arg) => return arg.infer(),
                    None => Kind::varchar(0),
                },
            },
            Self::Temporal { operand, .. } => return operand.infer(),
            Self::Function { func, args } => match func {
                Function::Abs | Function::Round | Function::Floor | Function::Ceil => {
                    match args.first() {
                        Some(arg) => return arg.infer(),
                        None => Kind::Double { unsigned: false },
                    }
                }
                Function::Sign => Kind::int(),
                Function::CurrentDate => Kind::Date,
                Function::CurrentTime => Kind::Time { precision: 0 },
                Function::CurrentTimestamp => Kind::datetime(),
                _ => Kind::Double { unsigned: false },
            },
            Self::Aggregate { func, arg, .. } => match (func, arg) {
                (Aggregate::Count, _) => Kind::bigint(),
                (Aggregate::Avg, _) => Kind::Double { unsigned: false },
                (Aggregate::Sum, Some(arg)) => match arg.infer()? {
                    Some(Kind::Integer { .. }) => Kind::integer(IntegerWidth::Big),
                    other => return Ok(other),
                },
                (_, Some(arg)) => return arg.infer(),
                (_, None) => Kind::bigint(),
            },
            Self::Case(case) => return case_kind(case),
            Self::Comparison { .. }
            | Self::Boolean { .. }
            | Self::Not(_)
            | Self::Between { .. }
            | Self::Like { .. }
            | Self::IsNull { .. }
            | Self::InList { .. }
            | Self::Quantified { .. } => Kind::Boolean,
            Self::Subquery(query) => return query.result_type(),
        }))
    }

    /// The kind this expression evaluates to, with an untyped NULL
    /// reported as a zero-length VARCHAR.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleCaseTypes`] when CASE branches have no
    /// common kind.
    pub fn result_type(&self) -> Result<Kind> {
        Ok(self.infer()?.unwrap_or_else(|| Kind::varchar(0)))
    }
}
