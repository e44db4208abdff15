//! In-process evaluation of constant expressions.
//!
//! `None` means the value is unknown here (a column, a sub-query, an
//! aggregate, a clock function, or an operation that would fail in the
//! database). `Some(Value::Null)` is SQL NULL and follows three-valued
//! logic.

use std::cmp::Ordering;

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};

use super::{ArithmeticOp, BooleanOp, Case, ComparisonOp, Expr, Function, StringOp, TemporalOp};
use crate::dialect::coerce;
use crate::types::{Interval, Value};

fn arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> Option<Value> {
    if left.is_null() || right.is_null() {
        return Some(Value::Null);
    }
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => {
            let v = match op {
                ArithmeticOp::Add => a.checked_add(*b)?,
                ArithmeticOp::Sub => a.checked_sub(*b)?,
                ArithmeticOp::Mul => a.checked_mul(*b)?,
                ArithmeticOp::Div => a.checked_div(*b)?,
                ArithmeticOp::Rem => a.checked_rem(*b)?,
            };
            Some(Value::Integer(v))
        }
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            let (a, b) = (left.as_f64()?, right.as_f64()?);
            let v = match op {
                ArithmeticOp::Add => a + b,
                ArithmeticOp::Sub => a - b,
                ArithmeticOp::Mul => a * b,
                ArithmeticOp::Div if b == 0.0 => return None,
                ArithmeticOp::Div => a / b,
                ArithmeticOp::Rem if b == 0.0 => return None,
                ArithmeticOp::Rem => a % b,
            };
            Some(Value::Float(v))
        }
        _ => {
            let (a, b) = (left.as_decimal()?, right.as_decimal()?);
            let v = match op {
                ArithmeticOp::Add => a.checked_add(b)?,
                ArithmeticOp::Sub => a.checked_sub(b)?,
                ArithmeticOp::Mul => a.checked_mul(b)?,
                ArithmeticOp::Div => a.checked_div(b)?,
                ArithmeticOp::Rem => a.checked_rem(b)?,
            };
            Some(Value::Decimal(v))
        }
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s.clone()),
        Value::Integer(n) => Some(n.to_string()),
        Value::Decimal(d) => Some(d.to_string()),
        Value::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

fn string_op(op: StringOp, args: &[Value]) -> Option<Value> {
    if args.iter().any(Value::is_null) {
        return Some(Value::Null);
    }
    if op == StringOp::Concat {
        return args
            .iter()
            .map(text)
            .collect::<Option<String>>()
            .map(Value::Text);
    }
    let s = match args.first()? {
        Value::Text(s) => s,
        _ => return None,
    };
    Some(match op {
        StringOp::Lower => Value::Text(s.to_lowercase()),
        StringOp::Upper => Value::Text(s.to_uppercase()),
        StringOp::Trim => Value::Text(s.trim_matches(' ').to_string()),
        StringOp::LTrim => Value::Text(s.trim_start_matches(' ').to_string()),
        StringOp::RTrim => Value::Text(s.trim_end_matches(' ').to_string()),
        StringOp::Length => Value::Integer(i128::try_from(s.chars().count()).ok()?),
        StringOp::Substring => {
            let start = match args.get(1)? {
                Value::Integer(n) => usize::try_from((*n).max(1) - 1).ok()?,
                _ => return None,
            };
            let chars = s.chars().skip(start);
            Value::Text(match args.get(2) {
                Some(Value::Integer(n)) => chars.take(usize::try_from(*n).ok()?).collect(),
                Some(_) => return None,
                None => chars.collect(),
            })
        }
        StringOp::Concat => return None,
    })
}

fn temporal(op: TemporalOp, value: &Value, interval: &Interval) -> Option<Value> {
    let interval = match op {
        TemporalOp::Add => interval.clone(),
        TemporalOp::Sub => interval.negate(),
    };
    match value {
        Value::Null => Some(Value::Null),
        Value::Date(d) => interval.add_to_date(*d).map(Value::Date),
        Value::Time(t) => interval.add_to_time(*t).map(Value::Time),
        Value::Datetime(dt) => interval.add_to(*dt).map(Value::Datetime),
        _ => None,
    }
}

fn float_fn(args: &[Value], f: impl Fn(f64) -> f64) -> Option<Value> {
    let x = args.first()?.as_f64()?;
    let y = f(x);
    y.is_finite().then_some(Value::Float(y))
}

fn function(func: Function, args: &[Value]) -> Option<Value> {
    if args.iter().any(Value::is_null) {
        return Some(Value::Null);
    }
    match func {
        Function::Abs => match args.first()? {
            Value::Integer(n) => n.checked_abs().map(Value::Integer),
            Value::Decimal(d) => Some(Value::Decimal(d.abs())),
            other => other.as_f64().map(|f| Value::Float(f.abs())),
        },
        Function::Sign => {
            let d = args.first()?.as_decimal()?;
            Some(Value::Integer(match d.cmp(&Decimal::ZERO) {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            }))
        }
        Function::Round | Function::Floor | Function::Ceil => {
            let value = args.first()?;
            if let Value::Integer(_) = value {
                return Some(value.clone());
            }
            let digits = match args.get(1) {
                Some(Value::Integer(n)) => u32::try_from(*n).ok()?,
                Some(_) => return None,
                None => 0,
            };
            let d = value.as_decimal()?;
            let rounded = match func {
                Function::Floor => d.floor(),
                Function::Ceil => d.ceil(),
                _ => d.round_dp_with_strategy(
                    digits,
                    rust_decimal::RoundingStrategy::MidpointAwayFromZero,
                ),
            };
            Some(match value {
                Value::Float(_) => Value::Float(rounded.to_f64()?),
                _ => Value::Decimal(rounded),
            })
        }
        Function::Sqrt => float_fn(args, f64::sqrt),
        Function::Exp => float_fn(args, f64::exp),
        Function::Ln => float_fn(args, f64::ln),
        Function::Log2 => float_fn(args, f64::log2),
        Function::Log10 => float_fn(args, f64::log10),
        Function::Sin => float_fn(args, f64::sin),
        Function::Cos => float_fn(args, f64::cos),
        Function::Tan => float_fn(args, f64::tan),
        Function::Asin => float_fn(args, f64::asin),
        Function::Acos => float_fn(args, f64::acos),
        Function::Atan => float_fn(args, f64::atan),
        Function::Power => {
            if let (Value::Decimal(x), Some(Value::Integer(y))) = (args.first()?, args.get(1)) {
                return x.checked_powi(i64::try_from(*y).ok()?).map(Value::Decimal);
            }
            let (x, y) = (args.first()?.as_f64()?, args.get(1)?.as_f64()?);
            let v = x.powf(y);
            v.is_finite().then_some(Value::Float(v))
        }
        Function::Log => {
            let (base, x) = (args.first()?.as_f64()?, args.get(1)?.as_f64()?);
            let v = x.ln() / base.ln();
            v.is_finite().then_some(Value::Float(v))
        }
        Function::Atan2 => {
            let (y, x) = (args.first()?.as_f64()?, args.get(1)?.as_f64()?);
            Some(Value::Float(y.atan2(x)))
        }
        Function::Pi => Some(Value::Float(std::f64::consts::PI)),
        Function::CurrentDate | Function::CurrentTime | Function::CurrentTimestamp => None,
    }
}

fn compare(op: ComparisonOp, left: &Value, right: &Value) -> Option<Value> {
    if left.is_null() || right.is_null() {
        return Some(Value::Null);
    }
    let ordering = left.compare(right)?;
    Some(Value::Boolean(match op {
        ComparisonOp::Eq => ordering == Ordering::Equal,
        ComparisonOp::Ne => ordering != Ordering::Equal,
        ComparisonOp::Lt => ordering == Ordering::Less,
        ComparisonOp::Le => ordering != Ordering::Greater,
        ComparisonOp::Gt => ordering == Ordering::Greater,
        ComparisonOp::Ge => ordering != Ordering::Less,
    }))
}

/// Three-valued AND / OR. A dominating operand (FALSE for AND, TRUE for
/// OR) decides even when others are unknown.
fn connect(op: BooleanOp, operands: &[Expr]) -> Option<Value> {
    let dominant = op == BooleanOp::Or;
    let mut unknown = false;
    let mut null = false;
    for operand in operands {
        match operand.evaluate() {
            Some(Value::Boolean(b)) if b == dominant => return Some(Value::Boolean(dominant)),
            Some(Value::Boolean(_)) => {}
            Some(Value::Null) => null = true,
            _ => unknown = true,
        }
    }
    if unknown {
        None
    } else if null {
        Some(Value::Null)
    } else {
        Some(Value::Boolean(!dominant))
    }
}

/// Translates a LIKE pattern into an anchored regex.
fn like_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::from("(?s)^");
    for c in pattern.chars() {
        match c {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).ok()
}

fn case(case: &Case) -> Option<Value> {
    let operand = match &case.operand {
        Some(operand) => Some(operand.evaluate()?),
        None => None,
    };
    for (when, then) in &case.whens {
        let matched = match &operand {
            Some(value) => compare(ComparisonOp::Eq, value, &when.evaluate()?)?,
            None => when.evaluate()?,
        };
        match matched {
            Value::Boolean(true) => return then.evaluate(),
            Value::Boolean(false) | Value::Null => {}
            _ => return None,
        }
    }
    match &case.otherwise {
        Some(otherwise) => otherwise.evaluate(),
        None => Some(Value::Null),
    }
}

impl Expr {
    /// Folds the expression to a value when every operand is known.
    ///
    /// `BETWEEN` is inclusive on both bounds and its `positive` flag
    /// inverts the test, so `5 BETWEEN 1 AND 10` is true and
    /// `5 NOT BETWEEN 1 AND 10` is false.
    #[must_use]
    pub fn evaluate(&self) -> Option<Value> {
        match self {
            Self::Literal(value) => Some(value.clone()),
            Self::Null(_) => Some(Value::Null),
            Self::Column(_)
            | Self::Aggregate { .. }
            | Self::Quantified { .. }
            | Self::Subquery(_) => None,
            Self::Arithmetic { op, left, right } => {
                arithmetic(*op, &left.evaluate()?, &right.evaluate()?)
            }
            Self::String { op, args } => {
                let args: Option<Vec<Value>> = args.iter().map(Self::evaluate).collect();
                string_op(*op, &args?)
            }
            Self::Temporal {
                op,
                operand,
                interval,
            } => temporal(*op, &operand.evaluate()?, interval),
            Self::Function { func, args } => {
                let args: Option<Vec<Value>> = args.iter().map(Self::evaluate).collect();
                function(*func, &args?)
            }
            Self::Case(c) => case(c),
            Self::Cast { expr, kind } => coerce(kind, expr.evaluate()?),
            Self::Comparison { op, left, right } => {
                compare(*op, &left.evaluate()?, &right.evaluate()?)
            }
            Self::Boolean { op, operands } => connect(*op, operands),
            Self::Not(inner) => match inner.evaluate()? {
                Value::Boolean(b) => Some(Value::Boolean(!b)),
                Value::Null => Some(Value::Null),
                _ => None,
            },
            Self::Between {
                expr,
                low,
                high,
                positive,
            } => {
                let (value, low, high) = (expr.evaluate()?, low.evaluate()?, high.evaluate()?);
                if value.is_null() || low.is_null() || high.is_null() {
                    return Some(Value::Null);
                }
                let inside = low.compare(&value)? != Ordering::Greater
                    && value.compare(&high)? != Ordering::Greater;
                Some(Value::Boolean(inside == *positive))
            }
            Self::Like {
                expr,
                pattern,
                positive,
            } => match (expr.evaluate()?, pattern.evaluate()?) {
                (Value::Text(s), Value::Text(p)) => {
                    Some(Value::Boolean(like_regex(&p)?.is_match(&s) == *positive))
                }
                (Value::Null, _) | (_, Value::Null) => Some(Value::Null),
                _ => None,
            },
            Self::IsNull { expr, positive } => {
                Some(Value::Boolean(expr.evaluate()?.is_null() == *positive))
            }
            Self::InList {
                expr,
                list,
                positive,
            } => {
                let value = expr.evaluate()?;
                if value.is_null() {
                    return Some(Value::Null);
                }
                let mut saw_null = false;
                for item in list {
                    match compare(ComparisonOp::Eq, &value, &item.evaluate()?)? {
                        Value::Boolean(true) => return Some(Value::Boolean(*positive)),
                        Value::Null => saw_null = true,
                        _ => {}
                    }
                }
                Some(if saw_null {
                    Value::Null
                } else {
                    Value::Boolean(!*positive)
                })
            }
        }
    }
}
