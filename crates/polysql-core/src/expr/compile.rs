//! Expression to SQL text.

use super::{Aggregate, ArithmeticOp, Expr, Quantifier, StringOp};
use crate::context::Compilation;
use crate::dml::compile_select;
use crate::error::{Error, Result};

/// Compiles `expr` into `ctx` and returns the emitted text, leaving the
/// buffer as it was.
fn fragment(ctx: &mut Compilation<'_>, expr: &Expr) -> Result<String> {
    let mark = ctx.mark();
    compile(ctx, expr)?;
    Ok(ctx.split_off(mark))
}

/// Compiles each expression to its own fragment. Dialects receiving the
/// fragments must keep them in order, or `?` placeholders would bind to
/// the wrong parameters.
fn fragments(ctx: &mut Compilation<'_>, exprs: &[Expr]) -> Result<Vec<String>> {
    exprs.iter().map(|e| fragment(ctx, e)).collect()
}

fn separated(ctx: &mut Compilation<'_>, exprs: &[Expr], separator: &str) -> Result<()> {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            ctx.push(separator);
        }
        compile(ctx, expr)?;
    }
    Ok(())
}

fn subquery(ctx: &mut Compilation<'_>, query: &crate::dml::Select) -> Result<()> {
    ctx.push("(");
    compile_select(ctx, query)?;
    ctx.push(")");
    Ok(())
}

/// Appends the SQL for `expr`, binding literals as parameters.
pub(crate) fn compile(ctx: &mut Compilation<'_>, expr: &Expr) -> Result<()> {
    let dialect = ctx.dialect();
    match expr {
        Expr::Literal(value) if value.is_null() => ctx.push("NULL"),
        Expr::Literal(value) => ctx.bind(None, value.clone()),
        Expr::Null(_) => ctx.push("NULL"),
        Expr::Column(column) => {
            let qualifier = match ctx.resolve(&column.table) {
                Some(Some(alias)) => Some(alias.to_string()),
                Some(None) => None,
                None => Some(ctx.quote(&column.table)),
            };
            if let Some(qualifier) = qualifier {
                ctx.push(&qualifier);
                ctx.push(".");
            }
            ctx.push_ident(&column.name);
        }
        Expr::Arithmetic {
            op: ArithmeticOp::Rem,
            left,
            right,
        } => {
            let left = fragment(ctx, left)?;
            let right = fragment(ctx, right)?;
            ctx.push(&dialect.modulo(&left, &right));
        }
        Expr::Arithmetic { op, left, right } => {
            ctx.push("(");
            compile(ctx, left)?;
            ctx.push(" ");
            ctx.push(op.as_str());
            ctx.push(" ");
            compile(ctx, right)?;
            ctx.push(")");
        }
        Expr::String { op, args } => match op {
            StringOp::Concat => {
                let parts = fragments(ctx, args)?;
                ctx.push(&dialect.concat(&parts));
            }
            StringOp::Length => {
                ctx.push(dialect.length_function());
                ctx.push("(");
                separated(ctx, args, ", ")?;
                ctx.push(")");
            }
            StringOp::Substring => {
                ctx.push(dialect.substring_function());
                ctx.push("(");
                separated(ctx, args, ", ")?;
                ctx.push(")");
            }
            StringOp::Lower | StringOp::Upper | StringOp::Trim | StringOp::LTrim
            | StringOp::RTrim => {
                let name = match op {
                    StringOp::Lower => "LOWER",
                    StringOp::Upper => "UPPER",
                    StringOp::Trim => "TRIM",
                    StringOp::LTrim => "LTRIM",
                    _ => "RTRIM",
                };
                ctx.push(name);
                ctx.push("(");
                separated(ctx, args, ", ")?;
                ctx.push(")");
            }
        },
        Expr::Temporal {
            op,
            operand,
            interval,
        } => {
            let kind = operand.result_type()?;
            let operand = fragment(ctx, operand)?;
            ctx.push(&dialect.temporal(*op, &operand, &kind, interval)?);
        }
        Expr::Function { func, args } => {
            let args = fragments(ctx, args)?;
            ctx.push(&dialect.function(*func, &args)?);
        }
        Expr::Aggregate {
            func,
            distinct,
            arg,
        } => {
            ctx.push(func.as_str());
            ctx.push("(");
            match arg {
                None if *func == Aggregate::Count => ctx.push("*"),
                None => {
                    return Err(Error::UnsupportedOperation(format!(
                        "{} requires an argument",
                        func.as_str()
                    )))
                }
                Some(arg) => {
                    if *distinct {
                        ctx.push("DISTINCT ");
                    }
                    compile(ctx, arg)?;
                }
            }
            ctx.push(")");
        }
        Expr::Case(case) => {
            ctx.push("CASE");
            if let Some(operand) = &case.operand {
                ctx.push(" ");
                compile(ctx, operand)?;
            }
            for (when, then) in &case.whens {
                ctx.push(" WHEN ");
                compile(ctx, when)?;
                ctx.push(" THEN ");
                compile(ctx, then)?;
            }
            if let Some(otherwise) = &case.otherwise {
                ctx.push(" ELSE ");
                compile(ctx, otherwise)?;
            }
            ctx.push(" END");
        }
        Expr::Cast { expr, kind } => {
            ctx.push("CAST(");
            compile(ctx, expr)?;
            ctx.push(" AS ");
            ctx.push(&dialect.cast_type(kind)?);
            ctx.push(")");
        }
        Expr::Comparison { op, left, right } => {
            compile(ctx, left)?;
            ctx.push(" ");
            ctx.push(op.as_str());
            ctx.push(" ");
            compile(ctx, right)?;
        }
        Expr::Boolean { op, operands } => {
            ctx.push("(");
            separated(ctx, operands, &format!(" {} ", op.as_str()))?;
            ctx.push(")");
        }
        Expr::Not(inner) => {
            ctx.push("NOT (");
            compile(ctx, inner)?;
            ctx.push(")");
        }
        Expr::Between {
            expr,
            low,
            high,
            positive,
        } => {
            compile(ctx, expr)?;
            ctx.push(if *positive { " BETWEEN " } else { " NOT BETWEEN " });
            compile(ctx, low)?;
            ctx.push(" AND ");
            compile(ctx, high)?;
        }
        Expr::Like {
            expr,
            pattern,
            positive,
        } => {
            compile(ctx, expr)?;
            ctx.push(if *positive { " LIKE " } else { " NOT LIKE " });
            compile(ctx, pattern)?;
        }
        Expr::IsNull { expr, positive } => {
            compile(ctx, expr)?;
            ctx.push(if *positive { " IS NULL" } else { " IS NOT NULL" });
        }
        Expr::InList {
            expr,
            list,
            positive,
        } => {
            if list.is_empty() {
                ctx.push(if *positive { "1 = 0" } else { "1 = 1" });
                return Ok(());
            }
            compile(ctx, expr)?;
            ctx.push(if *positive { " IN (" } else { " NOT IN (" });
            separated(ctx, list, ", ")?;
            ctx.push(")");
        }
        Expr::Quantified {
            quantifier,
            expr,
            query,
        } => {
            if let Some(expr) = expr {
                compile(ctx, expr)?;
                ctx.push(" ");
            }
            match quantifier {
                Quantifier::In => ctx.push("IN "),
                Quantifier::NotIn => ctx.push("NOT IN "),
                Quantifier::Exists => ctx.push("EXISTS "),
                Quantifier::NotExists => ctx.push("NOT EXISTS "),
                Quantifier::Any(op) => {
                    ctx.push(op.as_str());
                    ctx.push(" ANY ");
                }
                Quantifier::All(op) => {
                    ctx.push(op.as_str());
                    ctx.push(" ALL ");
                }
            }
            subquery(ctx, query)?;
        }
        Expr::Subquery(query) => subquery(ctx, query)?,
    }
    Ok(())
}

/// Wraps a predicate so it yields 1/0 where booleans cannot be selected.
pub(crate) fn compile_projection(ctx: &mut Compilation<'_>, expr: &Expr) -> Result<()> {
    if expr.is_predicate() && !ctx.dialect().native_boolean_projection() {
        ctx.push("CASE WHEN ");
        compile(ctx, expr)?;
        ctx.push(" THEN 1 ELSE 0 END");
        return Ok(());
    }
    compile(ctx, expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::QuotePolicy;
    use crate::dialect::{MySqlDialect, OracleDialect, PostgresDialect, SqliteDialect};
    use crate::expr::Function;
    use crate::types::{Interval, IntervalUnit, Kind, Value};

    fn sql(dialect: &dyn crate::dialect::Dialect, expr: &Expr) -> (String, Vec<Value>) {
        let mut ctx = Compilation::new(dialect, QuotePolicy::Always);
        compile(&mut ctx, expr).unwrap();
        ctx.take()
    }

    #[test]
    fn test_unscoped_column_is_table_qualified() {
        let e = Expr::column("person", "age", Kind::int()).ge(Expr::lit(18));
        let (text, params) = sql(&PostgresDialect::new(), &e);
        assert_eq!(text, "\"person\".\"age\" >= $1");
        assert_eq!(params, vec![Value::Integer(18)]);
    }

    #[test]
    fn test_params_follow_traversal_order() {
        let e = Expr::lit(1)
            .modulo(Expr::lit(2))
            .eq(Expr::lit(3))
            .and(Expr::lit("a").concat(Expr::lit("b")).eq(Expr::lit("ab")));
        let (text, params) = sql(&PostgresDialect::new(), &e);
        assert_eq!(text, "(MOD($1, $2) = $3 AND ($4 || $5) = $6)");
        assert_eq!(
            params,
            vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                Value::from("a"),
                Value::from("b"),
                Value::from("ab"),
            ]
        );
    }

    #[test]
    fn test_mysql_concat_and_modulo() {
        let e = Expr::lit("a").concat(Expr::lit(7).modulo(Expr::lit(4)));
        let (text, _) = sql(&MySqlDialect::mysql(), &e);
        assert_eq!(text, "CONCAT(?, MOD(?, ?))");
    }

    #[test]
    fn test_empty_in_list() {
        let e = Expr::column("t", "c", Kind::int()).in_list(Vec::<Expr>::new());
        assert_eq!(sql(&SqliteDialect::new(), &e).0, "1 = 0");
        let e = Expr::column("t", "c", Kind::int()).not_in_list(Vec::<Expr>::new());
        assert_eq!(sql(&SqliteDialect::new(), &e).0, "1 = 1");
    }

    #[test]
    fn test_case_and_cast() {
        let c = Expr::column("t", "n", Kind::int());
        let e = Expr::case_when(
            vec![(c.clone().gt(Expr::lit(0)), Expr::lit("pos"))],
            Some(Expr::lit("neg")),
        );
        assert_eq!(
            sql(&SqliteDialect::new(), &e).0,
            "CASE WHEN \"t\".\"n\" > ? THEN ? ELSE ? END"
        );
        assert_eq!(
            sql(&SqliteDialect::new(), &c.cast(Kind::decimal(10, 2))).0,
            "CAST(\"t\".\"n\" AS NUMERIC)"
        );
    }

    #[test]
    fn test_interval_delegates_to_dialect() {
        let e = Expr::column("t", "d", Kind::Date).plus_interval(Interval::new(1, IntervalUnit::Days));
        assert_eq!(
            sql(&MySqlDialect::mysql(), &e).0,
            "DATE_ADD(`t`.`d`, INTERVAL 1 DAY)"
        );
    }

    #[test]
    fn test_oracle_function_emulation() {
        let e = Expr::function(Function::Pi, Vec::new());
        assert_eq!(sql(&OracleDialect::new(), &e).0, "ACOS(-1)");
    }

    #[test]
    fn test_count_distinct() {
        let e = Expr::aggregate_distinct(Aggregate::Count, Expr::column("t", "c", Kind::int()));
        assert_eq!(sql(&PostgresDialect::new(), &e).0, "COUNT(DISTINCT \"t\".\"c\")");
        assert_eq!(sql(&PostgresDialect::new(), &Expr::count_all()).0, "COUNT(*)");
    }
}
