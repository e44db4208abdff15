//! Constant folding and per-vendor rendering of expressions.

mod common;

use chrono::NaiveDate;
use polysql_core::expr::{Aggregate, Function};
use polysql_core::types::IntervalUnit;
use polysql_core::{DmlCompiler, Error, Expr, Interval, Select, Value, Vendor};

#[test]
fn test_between_examples() {
    let inside = Expr::lit(5).between(Value::from(1), Value::from(10), true);
    assert_eq!(inside.evaluate(), Some(Value::Boolean(true)));

    let negated = Expr::lit(5).between(Value::from(1), Value::from(10), false);
    assert_eq!(negated.evaluate(), Some(Value::Boolean(false)));

    let edge = Expr::lit(10).between(Value::from(1), Value::from(10), true);
    assert_eq!(edge.evaluate(), Some(Value::Boolean(true)));
}

#[test]
fn test_unknown_and_null_are_distinct() {
    let flat = common::flat_shop();
    let line = common::table(&flat, "line");
    let column = line.col("quantity").unwrap().gt(Expr::lit(1));
    assert_eq!(column.evaluate(), None);

    let null = Expr::lit(Value::Null).eq(Expr::lit(1));
    assert_eq!(null.evaluate(), Some(Value::Null));
}

#[test]
fn test_interval_arithmetic_folds() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let expr = Expr::lit(start).plus_interval(Interval::new(10, IntervalUnit::Days));
    assert_eq!(
        expr.evaluate(),
        Some(Value::Date(NaiveDate::from_ymd_opt(2024, 1, 25).unwrap()))
    );
}

#[test]
fn test_interval_rendering_per_vendor() {
    let flat = common::flat_shop();
    let purchase = common::table(&flat, "purchase");
    let shifted = purchase
        .col("created")
        .unwrap()
        .plus_interval(Interval::new(1, IntervalUnit::Days));
    let query = Select::from_table(purchase).column_as(shifted, "due");

    let expected = [
        (Vendor::MySql, "DATE_ADD(a.`created`, INTERVAL 1 DAY)"),
        (Vendor::PostgreSql, "(a.\"created\" + INTERVAL '1 DAY')"),
        (Vendor::Sqlite, "DATETIME(a.\"created\", '+1 days')"),
        (
            Vendor::Derby,
            "{fn TIMESTAMPADD(SQL_TSI_DAY, 1, a.\"created\")}",
        ),
    ];
    for (vendor, fragment) in expected {
        let statement = DmlCompiler::new(vendor.dialect()).select(&query).unwrap();
        assert!(statement.sql.contains(fragment), "{vendor}: {}", statement.sql);
    }
}

#[test]
fn test_aggregates_and_functions() {
    let flat = common::flat_shop();
    let line = common::table(&flat, "line");
    let query = Select::from_table(line)
        .column_as(Expr::aggregate(Aggregate::Sum, line.col("quantity").unwrap()), "total")
        .column_as(
            Expr::function(Function::Abs, vec![line.col("quantity").unwrap()]),
            "magnitude",
        )
        .group_by(line.col("purchase_id").unwrap());
    let statement = DmlCompiler::new(Vendor::PostgreSql.dialect())
        .select(&query)
        .unwrap();
    assert_eq!(
        statement.sql,
        "SELECT SUM(a.\"quantity\") \"total\", ABS(a.\"quantity\") \"magnitude\" \
         FROM \"line\" a GROUP BY a.\"purchase_id\""
    );
}

#[test]
fn test_derby_emulations_with_bound_literals() {
    let flat = common::flat_shop();
    let line = common::table(&flat, "line");
    let quantity = || line.col("quantity").unwrap();
    let compiler = DmlCompiler::new(Vendor::Derby.dialect());

    let log = Select::from_table(line).column_as(
        Expr::function(Function::Log, vec![Expr::lit(2), quantity()]),
        "bits",
    );
    let statement = compiler.select(&log).unwrap();
    assert!(statement.sql.contains("(LN(a.\"quantity\") / LN(?))"), "{}", statement.sql);
    assert_eq!(statement.params, vec![Value::from(2)]);

    let both_bound = Select::from_table(line).column_as(
        Expr::function(Function::Log, vec![Expr::lit(2), Expr::lit(8)]),
        "three",
    );
    assert!(matches!(
        compiler.select(&both_bound),
        Err(Error::UnsupportedOperation(_))
    ));

    let rounded = Select::from_table(line).column_as(
        Expr::function(Function::Round, vec![Expr::lit(2.5)]),
        "three",
    );
    assert!(matches!(
        compiler.select(&rounded),
        Err(Error::UnsupportedOperation(_))
    ));
}
