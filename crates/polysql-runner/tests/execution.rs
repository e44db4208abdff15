//! Compiled DML executed against the shop schema.

mod common;

use polysql_core::{DmlCompiler, Expr, Insert, Select, Statement, Value, Vendor};
use polysql_runner::executor::SqliteExecutor;
use regex::Regex;
use rust_decimal::Decimal;

async fn add_customers(executor: &SqliteExecutor, count: usize) {
    let flat = common::flat_shop();
    let customer = common::table(&flat, "customer");
    let compiler = DmlCompiler::new(executor.dialect());
    for n in 1..=count {
        let insert = Insert::new(customer).value("email", format!("c{n}@example.com"));
        executor.execute(&compiler.insert(&insert).unwrap()).await.unwrap();
    }
}

async fn price_of(executor: &SqliteExecutor, sku: &str) -> f64 {
    let (price,): (f64,) = sqlx::query_as("SELECT price FROM product WHERE sku = ?")
        .bind(sku)
        .fetch_one(executor.pool())
        .await
        .unwrap();
    price
}

// =============================================================================
// Upserts
// =============================================================================

#[tokio::test]
async fn test_upsert_updates_existing_row() {
    let executor = common::shop_database().await;
    let flat = common::flat_shop();
    let product = common::table(&flat, "product");
    let compiler = DmlCompiler::new(executor.dialect());

    let insert = |price: Decimal| {
        Insert::new(product)
            .value("sku", "AB-00017")
            .value("price", price)
            .conflict_columns(["sku"])
            .on_conflict_do_update()
    };

    let first = executor
        .execute(&compiler.insert(&insert(Decimal::new(1999, 2))).unwrap())
        .await
        .unwrap();
    assert_eq!(first.rows_affected, 1);
    assert_eq!(first.generated_keys, vec![("id".to_string(), Value::Integer(1))]);

    let second = executor
        .execute(&compiler.insert(&insert(Decimal::new(2450, 2))).unwrap())
        .await
        .unwrap();
    assert_eq!(second.rows_affected, 1);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM product")
        .fetch_one(executor.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert!((price_of(&executor, "AB-00017").await - 24.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_upsert_do_nothing_keeps_row() {
    let executor = common::shop_database().await;
    let flat = common::flat_shop();
    let product = common::table(&flat, "product");
    let compiler = DmlCompiler::new(executor.dialect());

    let insert = |price: Decimal| {
        Insert::new(product)
            .value("sku", "ZZ-00001")
            .value("price", price)
            .conflict_columns(["sku"])
            .on_conflict_do_nothing()
    };
    executor
        .execute(&compiler.insert(&insert(Decimal::new(500, 2))).unwrap())
        .await
        .unwrap();
    let ignored = executor
        .execute(&compiler.insert(&insert(Decimal::new(900, 2))).unwrap())
        .await
        .unwrap();

    assert_eq!(ignored.rows_affected, 0);
    assert!(ignored.generated_keys.is_empty());
    assert!((price_of(&executor, "ZZ-00001").await - 5.0).abs() < f64::EPSILON);
}

// =============================================================================
// Pagination
// =============================================================================

fn window(statement: &Statement, vendor: Vendor) -> (u64, u64) {
    let number = |caps: &regex::Captures<'_>, i: usize| caps[i].parse::<u64>().unwrap();
    match vendor {
        Vendor::Oracle => {
            let re = Regex::new(r"ROWNUM <= (\d+)\) WHERE rnum\d+ > (\d+)$").unwrap();
            let caps = re.captures(&statement.sql).unwrap();
            let (upper, lower) = (number(&caps, 1), number(&caps, 2));
            (upper - lower, lower)
        }
        Vendor::Derby => {
            let re = Regex::new(r"OFFSET (\d+) ROWS FETCH NEXT (\d+) ROWS ONLY$").unwrap();
            let caps = re.captures(&statement.sql).unwrap();
            (number(&caps, 2), number(&caps, 1))
        }
        _ => {
            let re = Regex::new(r"LIMIT (\d+) OFFSET (\d+)$").unwrap();
            let caps = re.captures(&statement.sql).unwrap();
            (number(&caps, 1), number(&caps, 2))
        }
    }
}

#[tokio::test]
async fn test_pagination_selects_same_window_everywhere() {
    let executor = common::shop_database().await;
    add_customers(&executor, 30).await;

    let flat = common::flat_shop();
    let customer = common::table(&flat, "customer");
    let query = Select::from_table(customer)
        .entity(customer)
        .order_by(customer.col("id").unwrap())
        .limit(10)
        .offset(20);

    for vendor in Vendor::ALL {
        let statement = DmlCompiler::new(vendor.dialect()).select(&query).unwrap();
        assert_eq!(window(&statement, vendor), (10, 20), "{vendor}: {}", statement.sql);
    }

    let statement = DmlCompiler::new(executor.dialect()).select(&query).unwrap();
    let rows = executor.fetch(&statement).await.unwrap();
    let ids: Vec<Value> = rows.iter().map(|row| row[0].clone()).collect();
    let expected: Vec<Value> = (21..=30).map(|id: i64| Value::from(id)).collect();
    assert_eq!(ids, expected);

    // Whole-entity rows decode every column to its declared kind.
    assert_eq!(rows[0][2], Value::from("c21@example.com"));
    assert_eq!(rows[0][3], Value::from("bronze"));
    assert!(matches!(rows[0][1], Value::Datetime(_)));
}

#[tokio::test]
async fn test_filtered_fetch() {
    let executor = common::shop_database().await;
    add_customers(&executor, 5).await;

    let flat = common::flat_shop();
    let customer = common::table(&flat, "customer");
    let query = Select::from_table(customer)
        .column(customer.col("email").unwrap())
        .filter(customer.col("id").unwrap().gt(Expr::lit(3)))
        .order_by_desc(customer.col("id").unwrap());

    let statement = DmlCompiler::new(executor.dialect()).select(&query).unwrap();
    let rows = executor.fetch(&statement).await.unwrap();
    assert_eq!(
        rows,
        vec![
            vec![Value::from("c5@example.com")],
            vec![Value::from("c4@example.com")],
        ]
    );
}
