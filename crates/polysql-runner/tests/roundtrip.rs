//! Applying a schema to SQLite and reading it back.

mod common;

use polysql_core::schema::ChangeRule;
use polysql_core::{FlatSchema, FlatTable};
use polysql_runner::introspect::introspect;
use polysql_runner::loader::{parse_schema, to_json};

type ForeignKeyShape = (String, String, String, Option<ChangeRule>, Option<ChangeRule>);

/// Key structure of a table, independent of how it was declared.
#[derive(Debug, PartialEq)]
struct Shape {
    name: String,
    columns: Vec<String>,
    nullable: Vec<String>,
    primary_key: Vec<String>,
    unique: Vec<Vec<String>>,
    foreign_keys: Vec<ForeignKeyShape>,
}

fn shape(table: &FlatTable) -> Shape {
    let mut unique = table.unique.clone();
    unique.extend(
        table
            .columns
            .iter()
            .filter(|c| c.unique && !table.is_primary(&c.name))
            .map(|c| vec![c.name.clone()]),
    );
    unique.sort();
    unique.dedup();

    Shape {
        name: table.name.clone(),
        columns: table.columns.iter().map(|c| c.name.clone()).collect(),
        nullable: table
            .columns
            .iter()
            .filter(|c| c.nullable && !table.is_primary(&c.name))
            .map(|c| c.name.clone())
            .collect(),
        primary_key: table.primary_key.clone(),
        unique,
        foreign_keys: table
            .columns
            .iter()
            .filter_map(|c| {
                c.foreign_key.as_ref().map(|fk| {
                    (
                        c.name.clone(),
                        fk.references.clone(),
                        fk.column.clone(),
                        fk.on_delete,
                        fk.on_update,
                    )
                })
            })
            .collect(),
    }
}

fn shapes(schema: &FlatSchema) -> Vec<Shape> {
    schema.emitted().map(shape).collect()
}

#[tokio::test]
async fn test_introspected_schema_matches_declared() {
    let executor = common::shop_database().await;
    let live = introspect(executor.pool()).await.unwrap();
    let live = live.flatten().unwrap();

    assert_eq!(shapes(&live), shapes(&common::flat_shop()));
}

#[tokio::test]
async fn test_foreign_key_actions_survive() {
    let executor = common::shop_database().await;
    let live = introspect(executor.pool()).await.unwrap().flatten().unwrap();

    let line = common::table(&live, "line");
    let purchase = line.column("purchase_id").unwrap().foreign_key.as_ref().unwrap();
    assert_eq!(purchase.references, "purchase");
    assert_eq!(purchase.on_delete, Some(ChangeRule::Cascade));

    let product = line.column("product_id").unwrap().foreign_key.as_ref().unwrap();
    assert_eq!(product.references, "product");
    assert_eq!(product.on_delete, None);
}

#[tokio::test]
async fn test_introspected_document_reapplies() {
    let executor = common::shop_database().await;
    let live = introspect(executor.pool()).await.unwrap();
    let document = to_json(&live).unwrap();

    let copy = polysql_runner::executor::SqliteExecutor::connect(":memory:")
        .await
        .unwrap();
    copy.apply(&parse_schema(&document).unwrap(), polysql_core::DdlOptions::new())
        .await
        .unwrap();
    let again = introspect(copy.pool()).await.unwrap();

    assert_eq!(
        shapes(&again.flatten().unwrap()),
        shapes(&live.flatten().unwrap())
    );
}
