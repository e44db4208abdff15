#![allow(dead_code)]

use polysql_core::{DdlOptions, FlatSchema, FlatTable, Schema};
use polysql_runner::executor::SqliteExecutor;
use polysql_runner::loader::parse_schema;

/// Customers, products, purchases and purchase lines sharing an abstract
/// base with a surrogate key.
pub const SHOP: &str = r#"{
    "tables": [
        {
            "name": "record",
            "abstract": true,
            "columns": [
                {"name": "id", "kind": {"type": "integer", "width": "big"},
                 "primary": true, "generate_on_insert": "auto_increment"},
                {"name": "created", "kind": {"type": "datetime"},
                 "generate_on_insert": "timestamp"}
            ]
        },
        {
            "name": "customer",
            "extends": "record",
            "columns": [
                {"name": "email", "kind": {"type": "char", "length": 80, "varying": true},
                 "nullable": false, "unique": true},
                {"name": "tier", "kind": {"type": "enum", "values": ["bronze", "silver", "gold"]},
                 "nullable": false, "default": {"text": "bronze"}}
            ]
        },
        {
            "name": "product",
            "extends": "record",
            "columns": [
                {"name": "sku", "kind": {"type": "char", "length": 8},
                 "nullable": false, "unique": true},
                {"name": "price", "kind": {"type": "decimal", "precision": 10, "scale": 2},
                 "nullable": false}
            ]
        },
        {
            "name": "purchase",
            "extends": "record",
            "columns": [
                {"name": "customer_id", "kind": {"type": "integer", "width": "big"},
                 "nullable": false,
                 "foreign_key": {"references": "customer", "column": "id", "on_delete": "cascade"}}
            ]
        },
        {
            "name": "line",
            "columns": [
                {"name": "purchase_id", "kind": {"type": "integer", "width": "big"},
                 "nullable": false,
                 "foreign_key": {"references": "purchase", "column": "id", "on_delete": "cascade"}},
                {"name": "product_id", "kind": {"type": "integer", "width": "big"},
                 "nullable": false,
                 "foreign_key": {"references": "product", "column": "id"}},
                {"name": "quantity", "kind": {"type": "integer", "width": "int"},
                 "nullable": false, "min": {"integer": 1}}
            ],
            "constraints": {"primary_key": ["purchase_id", "product_id"]}
        }
    ]
}"#;

pub fn shop() -> Schema {
    parse_schema(SHOP).unwrap_or_else(|e| panic!("shop document failed to parse: {e}"))
}

pub fn flat_shop() -> FlatSchema {
    shop()
        .flatten()
        .unwrap_or_else(|e| panic!("shop schema failed to flatten: {e}"))
}

pub fn table<'a>(schema: &'a FlatSchema, name: &str) -> &'a FlatTable {
    schema
        .table(name)
        .unwrap_or_else(|| panic!("no table {name}"))
}

/// An in-memory database with the shop schema applied.
pub async fn shop_database() -> SqliteExecutor {
    let executor = SqliteExecutor::connect(":memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    executor
        .apply(&shop(), DdlOptions::new())
        .await
        .expect("Failed to apply shop schema");
    executor
}
