#![allow(dead_code)]

use polysql_core::schema::{ChangeRule, GenerateOnInsert};
use polysql_core::{Column, FlatSchema, FlatTable, ForeignKey, Kind, Schema, Table};

/// A small shop: customers, products, purchases and purchase lines, all
/// inheriting a surrogate key from an abstract base.
pub fn shop() -> Schema {
    Schema::new()
        .table(
            Table::new("record")
                .abstract_table()
                .column(Column::new("id", Kind::bigint()).auto_increment().primary())
                .column(
                    Column::new("created", Kind::datetime())
                        .generate_on_insert(GenerateOnInsert::Timestamp),
                ),
        )
        .table(
            Table::new("customer")
                .extends("record")
                .column(Column::new("email", Kind::varchar(80)).not_null().unique())
                .column(
                    Column::new("tier", Kind::enumeration(["bronze", "silver", "gold"]))
                        .not_null()
                        .default_value("bronze"),
                ),
        )
        .table(
            Table::new("product")
                .extends("record")
                .column(Column::new("sku", Kind::char(8)).not_null().unique())
                .column(Column::new("price", Kind::decimal(10, 2)).not_null()),
        )
        .table(
            Table::new("purchase").extends("record").column(
                Column::new("customer_id", Kind::bigint())
                    .not_null()
                    .references(ForeignKey::new("customer", "id").on_delete(ChangeRule::Cascade)),
            ),
        )
        .table(
            Table::new("line")
                .column(
                    Column::new("purchase_id", Kind::bigint())
                        .not_null()
                        .references(ForeignKey::new("purchase", "id").on_delete(ChangeRule::Cascade)),
                )
                .column(
                    Column::new("product_id", Kind::bigint())
                        .not_null()
                        .references(ForeignKey::new("product", "id")),
                )
                .column(Column::new("quantity", Kind::int()).not_null().min(1))
                .primary_key(["purchase_id", "product_id"]),
        )
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
