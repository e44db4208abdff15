//! # polysql-core
//!
//! A dialect-aware SQL compiler. One vendor-neutral schema and statement
//! model is compiled into DDL and DML for MySQL, MariaDB, PostgreSQL,
//! Oracle, SQLite and Apache Derby.
//!
//! This crate provides:
//! - A column type system with range and length validation
//! - A schema model with table inheritance, constraints and indexes
//! - An expression AST with constant folding
//! - DDL and DML compilers that emit parameterized SQL per dialect
//!
//! ## Schema DDL
//!
//! ```rust
//! use polysql_core::{Column, DdlCompiler, DdlOptions, Kind, Schema, Table, Vendor};
//!
//! let schema = Schema::new().table(
//!     Table::new("person")
//!         .column(Column::new("id", Kind::bigint()).auto_increment().primary())
//!         .column(Column::new("name", Kind::varchar(60)).not_null()),
//! );
//!
//! let dialect = Vendor::PostgreSql.dialect();
//! let batch = DdlCompiler::new(dialect, DdlOptions::new())
//!     .compile(&schema)
//!     .unwrap();
//!
//! assert_eq!(batch.statements[0].sql, "DROP TABLE IF EXISTS \"person\"");
//! assert!(batch.statements[1].sql.starts_with("CREATE TABLE \"person\""));
//! ```
//!
//! ## Queries
//!
//! Values are always bound, never inlined:
//!
//! ```rust
//! use polysql_core::{Column, DmlCompiler, Expr, Kind, Schema, Select, Table, Vendor};
//!
//! let schema = Schema::new()
//!     .table(Table::new("person").column(Column::new("id", Kind::int()).primary()))
//!     .flatten()
//!     .unwrap();
//! let person = schema.table("person").unwrap();
//!
//! let query = Select::from_table(person)
//!     .entity(person)
//!     .filter(person.col("id").unwrap().eq(Expr::lit(7)));
//! let statement = DmlCompiler::new(Vendor::MySql.dialect()).select(&query).unwrap();
//!
//! assert_eq!(statement.sql, "SELECT a.`id` FROM `person` a WHERE a.`id` = ?");
//! ```

pub mod context;
pub mod ddl;
pub mod dialect;
pub mod dml;
pub mod error;
pub mod expr;
pub mod reserved;
pub mod schema;
pub mod statement;
pub mod types;
pub mod vendor;

pub use context::{Compilation, QuotePolicy};
pub use ddl::{Compliance, DdlCompiler, DdlOptions};
pub use dialect::{
    DerbyDialect, Dialect, MySqlDialect, OracleDialect, PostgresDialect, SqliteDialect,
};
pub use dml::{Delete, DmlCompiler, Insert, RowPlan, Select, Update};
pub use error::{Error, Result, SchemaError};
pub use expr::Expr;
pub use schema::{Column, FlatSchema, FlatTable, ForeignKey, Schema, Table};
pub use statement::{Statement, StatementBatch, StatementKind};
pub use types::{Interval, Kind, Value};
pub use vendor::{Vendor, REGISTRY};
