//! Schema loading, execution and introspection for polysql.
//!
//! `polysql-runner` connects the compiler in `polysql-core` to a live
//! database:
//!
//! - **Loader** - reads JSON schema documents into the schema model
//! - **Executor** - runs compiled DDL and DML against SQLite through `sqlx`
//! - **Introspection** - reads a SQLite catalog back into a schema
//!
//! # Example
//!
//! ```rust,ignore
//! use polysql_runner::prelude::*;
//!
//! let schema = load_schema(Path::new("shop.json"))?;
//! let executor = SqliteExecutor::connect("sqlite::memory:").await?;
//! executor.apply(&schema, DdlOptions::new()).await?;
//!
//! let live = introspect(executor.pool()).await?;
//! println!("{}", to_json(&live)?);
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print PostgreSQL DDL for a schema document
//! polysql ddl --vendor postgresql --schema shop.json
//!
//! # Create the schema in a SQLite database
//! polysql apply --database sqlite:shop.db?mode=rwc --schema shop.json
//!
//! # Dump an existing SQLite database as a schema document
//! polysql introspect --database sqlite:shop.db
//! ```

pub mod error;
pub mod executor;
pub mod introspect;
pub mod loader;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, RunnerError};
    pub use crate::executor::{Execution, SqliteExecutor};
    pub use crate::introspect::introspect;
    pub use crate::loader::{load_schema, parse_schema, to_json};
    pub use polysql_core::{DdlOptions, Schema, Statement, StatementBatch, Value};
}
