//! Statement executor.
//!
//! Runs compiled statements against a SQLite database, one at a time, and
//! turns result rows back into typed values through their row plan.

use polysql_core::dialect::SqliteDialect;
use polysql_core::{
    DdlCompiler, DdlOptions, Schema, Statement, StatementBatch, StatementKind, Value,
};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

use crate::error::{Result, RunnerError};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Outcome of one executed statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Execution {
    /// Rows inserted, updated or deleted.
    pub rows_affected: u64,
    /// Database-generated key values by column name.
    pub generated_keys: Vec<(String, Value)>,
}

/// Executes compiled statements on a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
    dialect: SqliteDialect,
}

impl SqliteExecutor {
    /// Creates an executor over an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            dialect: SqliteDialect::new(),
        }
    }

    /// Connects to `url` with a single connection, so in-memory databases
    /// see every statement.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Returns the pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the dialect statements must be compiled for.
    #[must_use]
    pub const fn dialect(&self) -> &SqliteDialect {
        &self.dialect
    }

    /// Compiles `schema` for SQLite and executes the resulting DDL.
    pub async fn apply(&self, schema: &Schema, options: DdlOptions) -> Result<StatementBatch> {
        let batch = DdlCompiler::new(&self.dialect, options).compile(schema)?;
        for warning in &batch.warnings {
            warn!(%warning, "Schema compiled with warning");
        }
        self.execute_batch(&batch).await?;
        info!(statements = batch.len(), "Schema applied");
        Ok(batch)
    }

    /// Executes every statement of `batch` in order.
    pub async fn execute_batch(&self, batch: &StatementBatch) -> Result<Vec<Execution>> {
        let mut executions = Vec::with_capacity(batch.len());
        for statement in &batch.statements {
            executions.push(self.execute(statement).await?);
        }
        Ok(executions)
    }

    /// Executes one statement, reading back a generated row id for inserts.
    pub async fn execute(&self, statement: &Statement) -> Result<Execution> {
        debug!(sql = %statement.sql, params = statement.params.len(), "Executing SQL");
        let query = bind_all(sqlx::query(&statement.sql), &statement.params)?;
        let result = query.execute(&self.pool).await?;

        let mut execution = Execution {
            rows_affected: result.rows_affected(),
            generated_keys: Vec::new(),
        };
        if statement.kind == StatementKind::Insert && result.rows_affected() > 0 {
            match statement.generated_keys.as_slice() {
                [] => {}
                [key] => {
                    let id = Value::Integer(i128::from(result.last_insert_rowid()));
                    execution.generated_keys.push((key.clone(), id));
                }
                keys => warn!(?keys, "Only a single generated key can be read back"),
            }
        }
        Ok(execution)
    }

    /// Runs a query and decodes every row through its plan.
    ///
    /// Statements without a plan return the raw driver values.
    pub async fn fetch(&self, statement: &Statement) -> Result<Vec<Vec<Value>>> {
        debug!(sql = %statement.sql, params = statement.params.len(), "Fetching rows");
        let query = bind_all(sqlx::query(&statement.sql), &statement.params)?;
        let rows = query.fetch_all(&self.pool).await?;

        let mut decoded = Vec::with_capacity(rows.len());
        for row in &rows {
            let raw = raw_values(row)?;
            decoded.push(match &statement.plan {
                Some(plan) => plan.decode(&self.dialect, raw)?,
                None => raw,
            });
        }
        Ok(decoded)
    }
}

fn bind_all<'q>(mut query: SqliteQuery<'q>, params: &[Value]) -> Result<SqliteQuery<'q>> {
    for (position, value) in params.iter().enumerate() {
        query = bind(query, position, value)?;
    }
    Ok(query)
}

fn bind<'q>(query: SqliteQuery<'q>, position: usize, value: &Value) -> Result<SqliteQuery<'q>> {
    Ok(match value {
        Value::Null => query.bind(None::<String>),
        Value::Boolean(b) => query.bind(*b),
        Value::Integer(n) => {
            let n = i64::try_from(*n).map_err(|_| RunnerError::Bind {
                position,
                reason: format!("{n} does not fit in a 64-bit integer"),
            })?;
            query.bind(n)
        }
        Value::Float(f) => query.bind(*f),
        Value::Decimal(d) => query.bind(d.to_string()),
        Value::Text(s) => query.bind(s.clone()),
        Value::Binary(b) => query.bind(b.clone()),
        Value::Date(d) => query.bind(*d),
        Value::Time(t) => query.bind(*t),
        Value::Datetime(dt) => query.bind(*dt),
    })
}

/// Reads a row using the storage class of each value.
fn raw_values(row: &SqliteRow) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(row.columns().len());
    for i in 0..row.columns().len() {
        let raw = row.try_get_raw(i)?;
        if raw.is_null() {
            values.push(Value::Null);
            continue;
        }
        let storage = raw.type_info().name().to_string();
        values.push(match storage.as_str() {
            "INTEGER" => Value::Integer(i128::from(row.try_get::<i64, _>(i)?)),
            "REAL" => Value::Float(row.try_get::<f64, _>(i)?),
            "BLOB" => Value::Binary(row.try_get::<Vec<u8>, _>(i)?),
            _ => Value::Text(row.try_get::<String, _>(i)?),
        });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polysql_core::{Column, DmlCompiler, Insert, Kind, Select, Table};

    async fn executor() -> SqliteExecutor {
        SqliteExecutor::connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool")
    }

    fn notes() -> Schema {
        Schema::new().table(
            Table::new("note")
                .column(Column::new("id", Kind::bigint()).auto_increment().primary())
                .column(Column::new("body", Kind::varchar(200)).not_null())
                .column(Column::new("pinned", Kind::Boolean).not_null().default_value(false)),
        )
    }

    #[tokio::test]
    async fn test_apply_creates_tables() {
        let executor = executor().await;
        executor.apply(&notes(), DdlOptions::new()).await.unwrap();

        let row: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name='note'")
                .fetch_optional(executor.pool())
                .await
                .unwrap();
        assert!(row.is_some());
    }

    #[tokio::test]
    async fn test_apply_twice_recreates() {
        let executor = executor().await;
        executor.apply(&notes(), DdlOptions::new()).await.unwrap();
        executor.apply(&notes(), DdlOptions::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_reads_generated_key() {
        let executor = executor().await;
        executor.apply(&notes(), DdlOptions::new()).await.unwrap();
        let flat = notes().flatten().unwrap();
        let note = flat.table("note").unwrap();

        let compiler = DmlCompiler::new(executor.dialect());
        let first = compiler
            .insert(&Insert::new(note).value("body", "first"))
            .unwrap();
        let second = compiler
            .insert(&Insert::new(note).value("body", "second").value("pinned", true))
            .unwrap();
        executor.execute(&first).await.unwrap();
        let execution = executor.execute(&second).await.unwrap();
        assert_eq!(execution.rows_affected, 1);
        assert_eq!(
            execution.generated_keys,
            vec![("id".to_string(), Value::Integer(2))]
        );

        let query = Select::from_table(note)
            .entity(note)
            .order_by(note.col("id").unwrap());
        let rows = executor.fetch(&compiler.select(&query).unwrap()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            vec![Value::Integer(2), Value::from("second"), Value::Boolean(true)]
        );
    }

    #[tokio::test]
    async fn test_oversized_integer_is_rejected() {
        let executor = executor().await;
        let mut statement = Statement::new(StatementKind::Select, "SELECT ?");
        statement.params.push(Value::Integer(i128::from(u64::MAX)));
        let err = executor.fetch(&statement).await.unwrap_err();
        assert!(matches!(err, RunnerError::Bind { position: 0, .. }));
    }
}
