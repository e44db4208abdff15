//! Reads a live SQLite catalog back into the schema model.
//!
//! Tables come back in creation order with their columns, primary keys,
//! unique constraints, indexes and foreign keys. Checks are not recovered.

use std::collections::HashMap;

use polysql_core::schema::{ChangeRule, Index};
use polysql_core::{Column, ForeignKey, Kind, Schema, Table, Value};
use sqlx::sqlite::SqlitePool;
use tracing::{debug, warn};

use crate::error::{Result, RunnerError};

/// `(name, declared type, notnull, default, pk position)`
type ColumnRow = (String, String, i64, Option<String>, i64);

/// `(id, seq, referenced table, from, to, on update, on delete)`
type ForeignKeyRow = (i64, i64, String, String, Option<String>, String, String);

/// Reads every user table of the database.
pub async fn introspect(pool: &SqlitePool) -> Result<Schema> {
    let tables: Vec<(String, Option<String>)> = sqlx::query_as(
        "SELECT name, sql FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
    )
    .fetch_all(pool)
    .await?;

    let mut schema = Schema::new();
    let mut primary_keys: HashMap<String, Vec<String>> = HashMap::new();
    for (name, sql) in tables {
        let table = introspect_table(pool, &name, sql.as_deref(), &primary_keys).await?;
        let key = table
            .constraints
            .primary_key
            .clone()
            .unwrap_or_default();
        primary_keys.insert(name, key);
        schema = schema.table(table);
    }
    debug!(tables = schema.tables.len(), "Introspected schema");
    Ok(schema)
}

async fn introspect_table(
    pool: &SqlitePool,
    name: &str,
    sql: Option<&str>,
    primary_keys: &HashMap<String, Vec<String>>,
) -> Result<Table> {
    let rows: Vec<ColumnRow> = sqlx::query_as(
        "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid",
    )
    .bind(name)
    .fetch_all(pool)
    .await?;
    if rows.is_empty() {
        return Err(RunnerError::Introspection {
            table: name.to_string(),
            message: "table has no columns".to_string(),
        });
    }

    let mut key: Vec<(i64, String)> = rows
        .iter()
        .filter(|row| row.4 > 0)
        .map(|row| (row.4, row.0.clone()))
        .collect();
    key.sort();
    let key: Vec<String> = key.into_iter().map(|(_, column)| column).collect();
    let autoincrement = sql.is_some_and(|sql| sql.to_ascii_uppercase().contains("AUTOINCREMENT"));

    let mut table = Table::new(name);
    for (column_name, declared, not_null, default, pk) in rows {
        let kind = kind_of(&declared).unwrap_or_else(|| {
            warn!(table = name, column = %column_name, %declared, "Unknown column type, reading as text");
            Kind::Clob { length: None }
        });
        let mut column = Column::new(column_name, kind);
        // Key columns are implicitly NOT NULL even where SQLite allows NULLs.
        column.nullable = not_null == 0 && pk == 0;
        column.default = default.as_deref().and_then(parse_default);
        if pk > 0 && key.len() == 1 && autoincrement {
            column = column.auto_increment();
        }
        table = table.column(column);
    }
    if !key.is_empty() {
        table = table.primary_key(key);
    }

    read_indexes(pool, &mut table).await?;
    read_foreign_keys(pool, &mut table, primary_keys).await?;
    Ok(table)
}

async fn read_indexes(pool: &SqlitePool, table: &mut Table) -> Result<()> {
    let mut indexes: Vec<(String, i64, String)> =
        sqlx::query_as("SELECT name, \"unique\", origin FROM pragma_index_list(?)")
            .bind(&table.name)
            .fetch_all(pool)
            .await?;
    indexes.sort();

    for (index_name, unique, origin) in indexes {
        if origin == "pk" {
            continue;
        }
        let columns: Vec<(Option<String>,)> =
            sqlx::query_as("SELECT name FROM pragma_index_info(?) ORDER BY seqno")
                .bind(&index_name)
                .fetch_all(pool)
                .await?;
        let Some(columns) = columns
            .into_iter()
            .map(|(column,)| column)
            .collect::<Option<Vec<String>>>()
        else {
            warn!(index = %index_name, "Skipping expression index");
            continue;
        };

        match (origin.as_str(), columns.as_slice()) {
            ("u", [single]) => {
                if let Some(column) = table.columns.iter_mut().find(|c| &c.name == single) {
                    column.unique = true;
                }
            }
            ("u", _) => table.constraints.unique.push(columns),
            _ => {
                let index = Index::new(columns);
                table
                    .indexes
                    .push(if unique != 0 { index.unique() } else { index });
            }
        }
    }
    Ok(())
}

async fn read_foreign_keys(
    pool: &SqlitePool,
    table: &mut Table,
    primary_keys: &HashMap<String, Vec<String>>,
) -> Result<()> {
    let rows: Vec<ForeignKeyRow> = sqlx::query_as(
        "SELECT id, seq, \"table\", \"from\", \"to\", on_update, on_delete \
         FROM pragma_foreign_key_list(?) ORDER BY id, seq",
    )
    .bind(&table.name)
    .fetch_all(pool)
    .await?;

    let composite: Vec<i64> = rows.iter().filter(|row| row.1 > 0).map(|row| row.0).collect();
    for (id, _, references, from, to, on_update, on_delete) in rows {
        if composite.contains(&id) {
            warn!(table = %table.name, column = %from, "Skipping composite foreign key");
            continue;
        }
        let target = match to {
            Some(column) => column,
            None => match primary_keys.get(&references).map(Vec::as_slice) {
                Some([column]) => column.clone(),
                _ => {
                    return Err(RunnerError::Introspection {
                        table: table.name.clone(),
                        message: format!("cannot resolve the key of '{references}'"),
                    })
                }
            },
        };
        let mut fk = ForeignKey::new(references, target);
        fk.on_delete = change_rule(&on_delete);
        fk.on_update = change_rule(&on_update);
        let Some(column) = table.columns.iter_mut().find(|c| c.name == from) else {
            return Err(RunnerError::Introspection {
                table: table.name.clone(),
                message: format!("foreign key on unknown column '{from}'"),
            });
        };
        column.foreign_key = Some(fk);
    }
    Ok(())
}

fn change_rule(action: &str) -> Option<ChangeRule> {
    match action {
        "CASCADE" => Some(ChangeRule::Cascade),
        "SET NULL" => Some(ChangeRule::SetNull),
        "SET DEFAULT" => Some(ChangeRule::SetDefault),
        "RESTRICT" => Some(ChangeRule::Restrict),
        _ => None,
    }
}

/// Maps a declared column type to a kind.
fn kind_of(declared: &str) -> Option<Kind> {
    let upper = declared.trim().to_ascii_uppercase();
    let (base, args) = match upper.split_once('(') {
        Some((base, rest)) => (
            base.trim(),
            rest.trim_end_matches(')')
                .split(',')
                .filter_map(|arg| arg.trim().parse::<u32>().ok())
                .collect::<Vec<_>>(),
        ),
        None => (upper.as_str(), Vec::new()),
    };
    let arg = |i: usize| args.get(i).copied();
    let digits = |i: usize| arg(i).and_then(|n| u8::try_from(n).ok());

    Some(match base {
        "TINYINT" => Kind::tinyint(),
        "SMALLINT" => Kind::smallint(),
        "INT" | "INTEGER" | "MEDIUMINT" => Kind::int(),
        "BIGINT" => Kind::bigint(),
        "FLOAT" => Kind::Float { unsigned: false },
        "DOUBLE" | "DOUBLE PRECISION" | "REAL" => Kind::Double { unsigned: false },
        "DECIMAL" | "NUMERIC" => Kind::decimal(digits(0).unwrap_or(10), digits(1).unwrap_or(0)),
        "CHAR" | "CHARACTER" => Kind::char(arg(0).unwrap_or(1)),
        "VARCHAR" | "CHARACTER VARYING" => Kind::varchar(arg(0).unwrap_or(255)),
        "TEXT" | "CLOB" => Kind::Clob { length: None },
        "BLOB" => Kind::Blob { length: None },
        "DATE" => Kind::Date,
        "TIME" => Kind::Time { precision: 0 },
        "DATETIME" | "TIMESTAMP" => Kind::datetime(),
        "BOOLEAN" => Kind::Boolean,
        _ => return None,
    })
}

/// Parses a literal default. Expressions such as `CURRENT_TIMESTAMP` are
/// not literals and yield `None`.
fn parse_default(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        return Some(Value::Text(inner.replace("''", "'")));
    }
    if text.eq_ignore_ascii_case("NULL") {
        return None;
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::from(n));
    }
    if let Ok(f) = text.parse::<f64>() {
        return Some(Value::Float(f));
    }
    debug!(default = text, "Ignoring non-literal default");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SqliteExecutor;
    use polysql_core::schema::GenerateOnInsert;

    async fn pool_with(ddl: &[&str]) -> SqlitePool {
        let executor = SqliteExecutor::connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool");
        for sql in ddl {
            sqlx::query(sql).execute(executor.pool()).await.unwrap();
        }
        executor.pool().clone()
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(kind_of("varchar(80)"), Some(Kind::varchar(80)));
        assert_eq!(kind_of("DECIMAL(10, 2)"), Some(Kind::decimal(10, 2)));
        assert_eq!(kind_of("BIGINT"), Some(Kind::bigint()));
        assert_eq!(kind_of("DATETIME"), Some(Kind::datetime()));
        assert_eq!(kind_of("GEOMETRY"), None);
    }

    #[test]
    fn test_parse_default() {
        assert_eq!(parse_default("'it''s'"), Some(Value::from("it's")));
        assert_eq!(parse_default("42"), Some(Value::Integer(42)));
        assert_eq!(parse_default("1.5"), Some(Value::Float(1.5)));
        assert_eq!(parse_default("CURRENT_TIMESTAMP"), None);
        assert_eq!(parse_default("NULL"), None);
    }

    #[tokio::test]
    async fn test_introspect_keys_and_constraints() {
        let pool = pool_with(&[
            "CREATE TABLE author (id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT, \
             handle VARCHAR(30) NOT NULL UNIQUE, bio TEXT DEFAULT 'none')",
            "CREATE TABLE post (author_id INTEGER NOT NULL, slug VARCHAR(50) NOT NULL, \
             PRIMARY KEY (author_id, slug), \
             FOREIGN KEY (author_id) REFERENCES author (id) ON DELETE CASCADE)",
            "CREATE INDEX post_slug_idx ON post (slug)",
        ])
        .await;

        let schema = introspect(&pool).await.unwrap();
        assert_eq!(schema.tables.len(), 2);

        let author = &schema.tables[0];
        assert_eq!(author.constraints.primary_key, Some(vec!["id".to_string()]));
        assert_eq!(
            author.columns[0].generate_on_insert,
            Some(GenerateOnInsert::AutoIncrement)
        );
        assert!(author.columns[1].unique);
        assert_eq!(author.columns[2].default, Some(Value::from("none")));

        let post = &schema.tables[1];
        assert_eq!(
            post.constraints.primary_key,
            Some(vec!["author_id".to_string(), "slug".to_string()])
        );
        let fk = post.columns[0].foreign_key.as_ref().unwrap();
        assert_eq!(fk.references, "author");
        assert_eq!(fk.column, "id");
        assert_eq!(fk.on_delete, Some(ChangeRule::Cascade));
        assert_eq!(fk.on_update, None);
        assert_eq!(post.indexes.len(), 1);
        assert_eq!(post.indexes[0].columns, vec!["slug".to_string()]);

        assert!(schema.flatten().is_ok());
    }
}
