//! Inheritance resolution.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{Check, Column, Index, Schema, Table};
use crate::error::{Result, SchemaError};

/// A concrete table with every inherited column, constraint and index
/// merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTable {
    /// Table name.
    pub name: String,
    /// Whether DDL is suppressed for this table.
    pub skip: bool,
    /// Columns, ancestors first. `primary` is set on key members.
    pub columns: Vec<Column>,
    /// Primary key columns in key order.
    pub primary_key: Vec<String>,
    /// Unique column sets, ancestors first.
    pub unique: Vec<Vec<String>>,
    /// CHECK clauses, ancestors first.
    pub checks: Vec<Check>,
    /// Indexes, ancestors first.
    pub indexes: Vec<Index>,
}

impl FlatTable {
    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether the column belongs to the primary key.
    #[must_use]
    pub fn is_primary(&self, name: &str) -> bool {
        self.primary_key.iter().any(|c| c == name)
    }

    fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| {
            SchemaError::UnknownColumn {
                table: self.name.clone(),
                column: name.to_string(),
            }
            .into()
        })
    }
}

/// The concrete tables of a schema in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatSchema {
    /// Concrete tables, abstract ones removed.
    pub tables: Vec<FlatTable>,
}

impl FlatSchema {
    /// Looks up a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&FlatTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Tables that emit DDL.
    pub fn emitted(&self) -> impl DoubleEndedIterator<Item = &FlatTable> {
        self.tables.iter().filter(|t| !t.skip)
    }
}

/// Merged view of one table and its ancestors, before validation.
#[derive(Debug, Clone)]
struct Merged {
    columns: Vec<Column>,
    primary_key: Option<Vec<String>>,
    unique: Vec<Vec<String>>,
    checks: Vec<Check>,
    indexes: Vec<Index>,
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").unwrap_or_else(|_| unreachable!())
    })
}

fn check_identifier(name: &str) -> Result<()> {
    if identifier_pattern().is_match(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier(name.to_string()).into())
    }
}

pub(super) fn flatten(schema: &Schema) -> Result<FlatSchema> {
    let mut by_name: HashMap<&str, &Table> = HashMap::new();
    for table in &schema.tables {
        check_identifier(&table.name)?;
        if by_name.insert(&table.name, table).is_some() {
            return Err(SchemaError::DuplicateTable(table.name.clone()).into());
        }
    }

    let mut memo: HashMap<String, Merged> = HashMap::new();
    let mut flat = FlatSchema::default();
    for table in &schema.tables {
        let merged = resolve(table, &by_name, &mut memo, &mut Vec::new())?;
        if table.is_abstract {
            continue;
        }
        flat.tables.push(finish(table, merged)?);
    }

    let positions: HashMap<&str, usize> = flat
        .tables
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.as_str(), i))
        .collect();
    for (position, table) in flat.tables.iter().enumerate() {
        validate(table, position, &flat, &positions)?;
    }

    debug!(tables = flat.tables.len(), "Flattened schema");
    Ok(flat)
}

/// Depth-first merge of `table` with its ancestors, memoized by name.
fn resolve(
    table: &Table,
    by_name: &HashMap<&str, &Table>,
    memo: &mut HashMap<String, Merged>,
    chain: &mut Vec<String>,
) -> Result<Merged> {
    if chain.iter().any(|n| n == &table.name) {
        let mut cycle = chain.clone();
        cycle.push(table.name.clone());
        return Err(SchemaError::CircularDependency(cycle).into());
    }
    if let Some(done) = memo.get(&table.name) {
        return Ok(done.clone());
    }

    chain.push(table.name.clone());
    let mut merged = match &table.extends {
        Some(parent) => {
            let parent = by_name
                .get(parent.as_str())
                .ok_or_else(|| SchemaError::UnknownTable(parent.clone()))?;
            resolve(parent, by_name, memo, chain)?
        }
        None => Merged {
            columns: Vec::new(),
            primary_key: None,
            unique: Vec::new(),
            checks: Vec::new(),
            indexes: Vec::new(),
        },
    };
    chain.pop();

    let mut seen: HashSet<String> = merged.columns.iter().map(|c| c.name.clone()).collect();
    for column in &table.columns {
        check_identifier(&column.name)?;
        if !seen.insert(column.name.clone()) {
            return Err(SchemaError::DuplicateColumn {
                table: table.name.clone(),
                column: column.name.clone(),
            }
            .into());
        }
        merged.columns.push(column.clone());
    }

    let flagged: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.primary)
        .map(|c| c.name.clone())
        .collect();
    let own_key = match (&table.constraints.primary_key, flagged.is_empty()) {
        (Some(explicit), true) => Some(explicit.clone()),
        (Some(explicit), false) => {
            if flagged.iter().any(|c| !explicit.contains(c)) {
                return Err(SchemaError::DuplicatePrimaryKey(table.name.clone()).into());
            }
            Some(explicit.clone())
        }
        (None, false) => Some(flagged),
        (None, true) => None,
    };
    if let Some(key) = own_key {
        if merged.primary_key.is_some() {
            return Err(SchemaError::DuplicatePrimaryKey(table.name.clone()).into());
        }
        merged.primary_key = Some(key);
    }

    merged.unique.extend(table.constraints.unique.iter().cloned());
    merged.checks.extend(table.constraints.checks.iter().cloned());
    merged.indexes.extend(table.indexes.iter().cloned());

    memo.insert(table.name.clone(), merged.clone());
    Ok(merged)
}

fn finish(table: &Table, merged: Merged) -> Result<FlatTable> {
    let primary_key = merged
        .primary_key
        .ok_or_else(|| SchemaError::MissingPrimaryKey(table.name.clone()))?;
    let mut columns = merged.columns;
    for column in &mut columns {
        column.primary = primary_key.contains(&column.name);
    }
    Ok(FlatTable {
        name: table.name.clone(),
        skip: table.skip,
        columns,
        primary_key,
        unique: merged.unique,
        checks: merged.checks,
        indexes: merged.indexes,
    })
}

fn validate(
    table: &FlatTable,
    position: usize,
    flat: &FlatSchema,
    positions: &HashMap<&str, usize>,
) -> Result<()> {
    for name in &table.primary_key {
        let column = table.require_column(name)?;
        if column.nullable {
            return Err(SchemaError::NullablePrimaryKey {
                table: table.name.clone(),
                column: name.clone(),
            }
            .into());
        }
    }
    for set in &table.unique {
        for name in set {
            table.require_column(name)?;
        }
    }
    for index in &table.indexes {
        for name in &index.columns {
            table.require_column(name)?;
        }
    }
    for check in &table.checks {
        let mut names = Vec::new();
        check.columns_referenced(&mut names);
        for name in names {
            table.require_column(name)?;
        }
    }

    for column in &table.columns {
        let Some(fk) = &column.foreign_key else {
            continue;
        };
        let target = flat
            .table(&fk.references)
            .ok_or_else(|| SchemaError::UnknownTable(fk.references.clone()))?;
        target.require_column(&fk.column)?;
        if positions
            .get(fk.references.as_str())
            .is_some_and(|&p| p > position)
        {
            return Err(SchemaError::ForwardReference {
                table: table.name.clone(),
                references: fk.references.clone(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::schema::{Column, ForeignKey, Index};
    use crate::types::Kind;

    fn id() -> Column {
        Column::new("id", Kind::int()).primary()
    }

    #[test]
    fn test_abstract_columns_flow_to_children() {
        let schema = Schema::new()
            .table(
                Table::new("base")
                    .abstract_table()
                    .column(id())
                    .column(Column::new("created", Kind::datetime()))
                    .index(Index::new(["created"])),
            )
            .table(
                Table::new("account")
                    .extends("base")
                    .column(Column::new("email", Kind::varchar(255)).not_null()),
            );

        let flat = schema.flatten().unwrap();
        assert_eq!(flat.tables.len(), 1);
        let account = &flat.tables[0];
        let names: Vec<&str> = account.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "created", "email"]);
        assert_eq!(account.primary_key, ["id"]);
        assert!(account.is_primary("id"));
        assert_eq!(account.indexes.len(), 1);
    }

    #[test]
    fn test_duplicate_column_across_chain() {
        let schema = Schema::new()
            .table(Table::new("base").abstract_table().column(id()))
            .table(Table::new("child").extends("base").column(id()));
        assert_eq!(
            schema.flatten().unwrap_err(),
            Error::Schema(SchemaError::DuplicateColumn {
                table: "child".into(),
                column: "id".into()
            })
        );
    }

    #[test]
    fn test_circular_extends() {
        let schema = Schema::new()
            .table(Table::new("a").extends("b").column(id()))
            .table(Table::new("b").extends("a"));
        assert!(matches!(
            schema.flatten(),
            Err(Error::Schema(SchemaError::CircularDependency(_)))
        ));
    }

    #[test]
    fn test_missing_primary_key() {
        let schema = Schema::new().table(Table::new("t").column(Column::new("x", Kind::int())));
        assert_eq!(
            schema.flatten().unwrap_err(),
            Error::Schema(SchemaError::MissingPrimaryKey("t".into()))
        );
    }

    #[test]
    fn test_abstract_table_needs_no_primary_key() {
        let schema = Schema::new().table(
            Table::new("mixin")
                .abstract_table()
                .column(Column::new("x", Kind::int())),
        );
        assert!(schema.flatten().unwrap().tables.is_empty());
    }

    #[test]
    fn test_nullable_primary_key() {
        let schema = Schema::new().table(
            Table::new("t")
                .column(Column::new("id", Kind::int()))
                .primary_key(["id"]),
        );
        assert_eq!(
            schema.flatten().unwrap_err(),
            Error::Schema(SchemaError::NullablePrimaryKey {
                table: "t".into(),
                column: "id".into()
            })
        );
    }

    #[test]
    fn test_duplicate_primary_key_in_chain() {
        let schema = Schema::new()
            .table(Table::new("base").abstract_table().column(id()))
            .table(
                Table::new("child")
                    .extends("base")
                    .column(Column::new("code", Kind::char(4)).primary()),
            );
        assert_eq!(
            schema.flatten().unwrap_err(),
            Error::Schema(SchemaError::DuplicatePrimaryKey("child".into()))
        );
    }

    #[test]
    fn test_forward_reference() {
        let schema = Schema::new()
            .table(
                Table::new("orders")
                    .column(id())
                    .column(Column::new("customer", Kind::int()).references(ForeignKey::new("customer", "id"))),
            )
            .table(Table::new("customer").column(id()));
        assert_eq!(
            schema.flatten().unwrap_err(),
            Error::Schema(SchemaError::ForwardReference {
                table: "orders".into(),
                references: "customer".into()
            })
        );
    }

    #[test]
    fn test_self_reference_allowed() {
        let schema = Schema::new().table(
            Table::new("node")
                .column(id())
                .column(Column::new("parent", Kind::int()).references(ForeignKey::new("node", "id"))),
        );
        assert!(schema.flatten().is_ok());
    }

    #[test]
    fn test_unknown_unique_column() {
        let schema = Schema::new().table(Table::new("t").column(id()).unique(["nope"]));
        assert!(matches!(
            schema.flatten(),
            Err(Error::Schema(SchemaError::UnknownColumn { .. }))
        ));
    }

    #[test]
    fn test_duplicate_table() {
        let schema = Schema::new()
            .table(Table::new("t").column(id()))
            .table(Table::new("t").column(id()));
        assert_eq!(
            schema.flatten().unwrap_err(),
            Error::Schema(SchemaError::DuplicateTable("t".into()))
        );
    }

    #[test]
    fn test_invalid_identifier() {
        let schema = Schema::new().table(Table::new("bad name").column(id()));
        assert_eq!(
            schema.flatten().unwrap_err(),
            Error::Schema(SchemaError::InvalidIdentifier("bad name".into()))
        );
    }
}
