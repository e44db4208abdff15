//! INSERT, INSERT ... SELECT and upserts.

use uuid::Uuid;

use super::{compile_select, Select};
use crate::context::Compilation;
use crate::dialect::{Dialect, Upsert};
use crate::error::{Error, Result, SchemaError};
use crate::schema::{Column, FlatTable, GenerateOnInsert};
use crate::statement::StatementKind;
use crate::types::{validate_value, Value};

/// What an upsert does when the row already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    /// Keep the existing row.
    DoNothing,
    /// Overwrite the existing row's non-key columns.
    DoUpdate,
}

/// An INSERT into one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    table: FlatTable,
    values: Vec<(String, Value)>,
    source: Option<(Vec<String>, Select)>,
    conflict: Option<OnConflict>,
    conflict_columns: Vec<String>,
    returning: bool,
}

/// Where an inserted column's value comes from.
enum Source {
    Bound(Value),
    Sql(&'static str),
}

impl Insert {
    /// Starts an INSERT into `table`.
    #[must_use]
    pub fn new(table: &FlatTable) -> Self {
        Self {
            table: table.clone(),
            values: Vec::new(),
            source: None,
            conflict: None,
            conflict_columns: table.primary_key.clone(),
            returning: false,
        }
    }

    /// Sets a column value.
    #[must_use]
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    /// Inserts the rows of `query` into `columns` instead of values.
    #[must_use]
    pub fn select<I, S>(mut self, columns: I, query: Select) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source = Some((columns.into_iter().map(Into::into).collect(), query));
        self
    }

    /// Updates the existing row on a key conflict.
    #[must_use]
    pub const fn on_conflict_do_update(mut self) -> Self {
        self.conflict = Some(OnConflict::DoUpdate);
        self
    }

    /// Ignores the new row on a key conflict.
    #[must_use]
    pub const fn on_conflict_do_nothing(mut self) -> Self {
        self.conflict = Some(OnConflict::DoNothing);
        self
    }

    /// Columns identifying a conflicting row; the primary key by default.
    #[must_use]
    pub fn conflict_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflict_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Requests generated keys through `RETURNING` where the dialect has it.
    #[must_use]
    pub const fn returning(mut self) -> Self {
        self.returning = true;
        self
    }

    /// The target table.
    #[must_use]
    pub const fn table(&self) -> &FlatTable {
        &self.table
    }

    fn column(&self, name: &str) -> Result<&Column> {
        self.table.column(name).ok_or_else(|| {
            SchemaError::UnknownColumn {
                table: self.table.name.clone(),
                column: name.to_string(),
            }
            .into()
        })
    }

    /// Resolves the inserted columns: explicit values, then columns with
    /// a generate-on-insert policy. Auto-increment columns are left out
    /// and returned as generated keys.
    fn columns(&self, dialect: &dyn Dialect) -> Result<(Vec<(&Column, Source)>, Vec<String>)> {
        let mut columns = Vec::new();
        for (name, value) in &self.values {
            let column = self.column(name)?;
            validate_value(&self.table.name, column, value, dialect)?;
            columns.push((column, Source::Bound(value.clone())));
        }
        let mut generated = Vec::new();
        for column in &self.table.columns {
            if self.values.iter().any(|(name, _)| *name == column.name) {
                continue;
            }
            match column.generate_on_insert {
                Some(GenerateOnInsert::Uuid) => {
                    let uuid = Uuid::new_v4().to_string();
                    columns.push((column, Source::Bound(Value::Text(uuid))));
                }
                Some(GenerateOnInsert::Timestamp) => {
                    columns.push((column, Source::Sql("CURRENT_TIMESTAMP")));
                }
                Some(GenerateOnInsert::AutoIncrement) => generated.push(column.name.clone()),
                None => {}
            }
        }
        Ok((columns, generated))
    }

    /// Compiles into `ctx`, returning the statement kind and the names of
    /// database-generated key columns.
    pub(super) fn compile(&self, ctx: &mut Compilation<'_>) -> Result<(StatementKind, Vec<String>)> {
        let dialect = ctx.dialect();
        if let Some((columns, query)) = &self.source {
            for name in columns {
                self.column(name)?;
            }
            self.compile_insert_select(ctx, columns, query)?;
            return Ok((StatementKind::Insert, Vec::new()));
        }

        let (columns, generated) = self.columns(dialect)?;
        if columns.is_empty() {
            return Err(Error::UnsupportedOperation(format!(
                "INSERT into '{}' has no columns",
                self.table.name
            )));
        }
        if self.conflict.is_some() {
            for name in &self.conflict_columns {
                if !columns.iter().any(|(c, _)| c.name == *name) {
                    return Err(Error::UnsupportedOperation(format!(
                        "upsert into '{}' needs a value for conflict column '{name}'",
                        self.table.name
                    )));
                }
            }
        }

        let kind = match (self.conflict, dialect.upsert()) {
            (Some(conflict), Upsert::Merge) => {
                if dialect.merge_derived_source() {
                    self.compile_merge_derived(ctx, &columns, conflict);
                } else {
                    self.compile_merge_bound(ctx, &columns, conflict);
                }
                StatementKind::Merge
            }
            (conflict, upsert) => {
                let ignore = conflict == Some(OnConflict::DoNothing)
                    && upsert == Upsert::OnDuplicateKey;
                ctx.push(if ignore { "INSERT IGNORE INTO " } else { "INSERT INTO " });
                ctx.push_ident(&self.table.name);
                ctx.push(" (");
                push_names(ctx, columns.iter().map(|(c, _)| c.name.as_str()));
                ctx.push(") VALUES (");
                for (i, (column, source)) in columns.iter().enumerate() {
                    if i > 0 {
                        ctx.push(", ");
                    }
                    push_source(ctx, column, source);
                }
                ctx.push(")");
                if let Some(conflict) = conflict {
                    let updates = self.updated(columns.iter().map(|(c, _)| c.name.as_str()));
                    self.push_conflict_clause(ctx, conflict, upsert, &updates);
                }
                StatementKind::Insert
            }
        };

        if self.returning && !generated.is_empty() {
            if dialect.supports_returning() && kind == StatementKind::Insert {
                ctx.push(" RETURNING ");
                push_names(ctx, generated.iter().map(String::as_str));
            } else {
                ctx.warn(format!(
                    "{} has no RETURNING clause; generated keys of '{}' are left to the executor",
                    dialect.name(),
                    self.table.name
                ));
            }
        }
        Ok((kind, generated))
    }

    /// Inserted columns that an upsert overwrites.
    fn updated<'c>(&self, inserted: impl Iterator<Item = &'c str>) -> Vec<&'c str> {
        inserted
            .filter(|name| !self.conflict_columns.iter().any(|k| k == name))
            .collect()
    }

    fn push_conflict_clause(
        &self,
        ctx: &mut Compilation<'_>,
        conflict: OnConflict,
        upsert: Upsert,
        updates: &[&str],
    ) {
        match upsert {
            Upsert::OnConflict => {
                ctx.push(" ON CONFLICT (");
                push_names(ctx, self.conflict_columns.iter().map(String::as_str));
                ctx.push(")");
                if conflict == OnConflict::DoNothing || updates.is_empty() {
                    ctx.push(" DO NOTHING");
                    return;
                }
                ctx.push(" DO UPDATE SET ");
                for (i, name) in updates.iter().enumerate() {
                    if i > 0 {
                        ctx.push(", ");
                    }
                    let quoted = ctx.quote(name);
                    ctx.push(&format!("{quoted} = EXCLUDED.{quoted}"));
                }
            }
            Upsert::OnDuplicateKey => {
                if conflict == OnConflict::DoNothing {
                    return;
                }
                ctx.push(" ON DUPLICATE KEY UPDATE ");
                // A no-op assignment keeps the row when only keys were given.
                let fallback: Vec<&str> = self
                    .conflict_columns
                    .iter()
                    .map(String::as_str)
                    .take(1)
                    .collect();
                let updates = if updates.is_empty() { &fallback[..] } else { updates };
                for (i, name) in updates.iter().enumerate() {
                    if i > 0 {
                        ctx.push(", ");
                    }
                    let quoted = ctx.quote(name);
                    ctx.push(&format!("{quoted} = VALUES({quoted})"));
                }
            }
            Upsert::Merge => {}
        }
    }

    /// `MERGE INTO t a USING (SELECT ? "c", ... FROM dual) b ON (...)`.
    fn compile_merge_derived(
        &self,
        ctx: &mut Compilation<'_>,
        columns: &[(&Column, Source)],
        conflict: OnConflict,
    ) {
        let dialect = ctx.dialect();
        let target = ctx.next_alias();
        let source = ctx.next_alias();
        ctx.push("MERGE INTO ");
        ctx.push_ident(&self.table.name);
        ctx.push(&format!(" {target} USING (SELECT "));
        for (i, (column, value)) in columns.iter().enumerate() {
            if i > 0 {
                ctx.push(", ");
            }
            push_source(ctx, column, value);
            ctx.push(" ");
            ctx.push_ident(&column.name);
        }
        if let Some(dummy) = dialect.dummy_table() {
            ctx.push(" FROM ");
            ctx.push(dummy);
        }
        ctx.push(&format!(") {source} ON ("));
        for (i, key) in self.conflict_columns.iter().enumerate() {
            if i > 0 {
                ctx.push(" AND ");
            }
            let quoted = ctx.quote(key);
            ctx.push(&format!("{target}.{quoted} = {source}.{quoted}"));
        }
        ctx.push(")");
        let updates = self.updated(columns.iter().map(|(c, _)| c.name.as_str()));
        if conflict == OnConflict::DoUpdate && !updates.is_empty() {
            ctx.push(" WHEN MATCHED THEN UPDATE SET ");
            for (i, name) in updates.iter().enumerate() {
                if i > 0 {
                    ctx.push(", ");
                }
                let quoted = ctx.quote(name);
                ctx.push(&format!("{target}.{quoted} = {source}.{quoted}"));
            }
        }
        ctx.push(" WHEN NOT MATCHED THEN INSERT (");
        push_names(ctx, columns.iter().map(|(c, _)| c.name.as_str()));
        ctx.push(") VALUES (");
        for (i, (column, _)) in columns.iter().enumerate() {
            if i > 0 {
                ctx.push(", ");
            }
            let quoted = ctx.quote(&column.name);
            ctx.push(&format!("{source}.{quoted}"));
        }
        ctx.push(")");
    }

    /// `MERGE INTO t a USING dummy ON (a.k = ?) ...` with values bound in
    /// each clause: keys, then updates, then inserts.
    fn compile_merge_bound(
        &self,
        ctx: &mut Compilation<'_>,
        columns: &[(&Column, Source)],
        conflict: OnConflict,
    ) {
        let dialect = ctx.dialect();
        let target = ctx.next_alias();
        ctx.push("MERGE INTO ");
        ctx.push_ident(&self.table.name);
        ctx.push(&format!(" {target} USING "));
        ctx.push(dialect.dummy_table().unwrap_or("(VALUES 1)"));
        ctx.push(" ON (");
        for (i, key) in self.conflict_columns.iter().enumerate() {
            if i > 0 {
                ctx.push(" AND ");
            }
            let Some((column, value)) = columns.iter().find(|(c, _)| c.name == *key) else {
                continue;
            };
            ctx.push(&format!("{target}."));
            ctx.push_ident(key);
            ctx.push(" = ");
            push_source(ctx, column, value);
        }
        ctx.push(")");
        let updates: Vec<&(&Column, Source)> = columns
            .iter()
            .filter(|(c, _)| !self.conflict_columns.contains(&c.name))
            .collect();
        if conflict == OnConflict::DoUpdate && !updates.is_empty() {
            ctx.push(" WHEN MATCHED THEN UPDATE SET ");
            for (i, (column, value)) in updates.iter().enumerate() {
                if i > 0 {
                    ctx.push(", ");
                }
                ctx.push_ident(&column.name);
                ctx.push(" = ");
                push_source(ctx, column, value);
            }
        }
        ctx.push(" WHEN NOT MATCHED THEN INSERT (");
        push_names(ctx, columns.iter().map(|(c, _)| c.name.as_str()));
        ctx.push(") VALUES (");
        for (i, (column, value)) in columns.iter().enumerate() {
            if i > 0 {
                ctx.push(", ");
            }
            push_source(ctx, column, value);
        }
        ctx.push(")");
    }

    fn compile_insert_select(
        &self,
        ctx: &mut Compilation<'_>,
        columns: &[String],
        query: &Select,
    ) -> Result<()> {
        let dialect = ctx.dialect();
        let upsert = dialect.upsert();
        if self.conflict.is_some() && upsert == Upsert::Merge {
            return Err(Error::UnsupportedOperation(format!(
                "{} cannot upsert from a query",
                dialect.name()
            )));
        }
        let ignore = self.conflict == Some(OnConflict::DoNothing) && upsert == Upsert::OnDuplicateKey;
        ctx.push(if ignore { "INSERT IGNORE INTO " } else { "INSERT INTO " });
        ctx.push_ident(&self.table.name);
        ctx.push(" (");
        push_names(ctx, columns.iter().map(String::as_str));
        ctx.push(") ");
        let wrap = self.conflict.is_some() && query.filter.is_none() && dialect.upsert_select_needs_where();
        if wrap {
            ctx.push("SELECT * FROM (");
        }
        compile_select(ctx, query)?;
        if wrap {
            ctx.push(") WHERE 1 = 1");
        }
        if let Some(conflict) = self.conflict {
            let updates = self.updated(columns.iter().map(String::as_str));
            self.push_conflict_clause(ctx, conflict, upsert, &updates);
        }
        Ok(())
    }
}

fn push_names<'n>(ctx: &mut Compilation<'_>, names: impl Iterator<Item = &'n str>) {
    for (i, name) in names.enumerate() {
        if i > 0 {
            ctx.push(", ");
        }
        ctx.push_ident(name);
    }
}

fn push_source(ctx: &mut Compilation<'_>, column: &Column, source: &Source) {
    match source {
        Source::Bound(value) if value.is_null() => ctx.push("NULL"),
        Source::Bound(value) => ctx.bind(Some(&column.kind), value.clone()),
        Source::Sql(sql) => ctx.push(sql),
    }
}
