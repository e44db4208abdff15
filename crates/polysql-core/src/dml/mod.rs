//! Data-manipulation statements and their compiler.
//!
//! Statement models ([`Select`], [`Insert`], [`Update`], [`Delete`]) are
//! plain values built by the caller. [`DmlCompiler`] turns one into a
//! [`Statement`] for a dialect: SQL text, parameters in placeholder order,
//! and for SELECT a [`RowPlan`] that decodes result rows.

mod delete;
mod insert;
mod plan;
mod select;
mod update;

pub use delete::Delete;
pub use insert::{Insert, OnConflict};
pub use plan::{PlanColumn, RowPlan};
pub use select::{Join, OrderBy, Select, SelectItem};
pub use update::Update;

pub(crate) use select::compile_select;

use tracing::{debug, warn};

use crate::context::{Compilation, QuotePolicy};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::schema::FlatTable;
use crate::statement::{Statement, StatementBatch, StatementKind};

/// A table in a FROM or JOIN clause.
///
/// `key` is what column references name; it defaults to the table name
/// and differs only when the same table appears twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Table name.
    pub name: String,
    /// Reference key.
    pub key: String,
}

impl TableRef {
    /// References `name` under its own name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
        }
    }

    /// References `name` under a different key, for self joins.
    #[must_use]
    pub fn aliased(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }
}

impl From<&FlatTable> for TableRef {
    fn from(table: &FlatTable) -> Self {
        Self::new(table.name.clone())
    }
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN.
    Inner,
    /// LEFT OUTER JOIN.
    Left,
    /// RIGHT OUTER JOIN.
    Right,
    /// FULL OUTER JOIN.
    Full,
    /// CROSS JOIN.
    Cross,
}

impl JoinKind {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT OUTER JOIN",
            Self::Right => "RIGHT OUTER JOIN",
            Self::Full => "FULL OUTER JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// Row lock strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrength {
    /// FOR UPDATE.
    Update,
    /// FOR SHARE.
    Share,
}

/// Behaviour when a row is already locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockWait {
    /// Block until the lock is released.
    Wait,
    /// Fail immediately.
    NoWait,
    /// Skip locked rows.
    SkipLocked,
}

/// A row-locking clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    /// Lock strength.
    pub strength: LockStrength,
    /// Wait behaviour.
    pub wait: LockWait,
    /// Keys of the tables to lock; empty locks every table.
    pub of: Vec<String>,
}

impl Lock {
    /// `FOR UPDATE`.
    #[must_use]
    pub const fn update() -> Self {
        Self {
            strength: LockStrength::Update,
            wait: LockWait::Wait,
            of: Vec::new(),
        }
    }

    /// `FOR SHARE`.
    #[must_use]
    pub const fn share() -> Self {
        Self {
            strength: LockStrength::Share,
            wait: LockWait::Wait,
            of: Vec::new(),
        }
    }

    /// Adds `NOWAIT`.
    #[must_use]
    pub fn nowait(mut self) -> Self {
        self.wait = LockWait::NoWait;
        self
    }

    /// Adds `SKIP LOCKED`.
    #[must_use]
    pub fn skip_locked(mut self) -> Self {
        self.wait = LockWait::SkipLocked;
        self
    }

    /// Restricts the lock to one table reference.
    #[must_use]
    pub fn of(mut self, key: impl Into<String>) -> Self {
        self.of.push(key.into());
        self
    }
}

/// Compiles DML statements for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct DmlCompiler<'a> {
    dialect: &'a dyn Dialect,
    quoting: QuotePolicy,
}

impl<'a> DmlCompiler<'a> {
    /// Creates a compiler quoting every identifier.
    #[must_use]
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            dialect,
            quoting: QuotePolicy::Always,
        }
    }

    /// Sets the identifier quoting policy.
    #[must_use]
    pub const fn quoting(mut self, quoting: QuotePolicy) -> Self {
        self.quoting = quoting;
        self
    }

    fn finish(ctx: Compilation<'_>, kind: StatementKind, mut statement: Statement) -> Statement {
        statement.kind = kind;
        statement.warnings = ctx.into_warnings();
        debug!(sql = %statement.sql, params = statement.params.len(), "compiled statement");
        statement
    }

    /// Compiles a SELECT with its row plan.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedOperation`] for joins, functions
    /// or intervals the dialect cannot express.
    pub fn select(&self, query: &Select) -> Result<Statement> {
        let mut ctx = Compilation::new(self.dialect, self.quoting);
        let skip = select::compile_top(&mut ctx, query)?;
        let columns = ctx.take_translate_types();
        let (sql, params) = ctx.take();
        let mut statement = Statement::new(StatementKind::Select, sql);
        statement.params = params;
        statement.plan = Some(RowPlan { skip, columns });
        Ok(Self::finish(ctx, StatementKind::Select, statement))
    }

    /// Compiles an INSERT, INSERT ... SELECT or upsert.
    ///
    /// # Errors
    ///
    /// Returns range and length violations for bound values, and
    /// [`crate::Error::UnsupportedOperation`] for upserts the dialect
    /// cannot express.
    pub fn insert(&self, insert: &Insert) -> Result<Statement> {
        let mut ctx = Compilation::new(self.dialect, self.quoting);
        let (kind, generated_keys) = insert.compile(&mut ctx)?;
        let (sql, params) = ctx.take();
        let mut statement = Statement::new(kind, sql);
        statement.params = params;
        statement.generated_keys = generated_keys;
        Ok(Self::finish(ctx, kind, statement))
    }

    /// Compiles each insert into its own statement.
    ///
    /// When the dialect cannot report generated keys for a batch, the key
    /// lists are cleared and a warning is recorded.
    ///
    /// # Errors
    ///
    /// Fails on the first insert that fails to compile.
    pub fn insert_batch(&self, inserts: &[Insert]) -> Result<StatementBatch> {
        let mut batch = StatementBatch::default();
        for insert in inserts {
            batch.statements.push(self.insert(insert)?);
        }
        let has_keys = batch.statements.iter().any(|s| !s.generated_keys.is_empty());
        if inserts.len() > 1 && has_keys && !self.dialect.supports_return_generated_keys_batch() {
            let message = format!(
                "{} cannot return generated keys for a batch; keys are not retrieved",
                self.dialect.name()
            );
            warn!("{message}");
            batch.warnings.push(message);
            for statement in &mut batch.statements {
                statement.generated_keys.clear();
            }
        }
        for statement in &batch.statements {
            batch.warnings.extend(statement.warnings.iter().cloned());
        }
        Ok(batch)
    }

    /// Compiles an UPDATE.
    ///
    /// # Errors
    ///
    /// Returns range and length violations for bound values.
    pub fn update(&self, update: &Update) -> Result<Statement> {
        let mut ctx = Compilation::new(self.dialect, self.quoting);
        update.compile(&mut ctx)?;
        let (sql, params) = ctx.take();
        let mut statement = Statement::new(StatementKind::Update, sql);
        statement.params = params;
        Ok(Self::finish(ctx, StatementKind::Update, statement))
    }

    /// Compiles a DELETE.
    ///
    /// # Errors
    ///
    /// Propagates expression compile failures.
    pub fn delete(&self, delete: &Delete) -> Result<Statement> {
        let mut ctx = Compilation::new(self.dialect, self.quoting);
        delete.compile(&mut ctx)?;
        let (sql, params) = ctx.take();
        let mut statement = Statement::new(StatementKind::Delete, sql);
        statement.params = params;
        Ok(Self::finish(ctx, StatementKind::Delete, statement))
    }
}
