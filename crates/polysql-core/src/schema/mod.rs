//! Schema model: tables, columns, constraints and indexes.
//!
//! A [`Schema`] is what callers (or the schema-description loader) build.
//! It may use inheritance through [`Table::extends`]; [`Schema::flatten`]
//! resolves that into a [`FlatSchema`] the compilers work from.

mod flatten;

pub use flatten::{FlatSchema, FlatTable};

use serde::{Deserialize, Serialize};

use crate::types::{Kind, Value};

/// Referential action of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRule {
    /// Propagate the change.
    Cascade,
    /// Set referencing columns to NULL.
    SetNull,
    /// Set referencing columns to their default.
    SetDefault,
    /// Reject the change.
    Restrict,
}

impl ChangeRule {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
        }
    }
}

/// Foreign key declared on a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referenced table.
    pub references: String,
    /// Referenced column.
    pub column: String,
    /// Action on delete of the referenced row.
    #[serde(default)]
    pub on_delete: Option<ChangeRule>,
    /// Action on update of the referenced key.
    #[serde(default)]
    pub on_update: Option<ChangeRule>,
}

impl ForeignKey {
    /// References `table(column)` with no actions.
    #[must_use]
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            references: table.into(),
            column: column.into(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub const fn on_delete(mut self, rule: ChangeRule) -> Self {
        self.on_delete = Some(rule);
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub const fn on_update(mut self, rule: ChangeRule) -> Self {
        self.on_update = Some(rule);
        self
    }
}

/// Value produced automatically on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateOnInsert {
    /// Database-assigned increasing integer.
    AutoIncrement,
    /// Random UUID text, generated by the compiler.
    Uuid,
    /// Current timestamp.
    Timestamp,
}

/// Value produced automatically on update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateOnUpdate {
    /// Current timestamp.
    Timestamp,
    /// Previous value plus one.
    Increment,
}

/// Comparison operator of a CHECK condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
}

impl CheckOp {
    /// Returns the SQL operator.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// Right-hand side of a CHECK condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operand {
    /// A literal.
    Value(Value),
    /// Another column of the same table.
    Column(String),
}

/// A table-level CHECK clause, possibly an AND/OR tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Check {
    /// `column op operand`.
    Condition {
        /// Left-hand column.
        column: String,
        /// Operator.
        op: CheckOp,
        /// Right-hand side.
        operand: Operand,
    },
    /// All sub-clauses hold.
    And(Vec<Check>),
    /// Any sub-clause holds.
    Or(Vec<Check>),
}

impl Check {
    /// `column op value`.
    #[must_use]
    pub fn value(column: impl Into<String>, op: CheckOp, value: impl Into<Value>) -> Self {
        Self::Condition {
            column: column.into(),
            op,
            operand: Operand::Value(value.into()),
        }
    }

    /// `column op other_column`.
    #[must_use]
    pub fn columns(column: impl Into<String>, op: CheckOp, other: impl Into<String>) -> Self {
        Self::Condition {
            column: column.into(),
            op,
            operand: Operand::Column(other.into()),
        }
    }

    /// Collects every column the clause mentions.
    pub fn columns_referenced<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Condition {
                column, operand, ..
            } => {
                out.push(column);
                if let Operand::Column(other) = operand {
                    out.push(other);
                }
            }
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.columns_referenced(out);
                }
            }
        }
    }
}

/// Per-column comparison check, e.g. `age >= 18`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCheck {
    /// Operator.
    pub op: CheckOp,
    /// Right-hand literal.
    pub value: Value,
}

/// Index access method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    /// B-tree index.
    #[default]
    BTree,
    /// Hash index.
    Hash,
}

impl IndexType {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::BTree => "BTREE",
            Self::Hash => "HASH",
        }
    }
}

/// Index declared on a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnIndex {
    /// Whether the index enforces uniqueness.
    #[serde(default)]
    pub unique: bool,
    /// Access method.
    #[serde(default, rename = "type")]
    pub index_type: IndexType,
}

/// Table-level index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Whether the index enforces uniqueness.
    #[serde(default)]
    pub unique: bool,
    /// Access method.
    #[serde(default, rename = "type")]
    pub index_type: IndexType,
    /// Indexed columns in order.
    pub columns: Vec<String>,
}

impl Index {
    /// A non-unique B-tree index over `columns`.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            unique: false,
            index_type: IndexType::BTree,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Makes the index unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the access method.
    #[must_use]
    pub const fn index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = index_type;
        self
    }
}

const fn default_true() -> bool {
    true
}

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Kind with its attributes.
    pub kind: Kind,
    /// Whether NULL is permitted.
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Whether the column alone is unique.
    #[serde(default)]
    pub unique: bool,
    /// Whether the column belongs to the primary key.
    #[serde(default)]
    pub primary: bool,
    /// Default value.
    #[serde(default)]
    pub default: Option<Value>,
    /// Value generated on insert.
    #[serde(default)]
    pub generate_on_insert: Option<GenerateOnInsert>,
    /// Value generated on update.
    #[serde(default)]
    pub generate_on_update: Option<GenerateOnUpdate>,
    /// Inclusive lower bound, compiled into a CHECK.
    #[serde(default)]
    pub min: Option<Value>,
    /// Inclusive upper bound, compiled into a CHECK.
    #[serde(default)]
    pub max: Option<Value>,
    /// Comparison check, compiled into a CHECK.
    #[serde(default)]
    pub check: Option<ColumnCheck>,
    /// Single-column index.
    #[serde(default)]
    pub index: Option<ColumnIndex>,
    /// Single-column foreign key.
    #[serde(default)]
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    /// Creates a nullable column with no constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: true,
            unique: false,
            primary: false,
            default: None,
            generate_on_insert: None,
            generate_on_update: None,
            min: None,
            max: None,
            check: None,
            index: None,
            foreign_key: None,
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Adds the column to the primary key and marks it NOT NULL.
    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self.nullable = false;
        self
    }

    /// Marks the column unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the generate-on-insert policy.
    #[must_use]
    pub const fn generate_on_insert(mut self, policy: GenerateOnInsert) -> Self {
        self.generate_on_insert = Some(policy);
        self
    }

    /// Shorthand for auto-increment.
    #[must_use]
    pub const fn auto_increment(self) -> Self {
        self.generate_on_insert(GenerateOnInsert::AutoIncrement)
    }

    /// Sets the generate-on-update policy.
    #[must_use]
    pub const fn generate_on_update(mut self, policy: GenerateOnUpdate) -> Self {
        self.generate_on_update = Some(policy);
        self
    }

    /// Sets the inclusive lower bound.
    #[must_use]
    pub fn min(mut self, value: impl Into<Value>) -> Self {
        self.min = Some(value.into());
        self
    }

    /// Sets the inclusive upper bound.
    #[must_use]
    pub fn max(mut self, value: impl Into<Value>) -> Self {
        self.max = Some(value.into());
        self
    }

    /// Adds a comparison check against a literal.
    #[must_use]
    pub fn check(mut self, op: CheckOp, value: impl Into<Value>) -> Self {
        self.check = Some(ColumnCheck {
            op,
            value: value.into(),
        });
        self
    }

    /// Declares a single-column index.
    #[must_use]
    pub const fn indexed(mut self, unique: bool, index_type: IndexType) -> Self {
        self.index = Some(ColumnIndex { unique, index_type });
        self
    }

    /// Declares a foreign key.
    #[must_use]
    pub fn references(mut self, fk: ForeignKey) -> Self {
        self.foreign_key = Some(fk);
        self
    }
}

/// Table-level constraints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Constraints {
    /// Explicit primary key columns.
    #[serde(default)]
    pub primary_key: Option<Vec<String>>,
    /// Unique column sets.
    #[serde(default)]
    pub unique: Vec<Vec<String>>,
    /// CHECK clauses.
    #[serde(default)]
    pub checks: Vec<Check>,
}

/// A table, possibly abstract or inheriting from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Abstract tables only contribute to descendants.
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Skipped tables are validated but emit no DDL.
    #[serde(default)]
    pub skip: bool,
    /// Parent table.
    #[serde(default)]
    pub extends: Option<String>,
    /// Own columns.
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Own constraints.
    #[serde(default)]
    pub constraints: Constraints,
    /// Own indexes.
    #[serde(default)]
    pub indexes: Vec<Index>,
}

impl Table {
    /// Creates a concrete table with no columns.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            skip: false,
            extends: None,
            columns: Vec::new(),
            constraints: Constraints::default(),
            indexes: Vec::new(),
        }
    }

    /// Marks the table abstract.
    #[must_use]
    pub const fn abstract_table(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Marks the table skipped.
    #[must_use]
    pub const fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Sets the parent table.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Declares the primary key explicitly.
    #[must_use]
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.primary_key = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a unique column set.
    #[must_use]
    pub fn unique<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints
            .unique
            .push(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a CHECK clause.
    #[must_use]
    pub fn check(mut self, check: Check) -> Self {
        self.constraints.checks.push(check);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }
}

/// An ordered collection of tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Tables in declaration order.
    pub tables: Vec<Table>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a table.
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Resolves inheritance and validates the result.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::SchemaError`] wrapped in [`crate::Error`]
    /// for any structural problem.
    pub fn flatten(&self) -> crate::Result<FlatSchema> {
        flatten::flatten(self)
    }
}
