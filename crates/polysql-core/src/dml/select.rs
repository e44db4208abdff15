//! SELECT model and compilation.

use super::{JoinKind, Lock, PlanColumn, TableRef};
use crate::context::Compilation;
use crate::dialect::Pagination;
use crate::error::{Error, Result};
use crate::expr::{compile, compile_projection, Expr};
use crate::schema::FlatTable;
use crate::types::Kind;

/// Alias of the ROWNUM column in Oracle pagination wrappers.
const ROWNUM_ALIAS: &str = "rnum3729";

/// One entry of a SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// A single expression.
    Expr {
        /// Selected expression.
        expr: Expr,
        /// Optional column alias.
        alias: Option<String>,
    },
    /// Every column of a table reference.
    Entity {
        /// Key of the table reference.
        key: String,
        /// The table whose columns are selected.
        table: FlatTable,
    },
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Join kind.
    pub kind: JoinKind,
    /// Joined table.
    pub table: TableRef,
    /// Join condition; ignored for CROSS JOIN.
    pub on: Option<Expr>,
}

/// An ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Sort expression.
    pub expr: Expr,
    /// Sort descending.
    pub descending: bool,
}

/// A SELECT query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    /// SELECT DISTINCT.
    pub distinct: bool,
    /// Select list.
    pub items: Vec<SelectItem>,
    /// FROM table, or the dialect's dummy table when absent.
    pub from: Option<TableRef>,
    /// JOIN clauses.
    pub joins: Vec<Join>,
    /// WHERE predicate.
    pub filter: Option<Expr>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// HAVING predicate.
    pub having: Option<Expr>,
    /// ORDER BY entries.
    pub order_by: Vec<OrderBy>,
    /// Maximum number of rows.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
    /// Row-locking clause.
    pub lock: Option<Lock>,
}

impl Select {
    /// An empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A query over `table`.
    #[must_use]
    pub fn from_table(table: impl Into<TableRef>) -> Self {
        Self {
            from: Some(table.into()),
            ..Self::default()
        }
    }

    /// Selects every column of `table` under its own name.
    #[must_use]
    pub fn entity(self, table: &FlatTable) -> Self {
        let key = table.name.clone();
        self.entity_as(key, table)
    }

    /// Selects every column of `table` referenced as `key`.
    #[must_use]
    pub fn entity_as(mut self, key: impl Into<String>, table: &FlatTable) -> Self {
        self.items.push(SelectItem::Entity {
            key: key.into(),
            table: table.clone(),
        });
        self
    }

    /// Selects an expression.
    #[must_use]
    pub fn column(mut self, expr: Expr) -> Self {
        self.items.push(SelectItem::Expr { expr, alias: None });
        self
    }

    /// Selects an expression under an alias.
    #[must_use]
    pub fn column_as(mut self, expr: Expr, alias: impl Into<String>) -> Self {
        self.items.push(SelectItem::Expr {
            expr,
            alias: Some(alias.into()),
        });
        self
    }

    /// Sets DISTINCT.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds a join.
    #[must_use]
    pub fn join(mut self, kind: JoinKind, table: impl Into<TableRef>, on: Option<Expr>) -> Self {
        self.joins.push(Join {
            kind,
            table: table.into(),
            on,
        });
        self
    }

    /// Adds an INNER JOIN.
    #[must_use]
    pub fn inner_join(self, table: impl Into<TableRef>, on: Expr) -> Self {
        self.join(JoinKind::Inner, table, Some(on))
    }

    /// Adds a LEFT OUTER JOIN.
    #[must_use]
    pub fn left_join(self, table: impl Into<TableRef>, on: Expr) -> Self {
        self.join(JoinKind::Left, table, Some(on))
    }

    /// Adds a CROSS JOIN.
    #[must_use]
    pub fn cross_join(self, table: impl Into<TableRef>) -> Self {
        self.join(JoinKind::Cross, table, None)
    }

    /// Adds a WHERE predicate, AND-ed with any existing one.
    #[must_use]
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Adds a GROUP BY expression.
    #[must_use]
    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    /// Sets the HAVING predicate.
    #[must_use]
    pub fn having(mut self, predicate: Expr) -> Self {
        self.having = Some(predicate);
        self
    }

    /// Orders ascending by `expr`.
    #[must_use]
    pub fn order_by(mut self, expr: Expr) -> Self {
        self.order_by.push(OrderBy {
            expr,
            descending: false,
        });
        self
    }

    /// Orders descending by `expr`.
    #[must_use]
    pub fn order_by_desc(mut self, expr: Expr) -> Self {
        self.order_by.push(OrderBy {
            expr,
            descending: true,
        });
        self
    }

    /// Sets LIMIT.
    #[must_use]
    pub const fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sets OFFSET.
    #[must_use]
    pub const fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Sets the row-locking clause.
    #[must_use]
    pub fn lock(mut self, lock: Lock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Kind of the first result column, for scalar sub-queries.
    ///
    /// # Errors
    ///
    /// Propagates [`Expr::infer`] failures.
    pub fn result_type(&self) -> Result<Option<Kind>> {
        match self.items.first() {
            Some(SelectItem::Expr { expr, .. }) => expr.infer(),
            Some(SelectItem::Entity { table, .. }) => {
                Ok(table.columns.first().map(|c| c.kind.clone()))
            }
            None => Ok(None),
        }
    }
}

/// Compiles a top-level SELECT, recording result columns, and returns
/// how many leading raw columns the row plan skips.
pub(super) fn compile_top(ctx: &mut Compilation<'_>, query: &Select) -> Result<usize> {
    ctx.enter_scope();
    let result = compile_scoped(ctx, query, true);
    ctx.exit_scope();
    result
}

/// Compiles a nested SELECT (sub-query or INSERT source).
pub(crate) fn compile_select(ctx: &mut Compilation<'_>, query: &Select) -> Result<()> {
    ctx.enter_scope();
    let result = compile_scoped(ctx, query, false);
    ctx.exit_scope();
    result.map(|_| ())
}

fn table_with_alias(ctx: &mut Compilation<'_>, table: &TableRef) -> String {
    let alias = ctx.next_alias();
    ctx.register(&table.key, Some(alias.clone()));
    format!("{} {alias}", ctx.quote(&table.name))
}

fn compile_scoped(ctx: &mut Compilation<'_>, query: &Select, top: bool) -> Result<usize> {
    let dialect = ctx.dialect();
    if query.items.is_empty() {
        return Err(Error::UnsupportedOperation(
            "SELECT needs at least one item".to_string(),
        ));
    }

    // Aliases first so items may reference joined tables.
    let from = query.from.as_ref().map(|t| table_with_alias(ctx, t));
    let mut joins = Vec::with_capacity(query.joins.len());
    for join in &query.joins {
        if !dialect.supports_join(join.kind) {
            return Err(Error::UnsupportedOperation(format!(
                "{} does not support {}",
                dialect.name(),
                join.kind.as_str()
            )));
        }
        joins.push(table_with_alias(ctx, &join.table));
    }

    let start = ctx.mark();
    ctx.push("SELECT ");
    if query.distinct {
        ctx.push("DISTINCT ");
    }
    let labels = compile_items(ctx, query, top)?;

    if let Some(source) = from.as_deref().or_else(|| dialect.dummy_table()) {
        ctx.push(" FROM ");
        ctx.push(source);
    }
    for (join, table) in query.joins.iter().zip(&joins) {
        ctx.push(" ");
        ctx.push(join.kind.as_str());
        ctx.push(" ");
        ctx.push(table);
        if join.kind != JoinKind::Cross {
            if let Some(on) = &join.on {
                ctx.push(" ON ");
                compile(ctx, on)?;
            }
        }
    }
    if let Some(filter) = &query.filter {
        ctx.push(" WHERE ");
        compile(ctx, filter)?;
    }
    if !query.group_by.is_empty() {
        ctx.push(" GROUP BY ");
        for (i, expr) in query.group_by.iter().enumerate() {
            if i > 0 {
                ctx.push(", ");
            }
            compile(ctx, expr)?;
        }
    }
    if let Some(having) = &query.having {
        ctx.push(" HAVING ");
        compile(ctx, having)?;
    }
    if !query.order_by.is_empty() {
        ctx.push(" ORDER BY ");
        for (i, order) in query.order_by.iter().enumerate() {
            if i > 0 {
                ctx.push(", ");
            }
            compile(ctx, &order.expr)?;
            if order.descending {
                ctx.push(" DESC");
            }
        }
    }

    let skip = paginate(ctx, query, start, top, &labels);

    if let Some(lock) = &query.lock {
        let of: Vec<String> = lock
            .of
            .iter()
            .map(|key| match ctx.resolve(key) {
                Some(Some(alias)) => alias.to_string(),
                _ => ctx.quote(key),
            })
            .collect();
        match dialect.lock_clause(lock, &of) {
            Some(clause) => ctx.push(&clause),
            None => ctx.warn(format!(
                "{} cannot express {:?} {:?} row locks; lock clause dropped",
                dialect.name(),
                lock.strength,
                lock.wait
            )),
        }
    }
    Ok(skip)
}

/// Emits the select list and returns the output column labels.
fn compile_items(ctx: &mut Compilation<'_>, query: &Select, top: bool) -> Result<Vec<String>> {
    let aliased = ctx.dialect().aliases_select_items();
    let mut labels = Vec::new();
    let mut first = true;
    let mut next_label = |ctx: &mut Compilation<'_>, given: Option<&str>, name: &str| {
        if !std::mem::take(&mut first) {
            ctx.push(", ");
        }
        let position = labels.len() + 1;
        let label = match given {
            Some(alias) => alias.to_string(),
            None if aliased || name.is_empty() => format!("c{position}"),
            None => name.to_string(),
        };
        labels.push(label.clone());
        label
    };

    for item in &query.items {
        match item {
            SelectItem::Expr { expr, alias } => {
                let label = next_label(ctx, alias.as_deref(), "");
                compile_projection(ctx, expr)?;
                if alias.is_some() || aliased {
                    ctx.push(" ");
                    ctx.push_ident(&label);
                }
                if top {
                    ctx.translate(PlanColumn {
                        label,
                        entity: None,
                        kind: expr.result_type()?,
                    });
                }
            }
            SelectItem::Entity { key, table } => {
                let qualifier = match ctx.resolve(key) {
                    Some(Some(alias)) => alias.to_string(),
                    _ => ctx.quote(&table.name),
                };
                for column in &table.columns {
                    let label = next_label(ctx, None, &column.name);
                    ctx.push(&qualifier);
                    ctx.push(".");
                    ctx.push_ident(&column.name);
                    if aliased {
                        ctx.push(" ");
                        ctx.push_ident(&label);
                    }
                    if top {
                        ctx.translate(PlanColumn {
                            label,
                            entity: Some(key.clone()),
                            kind: column.kind.clone(),
                        });
                    }
                }
            }
        }
    }
    Ok(labels)
}

/// Applies LIMIT/OFFSET and returns the number of leading columns the
/// row plan skips.
fn paginate(
    ctx: &mut Compilation<'_>,
    query: &Select,
    start: usize,
    top: bool,
    labels: &[String],
) -> usize {
    let dialect = ctx.dialect();
    let (limit, offset) = (query.limit, query.offset.filter(|&n| n > 0));
    if limit.is_none() && offset.is_none() {
        return 0;
    }
    match dialect.pagination() {
        Pagination::LimitOffset => {
            ctx.push(&dialect.limit_offset(limit, offset));
            0
        }
        Pagination::OffsetFetch => {
            if let Some(offset) = offset {
                ctx.push(&format!(" OFFSET {offset} ROWS"));
            }
            if let Some(limit) = limit {
                ctx.push(&format!(" FETCH NEXT {limit} ROWS ONLY"));
            }
            0
        }
        Pagination::RowNum => {
            let columns = if top {
                "*".to_string()
            } else {
                labels
                    .iter()
                    .map(|l| ctx.quote(l))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            match offset {
                None => {
                    ctx.insert_at(start, &format!("SELECT {columns} FROM ("));
                    ctx.push(&format!(") WHERE ROWNUM <= {}", limit.unwrap_or(0)));
                    0
                }
                Some(offset) => {
                    ctx.insert_at(
                        start,
                        &format!("SELECT {columns} FROM (SELECT ROWNUM {ROWNUM_ALIAS}, t.* FROM ("),
                    );
                    ctx.push(") t");
                    if let Some(limit) = limit {
                        ctx.push(&format!(" WHERE ROWNUM <= {}", offset.saturating_add(limit)));
                    }
                    ctx.push(&format!(") WHERE {ROWNUM_ALIAS} > {offset}"));
                    usize::from(top)
                }
            }
        }
    }
}
