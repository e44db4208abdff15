//! Per-compile mutable state.
//!
//! A [`Compilation`] is created for one compile call and dropped after it.
//! It owns everything that changes while SQL is emitted: the text buffer,
//! bound parameters, alias counters, constraint-name counters and
//! warnings. Nothing here is shared between compiles.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dialect::Dialect;
use crate::dml::PlanColumn;
use crate::reserved;
use crate::types::{Kind, Value};

/// When identifiers are wrapped in the dialect's quote characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotePolicy {
    /// Quote every identifier.
    #[default]
    Always,
    /// Quote only identifiers that are reserved words.
    Reserved,
    /// Emit identifiers verbatim.
    Never,
}

/// Accumulator for one compile pass.
#[derive(Debug)]
pub struct Compilation<'a> {
    dialect: &'a dyn Dialect,
    quoting: QuotePolicy,
    sql: String,
    params: Vec<Value>,
    next_alias: usize,
    scopes: Vec<HashMap<String, Option<String>>>,
    translate_types: Vec<PlanColumn>,
    counters: HashMap<(String, &'static str), usize>,
    warnings: Vec<String>,
}

impl<'a> Compilation<'a> {
    /// Starts a compile pass for `dialect`.
    #[must_use]
    pub fn new(dialect: &'a dyn Dialect, quoting: QuotePolicy) -> Self {
        Self {
            dialect,
            quoting,
            sql: String::new(),
            params: Vec::new(),
            next_alias: 0,
            scopes: Vec::new(),
            translate_types: Vec::new(),
            counters: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// The target dialect.
    #[must_use]
    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    /// Quotes an identifier according to the quoting policy.
    #[must_use]
    pub fn quote(&self, name: &str) -> String {
        match self.quoting {
            QuotePolicy::Always => self.dialect.quote_identifier(name),
            QuotePolicy::Reserved if self.is_reserved(name) => self.dialect.quote_identifier(name),
            QuotePolicy::Reserved | QuotePolicy::Never => name.to_string(),
        }
    }

    /// Whether `name` is reserved by a standard or by the dialect.
    #[must_use]
    pub fn is_reserved(&self, name: &str) -> bool {
        reserved::lookup(name).is_some()
            || self
                .dialect
                .reserved_words()
                .iter()
                .any(|w| w.eq_ignore_ascii_case(name))
    }

    /// Appends SQL text.
    pub fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Appends a quoted identifier.
    pub fn push_ident(&mut self, name: &str) {
        let quoted = self.quote(name);
        self.sql.push_str(&quoted);
    }

    /// Binds a parameter and appends its placeholder.
    pub fn bind(&mut self, kind: Option<&Kind>, value: Value) {
        let value = self.dialect.bind_value(kind, value);
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    /// Current length of the SQL buffer, for [`Self::split_off`].
    #[must_use]
    pub fn mark(&self) -> usize {
        self.sql.len()
    }

    /// Removes and returns everything emitted since `mark`.
    pub fn split_off(&mut self, mark: usize) -> String {
        self.sql.split_off(mark)
    }

    /// Inserts text at an earlier mark.
    pub fn insert_at(&mut self, mark: usize, sql: &str) {
        self.sql.insert_str(mark, sql);
    }

    /// Allocates the next table alias: `a`, `b`, ... `z`, `aa`, `ab`, ...
    pub fn next_alias(&mut self) -> String {
        let mut n = self.next_alias;
        self.next_alias += 1;
        let mut alias = Vec::new();
        loop {
            alias.push(b'a' + u8::try_from(n % 26).unwrap_or(0));
            if n < 26 {
                break;
            }
            n = n / 26 - 1;
        }
        alias.reverse();
        String::from_utf8(alias).unwrap_or_default()
    }

    /// Opens a name scope for a (sub-)query.
    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Closes the innermost scope.
    pub fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    /// Registers how references to `key` are qualified in the current scope.
    ///
    /// `None` means columns of `key` are emitted unqualified.
    pub fn register(&mut self, key: &str, alias: Option<String>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(key.to_string(), alias);
        }
    }

    /// Resolves `key` from the innermost scope outwards.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<Option<&str>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(key))
            .map(Option::as_deref)
    }

    /// Records the decoded kind of the next result column.
    pub fn translate(&mut self, column: PlanColumn) {
        self.translate_types.push(column);
    }

    /// Takes the recorded result columns.
    pub fn take_translate_types(&mut self) -> Vec<PlanColumn> {
        std::mem::take(&mut self.translate_types)
    }

    /// Returns the next 1-based number for a named constraint of `table`.
    pub fn next_constraint(&mut self, table: &str, kind: &'static str) -> usize {
        let counter = self.counters.entry((table.to_string(), kind)).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Logs a warning and records it for the caller.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(dialect = self.dialect.name(), "{message}");
        self.warnings.push(message);
    }

    /// Warnings recorded so far.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Takes the emitted SQL and parameters, resetting both.
    pub fn take(&mut self) -> (String, Vec<Value>) {
        (
            std::mem::take(&mut self.sql),
            std::mem::take(&mut self.params),
        )
    }

    /// Consumes the context, returning its warnings.
    #[must_use]
    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect};

    #[test]
    fn test_alias_sequence() {
        let dialect = PostgresDialect::new();
        let mut ctx = Compilation::new(&dialect, QuotePolicy::Always);
        let aliases: Vec<String> = (0..28).map(|_| ctx.next_alias()).collect();
        assert_eq!(aliases[0], "a");
        assert_eq!(aliases[25], "z");
        assert_eq!(aliases[26], "aa");
        assert_eq!(aliases[27], "ab");
    }

    #[test]
    fn test_aliases_do_not_leak_between_contexts() {
        let dialect = PostgresDialect::new();
        let mut first = Compilation::new(&dialect, QuotePolicy::Always);
        first.next_alias();
        first.next_alias();
        let mut second = Compilation::new(&dialect, QuotePolicy::Always);
        assert_eq!(second.next_alias(), "a");
    }

    #[test]
    fn test_postgres_placeholders_are_numbered() {
        let dialect = PostgresDialect::new();
        let mut ctx = Compilation::new(&dialect, QuotePolicy::Always);
        ctx.bind(None, Value::Integer(1));
        ctx.push(", ");
        ctx.bind(None, Value::Integer(2));
        let (sql, params) = ctx.take();
        assert_eq!(sql, "$1, $2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_quote_policies() {
        let dialect = MySqlDialect::mysql();
        let always = Compilation::new(&dialect, QuotePolicy::Always);
        assert_eq!(always.quote("name"), "`name`");
        let reserved = Compilation::new(&dialect, QuotePolicy::Reserved);
        assert_eq!(reserved.quote("name"), "name");
        assert_eq!(reserved.quote("order"), "`order`");
        let never = Compilation::new(&dialect, QuotePolicy::Never);
        assert_eq!(never.quote("order"), "order");
    }

    #[test]
    fn test_scopes_resolve_outwards() {
        let dialect = PostgresDialect::new();
        let mut ctx = Compilation::new(&dialect, QuotePolicy::Always);
        ctx.enter_scope();
        ctx.register("outer_t", Some("a".into()));
        ctx.enter_scope();
        ctx.register("inner_t", Some("b".into()));
        assert_eq!(ctx.resolve("outer_t"), Some(Some("a")));
        assert_eq!(ctx.resolve("inner_t"), Some(Some("b")));
        ctx.exit_scope();
        assert_eq!(ctx.resolve("inner_t"), None);
    }

    #[test]
    fn test_constraint_counters_per_table() {
        let dialect = PostgresDialect::new();
        let mut ctx = Compilation::new(&dialect, QuotePolicy::Always);
        assert_eq!(ctx.next_constraint("a", "unique"), 1);
        assert_eq!(ctx.next_constraint("a", "unique"), 2);
        assert_eq!(ctx.next_constraint("b", "unique"), 1);
        assert_eq!(ctx.next_constraint("a", "fk"), 1);
    }
}
