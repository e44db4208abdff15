//! CREATE TABLE and CREATE INDEX text.

use crate::context::Compilation;
use crate::dialect::{AutoIncrement, EnumStrategy};
use crate::error::Result;
use crate::schema::{
    Check, Column, ForeignKey, FlatTable, GenerateOnInsert, Index, IndexType, Operand,
};
use crate::statement::{Statement, StatementKind};
use crate::types::{Kind, Value};

/// Whether `column` is an auto-increment column.
fn is_auto_increment(column: &Column) -> bool {
    column.generate_on_insert == Some(GenerateOnInsert::AutoIncrement)
}

/// Column carrying SQLite's inline `PRIMARY KEY AUTOINCREMENT`, if any.
fn inline_key<'t>(ctx: &mut Compilation<'_>, table: &'t FlatTable) -> Option<&'t Column> {
    if ctx.dialect().auto_increment() != AutoIncrement::InlinePrimaryKey {
        return None;
    }
    let column = table.columns.iter().find(|c| is_auto_increment(c))?;
    if table.primary_key.len() == 1 && table.primary_key[0] == column.name {
        return Some(column);
    }
    ctx.warn(format!(
        "{}: AUTOINCREMENT on '{}' requires it to be the sole primary key column; dropped",
        table.name, column.name
    ));
    None
}

pub(super) fn create_table(ctx: &mut Compilation<'_>, table: &FlatTable) -> Result<Statement> {
    let inline = inline_key(ctx, table).map(|c| c.name.clone());

    let mut definitions = table
        .columns
        .iter()
        .map(|column| column_definition(ctx, table, column, inline.as_deref()))
        .collect::<Result<Vec<_>>>()?;
    definitions.extend(unique_constraints(ctx, table));
    definitions.extend(check_constraints(ctx, table));
    if inline.is_none() && !table.primary_key.is_empty() {
        definitions.push(primary_key(ctx, table));
    }
    definitions.extend(foreign_keys(ctx, table));

    let sql = format!(
        "CREATE TABLE {} (\n    {}\n)",
        ctx.quote(&table.name),
        definitions.join(",\n    ")
    );
    Ok(Statement::new(StatementKind::CreateTable, sql))
}

fn column_definition(
    ctx: &Compilation<'_>,
    table: &FlatTable,
    column: &Column,
    inline: Option<&str>,
) -> Result<String> {
    let dialect = ctx.dialect();
    let auto = is_auto_increment(column);
    let is_inline = inline == Some(column.name.as_str());

    let declared = match (&column.kind, dialect.auto_increment()) {
        _ if is_inline => "INTEGER".to_string(),
        (Kind::Integer { width, .. }, AutoIncrement::Serial) if auto => {
            dialect.serial_type(*width).to_string()
        }
        (Kind::Enum { .. }, _) if dialect.enum_strategy() == EnumStrategy::NamedType => {
            ctx.quote(&dialect.enum_type_name(&table.name, &column.name))
        }
        (kind, _) => dialect.declare(kind)?,
    };

    let mut sql = format!("{} {declared}", ctx.quote(&column.name));
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&dialect.literal(default));
    }
    if !column.nullable {
        sql.push_str(" NOT NULL");
    } else if dialect.declares_null() {
        sql.push_str(" NULL");
    }
    if is_inline {
        sql.push_str(" PRIMARY KEY AUTOINCREMENT");
    } else if auto {
        if let AutoIncrement::Keyword(keyword) = dialect.auto_increment() {
            sql.push(' ');
            sql.push_str(keyword);
        }
    }
    Ok(sql)
}

fn column_list(ctx: &Compilation<'_>, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| ctx.quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn unique_constraints(ctx: &mut Compilation<'_>, table: &FlatTable) -> Vec<String> {
    let mut sets = table.unique.clone();
    for column in &table.columns {
        let single = vec![column.name.clone()];
        if column.unique && !column.primary && !sets.contains(&single) {
            sets.push(single);
        }
    }
    sets.iter()
        .map(|set| {
            let n = ctx.next_constraint(&table.name, "unique");
            format!(
                "CONSTRAINT {} UNIQUE ({})",
                ctx.quote(&format!("{}_unique_{n}", table.name)),
                column_list(ctx, set)
            )
        })
        .collect()
}

fn check_constraints(ctx: &mut Compilation<'_>, table: &FlatTable) -> Vec<String> {
    let dialect = ctx.dialect();
    let mut conditions: Vec<String> = table
        .checks
        .iter()
        .map(|check| check_clause(ctx, check))
        .collect();

    for column in &table.columns {
        let quoted = ctx.quote(&column.name);
        let range: Vec<String> = [(">=", &column.min), ("<=", &column.max)]
            .into_iter()
            .filter_map(|(op, bound)| {
                bound
                    .as_ref()
                    .map(|v| format!("{quoted} {op} {}", dialect.literal(v)))
            })
            .collect();
        if !range.is_empty() {
            conditions.push(range.join(" AND "));
        }
    }
    for column in &table.columns {
        if let Some(check) = &column.check {
            conditions.push(format!(
                "{} {} {}",
                ctx.quote(&column.name),
                check.op.as_sql(),
                dialect.literal(&check.value)
            ));
        }
    }
    for column in &table.columns {
        if column.kind.is_unsigned() && !dialect.allows_unsigned_numeric() {
            conditions.push(format!("{} >= 0", ctx.quote(&column.name)));
        }
        if let Kind::Enum { values } = &column.kind {
            if dialect.enum_strategy() == EnumStrategy::Check {
                let members: Vec<String> = values
                    .iter()
                    .map(|v| dialect.literal(&Value::from(v.as_str())))
                    .collect();
                conditions.push(format!(
                    "{} IN ({})",
                    ctx.quote(&column.name),
                    members.join(", ")
                ));
            }
        }
    }

    conditions
        .into_iter()
        .map(|condition| {
            if dialect.names_constraints() {
                let n = ctx.next_constraint(&table.name, "ck");
                format!(
                    "CONSTRAINT {} CHECK ({condition})",
                    ctx.quote(&format!("{}_ck_{n}", table.name))
                )
            } else {
                format!("CHECK ({condition})")
            }
        })
        .collect()
}

fn check_clause(ctx: &Compilation<'_>, check: &Check) -> String {
    match check {
        Check::Condition {
            column,
            op,
            operand,
        } => {
            let right = match operand {
                Operand::Value(value) => ctx.dialect().literal(value),
                Operand::Column(other) => ctx.quote(other),
            };
            format!("{} {} {right}", ctx.quote(column), op.as_sql())
        }
        Check::And(children) | Check::Or(children) => {
            let joiner = if matches!(check, Check::And(_)) {
                " AND "
            } else {
                " OR "
            };
            let parts: Vec<String> = children.iter().map(|c| check_clause(ctx, c)).collect();
            format!("({})", parts.join(joiner))
        }
    }
}

fn primary_key(ctx: &Compilation<'_>, table: &FlatTable) -> String {
    let columns = column_list(ctx, &table.primary_key);
    if ctx.dialect().names_constraints() {
        format!(
            "CONSTRAINT {} PRIMARY KEY ({columns})",
            ctx.quote(&format!("{}_pk", table.name))
        )
    } else {
        format!("PRIMARY KEY ({columns})")
    }
}

fn foreign_keys(ctx: &mut Compilation<'_>, table: &FlatTable) -> Vec<String> {
    table
        .columns
        .iter()
        .filter_map(|column| {
            column
                .foreign_key
                .as_ref()
                .map(|fk| foreign_key(ctx, table, column, fk))
        })
        .collect()
}

fn foreign_key(
    ctx: &mut Compilation<'_>,
    table: &FlatTable,
    column: &Column,
    fk: &ForeignKey,
) -> String {
    let n = ctx.next_constraint(&table.name, "fk");
    let mut sql = format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        ctx.quote(&format!("{}_fk_{n}", table.name)),
        ctx.quote(&column.name),
        ctx.quote(&fk.references),
        ctx.quote(&fk.column)
    );
    for (rule, on_update) in [(fk.on_delete, false), (fk.on_update, true)] {
        let Some(rule) = rule else {
            continue;
        };
        let event = if on_update { "UPDATE" } else { "DELETE" };
        if ctx.dialect().supports_change_rule(rule, on_update) {
            sql.push_str(&format!(" ON {event} {}", rule.as_sql()));
        } else {
            ctx.warn(format!(
                "{}.{}: ON {event} {} not supported by {}; dropped",
                table.name,
                column.name,
                rule.as_sql(),
                ctx.dialect().name()
            ));
        }
    }
    sql
}

pub(super) fn create_indexes(ctx: &mut Compilation<'_>, table: &FlatTable) -> Vec<Statement> {
    let column_indexes = table.columns.iter().filter_map(|column| {
        column.index.map(|index| Index {
            unique: index.unique,
            index_type: index.index_type,
            columns: vec![column.name.clone()],
        })
    });
    let indexes: Vec<Index> = table.indexes.iter().cloned().chain(column_indexes).collect();
    indexes
        .iter()
        .map(|index| create_index(ctx, table, index))
        .collect()
}

fn create_index(ctx: &mut Compilation<'_>, table: &FlatTable, index: &Index) -> Statement {
    let dialect = ctx.dialect();
    let name = format!("{}_{}_idx", table.name, index.columns.join("_"));
    let using = dialect.index_type_clause(index.index_type);
    if using.is_none() && index.index_type != IndexType::BTree {
        ctx.warn(format!(
            "{name}: {} indexes not supported by {}; using the default type",
            index.index_type.as_sql(),
            dialect.name()
        ));
    }

    let mut sql = format!(
        "CREATE {}INDEX {} ON {}",
        if index.unique { "UNIQUE " } else { "" },
        ctx.quote(&name),
        ctx.quote(&table.name)
    );
    let columns = format!(" ({})", column_list(ctx, &index.columns));
    match using {
        Some(using) if dialect.index_type_after_columns() => {
            sql.push_str(&columns);
            sql.push_str(&format!(" USING {using}"));
        }
        Some(using) => {
            sql.push_str(&format!(" USING {using}"));
            sql.push_str(&columns);
        }
        None => sql.push_str(&columns),
    }
    Statement::new(StatementKind::CreateIndex, sql)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::QuotePolicy;
    use crate::dialect::{
        DerbyDialect, Dialect, MySqlDialect, OracleDialect, PostgresDialect, SqliteDialect,
    };
    use crate::schema::{ChangeRule, CheckOp, Schema, Table};

    fn flat(table: Table) -> FlatTable {
        Schema::new().table(table).flatten().unwrap().tables.remove(0)
    }

    fn account() -> FlatTable {
        flat(
            Table::new("account")
                .column(Column::new("id", Kind::bigint()).auto_increment().primary())
                .column(Column::new("email", Kind::varchar(80)).not_null().unique())
                .column(Column::new("age", Kind::int()).min(0).max(150)),
        )
    }

    fn render(dialect: &dyn Dialect, table: &FlatTable) -> (String, Vec<String>) {
        let mut ctx = Compilation::new(dialect, QuotePolicy::Always);
        let sql = create_table(&mut ctx, table).unwrap().sql;
        (sql, ctx.into_warnings())
    }

    #[test]
    fn test_postgres_serial() {
        let (sql, warnings) = render(&PostgresDialect::new(), &account());
        assert_eq!(
            sql,
            "CREATE TABLE \"account\" (\n    \"id\" BIGSERIAL NOT NULL,\n    \
             \"email\" VARCHAR(80) NOT NULL,\n    \"age\" INTEGER NULL,\n    \
             CONSTRAINT \"account_unique_1\" UNIQUE (\"email\"),\n    \
             CHECK (\"age\" >= 0 AND \"age\" <= 150),\n    PRIMARY KEY (\"id\")\n)"
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_sqlite_inline_primary_key() {
        let (sql, _) = render(&SqliteDialect::new(), &account());
        assert!(sql.contains("\"id\" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,"));
        assert!(!sql.contains("PRIMARY KEY (\"id\")"));
    }

    #[test]
    fn test_sqlite_composite_key_drops_autoincrement() {
        let table = flat(
            Table::new("pair")
                .column(Column::new("a", Kind::int()).not_null().auto_increment())
                .column(Column::new("b", Kind::int()).not_null())
                .primary_key(["a", "b"]),
        );
        let (sql, warnings) = render(&SqliteDialect::new(), &table);
        assert!(sql.contains("PRIMARY KEY (\"a\", \"b\")"));
        assert!(!sql.contains("AUTOINCREMENT"));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_oracle_names_checks_and_key() {
        let (sql, _) = render(&OracleDialect::new(), &account());
        assert!(sql.contains("CONSTRAINT \"account_ck_1\" CHECK (\"age\" >= 0 AND \"age\" <= 150)"));
        assert!(sql.contains("CONSTRAINT \"account_pk\" PRIMARY KEY (\"id\")"));
    }

    #[test]
    fn test_check_tree_and_column_check_order() {
        let table = flat(
            Table::new("span")
                .column(Column::new("id", Kind::int()).primary())
                .column(Column::new("lo", Kind::int()).check(CheckOp::Gt, -5))
                .column(Column::new("hi", Kind::int()))
                .check(Check::Or(vec![
                    Check::columns("lo", CheckOp::Lt, "hi"),
                    Check::value("hi", CheckOp::Eq, 0),
                ])),
        );
        let (sql, _) = render(&PostgresDialect::new(), &table);
        let tree = sql.find("CHECK ((\"lo\" < \"hi\" OR \"hi\" = 0))").unwrap();
        let column = sql.find("CHECK (\"lo\" > -5)").unwrap();
        assert!(tree < column);
    }

    #[test]
    fn test_foreign_key_actions() {
        let table = Schema::new()
            .table(Table::new("purchase").column(Column::new("id", Kind::int()).primary()))
            .table(
                Table::new("line")
                    .column(Column::new("id", Kind::int()).primary())
                    .column(
                        Column::new("order_id", Kind::int()).references(
                            ForeignKey::new("purchase", "id")
                                .on_delete(ChangeRule::Cascade)
                                .on_update(ChangeRule::Cascade),
                        ),
                    ),
            )
            .flatten()
            .unwrap()
            .tables
            .remove(1);
        let (sql, warnings) = render(&PostgresDialect::new(), &table);
        assert!(sql.contains(
            "CONSTRAINT \"line_fk_1\" FOREIGN KEY (\"order_id\") REFERENCES \"purchase\" (\"id\") \
             ON DELETE CASCADE ON UPDATE CASCADE"
        ));
        assert!(warnings.is_empty());

        let (sql, warnings) = render(&OracleDialect::new(), &table);
        assert!(sql.contains("ON DELETE CASCADE"));
        assert!(!sql.contains("ON UPDATE"));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_enum_strategies() {
        let table = flat(
            Table::new("ticket")
                .column(Column::new("id", Kind::int()).primary())
                .column(Column::new("state", Kind::enumeration(["open", "closed"])).not_null()),
        );
        let (sql, _) = render(&PostgresDialect::new(), &table);
        assert!(sql.contains("\"state\" \"ticket_state\" NOT NULL"));

        let (sql, _) = render(&DerbyDialect::new(), &table);
        assert!(sql.contains("\"state\" VARCHAR(6) NOT NULL"));
        assert!(sql.contains("CHECK (\"state\" IN ('open', 'closed'))"));
    }

    #[test]
    fn test_unsigned_degrades_to_check() {
        let table = flat(
            Table::new("counter")
                .column(Column::new("id", Kind::int()).primary())
                .column(Column::new("hits", Kind::int().unsigned())),
        );
        let (sql, _) = render(&SqliteDialect::new(), &table);
        assert!(sql.contains("CHECK (\"hits\" >= 0)"));
        let (sql, _) = render(&MySqlDialect::mysql(), &table);
        assert!(!sql.contains(">= 0"));
    }

    #[test]
    fn test_index_type_placement() {
        let table = flat(
            Table::new("tag")
                .column(Column::new("id", Kind::int()).primary())
                .column(Column::new("label", Kind::varchar(20)).indexed(true, IndexType::Hash)),
        );
        let pg = PostgresDialect::new();
        let mut ctx = Compilation::new(&pg, QuotePolicy::Always);
        let statements = create_indexes(&mut ctx, &table);
        assert_eq!(
            statements[0].sql,
            "CREATE UNIQUE INDEX \"tag_label_idx\" ON \"tag\" USING HASH (\"label\")"
        );

        let dialect = MySqlDialect::mysql();
        let mut ctx = Compilation::new(&dialect, QuotePolicy::Always);
        let statements = create_indexes(&mut ctx, &table);
        assert_eq!(
            statements[0].sql,
            "CREATE UNIQUE INDEX `tag_label_idx` ON `tag` (`label`) USING HASH"
        );

        let dialect = SqliteDialect::new();
        let mut ctx = Compilation::new(&dialect, QuotePolicy::Always);
        let statements = create_indexes(&mut ctx, &table);
        assert_eq!(
            statements[0].sql,
            "CREATE UNIQUE INDEX \"tag_label_idx\" ON \"tag\" (\"label\")"
        );
        assert_eq!(ctx.warnings().len(), 1);
    }
}
