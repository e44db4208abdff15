//! Expression and predicate AST.
//!
//! [`Expr`] is dialect independent. Every node has a result [`Kind`]
//! ([`Expr::result_type`]), can be folded in process when its operands are
//! constant ([`Expr::evaluate`]), and compiles through a [`Dialect`]
//! into SQL text with bound parameters.
//!
//! [`Dialect`]: crate::dialect::Dialect

mod compile;
mod evaluate;
mod infer;

pub(crate) use compile::{compile, compile_projection};

use crate::dml::Select;
use crate::error::{Result, SchemaError};
use crate::schema::FlatTable;
use crate::types::{Interval, Kind, Value};

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Remainder, compiled as `MOD` or `%` per dialect.
    Rem,
}

impl ArithmeticOp {
    /// Returns the SQL operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }
}

/// String operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringOp {
    /// Concatenation of all arguments.
    Concat,
    /// `LOWER(s)`.
    Lower,
    /// `UPPER(s)`.
    Upper,
    /// `TRIM(s)`.
    Trim,
    /// `LTRIM(s)`.
    LTrim,
    /// `RTRIM(s)`.
    RTrim,
    /// Character length.
    Length,
    /// `SUBSTRING(s, start[, length])`, 1-based.
    Substring,
}

/// Adding or subtracting an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalOp {
    /// `x + interval`.
    Add,
    /// `x - interval`.
    Sub,
}

/// Scalar functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Sign,
    /// `ROUND(x)` or `ROUND(x, digits)`.
    Round,
    Floor,
    Ceil,
    Sqrt,
    /// `POWER(x, y)`.
    Power,
    Exp,
    Ln,
    /// `LOG(base, x)`.
    Log,
    Log2,
    Log10,
    Pi,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    /// `ATAN2(y, x)`.
    Atan2,
    CurrentDate,
    CurrentTime,
    /// `CURRENT_TIMESTAMP`, also known as `NOW()`.
    CurrentTimestamp,
}

impl Function {
    /// Standard SQL name.
    #[must_use]
    pub const fn sql_name(&self) -> &'static str {
        match self {
            Self::Abs => "ABS",
            Self::Sign => "SIGN",
            Self::Round => "ROUND",
            Self::Floor => "FLOOR",
            Self::Ceil => "CEIL",
            Self::Sqrt => "SQRT",
            Self::Power => "POWER",
            Self::Exp => "EXP",
            Self::Ln => "LN",
            Self::Log => "LOG",
            Self::Log2 => "LOG2",
            Self::Log10 => "LOG10",
            Self::Pi => "PI",
            Self::Sin => "SIN",
            Self::Cos => "COS",
            Self::Tan => "TAN",
            Self::Asin => "ASIN",
            Self::Acos => "ACOS",
            Self::Atan => "ATAN",
            Self::Atan2 => "ATAN2",
            Self::CurrentDate => "CURRENT_DATE",
            Self::CurrentTime => "CURRENT_TIME",
            Self::CurrentTimestamp => "CURRENT_TIMESTAMP",
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    /// Returns the SQL name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    /// Returns the SQL operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    And,
    Or,
}

impl BooleanOp {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// How a value is compared against a sub-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    In,
    NotIn,
    Exists,
    NotExists,
    Any(ComparisonOp),
    All(ComparisonOp),
}

/// A typed column reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Key of the table in the query, usually its name.
    pub table: String,
    /// Column name.
    pub name: String,
    /// Declared kind.
    pub kind: Kind,
}

/// A CASE expression, simple when `operand` is set, searched otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    /// Operand compared against each WHEN value.
    pub operand: Option<Expr>,
    /// WHEN / THEN pairs in order.
    pub whens: Vec<(Expr, Expr)>,
    /// ELSE branch.
    pub otherwise: Option<Expr>,
}

/// An SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant, bound as a parameter.
    Literal(Value),
    /// A typed NULL.
    Null(Kind),
    /// A column reference.
    Column(ColumnRef),
    /// Binary arithmetic.
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// String operation.
    String { op: StringOp, args: Vec<Expr> },
    /// Interval arithmetic on a temporal operand.
    Temporal {
        op: TemporalOp,
        operand: Box<Expr>,
        interval: Interval,
    },
    /// Scalar function call.
    Function { func: Function, args: Vec<Expr> },
    /// Aggregate call; `arg` is `None` for `COUNT(*)`.
    Aggregate {
        func: Aggregate,
        distinct: bool,
        arg: Option<Box<Expr>>,
    },
    /// CASE expression.
    Case(Box<Case>),
    /// `CAST(expr AS kind)`.
    Cast { expr: Box<Expr>, kind: Kind },
    /// Binary comparison.
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// AND / OR over any number of operands.
    Boolean { op: BooleanOp, operands: Vec<Expr> },
    /// Logical negation.
    Not(Box<Expr>),
    /// `[NOT] BETWEEN`, inclusive; `positive = false` is `NOT BETWEEN`.
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        positive: bool,
    },
    /// `[NOT] LIKE`.
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        positive: bool,
    },
    /// `IS [NOT] NULL`.
    IsNull { expr: Box<Expr>, positive: bool },
    /// `[NOT] IN (list)`.
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        positive: bool,
    },
    /// Comparison against a sub-query; `expr` is `None` for EXISTS.
    Quantified {
        quantifier: Quantifier,
        expr: Option<Box<Expr>>,
        query: Box<Select>,
    },
    /// Scalar sub-query.
    Subquery(Box<Select>),
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<ColumnRef> for Expr {
    fn from(column: ColumnRef) -> Self {
        Self::Column(column)
    }
}

impl Expr {
    /// A literal.
    pub fn lit(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// A typed NULL.
    #[must_use]
    pub const fn null(kind: Kind) -> Self {
        Self::Null(kind)
    }

    /// A column of the table registered under `table`.
    pub fn column(table: impl Into<String>, name: impl Into<String>, kind: Kind) -> Self {
        Self::Column(ColumnRef {
            table: table.into(),
            name: name.into(),
            kind,
        })
    }

    fn arithmetic(self, op: ArithmeticOp, other: impl Into<Self>) -> Self {
        Self::Arithmetic {
            op,
            left: Box::new(self),
            right: Box::new(other.into()),
        }
    }

    /// `self + other`.
    #[must_use]
    pub fn plus(self, other: impl Into<Self>) -> Self {
        self.arithmetic(ArithmeticOp::Add, other)
    }

    /// `self - other`.
    #[must_use]
    pub fn minus(self, other: impl Into<Self>) -> Self {
        self.arithmetic(ArithmeticOp::Sub, other)
    }

    /// `self * other`.
    #[must_use]
    pub fn times(self, other: impl Into<Self>) -> Self {
        self.arithmetic(ArithmeticOp::Mul, other)
    }

    /// `self / other`.
    #[must_use]
    pub fn divided_by(self, other: impl Into<Self>) -> Self {
        self.arithmetic(ArithmeticOp::Div, other)
    }

    /// `MOD(self, other)`.
    #[must_use]
    pub fn modulo(self, other: impl Into<Self>) -> Self {
        self.arithmetic(ArithmeticOp::Rem, other)
    }

    /// Concatenation.
    #[must_use]
    pub fn concat(self, other: impl Into<Self>) -> Self {
        match self {
            Self::String {
                op: StringOp::Concat,
                mut args,
            } => {
                args.push(other.into());
                Self::String {
                    op: StringOp::Concat,
                    args,
                }
            }
            this => Self::String {
                op: StringOp::Concat,
                args: vec![this, other.into()],
            },
        }
    }

    /// Unary string operation.
    #[must_use]
    pub fn string(op: StringOp, arg: Self) -> Self {
        Self::String {
            op,
            args: vec![arg],
        }
    }

    /// `SUBSTRING(self, start[, length])`.
    #[must_use]
    pub fn substring(self, start: i64, length: Option<i64>) -> Self {
        let mut args = vec![self, Self::lit(start)];
        if let Some(length) = length {
            args.push(Self::lit(length));
        }
        Self::String {
            op: StringOp::Substring,
            args,
        }
    }

    /// `self + interval`.
    #[must_use]
    pub fn plus_interval(self, interval: Interval) -> Self {
        Self::Temporal {
            op: TemporalOp::Add,
            operand: Box::new(self),
            interval,
        }
    }

    /// `self - interval`.
    #[must_use]
    pub fn minus_interval(self, interval: Interval) -> Self {
        Self::Temporal {
            op: TemporalOp::Sub,
            operand: Box::new(self),
            interval,
        }
    }

    /// Function call.
    #[must_use]
    pub fn function(func: Function, args: Vec<Self>) -> Self {
        Self::Function { func, args }
    }

    /// `CURRENT_TIMESTAMP`.
    #[must_use]
    pub fn now() -> Self {
        Self::function(Function::CurrentTimestamp, Vec::new())
    }

    /// Aggregate over `arg`.
    #[must_use]
    pub fn aggregate(func: Aggregate, arg: Self) -> Self {
        Self::Aggregate {
            func,
            distinct: false,
            arg: Some(Box::new(arg)),
        }
    }

    /// Aggregate over the distinct values of `arg`.
    #[must_use]
    pub fn aggregate_distinct(func: Aggregate, arg: Self) -> Self {
        Self::Aggregate {
            func,
            distinct: true,
            arg: Some(Box::new(arg)),
        }
    }

    /// `COUNT(*)`.
    #[must_use]
    pub const fn count_all() -> Self {
        Self::Aggregate {
            func: Aggregate::Count,
            distinct: false,
            arg: None,
        }
    }

    /// Searched CASE.
    #[must_use]
    pub fn case_when(whens: Vec<(Self, Self)>, otherwise: Option<Self>) -> Self {
        Self::Case(Box::new(Case {
            operand: None,
            whens,
            otherwise,
        }))
    }

    /// Simple CASE over `operand`.
    #[must_use]
    pub fn case_of(operand: Self, whens: Vec<(Self, Self)>, otherwise: Option<Self>) -> Self {
        Self::Case(Box::new(Case {
            operand: Some(operand),
            whens,
            otherwise,
        }))
    }

    /// `CAST(self AS kind)`.
    #[must_use]
    pub fn cast(self, kind: Kind) -> Self {
        Self::Cast {
            expr: Box::new(self),
            kind,
        }
    }

    fn compare(self, op: ComparisonOp, other: impl Into<Self>) -> Self {
        Self::Comparison {
            op,
            left: Box::new(self),
            right: Box::new(other.into()),
        }
    }

    /// `self = other`.
    #[must_use]
    pub fn eq(self, other: impl Into<Self>) -> Self {
        self.compare(ComparisonOp::Eq, other)
    }

    /// `self <> other`.
    #[must_use]
    pub fn ne(self, other: impl Into<Self>) -> Self {
        self.compare(ComparisonOp::Ne, other)
    }

    /// `self < other`.
    #[must_use]
    pub fn lt(self, other: impl Into<Self>) -> Self {
        self.compare(ComparisonOp::Lt, other)
    }

    /// `self <= other`.
    #[must_use]
    pub fn le(self, other: impl Into<Self>) -> Self {
        self.compare(ComparisonOp::Le, other)
    }

    /// `self > other`.
    #[must_use]
    pub fn gt(self, other: impl Into<Self>) -> Self {
        self.compare(ComparisonOp::Gt, other)
    }

    /// `self >= other`.
    #[must_use]
    pub fn ge(self, other: impl Into<Self>) -> Self {
        self.compare(ComparisonOp::Ge, other)
    }

    fn connect(self, op: BooleanOp, other: Self) -> Self {
        match self {
            Self::Boolean {
                op: existing,
                mut operands,
            } if existing == op => {
                operands.push(other);
                Self::Boolean { op, operands }
            }
            this => Self::Boolean {
                op,
                operands: vec![this, other],
            },
        }
    }

    /// `self AND other`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.connect(BooleanOp::And, other)
    }

    /// `self OR other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.connect(BooleanOp::Or, other)
    }

    /// `NOT self`.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// `self [NOT] BETWEEN low AND high`.
    #[must_use]
    pub fn between(self, low: impl Into<Self>, high: impl Into<Self>, positive: bool) -> Self {
        Self::Between {
            expr: Box::new(self),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            positive,
        }
    }

    /// `self LIKE pattern`.
    #[must_use]
    pub fn like(self, pattern: impl Into<Self>) -> Self {
        Self::Like {
            expr: Box::new(self),
            pattern: Box::new(pattern.into()),
            positive: true,
        }
    }

    /// `self NOT LIKE pattern`.
    #[must_use]
    pub fn not_like(self, pattern: impl Into<Self>) -> Self {
        Self::Like {
            expr: Box::new(self),
            pattern: Box::new(pattern.into()),
            positive: false,
        }
    }

    /// `self IS NULL`.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            positive: true,
        }
    }

    /// `self IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            positive: false,
        }
    }

    /// `self IN (list)`.
    #[must_use]
    pub fn in_list<I, E>(self, list: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Self>,
    {
        Self::InList {
            expr: Box::new(self),
            list: list.into_iter().map(Into::into).collect(),
            positive: true,
        }
    }

    /// `self NOT IN (list)`.
    #[must_use]
    pub fn not_in_list<I, E>(self, list: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Self>,
    {
        Self::InList {
            expr: Box::new(self),
            list: list.into_iter().map(Into::into).collect(),
            positive: false,
        }
    }

    /// `self IN (query)`.
    #[must_use]
    pub fn in_subquery(self, query: Select) -> Self {
        Self::Quantified {
            quantifier: Quantifier::In,
            expr: Some(Box::new(self)),
            query: Box::new(query),
        }
    }

    /// `self NOT IN (query)`.
    #[must_use]
    pub fn not_in_subquery(self, query: Select) -> Self {
        Self::Quantified {
            quantifier: Quantifier::NotIn,
            expr: Some(Box::new(self)),
            query: Box::new(query),
        }
    }

    /// `EXISTS (query)`.
    #[must_use]
    pub fn exists(query: Select) -> Self {
        Self::Quantified {
            quantifier: Quantifier::Exists,
            expr: None,
            query: Box::new(query),
        }
    }

    /// `NOT EXISTS (query)`.
    #[must_use]
    pub fn not_exists(query: Select) -> Self {
        Self::Quantified {
            quantifier: Quantifier::NotExists,
            expr: None,
            query: Box::new(query),
        }
    }

    /// `self op ANY (query)`.
    #[must_use]
    pub fn any(self, op: ComparisonOp, query: Select) -> Self {
        Self::Quantified {
            quantifier: Quantifier::Any(op),
            expr: Some(Box::new(self)),
            query: Box::new(query),
        }
    }

    /// `self op ALL (query)`.
    #[must_use]
    pub fn all(self, op: ComparisonOp, query: Select) -> Self {
        Self::Quantified {
            quantifier: Quantifier::All(op),
            expr: Some(Box::new(self)),
            query: Box::new(query),
        }
    }

    /// Scalar sub-query.
    #[must_use]
    pub fn subquery(query: Select) -> Self {
        Self::Subquery(Box::new(query))
    }

    /// Whether the node yields a truth value rather than a scalar.
    #[must_use]
    pub const fn is_predicate(&self) -> bool {
        matches!(
            self,
            Self::Comparison { .. }
                | Self::Boolean { .. }
                | Self::Not(_)
                | Self::Between { .. }
                | Self::Like { .. }
                | Self::IsNull { .. }
                | Self::InList { .. }
                | Self::Quantified { .. }
        )
    }
}

impl FlatTable {
    /// A typed reference to one of this table's columns.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownColumn`] if the table has no such
    /// column.
    pub fn col(&self, name: &str) -> Result<Expr> {
        let column = self.column(name).ok_or_else(|| SchemaError::UnknownColumn {
            table: self.name.clone(),
            column: name.to_string(),
        })?;
        Ok(Expr::column(&self.name, &column.name, column.kind.clone()))
    }
}
