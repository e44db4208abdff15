//! Result row decoding.

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::types::{Kind, Value};

/// One result column of a SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanColumn {
    /// Column label as selected.
    pub label: String,
    /// Table key for columns of a whole-entity item, `None` for
    /// expressions.
    pub entity: Option<String>,
    /// Expected kind.
    pub kind: Kind,
}

/// How to turn raw driver values into typed values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowPlan {
    /// Leading raw columns to ignore, e.g. Oracle's ROWNUM.
    pub skip: usize,
    /// Result columns in order.
    pub columns: Vec<PlanColumn>,
}

impl RowPlan {
    /// Decodes one raw row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when a value cannot be converted to its
    /// column kind or the row is too short.
    pub fn decode(&self, dialect: &dyn Dialect, raw: Vec<Value>) -> Result<Vec<Value>> {
        let mut values = raw.into_iter().skip(self.skip);
        self.columns
            .iter()
            .enumerate()
            .map(|(position, column)| {
                let Some(value) = values.next() else {
                    return Err(Error::Decode {
                        position,
                        expected: column.kind.to_string(),
                        found: "end of row".to_string(),
                    });
                };
                let found = value.type_name();
                dialect
                    .decode_value(&column.kind, value)
                    .ok_or_else(|| Error::Decode {
                        position,
                        expected: column.kind.to_string(),
                        found: found.to_string(),
                    })
            })
            .collect()
    }

    /// Position of a column label.
    #[must_use]
    pub fn position(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{OracleDialect, SqliteDialect};

    fn column(label: &str, kind: Kind) -> PlanColumn {
        PlanColumn {
            label: label.to_string(),
            entity: None,
            kind,
        }
    }

    #[test]
    fn test_decode_skips_rownum() {
        let plan = RowPlan {
            skip: 1,
            columns: vec![column("c1", Kind::Boolean), column("c2", Kind::int())],
        };
        let row = plan
            .decode(
                &OracleDialect::new(),
                vec![Value::Integer(7), Value::Integer(1), Value::Integer(42)],
            )
            .unwrap();
        assert_eq!(row, vec![Value::Boolean(true), Value::Integer(42)]);
    }

    #[test]
    fn test_decode_error_names_position() {
        let plan = RowPlan {
            skip: 0,
            columns: vec![column("d", Kind::Date)],
        };
        let err = plan
            .decode(&SqliteDialect::new(), vec![Value::from("not a date")])
            .unwrap_err();
        assert!(matches!(err, Error::Decode { position: 0, .. }));
    }

    #[test]
    fn test_short_row() {
        let plan = RowPlan {
            skip: 0,
            columns: vec![column("a", Kind::int()), column("b", Kind::int())],
        };
        let err = plan
            .decode(&SqliteDialect::new(), vec![Value::Integer(1)])
            .unwrap_err();
        assert!(matches!(err, Error::Decode { position: 1, .. }));
    }
}
