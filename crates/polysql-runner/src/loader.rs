//! Schema documents.
//!
//! A schema document is the JSON form of [`Schema`]: a `tables` array in
//! declaration order, each table with its columns, constraints and indexes.

use std::path::Path;

use polysql_core::Schema;
use tracing::debug;

use crate::error::{Result, RunnerError};

/// Parses a schema document.
pub fn parse_schema(json: &str) -> Result<Schema> {
    Ok(serde_json::from_str(json)?)
}

/// Reads and parses a schema document from disk.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let json = std::fs::read_to_string(path)?;
    let schema: Schema =
        serde_json::from_str(&json).map_err(|source| RunnerError::SchemaFile {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), tables = schema.tables.len(), "Loaded schema");
    Ok(schema)
}

/// Renders a schema as a pretty-printed document.
pub fn to_json(schema: &Schema) -> Result<String> {
    Ok(serde_json::to_string_pretty(schema)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polysql_core::{Kind, Value};

    const DOCUMENT: &str = r#"{
        "tables": [
            {
                "name": "person",
                "columns": [
                    {"name": "id", "kind": {"type": "integer", "width": "big"}, "nullable": false, "primary": true},
                    {"name": "nick", "kind": {"type": "char", "length": 20, "varying": true}, "default": {"text": "anon"}}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_document() {
        let schema = parse_schema(DOCUMENT).unwrap();
        let person = &schema.tables[0];
        assert_eq!(person.name, "person");
        assert_eq!(person.columns[0].kind, Kind::bigint());
        assert!(!person.columns[0].nullable);
        assert!(person.columns[1].nullable);
        assert_eq!(person.columns[1].default, Some(Value::from("anon")));
    }

    #[test]
    fn test_json_round_trip() {
        let schema = parse_schema(DOCUMENT).unwrap();
        let reparsed = parse_schema(&to_json(&schema).unwrap()).unwrap();
        assert_eq!(schema, reparsed);
    }

    #[test]
    fn test_bad_document() {
        assert!(matches!(
            parse_schema("{\"tables\": 3}"),
            Err(RunnerError::Serialization(_))
        ));
    }
}
