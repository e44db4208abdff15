//! Reserved words of the SQL standards.

const SQL92: u8 = 1;
const SQL99: u8 = 2;
const SQL2003: u8 = 4;
const ALL: u8 = SQL92 | SQL99 | SQL2003;
const SINCE99: u8 = SQL99 | SQL2003;

/// Sorted by word so lookups can binary search.
static WORDS: &[(&str, u8)] = &[
    ("ABSOLUTE", SQL92 | SQL99),
    ("ACTION", SQL92 | SQL99),
    ("ADD", ALL),
    ("ALL", ALL),
    ("ALLOCATE", ALL),
    ("ALTER", ALL),
    ("AND", ALL),
    ("ANY", ALL),
    ("ARE", ALL),
    ("ARRAY", SINCE99),
    ("AS", ALL),
    ("ASC", SQL92 | SQL99),
    ("ASSERTION", SQL92 | SQL99),
    ("AT", ALL),
    ("AUTHORIZATION", ALL),
    ("AVG", SQL92),
    ("BEGIN", ALL),
    ("BETWEEN", ALL),
    ("BIGINT", SQL2003),
    ("BINARY", SINCE99),
    ("BIT", SQL92 | SQL99),
    ("BLOB", SINCE99),
    ("BOOLEAN", SINCE99),
    ("BOTH", ALL),
    ("BY", ALL),
    ("CALL", SINCE99),
    ("CASCADE", SQL92 | SQL99),
    ("CASE", ALL),
    ("CAST", ALL),
    ("CHAR", ALL),
    ("CHARACTER", ALL),
    ("CHECK", ALL),
    ("CLOB", SINCE99),
    ("CLOSE", ALL),
    ("COLLATE", ALL),
    ("COLUMN", ALL),
    ("COMMIT", ALL),
    ("CONNECT", ALL),
    ("CONSTRAINT", ALL),
    ("CONTINUE", ALL),
    ("COUNT", SQL92),
    ("CREATE", ALL),
    ("CROSS", ALL),
    ("CURRENT", ALL),
    ("CURRENT_DATE", ALL),
    ("CURRENT_TIME", ALL),
    ("CURRENT_TIMESTAMP", ALL),
    ("CURRENT_USER", ALL),
    ("CURSOR", ALL),
    ("DATE", ALL),
    ("DAY", ALL),
    ("DEALLOCATE", ALL),
    ("DEC", ALL),
    ("DECIMAL", ALL),
    ("DECLARE", ALL),
    ("DEFAULT", ALL),
    ("DELETE", ALL),
    ("DESC", SQL92 | SQL99),
    ("DESCRIBE", ALL),
    ("DISTINCT", ALL),
    ("DOUBLE", ALL),
    ("DROP", ALL),
    ("ELSE", ALL),
    ("END", ALL),
    ("ESCAPE", ALL),
    ("EXCEPT", ALL),
    ("EXEC", ALL),
    ("EXECUTE", ALL),
    ("EXISTS", ALL),
    ("EXTERNAL", ALL),
    ("FALSE", ALL),
    ("FETCH", ALL),
    ("FLOAT", ALL),
    ("FOR", ALL),
    ("FOREIGN", ALL),
    ("FROM", ALL),
    ("FULL", ALL),
    ("FUNCTION", SINCE99),
    ("GET", ALL),
    ("GLOBAL", ALL),
    ("GRANT", ALL),
    ("GROUP", ALL),
    ("HAVING", ALL),
    ("HOUR", ALL),
    ("IDENTITY", ALL),
    ("IN", ALL),
    ("INDEX", SQL92),
    ("INNER", ALL),
    ("INSERT", ALL),
    ("INT", ALL),
    ("INTEGER", ALL),
    ("INTERSECT", ALL),
    ("INTERVAL", ALL),
    ("INTO", ALL),
    ("IS", ALL),
    ("JOIN", ALL),
    ("KEY", SQL92 | SQL99),
    ("LEADING", ALL),
    ("LEFT", ALL),
    ("LIKE", ALL),
    ("LOCAL", ALL),
    ("MATCH", ALL),
    ("MAX", SQL92),
    ("MERGE", SQL2003),
    ("MIN", SQL92),
    ("MINUTE", ALL),
    ("MONTH", ALL),
    ("NATURAL", ALL),
    ("NO", ALL),
    ("NOT", ALL),
    ("NULL", ALL),
    ("NUMERIC", ALL),
    ("OF", ALL),
    ("ON", ALL),
    ("ONLY", ALL),
    ("OPEN", ALL),
    ("OR", ALL),
    ("ORDER", ALL),
    ("OUTER", ALL),
    ("OVERLAPS", ALL),
    ("PRIMARY", ALL),
    ("PROCEDURE", ALL),
    ("REAL", ALL),
    ("REFERENCES", ALL),
    ("RESTRICT", SQL92 | SQL99),
    ("REVOKE", ALL),
    ("RIGHT", ALL),
    ("ROLLBACK", ALL),
    ("ROW", SINCE99),
    ("ROWS", ALL),
    ("SECOND", ALL),
    ("SELECT", ALL),
    ("SESSION_USER", ALL),
    ("SET", ALL),
    ("SIZE", SQL92 | SQL99),
    ("SMALLINT", ALL),
    ("SOME", ALL),
    ("SUM", SQL92),
    ("SYSTEM_USER", ALL),
    ("TABLE", ALL),
    ("THEN", ALL),
    ("TIME", ALL),
    ("TIMESTAMP", ALL),
    ("TO", ALL),
    ("TRAILING", ALL),
    ("TRIGGER", SINCE99),
    ("TRUE", ALL),
    ("UNION", ALL),
    ("UNIQUE", ALL),
    ("UNKNOWN", ALL),
    ("UPDATE", ALL),
    ("USER", ALL),
    ("USING", ALL),
    ("VALUE", ALL),
    ("VALUES", ALL),
    ("VARCHAR", ALL),
    ("VIEW", SQL92 | SQL99),
    ("WHEN", ALL),
    ("WHERE", ALL),
    ("WINDOW", SINCE99),
    ("WITH", ALL),
    ("YEAR", ALL),
    ("ZONE", SQL92 | SQL99),
];

/// Returns the standards that reserve `word`, or `None` if it is free.
#[must_use]
pub fn lookup(word: &str) -> Option<Vec<&'static str>> {
    let upper = word.to_ascii_uppercase();
    let index = WORDS.binary_search_by(|(w, _)| (*w).cmp(upper.as_str())).ok()?;
    let flags = WORDS[index].1;
    let mut standards = Vec::new();
    if flags & SQL92 != 0 {
        standards.push("SQL-92");
    }
    if flags & SQL99 != 0 {
        standards.push("SQL-99");
    }
    if flags & SQL2003 != 0 {
        standards.push("SQL-2003");
    }
    Some(standards)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_are_sorted() {
        assert!(WORDS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_lookup_case_insensitive() {
        assert_eq!(lookup("order"), Some(vec!["SQL-92", "SQL-99", "SQL-2003"]));
        assert_eq!(lookup("Merge"), Some(vec!["SQL-2003"]));
        assert_eq!(lookup("customer"), None);
    }
}
