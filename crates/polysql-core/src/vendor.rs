//! The closed set of supported database vendors and their dialects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dialect::{
    DerbyDialect, Dialect, MySqlDialect, OracleDialect, PostgresDialect, SqliteDialect,
};
use crate::error::{Error, Result};

/// A supported database vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// MySQL.
    MySql,
    /// MariaDB.
    MariaDb,
    /// PostgreSQL.
    PostgreSql,
    /// Oracle Database.
    Oracle,
    /// SQLite.
    Sqlite,
    /// Apache Derby.
    Derby,
}

impl Vendor {
    /// Every vendor, in registry order.
    pub const ALL: [Self; 6] = [
        Self::MySql,
        Self::MariaDb,
        Self::PostgreSql,
        Self::Oracle,
        Self::Sqlite,
        Self::Derby,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::MariaDb => "mariadb",
            Self::PostgreSql => "postgresql",
            Self::Oracle => "oracle",
            Self::Sqlite => "sqlite",
            Self::Derby => "derby",
        }
    }

    /// The dialect registered for this vendor.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        REGISTRY.dialect(self)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Vendor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::MySql),
            "mariadb" => Ok(Self::MariaDb),
            "postgresql" | "postgres" | "pg" => Ok(Self::PostgreSql),
            "oracle" => Ok(Self::Oracle),
            "sqlite" => Ok(Self::Sqlite),
            "derby" => Ok(Self::Derby),
            _ => Err(Error::UnsupportedVendor(s.to_string())),
        }
    }
}

static MYSQL: MySqlDialect = MySqlDialect::mysql();
static MARIADB: MySqlDialect = MySqlDialect::mariadb();
static POSTGRES: PostgresDialect = PostgresDialect::new();
static ORACLE: OracleDialect = OracleDialect::new();
static SQLITE: SqliteDialect = SqliteDialect::new();
static DERBY: DerbyDialect = DerbyDialect::new();

/// Static mapping of vendors to dialects.
pub static REGISTRY: DialectRegistry = DialectRegistry {
    entries: [
        (Vendor::MySql, &MYSQL),
        (Vendor::MariaDb, &MARIADB),
        (Vendor::PostgreSql, &POSTGRES),
        (Vendor::Oracle, &ORACLE),
        (Vendor::Sqlite, &SQLITE),
        (Vendor::Derby, &DERBY),
    ],
};

/// Maps each [`Vendor`] to exactly one [`Dialect`].
pub struct DialectRegistry {
    entries: [(Vendor, &'static dyn Dialect); 6],
}

impl DialectRegistry {
    /// Looks up a dialect by vendor name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVendor`] for an unknown name.
    pub fn get(&self, name: &str) -> Result<&'static dyn Dialect> {
        let vendor: Vendor = name.parse()?;
        Ok(self.dialect(vendor))
    }

    /// The dialect of a known vendor.
    #[must_use]
    pub fn dialect(&self, vendor: Vendor) -> &'static dyn Dialect {
        // Entries are laid out in `Vendor` discriminant order.
        self.entries[vendor as usize].1
    }

    /// Iterates over every registered vendor and its dialect.
    pub fn iter(&self) -> impl Iterator<Item = (Vendor, &'static dyn Dialect)> + '_ {
        self.entries.iter().copied()
    }
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(v, _)| v))
            .finish()
    }
}
