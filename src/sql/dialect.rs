//! SQL dialect detection and handling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown dialect: {name} (expected one of {expected})", expected = Dialect::ALL.map(Dialect::name).join(", "))]
pub struct UnknownDialect {
    pub name: String,
}

/// SQL dialect variants supported by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL
    #[default]
    PostgreSQL,
    /// MySQL / MariaDB
    MySQL,
    /// SQLite
    SQLite,
    /// Microsoft SQL Server
    SqlServer,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Self::PostgreSQL,
        Self::MySQL,
        Self::SQLite,
        Self::SqlServer,
    ];

    /// Parse dialect from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::PostgreSQL),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "sqlite" => Some(Self::SQLite),
            "sqlserver" | "mssql" | "tsql" => Some(Self::SqlServer),
            _ => None,
        }
    }

    /// Like `from_str`, with an error listing the known names.
    pub fn parse(name: &str) -> Result<Self, UnknownDialect> {
        Self::from_str(name).ok_or_else(|| UnknownDialect {
            name: name.to_string(),
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
            Self::SqlServer => "sqlserver",
        }
    }

    /// Quote an identifier the way this dialect expects.
    pub fn quote(self, ident: &str) -> String {
        match self {
            Self::MySQL => format!("`{}`", ident),
            Self::SqlServer => format!("[{}]", ident),
            Self::PostgreSQL | Self::SQLite => format!("\"{}\"", ident),
        }
    }

    /// Detect dialect from SQL content. Falls back to PostgreSQL.
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();

        // Check header comments
        if lower.contains("postgresql database dump") || lower.contains("pg_dump") {
            return Self::PostgreSQL;
        }
        if lower.contains("mysql dump") || lower.contains("mysqldump") {
            return Self::MySQL;
        }

        // Check quoting and type keywords
        if lower.contains("nvarchar")
            || lower.contains("uniqueidentifier")
            || lower.contains("identity")
            || lower.contains("create table [")
        {
            return Self::SqlServer;
        }
        if lower.contains("auto_increment")
            || lower.contains("engine=")
            || lower.contains("unsigned")
            || lower.contains('`')
        {
            return Self::MySQL;
        }
        if lower.contains("autoincrement") || lower.contains("without rowid") {
            return Self::SQLite;
        }

        Self::PostgreSQL
    }
}
