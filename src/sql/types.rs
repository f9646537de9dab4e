//! Type mapping between SQL column types and canonical schema types.

use super::Dialect;

/// Map an SQL type name to its canonical schema type. Size parameters are
/// ignored; unknown types pass through lower-cased.
pub fn canonical_type(sql_type: &str) -> String {
    let lower = sql_type.to_lowercase();
    let base = lower.split('(').next().unwrap_or(&lower).trim();

    let canonical = match base {
        // Integer types
        "int" | "integer" | "bigint" | "smallint" | "tinyint" | "mediumint" | "int2"
        | "int4" | "int8" | "serial" | "bigserial" | "smallserial" => "integer",

        // Floating point / fixed point
        "float" | "double" | "real" | "float4" | "float8" => "float",
        "decimal" | "numeric" | "money" => "decimal",

        // String types
        "varchar" | "nvarchar" | "char" | "nchar" | "character" => "varchar",
        "text" | "ntext" | "longtext" | "mediumtext" | "tinytext" => "text",

        // Date/time
        "datetime" | "datetime2" | "timestamp" | "timestamptz" | "date" | "time" => {
            "timestamp"
        }

        // Boolean
        "bit" | "bool" | "boolean" => "boolean",

        // UUID
        "uuid" | "uniqueidentifier" => "uuid",

        // Default: keep original
        _ => base,
    };
    canonical.to_string()
}

/// Whether an SQL type implies an auto-incrementing column.
pub fn is_serial_type(sql_type: &str) -> bool {
    matches!(
        sql_type.to_lowercase().as_str(),
        "serial" | "bigserial" | "smallserial"
    )
}

/// Map a canonical schema type to the dialect's SQL type. Unknown types are
/// upper-cased.
pub fn dialect_type(typ: &str, dialect: Dialect) -> String {
    let mapped = match dialect {
        Dialect::PostgreSQL => map_postgres_type(typ),
        Dialect::MySQL => map_mysql_type(typ),
        Dialect::SQLite => map_sqlite_type(typ),
        Dialect::SqlServer => map_sqlserver_type(typ),
    };
    mapped.map_or_else(|| typ.to_uppercase(), str::to_string)
}

fn map_postgres_type(typ: &str) -> Option<&'static str> {
    Some(match typ {
        "integer" => "INTEGER",
        "varchar" => "VARCHAR(255)",
        "text" => "TEXT",
        "timestamp" => "TIMESTAMP",
        "boolean" => "BOOLEAN",
        "float" => "REAL",
        "decimal" => "DECIMAL",
        "uuid" => "UUID",
        _ => return None,
    })
}

fn map_mysql_type(typ: &str) -> Option<&'static str> {
    Some(match typ {
        "integer" => "INT",
        "varchar" => "VARCHAR(255)",
        "text" => "TEXT",
        "timestamp" => "TIMESTAMP",
        "boolean" => "TINYINT(1)",
        "float" => "FLOAT",
        "decimal" => "DECIMAL",
        "uuid" => "CHAR(36)",
        _ => return None,
    })
}

fn map_sqlite_type(typ: &str) -> Option<&'static str> {
    Some(match typ {
        "integer" | "boolean" => "INTEGER",
        "varchar" | "text" | "timestamp" | "uuid" => "TEXT",
        "float" | "decimal" => "REAL",
        _ => return None,
    })
}

fn map_sqlserver_type(typ: &str) -> Option<&'static str> {
    Some(match typ {
        "integer" => "INT",
        "varchar" => "NVARCHAR(255)",
        "text" => "NVARCHAR(MAX)",
        "timestamp" => "DATETIME2",
        "boolean" => "BIT",
        "float" => "FLOAT",
        "decimal" => "DECIMAL",
        "uuid" => "UNIQUEIDENTIFIER",
        _ => return None,
    })
}
