//! Importers: schema text, SQL DDL and the JSON interchange document.
//!
//! Every importer produces schema text, the editable form. SQL is parsed
//! and re-serialized so the result is always in canonical syntax.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::graph::Position;
use crate::serializer::serialize;
use crate::sql::{Dialect, SqlParseError, parse_sql};

pub const SQL_IMPORT_HEADER: &str = "// Imported from SQL\n\n";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no table definitions found")]
    NoTableDefinitions,
    #[error(transparent)]
    Sql(#[from] SqlParseError),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Imported {
    pub schema_text: String,
    pub node_positions: Option<BTreeMap<String, Position>>,
}

impl Imported {
    fn text(schema_text: String) -> Self {
        Self {
            schema_text,
            node_positions: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Dbml,
    Sql,
    Json,
}

impl ImportFormat {
    pub fn from_file_name(name: impl AsRef<Path>) -> Option<Self> {
        let ext = name.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "dbml" => Some(Self::Dbml),
            "sql" => Some(Self::Sql),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Guess the format from content when there is no file name to go by.
    pub fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('{') && content.contains("\"dbmlCode\"") {
            Self::Json
        } else if content.to_lowercase().contains("create table") {
            Self::Sql
        } else {
            Self::Dbml
        }
    }

    /// The dialect SQL content was written in. Other formats have none.
    pub fn source_dialect(self, content: &str) -> Option<Dialect> {
        (self == Self::Sql).then(|| Dialect::detect(content))
    }
}

pub fn import(format: ImportFormat, content: &str) -> Result<Imported, ImportError> {
    match format {
        ImportFormat::Dbml => import_dbml(content),
        ImportFormat::Sql => import_sql(content),
        ImportFormat::Json => import_json(content),
    }
}

/// Accept schema text as is, provided it declares at least one table.
pub fn import_dbml(content: &str) -> Result<Imported, ImportError> {
    if !content.contains("Table ") && !content.contains("table ") {
        return Err(ImportError::NoTableDefinitions);
    }
    Ok(Imported::text(content.to_string()))
}

pub fn import_sql(content: &str) -> Result<Imported, ImportError> {
    let schema = parse_sql(content)?;
    tracing::info!(
        tables = schema.tables.len(),
        relationships = schema.relationships.len(),
        "imported SQL"
    );
    Ok(Imported::text(format!(
        "{}{}",
        SQL_IMPORT_HEADER,
        serialize(&schema)
    )))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonImport {
    #[serde(default)]
    dbml_code: Option<String>,
    #[serde(default)]
    node_positions: Option<BTreeMap<String, Position>>,
}

pub fn import_json(content: &str) -> Result<Imported, ImportError> {
    let doc: JsonImport = serde_json::from_str(content)?;
    let schema_text = doc
        .dbml_code
        .filter(|code| !code.is_empty())
        .ok_or(ImportError::MissingField("dbmlCode"))?;
    tracing::info!(
        positions = doc.node_positions.as_ref().map_or(0, BTreeMap::len),
        "imported diagram document"
    );
    Ok(Imported {
        schema_text,
        node_positions: doc.node_positions,
    })
}
