//! SQL DDL generation from a Schema.

use super::Dialect;
use super::types::dialect_type;
use crate::ast::{Column, Relationship, Schema, Table};

/// Generate CREATE TABLE statements followed by one ALTER TABLE per
/// relationship.
pub fn generate(schema: &Schema, dialect: Dialect) -> String {
    let mut lines: Vec<String> = Vec::new();

    for table in &schema.tables {
        generate_table(&mut lines, table, dialect);
    }

    for rel in &schema.relationships {
        generate_foreign_key(&mut lines, rel, dialect);
    }

    lines.join("\n")
}

fn generate_table(lines: &mut Vec<String>, table: &Table, dialect: Dialect) {
    lines.push(format!("-- Table: {}", table.name));
    // SQL has no column-less tables
    if table.columns.is_empty() {
        lines.push("-- (no columns, skipped)".to_string());
        lines.push(String::new());
        return;
    }
    lines.push(format!("CREATE TABLE {} (", dialect.quote(&table.name)));

    // (definition, trailing comment)
    let mut defs: Vec<(String, Option<&str>)> = table
        .columns
        .iter()
        .map(|c| (column_definition(c, dialect), c.note.as_deref()))
        .collect();

    // Composite form even for a single key, for uniformity across dialects
    let primary_keys: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.is_primary_key)
        .map(|c| dialect.quote(&c.name))
        .collect();
    if !primary_keys.is_empty() {
        defs.push((format!("  PRIMARY KEY ({})", primary_keys.join(", ")), None));
    }

    let last = defs.len().saturating_sub(1);
    for (i, (def, note)) in defs.into_iter().enumerate() {
        let mut line = def;
        if i < last {
            line.push(',');
        }
        if let Some(note) = note {
            line.push_str(&format!(" -- {}", note.replace('\n', " ")));
        }
        lines.push(line);
    }

    lines.push(");".to_string());
    lines.push(String::new());
}

fn column_definition(column: &Column, dialect: Dialect) -> String {
    let mut typ = dialect_type(&column.typ, dialect);
    let mut increment = None;
    if column.is_increment {
        match dialect {
            Dialect::PostgreSQL if column.typ == "integer" => typ = "SERIAL".to_string(),
            Dialect::MySQL => increment = Some("AUTO_INCREMENT"),
            Dialect::SqlServer => increment = Some("IDENTITY"),
            // SQLite only allows AUTOINCREMENT on an inline INTEGER PRIMARY KEY
            _ => {}
        }
    }

    let mut def = format!("  {} {}", dialect.quote(&column.name), typ);
    if let Some(clause) = increment {
        def.push(' ');
        def.push_str(clause);
    }
    if column.is_unique {
        def.push_str(" UNIQUE");
    }
    if column.is_not_null {
        def.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        def.push_str(&format!(" DEFAULT {}", default_expression(default)));
    }

    def
}

/// Schema-text defaults wrap expressions in backticks; SQL takes them bare.
fn default_expression(default: &str) -> &str {
    default
        .strip_prefix('`')
        .and_then(|d| d.strip_suffix('`'))
        .unwrap_or(default)
}

fn generate_foreign_key(lines: &mut Vec<String>, rel: &Relationship, dialect: Dialect) {
    let constraint_name = format!("fk_{}_{}", rel.from.table, rel.from.column);
    lines.push(format!(
        "-- Foreign Key: {}.{} -> {}.{}",
        rel.from.table, rel.from.column, rel.to.table, rel.to.column
    ));
    lines.push(format!("ALTER TABLE {}", dialect.quote(&rel.from.table)));
    lines.push(format!("  ADD CONSTRAINT {}", dialect.quote(&constraint_name)));
    lines.push(format!("  FOREIGN KEY ({})", dialect.quote(&rel.from.column)));
    lines.push(format!(
        "  REFERENCES {} ({});",
        dialect.quote(&rel.to.table),
        dialect.quote(&rel.to.column)
    ));
    lines.push(String::new());
}
