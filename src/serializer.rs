//! Serializer for converting a Schema back to schema-text notation.

use crate::ast::{Column, Relationship, Schema, Table};

/// Serialize a Schema to canonical schema text.
pub fn serialize(schema: &Schema) -> String {
    let mut output = String::new();

    for table in &schema.tables {
        serialize_table(&mut output, table);
        output.push('\n');
    }

    for rel in &schema.relationships {
        serialize_relationship(&mut output, rel);
    }

    output
}

fn serialize_table(output: &mut String, table: &Table) {
    output.push_str(&format!("Table {} {{\n", table.name));
    for column in &table.columns {
        serialize_column(output, column);
    }
    output.push_str("}\n");
}

fn serialize_column(output: &mut String, column: &Column) {
    output.push_str(&format!("  {} {}", column.name, column.typ));

    // Settings in order: pk, unique, increment, not null, default, note
    let mut settings: Vec<String> = Vec::new();
    if column.is_primary_key {
        settings.push("primary key".to_string());
    }
    if column.is_unique {
        settings.push("unique".to_string());
    }
    if column.is_increment {
        settings.push("increment".to_string());
    }
    // Primary keys are implicitly not null
    if column.is_not_null && !column.is_primary_key {
        settings.push("not null".to_string());
    }
    if let Some(default) = &column.default {
        settings.push(format!("default: {}", default));
    }
    if let Some(note) = &column.note {
        let quote = if note.contains('\'') { '"' } else { '\'' };
        settings.push(format!("note: {quote}{note}{quote}"));
    }

    if !settings.is_empty() {
        output.push_str(&format!(" [{}]", settings.join(", ")));
    }
    output.push('\n');
}

pub(crate) fn serialize_relationship(output: &mut String, rel: &Relationship) {
    output.push_str(&format!(
        "Ref: {}.{} {} {}.{}\n",
        rel.from.table,
        rel.from.column,
        rel.cardinality.operator(),
        rel.to.table,
        rel.to.column
    ));
}
