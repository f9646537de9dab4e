//! SQL importer for CREATE TABLE / ALTER TABLE statements.
//!
//! The importer is deliberately shallow: each CREATE TABLE body runs to the
//! first `);` and is split on every comma, so a type such as
//! `DECIMAL(10,2)` is cut in two. Whatever cannot be recognized is dropped
//! instead of failing the import.

use super::types::{canonical_type, is_serial_type};
use crate::ast::{Cardinality, Column, ColumnRef, Relationship, Schema, Table};
use crate::lexer::{Cursor, is_ident_char};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SqlParseError {
    #[error("no tables found")]
    NoTables,
}

/// Keywords that start a table-level constraint instead of a column.
const CONSTRAINT_KEYWORDS: [&str; 7] = [
    "PRIMARY",
    "FOREIGN",
    "UNIQUE",
    "CHECK",
    "CONSTRAINT",
    "KEY",
    "INDEX",
];

/// Parse SQL DDL into a Schema.
pub fn parse_sql(input: &str) -> Result<Schema, SqlParseError> {
    let source = strip_comments(input);
    let mut tables = Vec::new();
    let mut relationships = Vec::new();

    for (name, body) in create_statements(&source) {
        let (table, fks) = parse_table_body(name, body);
        relationships.extend(fks);
        if !table.columns.is_empty() {
            tables.push(table);
        }
    }

    relationships.extend(alter_table_foreign_keys(&source));

    if tables.is_empty() {
        return Err(SqlParseError::NoTables);
    }

    let mut schema = Schema {
        tables,
        relationships,
    };
    schema.mark_foreign_keys();

    tracing::debug!(
        tables = schema.tables.len(),
        relationships = schema.relationships.len(),
        "parsed SQL"
    );
    Ok(schema)
}

/// Remove `-- ...` and `/* ... */` comments, leaving string literals intact.
fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\'' {
                in_string = false;
            }
            continue;
        }
        match c {
            '\'' => {
                in_string = true;
                out.push(c);
            }
            '-' if chars.peek() == Some(&'-') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out
}

/// Every `CREATE TABLE [IF NOT EXISTS] [schema.]name ( body );` as
/// `(name, body)`. A statement without its `);` terminator is skipped.
fn create_statements(source: &str) -> Vec<(&str, &str)> {
    let mut cursor = Cursor::new(source);
    let mut statements = Vec::new();

    while cursor.find_keyword("create").is_some() {
        let resume = cursor.pos();
        match create_table_tail(&mut cursor) {
            Some(statement) => statements.push(statement),
            None => cursor.set_pos(resume),
        }
    }

    statements
}

fn create_table_tail<'a>(cursor: &mut Cursor<'a>) -> Option<(&'a str, &'a str)> {
    cursor.skip_whitespace();
    if !cursor.eat_keyword("table") {
        return None;
    }
    cursor.skip_whitespace();

    // Skip IF NOT EXISTS
    if cursor.eat_keyword("if") {
        cursor.skip_whitespace();
        cursor.eat_keyword("not");
        cursor.skip_whitespace();
        cursor.eat_keyword("exists");
        cursor.skip_whitespace();
    }

    let name = eat_table_name(cursor)?;
    cursor.skip_whitespace();
    if !cursor.eat('(') {
        return None;
    }
    let body = cursor.take_until(");")?;
    Some((name, body))
}

fn parse_table_body(table_name: &str, body: &str) -> (Table, Vec<Relationship>) {
    let mut columns = Vec::new();
    let mut relationships = Vec::new();

    for piece in body.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if is_table_constraint(piece) {
            continue;
        }
        if let Some((column, reference)) = parse_column(piece) {
            if let Some(target) = reference {
                relationships.push(many_to_one(
                    ColumnRef::new(table_name, column.name.clone()),
                    target,
                ));
            }
            columns.push(column);
        }
    }

    // Table-level PRIMARY KEY (col, ...)
    for pk in table_primary_keys(body) {
        if let Some(col) = columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(&pk))
        {
            col.is_primary_key = true;
        }
    }

    // Table-level FOREIGN KEY (col) REFERENCES t (col)
    let mut cursor = Cursor::new(body);
    while cursor.find_keyword("foreign").is_some() {
        if let Some(fk) = parse_foreign_key(&mut cursor) {
            relationships.extend(fk.into_relationships(table_name));
        }
    }

    (
        Table {
            name: table_name.to_string(),
            columns,
        },
        relationships,
    )
}

fn is_table_constraint(piece: &str) -> bool {
    let first = piece
        .split(|c: char| !is_ident_char(c))
        .next()
        .unwrap_or_default();
    CONSTRAINT_KEYWORDS
        .iter()
        .any(|kw| first.eq_ignore_ascii_case(kw))
}

/// `<name> <type>(<size>)? <constraints>`. Returns the column and the
/// target of an inline `REFERENCES t(c)` clause, if any.
fn parse_column(piece: &str) -> Option<(Column, Option<ColumnRef>)> {
    let mut cursor = Cursor::new(piece);
    let name = eat_quoted_ident(&mut cursor)?;
    if !cursor.skip_whitespace() {
        return None;
    }
    let raw_type = cursor.eat_ident()?;

    // Optional (size) made only of digits and commas
    let before_size = cursor.pos();
    if cursor.eat('(') {
        let sized = cursor
            .take_until(")")
            .is_some_and(|size| size.chars().all(|c| c.is_ascii_digit() || c == ','));
        if !sized {
            cursor.set_pos(before_size);
        }
    }

    let constraints = cursor.rest();
    let keywords = blank_string_literals(constraints);
    let words: Vec<String> = keywords
        .split(|c: char| !is_ident_char(c))
        .filter(|w| !w.is_empty())
        .map(str::to_uppercase)
        .collect();
    let has = |phrase: &[&str]| words.windows(phrase.len()).any(|w| w == phrase);

    let mut column = Column::new(name, canonical_type(raw_type));
    column.is_primary_key = has(&["PRIMARY", "KEY"]);
    column.is_not_null = has(&["NOT", "NULL"]);
    column.is_unique = has(&["UNIQUE"]);
    column.is_increment = is_serial_type(raw_type)
        || has(&["AUTO_INCREMENT"])
        || has(&["AUTOINCREMENT"])
        || has(&["IDENTITY"]);
    column.default = column_default(constraints);

    let mut cursor = Cursor::new(&keywords);
    let reference = if cursor.find_keyword("references").is_some() {
        parse_reference_target(&mut cursor).and_then(|(table, mut cols)| {
            (!cols.is_empty()).then(|| ColumnRef::new(table, cols.swap_remove(0)))
        })
    } else {
        None
    };

    Some((column, reference))
}

/// `s` with every `'...'` literal replaced by a single space.
fn blank_string_literals(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    for c in s.chars() {
        match (in_string, c) {
            (false, '\'') => {
                in_string = true;
                out.push(' ');
            }
            (false, c) => out.push(c),
            (true, '\'') => in_string = false,
            (true, _) => {}
        }
    }
    out
}

/// The value following `DEFAULT`, converted to schema-text syntax:
/// literals are kept, expressions are wrapped in backticks.
fn column_default(constraints: &str) -> Option<String> {
    let mut cursor = Cursor::new(constraints);
    cursor.find_keyword("default")?;
    cursor.skip_whitespace();

    if cursor.peek() == Some('\'') {
        let start = cursor.pos();
        cursor.bump();
        cursor.take_until("'")?;
        return Some(constraints[start..cursor.pos()].to_string());
    }

    let value = cursor.eat_while(|c| !c.is_whitespace());
    if value.is_empty() {
        return None;
    }
    let is_literal = value.parse::<f64>().is_ok()
        || ["true", "false", "null"]
            .iter()
            .any(|kw| value.eq_ignore_ascii_case(kw));
    Some(if is_literal {
        value.to_string()
    } else {
        format!("`{}`", value)
    })
}

/// Column names listed in table-level `PRIMARY KEY (...)` clauses.
fn table_primary_keys(body: &str) -> Vec<String> {
    let mut cursor = Cursor::new(body);
    let mut keys = Vec::new();

    while cursor.find_keyword("primary").is_some() {
        cursor.skip_whitespace();
        if !cursor.eat_keyword("key") {
            continue;
        }
        cursor.skip_whitespace();
        if let Some(cols) = parse_ident_list(&mut cursor) {
            keys.extend(cols);
        }
    }

    keys
}

/// ALTER TABLE t ... FOREIGN KEY (c) REFERENCES t2 (c2), each statement
/// bounded by its `;`.
fn alter_table_foreign_keys(source: &str) -> Vec<Relationship> {
    let mut cursor = Cursor::new(source);
    let mut relationships = Vec::new();

    while cursor.find_keyword("alter").is_some() {
        cursor.skip_whitespace();
        if !cursor.eat_keyword("table") {
            continue;
        }
        cursor.skip_whitespace();

        // Skip ONLY if present
        if cursor.eat_keyword("only") {
            cursor.skip_whitespace();
        }

        let Some(table_name) = eat_table_name(&mut cursor) else {
            continue;
        };
        let statement = cursor
            .take_until(";")
            .unwrap_or_else(|| cursor.rest());

        let mut inner = Cursor::new(statement);
        while inner.find_keyword("foreign").is_some() {
            if let Some(fk) = parse_foreign_key(&mut inner) {
                relationships.extend(fk.into_relationships(table_name));
            }
        }
    }

    relationships
}

struct ForeignKey {
    columns: Vec<String>,
    target: String,
    target_columns: Vec<String>,
}

impl ForeignKey {
    /// One many-to-one relationship per column pair.
    fn into_relationships(self, table_name: &str) -> impl Iterator<Item = Relationship> + '_ {
        let target = self.target;
        self.columns
            .into_iter()
            .zip(self.target_columns)
            .map(move |(column, target_column)| {
                many_to_one(
                    ColumnRef::new(table_name, column),
                    ColumnRef::new(target.clone(), target_column),
                )
            })
    }
}

/// Parse `KEY (cols) REFERENCES table (cols)`; the cursor sits after FOREIGN.
fn parse_foreign_key(cursor: &mut Cursor<'_>) -> Option<ForeignKey> {
    cursor.skip_whitespace();
    if !cursor.eat_keyword("key") {
        return None;
    }
    cursor.skip_whitespace();
    let columns = parse_ident_list(cursor)?;
    cursor.skip_whitespace();
    if !cursor.eat_keyword("references") {
        return None;
    }
    let (target, target_columns) = parse_reference_target(cursor)?;
    Some(ForeignKey {
        columns,
        target,
        target_columns,
    })
}

/// Parse `table (cols)` following a REFERENCES keyword.
fn parse_reference_target(cursor: &mut Cursor<'_>) -> Option<(String, Vec<String>)> {
    cursor.skip_whitespace();
    let target = eat_table_name(cursor)?;
    cursor.skip_whitespace();
    let columns = parse_ident_list(cursor)?;
    Some((target.to_string(), columns))
}

/// Parse `( ident, ident, ... )`.
fn parse_ident_list(cursor: &mut Cursor<'_>) -> Option<Vec<String>> {
    if !cursor.eat('(') {
        return None;
    }
    let inner = cursor.take_until(")")?;
    let idents = inner
        .split(',')
        .filter_map(|part| eat_quoted_ident(&mut Cursor::new(part.trim())))
        .map(str::to_string)
        .collect();
    Some(idents)
}

/// Table name, optionally schema-qualified; the last segment wins.
fn eat_table_name<'a>(cursor: &mut Cursor<'a>) -> Option<&'a str> {
    let mut name = eat_quoted_ident(cursor)?;
    while cursor.eat('.') {
        name = eat_quoted_ident(cursor)?;
    }
    Some(name)
}

/// Identifier optionally wrapped in backticks, double quotes or brackets.
fn eat_quoted_ident<'a>(cursor: &mut Cursor<'a>) -> Option<&'a str> {
    let quoted = cursor.eat('`') || cursor.eat('"') || cursor.eat('[');
    let ident = cursor.eat_ident()?;
    if quoted {
        let _ = cursor.eat('`') || cursor.eat('"') || cursor.eat(']');
    }
    Some(ident)
}

fn many_to_one(from: ColumnRef, to: ColumnRef) -> Relationship {
    Relationship {
        from,
        to,
        cardinality: Cardinality::ManyToOne,
    }
}
