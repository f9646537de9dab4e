use std::collections::HashSet;
use std::ops::Range;

use crate::ast::*;
use crate::lexer::Cursor;

/// A `Table <name> { ... }` block located in schema text.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock<'a> {
    pub name: &'a str,
    pub body: &'a str,
    /// Byte range from the `Table` keyword through the closing brace.
    pub span: Range<usize>,
}

/// Parse schema text into a [`Schema`]. Never fails.
pub fn parse(input: &str) -> Schema {
    Parser::new(input).parse()
}

/// Locate every table block. The body ends at the first `}` after the
/// opening brace; a block without a closing brace is skipped.
pub fn table_blocks(input: &str) -> Vec<TableBlock<'_>> {
    let mut cursor = Cursor::new(input);
    let mut blocks = Vec::new();

    while let Some(start) = cursor.find_keyword("table") {
        let resume = cursor.pos();
        match table_block_tail(&mut cursor) {
            Some((name, body)) => blocks.push(TableBlock {
                name,
                body,
                span: start..cursor.pos(),
            }),
            None => cursor.set_pos(resume),
        }
    }

    blocks
}

fn table_block_tail<'a>(cursor: &mut Cursor<'a>) -> Option<(&'a str, &'a str)> {
    if !cursor.skip_whitespace() {
        return None;
    }
    let name = cursor.eat_ident()?;
    cursor.skip_whitespace();
    if !cursor.eat('{') {
        return None;
    }
    let body = cursor.take_until("}")?;
    Some((name, body))
}

pub struct Parser<'a> {
    input: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    pub fn parse(&self) -> Schema {
        let tables: Vec<Table> = table_blocks(self.input)
            .into_iter()
            .map(|block| Table {
                name: block.name.to_string(),
                columns: block.body.lines().filter_map(parse_column).collect(),
            })
            .collect();

        let mut seen = HashSet::new();
        for table in &tables {
            if !seen.insert(table.name.as_str()) {
                tracing::warn!(table = %table.name, "duplicate table definition");
            }
        }

        let mut schema = Schema {
            tables,
            relationships: self.parse_refs(),
        };
        schema.mark_foreign_keys();

        tracing::debug!(
            tables = schema.tables.len(),
            relationships = schema.relationships.len(),
            "parsed schema text"
        );
        schema
    }

    /// Collect every `Ref: a.b <op> c.d` statement in the text.
    fn parse_refs(&self) -> Vec<Relationship> {
        let mut cursor = Cursor::new(self.input);
        let mut rels = Vec::new();

        while cursor.find_keyword("ref").is_some() {
            let resume = cursor.pos();
            match parse_ref_tail(&mut cursor) {
                Some(rel) => rels.push(rel),
                None => cursor.set_pos(resume),
            }
        }

        rels
    }
}

fn parse_ref_tail(cursor: &mut Cursor<'_>) -> Option<Relationship> {
    if !cursor.eat(':') {
        return None;
    }
    cursor.skip_whitespace();
    let from = parse_column_ref(cursor)?;
    cursor.skip_whitespace();
    let op = cursor.eat_while(|c| matches!(c, '<' | '>' | '-'));
    if op.is_empty() {
        return None;
    }
    cursor.skip_whitespace();
    let to = parse_column_ref(cursor)?;

    Some(Relationship {
        from,
        to,
        cardinality: Cardinality::from_operator(op),
    })
}

fn parse_column_ref(cursor: &mut Cursor<'_>) -> Option<ColumnRef> {
    let table = cursor.eat_ident()?;
    if !cursor.eat('.') {
        return None;
    }
    let column = cursor.eat_ident()?;
    Some(ColumnRef::new(table, column))
}

/// `<name> <type> [constraint, ...]`. Blank lines, `//` comments and lines
/// that do not start with two identifiers yield nothing.
fn parse_column(line: &str) -> Option<Column> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
        return None;
    }

    let mut cursor = Cursor::new(line);
    let name = cursor.eat_ident()?;
    if !cursor.skip_whitespace() {
        return None;
    }
    let typ = cursor.eat_ident()?;

    let mut column = Column::new(name, typ.to_lowercase());
    cursor.skip_whitespace();
    if cursor.eat('[') {
        if let Some(list) = cursor.take_until("]") {
            apply_settings(&mut column, list);
        }
    }
    Some(column)
}

fn apply_settings(column: &mut Column, list: &str) {
    for setting in split_settings(list) {
        let normalized = setting
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        match normalized.as_str() {
            "pk" | "primary key" | "primarykey" => column.is_primary_key = true,
            "not null" | "notnull" => column.is_not_null = true,
            "unique" => column.is_unique = true,
            "increment" => column.is_increment = true,
            _ => {
                if let Some(value) = setting_value(setting, "note") {
                    if column.note.is_none() {
                        column.note = Some(unquote(value).to_string());
                    }
                } else if let Some(value) = setting_value(setting, "default") {
                    column.default = Some(value.to_string());
                }
            }
        }
    }
}

/// Value of a `key: value` setting when `key` matches case-insensitively.
fn setting_value<'a>(setting: &'a str, key: &str) -> Option<&'a str> {
    let (head, value) = setting.split_once(':')?;
    head.trim().eq_ignore_ascii_case(key).then(|| value.trim())
}

fn unquote(value: &str) -> &str {
    let mut chars = value.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('\'' | '"' | '`')), Some(close)) if open == close => {
            &value[1..value.len() - 1]
        }
        _ => value,
    }
}

/// Split a settings list on commas that are not inside quotes.
fn split_settings(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in list.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, ',') => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(list[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        let input = r#"
            Table users {
              id integer [primary key]
              username VARCHAR [not null, unique]
              // a comment line
              created_at timestamp
            }
        "#;
        let schema = parse(input);
        assert_eq!(schema.tables.len(), 1);
        let users = &schema.tables[0];
        assert_eq!(users.name, "users");
        assert_eq!(users.columns.len(), 3);
        assert!(users.columns[0].is_primary_key);
        assert_eq!(users.columns[1].typ, "varchar");
        assert!(users.columns[1].is_not_null);
        assert!(users.columns[1].is_unique);
        assert!(!users.columns[2].is_not_null);
    }

    #[test]
    fn test_settings_case_insensitive_and_unordered() {
        let schema = parse("Table t {\n  id int [NOT NULL, PK, Increment]\n}");
        let col = &schema.tables[0].columns[0];
        assert!(col.is_primary_key);
        assert!(col.is_not_null);
        assert!(col.is_increment);
    }

    #[test]
    fn test_note_first_match_wins() {
        let schema = parse(
            "Table posts {\n  body text [note: 'Content, with comma', note: \"second\"]\n}",
        );
        let col = &schema.tables[0].columns[0];
        assert_eq!(col.note.as_deref(), Some("Content, with comma"));
    }

    #[test]
    fn test_default_and_unknown_settings() {
        let schema = parse("Table t {\n  status varchar [default: 'draft', ref: x, null]\n}");
        let col = &schema.tables[0].columns[0];
        assert_eq!(col.default.as_deref(), Some("'draft'"));
        assert!(!col.is_not_null);
        assert!(!col.is_primary_key);
    }

    #[test]
    fn test_unknown_type_passes_through() {
        let schema = parse("Table t {\n  tags MyCustomType\n}");
        assert_eq!(schema.tables[0].columns[0].typ, "mycustomtype");
    }

    #[test]
    fn test_parse_relationships() {
        let input = r#"
            Ref: posts.user_id > users.id
            Ref: users.id < follows.following_user_id
            ref: a.b - c.d
            Ref: a.b <> c.d
            Ref: a.b >> c.d
        "#;
        let schema = parse(input);
        let kinds: Vec<_> = schema.relationships.iter().map(|r| r.cardinality).collect();
        assert_eq!(
            kinds,
            vec![
                Cardinality::ManyToOne,
                Cardinality::OneToMany,
                Cardinality::OneToOne,
                Cardinality::ManyToMany,
                Cardinality::OneToMany,
            ]
        );
        assert_eq!(schema.relationships[0].from, ColumnRef::new("posts", "user_id"));
        assert_eq!(schema.relationships[0].to, ColumnRef::new("users", "id"));
    }

    #[test]
    fn test_marks_foreign_key() {
        let input = "Table users { id integer [primary key] }\n\
                     Table posts { user_id integer }\n\
                     Ref: posts.user_id > users.id";
        let schema = parse(input);
        assert_eq!(schema.relationships.len(), 1);
        assert_eq!(schema.relationships[0].cardinality, Cardinality::ManyToOne);
        let posts = schema.table("posts").unwrap();
        assert!(posts.columns[0].is_foreign_key);
    }

    #[test]
    fn test_single_line_block() {
        let schema = parse("Table users { id integer [primary key] }");
        assert_eq!(schema.tables[0].columns.len(), 1);
        assert!(schema.tables[0].columns[0].is_primary_key);
    }

    #[test]
    fn test_malformed_ref_is_skipped() {
        let schema = parse("Ref: posts > users.id\nRef: a.b > c.d");
        assert_eq!(schema.relationships.len(), 1);
        assert_eq!(schema.relationships[0].from.table, "a");
    }

    #[test]
    fn test_unterminated_block_yields_nothing() {
        let schema = parse("Table users {\n  id integer\n");
        assert!(schema.tables.is_empty());
    }

    #[test]
    fn test_unterminated_block_swallows_next_table() {
        let schema = parse("Table a {\n  x int\nTable b {\n  y int\n}");
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(schema.tables[0].name, "a");
        let names: Vec<_> = schema.tables[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "Table", "y"]);
    }

    #[test]
    fn test_duplicate_tables_are_kept() {
        let schema = parse("Table t { a int }\nTable t { b int }");
        assert_eq!(schema.tables.len(), 2);
        assert_eq!(schema.tables[1].columns[0].name, "b");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let input = crate::DEFAULT_SCHEMA;
        assert_eq!(parse(input), parse(input));
    }

    #[test]
    fn test_table_block_spans() {
        let input = "Table a { x int }\nTable b { y int }";
        let blocks = table_blocks(input);
        assert_eq!(blocks.len(), 2);
        assert_eq!(&input[blocks[1].span.clone()], "Table b { y int }");
    }

    #[test]
    fn test_parse_unicode() {
        let schema = parse("Table ユーザー {\n  名前 文字列 [not null]\n}");
        assert_eq!(schema.tables[0].name, "ユーザー");
        assert_eq!(schema.tables[0].columns[0].name, "名前");
    }
}
