use rstest::rstest;
use schemacraft::ast::ColumnRef;
use schemacraft::graph::{Edge, EdgeId};
use schemacraft::import::{ImportFormat, import_sql};
use schemacraft::parser::parse;
use schemacraft::sql::{Dialect, generate, parse_sql};
use schemacraft::sync::Canvas;
use schemacraft::workspace::Workspace;
use schemacraft::{DEFAULT_SCHEMA, rewrite};

const SHOP: &str = "Table customers {
  id integer [pk, increment]
  email varchar [not null, unique]
  created_at timestamp [default: `now()`]
}

Table orders {
  id integer [pk]
  customer_id integer [not null]
  total decimal
  note text [note: 'free text']
}

Table customer_orders {
  id integer [pk]
  order_id integer
}

Ref: orders.customer_id > customers.id
Ref: customer_orders.order_id > orders.id
";

fn endpoints(schema: &schemacraft::ast::Schema) -> Vec<(ColumnRef, ColumnRef)> {
    schema
        .relationships
        .iter()
        .map(|r| (r.from.clone(), r.to.clone()))
        .collect()
}

#[rstest]
fn test_sql_round_trip(
    #[values(Dialect::PostgreSQL, Dialect::MySQL, Dialect::SQLite, Dialect::SqlServer)]
    dialect: Dialect,
) {
    let original = parse(SHOP);
    let sql = generate(&original, dialect);
    let imported = parse_sql(&sql).unwrap();

    let names = |s: &schemacraft::ast::Schema| -> Vec<(String, Vec<String>)> {
        s.tables
            .iter()
            .map(|t| (t.name.clone(), t.columns.iter().map(|c| c.name.clone()).collect()))
            .collect()
    };
    assert_eq!(names(&imported), names(&original));
    assert_eq!(endpoints(&imported), endpoints(&original));

    let pks: Vec<_> = imported.tables.iter().map(|t| t.columns[0].is_primary_key).collect();
    assert_eq!(pks, vec![true, true, true]);
}

#[rstest]
#[case(Dialect::PostgreSQL)]
#[case(Dialect::MySQL)]
#[case(Dialect::SQLite)]
#[case(Dialect::SqlServer)]
fn test_one_pk_one_fk_counts(#[case] dialect: Dialect) {
    let schema = parse(
        "Table users {\n  id integer [primary key]\n}\n\nTable posts {\n  user_id integer\n}\nRef: posts.user_id > users.id",
    );
    let imported = parse_sql(&generate(&schema, dialect)).unwrap();
    assert_eq!(imported.tables.len(), 2);
    assert_eq!(imported.relationships.len(), 1);
}

#[test]
fn test_foreign_key_marking() {
    let schema = parse(
        "Table users { id integer [primary key] }\nTable posts { user_id integer }\nRef: posts.user_id > users.id",
    );
    assert!(schema.tables[1].columns[0].is_foreign_key);
    assert!(!schema.tables[0].columns[0].is_foreign_key);
    assert_eq!(schema.relationships.len(), 1);
    assert_eq!(
        schema.relationships[0].cardinality,
        schemacraft::ast::Cardinality::ManyToOne
    );
}

#[test]
fn test_parse_is_deterministic() {
    assert_eq!(parse(SHOP), parse(SHOP));
    assert_eq!(parse(DEFAULT_SCHEMA), parse(DEFAULT_SCHEMA));
}

#[test]
fn test_no_edge_churn() {
    let ids = |canvas: &Canvas| -> Vec<EdgeId> { canvas.edges().iter().map(Edge::id).collect() };
    let mut canvas = Canvas::default();
    canvas.sync(&parse(SHOP));
    let first = ids(&canvas);
    canvas.sync(&parse(SHOP));
    assert_eq!(ids(&canvas), first);

    let mut fresh = Canvas::default();
    fresh.sync(&parse(SHOP));
    assert_eq!(ids(&fresh), first);
}

#[test]
fn test_delete_orders_spares_customer_orders() {
    let out = rewrite::remove_table(SHOP, "orders");
    assert!(!out.contains("Table orders {"));
    assert!(out.contains("Table customer_orders {\n  id integer [pk]\n  order_id integer\n}"));
    assert!(!out.contains("Ref: orders.customer_id"));
    assert!(!out.contains("> orders.id"));

    let schema = parse(&out);
    let names: Vec<_> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["customers", "customer_orders"]);
    assert!(schema.relationships.is_empty());
}

#[test]
fn test_malformed_sql_keeps_text() {
    let mut workspace = Workspace::default();
    let before = workspace.text().to_string();
    let err = workspace
        .import(ImportFormat::Sql, "CREATE TABLE users (\n  id INT PRIMARY KEY\n")
        .unwrap_err();
    assert!(!err.to_string().is_empty());
    assert_eq!(workspace.text(), before);
    assert!(import_sql("CREATE TABLE users (id INT").is_err());
}

#[test]
fn test_sql_import_reparses_cleanly() {
    let sql = "CREATE TABLE IF NOT EXISTS public.accounts (\n  id BIGSERIAL PRIMARY KEY,\n  name VARCHAR(100) NOT NULL\n);\n\
               CREATE TABLE sessions (\n  id UUID,\n  account_id BIGINT,\n  PRIMARY KEY (id),\n  FOREIGN KEY (account_id) REFERENCES accounts(id)\n);";
    let imported = import_sql(sql).unwrap();
    let schema = parse(&imported.schema_text);
    assert_eq!(schema.tables.len(), 2);
    assert!(schema.tables[0].columns[0].is_increment);
    assert_eq!(schema.tables[1].columns[0].typ, "uuid");
    assert!(schema.tables[1].columns[1].is_foreign_key);
    assert_eq!(parse_sql(sql).unwrap(), schema);
}
