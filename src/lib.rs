pub mod ast;
pub mod config;
pub mod document;
pub mod geometry;
pub mod graph;
pub mod import;
pub mod lexer;
pub mod measure;
pub mod parser;
pub mod rewrite;
pub mod serializer;
pub mod share;
pub mod sql;
pub mod sync;
pub mod workspace;

use wasm_bindgen::prelude::*;

use config::Settings;
use import::ImportFormat;
use sql::Dialect;
use sync::Focus;
use workspace::{ProjectSnapshot, Workspace};

/// Sample schema a new workspace opens with.
pub const DEFAULT_SCHEMA: &str = "// Use DBML to define your database structure
// Docs: https://dbml.dbdiagram.io/docs

Table follows {
  following_user_id integer
  followed_user_id integer
  created_at timestamp
}

Table users {
  id integer [primary key]
  username varchar
  role varchar
  created_at timestamp
}

Table posts {
  id integer [primary key]
  title varchar
  body text [note: 'Content of the post']
  user_id integer [not null]
  status varchar
  created_at timestamp
}

Ref: posts.user_id > users.id // many-to-one

Ref: users.id < follows.following_user_id

Ref: users.id < follows.followed_user_id
";

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn parse_dialect(name: Option<&str>, fallback: Dialect) -> Result<Dialect, String> {
    match name {
        Some(name) => Dialect::parse(name).map_err(|e| e.to_string()),
        None => Ok(fallback),
    }
}

/// Parse schema text to its JSON form
#[wasm_bindgen(js_name = "parseSchema")]
pub fn parse_schema(source: &str) -> Result<String, String> {
    serde_json::to_string(&parser::parse(source)).map_err(|e| e.to_string())
}

/// Convert SQL DDL to schema text
#[wasm_bindgen(js_name = "importSql")]
pub fn import_sql(sql: &str) -> Result<String, String> {
    import::import_sql(sql)
        .map(|imported| imported.schema_text)
        .map_err(|e| e.to_string())
}

/// Read a diagram document; returns `{dbmlCode, nodePositions}` as JSON
#[wasm_bindgen(js_name = "importJson")]
pub fn import_json(content: &str) -> Result<String, String> {
    let imported = import::import_json(content).map_err(|e| e.to_string())?;
    let snapshot = ProjectSnapshot {
        dbml_code: imported.schema_text,
        node_positions: imported.node_positions.unwrap_or_default(),
        ..ProjectSnapshot::default()
    };
    serde_json::to_string(&snapshot).map_err(|e| e.to_string())
}

/// Share link carrying `source` for a page served at `origin`
#[wasm_bindgen(js_name = "shareLink")]
pub fn share_link(origin: &str, source: &str) -> String {
    share::encode_link(origin, source)
}

/// Schema text from a share link
#[wasm_bindgen(js_name = "decodeShareLink")]
pub fn decode_share_link(url: &str) -> Result<String, String> {
    share::decode_link(url).map_err(|e| e.to_string())
}

/// Render schema text as SQL DDL
#[wasm_bindgen(js_name = "generateSql")]
pub fn generate_sql(source: &str, dialect: Option<String>) -> Result<String, String> {
    let dialect = parse_dialect(dialect.as_deref(), Dialect::default())?;
    Ok(sql::generate(&parser::parse(source), dialect))
}

/// A live editing session for a JavaScript host.
#[wasm_bindgen]
pub struct DiagramSession {
    workspace: Workspace,
}

#[wasm_bindgen]
impl DiagramSession {
    /// `config` is optional TOML settings.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<DiagramSession, String> {
        let settings = match config {
            Some(source) => Settings::from_toml(&source).map_err(|e| e.to_string())?,
            None => Settings::default(),
        };
        Ok(Self {
            workspace: Workspace::new(settings),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn text(&self) -> String {
        self.workspace.text().to_string()
    }

    #[wasm_bindgen(js_name = "setText")]
    pub fn set_text(&mut self, text: &str) {
        self.workspace.set_text(text);
    }

    #[wasm_bindgen(js_name = "deleteNode")]
    pub fn delete_node(&mut self, id: &str) {
        self.workspace.delete_node(id);
    }

    pub fn connect(
        &mut self,
        source: &str,
        source_handle: &str,
        target: &str,
        target_handle: &str,
    ) -> Option<String> {
        self.workspace
            .connect(source, source_handle, target, target_handle)
            .map(|id| id.to_string())
    }

    #[wasm_bindgen(js_name = "moveNode")]
    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.workspace.move_node(id, x, y)
    }

    #[wasm_bindgen(js_name = "clickEdge")]
    pub fn click_edge(&mut self, id: &str) -> bool {
        self.workspace.click_edge(id)
    }

    #[wasm_bindgen(js_name = "clickPane")]
    pub fn click_pane(&mut self) {
        self.workspace.click_pane();
    }

    /// Returns whether an edge was removed.
    #[wasm_bindgen(js_name = "pressDelete")]
    pub fn press_delete(&mut self, editor_focused: bool) -> bool {
        let focus = if editor_focused {
            Focus::TextSurface
        } else {
            Focus::Canvas
        };
        self.workspace.press_delete(focus).is_some()
    }

    /// Import file content; the format comes from the file name when it has
    /// a known extension, otherwise from the content.
    #[wasm_bindgen(js_name = "importFile")]
    pub fn import(&mut self, file_name: &str, content: &str) -> Result<(), String> {
        let format = ImportFormat::from_file_name(file_name)
            .unwrap_or_else(|| ImportFormat::detect(content));
        self.workspace
            .import(format, content)
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "exportSql")]
    pub fn export_sql(&self, dialect: Option<String>) -> Result<String, String> {
        let fallback = self.workspace.settings().export.default_dialect;
        let dialect = parse_dialect(dialect.as_deref(), fallback)?;
        Ok(self.workspace.export_sql(dialect))
    }

    #[wasm_bindgen(js_name = "exportJson")]
    pub fn export_json(&self) -> Result<String, String> {
        self.workspace.export_json().map_err(|e| e.to_string())
    }

    /// Nodes and edges as JSON for the renderer.
    pub fn view(&self) -> Result<String, String> {
        serde_json::to_string(&self.workspace.canvas().view()).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "setProjectName")]
    pub fn set_project_name(&mut self, name: &str) {
        self.workspace.set_project_name(name);
    }

    /// Open the diagram carried by a share link.
    #[wasm_bindgen(js_name = "openShareLink")]
    pub fn open_share_link(&mut self, url: &str) -> Result<(), String> {
        self.workspace.open_share_link(url).map_err(|e| e.to_string())
    }

    /// Save record: text, layout and project metadata as JSON.
    pub fn snapshot(&mut self) -> Result<String, String> {
        serde_json::to_string(&self.workspace.snapshot()).map_err(|e| e.to_string())
    }

    pub fn restore(&mut self, snapshot: &str) -> Result<(), String> {
        let snapshot: ProjectSnapshot = serde_json::from_str(snapshot).map_err(|e| e.to_string())?;
        self.workspace.restore(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sql_unknown_dialect() {
        let err = generate_sql(DEFAULT_SCHEMA, Some("oracle".into())).unwrap_err();
        assert!(err.starts_with("unknown dialect: oracle (expected one of postgresql"));
    }

    #[test]
    fn test_import_json_returns_snapshot() {
        let json = import_json(r#"{"dbmlCode":"Table a {\n}"}"#).unwrap();
        let snapshot: ProjectSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot.dbml_code, "Table a {\n}");
        assert!(snapshot.node_positions.is_empty());
    }

    #[test]
    fn test_session_flow() {
        let mut session = DiagramSession::new(Some("[export]\ndefault_dialect = \"sqlite\"".into())).unwrap();
        assert!(session.export_sql(None).unwrap().contains("CREATE TABLE \"users\""));
        assert!(session.import("dump.sql", "CREATE TABLE t (id INT);").is_ok());
        assert!(session.text().starts_with("// Imported from SQL"));
        assert!(session.import("dump.sql", "nothing here").is_err());
        assert!(session.text().contains("Table t {"));
    }

    #[test]
    fn test_share_link_reopens_session() {
        let link = share_link("https://example.com", "Table a {\n  id int\n}\n");
        assert_eq!(decode_share_link(&link).unwrap(), "Table a {\n  id int\n}\n");

        let mut session = DiagramSession::new(None).unwrap();
        session.open_share_link(&link).unwrap();
        assert_eq!(session.text(), "Table a {\n  id int\n}\n");
        assert!(session.open_share_link("https://example.com").is_err());
        assert_eq!(session.text(), "Table a {\n  id int\n}\n");
    }

    #[test]
    fn test_session_snapshot_has_project_record() {
        let mut session = DiagramSession::new(None).unwrap();
        session.set_project_name("Blog");
        let json: serde_json::Value = serde_json::from_str(&session.snapshot().unwrap()).unwrap();
        assert_eq!(json["name"], "Blog");
        assert!(json["id"].as_str().unwrap().starts_with("project-"));
        assert!(json["createdAt"].is_string());
        assert!(json["updatedAt"].is_string());
    }
}
