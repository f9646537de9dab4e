//! The editing session: schema text, the schema parsed from it, and the
//! canvas kept in step with both.
//!
//! Text is the source of truth. Canvas gestures that change the schema
//! are applied as text rewrites, after which everything is re-derived.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::DEFAULT_SCHEMA;
use crate::ast::{Cardinality, Schema};
use crate::config::Settings;
use crate::document;
use crate::graph::{Edge, EdgeId, Position};
use crate::import::{ImportError, ImportFormat, import};
use crate::parser::parse;
use crate::rewrite::{append_ref, remove_table};
use crate::share::{self, ShareError};
use crate::sql::{Dialect, generate};
use crate::sync::{Canvas, Focus};

pub const UNTITLED_PROJECT: &str = "Untitled Project";

/// What gets persisted between sessions. The project fields are absent in
/// records written before the first save assigned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub dbml_code: String,
    #[serde(default)]
    pub node_positions: BTreeMap<String, Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Identity of a saved project, fixed at its first save.
#[derive(Debug, Clone, PartialEq)]
struct Project {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl Project {
    fn new(name: Option<String>, created_at: DateTime<Utc>) -> Self {
        let stamp = created_at.to_rfc3339_opts(SecondsFormat::Nanos, true);
        let digest = Sha256::digest(stamp.as_bytes());
        Self {
            id: format!("project-{}", hex::encode(&digest[..8])),
            name: name.unwrap_or_else(|| UNTITLED_PROJECT.to_string()),
            created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Workspace {
    text: String,
    schema: Schema,
    canvas: Canvas,
    settings: Settings,
    project: Option<Project>,
    pending_name: Option<String>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Workspace {
    /// A workspace holding the sample schema.
    pub fn new(settings: Settings) -> Self {
        Self::with_text(settings, DEFAULT_SCHEMA)
    }

    pub fn with_text(settings: Settings, text: impl Into<String>) -> Self {
        let mut workspace = Self {
            text: String::new(),
            schema: Schema::default(),
            canvas: Canvas::new(&settings.canvas),
            settings,
            project: None,
            pending_name: None,
        };
        workspace.set_text(text);
        workspace
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the text and re-derive everything from it.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.schema = parse(&self.text);
        self.canvas.sync(&self.schema);
    }

    /// Delete a table node by removing its block and `Ref:` lines.
    pub fn delete_node(&mut self, id: &str) {
        let text = remove_table(&self.text, id);
        self.set_text(text);
    }

    /// Draw a connection. With propagation on, a `Ref:` line is appended and
    /// the returned id is that of the derived edge replacing the manual one,
    /// or the manual id when the appended line yields no edge.
    pub fn connect(
        &mut self,
        source_node: &str,
        source_handle: &str,
        target_node: &str,
        target_handle: &str,
    ) -> Option<EdgeId> {
        let id = self
            .canvas
            .connect(source_node, source_handle, target_node, target_handle)?;
        if !self.settings.sync.propagate_connections {
            return Some(id);
        }

        let endpoints = self.canvas.edge(id.as_str())?.endpoints().clone();
        let derived = EdgeId::derived(&endpoints);
        let text = append_ref(&self.text, &endpoints.into_relationship(Cardinality::ManyToOne));
        self.set_text(text);
        if self.canvas.edge(derived.as_str()).is_some() {
            Some(derived)
        } else {
            tracing::warn!(edge = %id, "appended Ref produced no edge");
            Some(id)
        }
    }

    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.canvas.move_node(id, x, y)
    }

    pub fn click_edge(&mut self, id: &str) -> bool {
        self.canvas.click_edge(id)
    }

    pub fn click_pane(&mut self) {
        self.canvas.click_pane();
    }

    pub fn press_delete(&mut self, focus: Focus) -> Option<Edge> {
        self.canvas.delete_selected(focus)
    }

    /// Import content, replacing the text. On failure nothing changes.
    pub fn import(&mut self, format: ImportFormat, content: &str) -> Result<(), ImportError> {
        let imported = match import(format, content) {
            Ok(imported) => imported,
            Err(err) => {
                tracing::warn!(?format, error = %err, "import failed");
                return Err(err);
            }
        };
        if let Some(positions) = imported.node_positions {
            self.canvas.seed_positions(positions);
        }
        self.set_text(imported.schema_text);
        Ok(())
    }

    pub fn export_sql(&self, dialect: Dialect) -> String {
        generate(&self.schema, dialect)
    }

    /// SQL in the configured default dialect.
    pub fn export_default_sql(&self) -> String {
        self.export_sql(self.settings.export.default_dialect)
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        document::export_json(&self.text, &self.schema, Some(self.canvas.positions()))
    }

    /// Share link for the current text.
    pub fn share_link(&self, origin: &str) -> String {
        share::encode_link(origin, &self.text)
    }

    /// Replace the text with the one a share link carries. On failure
    /// nothing changes.
    pub fn open_share_link(&mut self, url: &str) -> Result<(), ShareError> {
        let text = share::decode_link(url)?;
        self.set_text(text);
        Ok(())
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        match &mut self.project {
            Some(project) => project.name = name,
            None => self.pending_name = Some(name),
        }
    }

    /// The save record. The first call assigns the project id, name and
    /// creation time; every call stamps `updated_at`.
    pub fn snapshot(&mut self) -> ProjectSnapshot {
        let now = Utc::now();
        let pending_name = self.pending_name.take();
        let project = self
            .project
            .get_or_insert_with(|| Project::new(pending_name, now));
        ProjectSnapshot {
            id: Some(project.id.clone()),
            name: Some(project.name.clone()),
            dbml_code: self.text.clone(),
            node_positions: self.canvas.positions(),
            created_at: Some(project.created_at),
            updated_at: Some(now),
        }
    }

    /// Start over from a snapshot: fresh canvas, saved layout, saved text.
    /// A snapshot without an id gets a new identity at the next save.
    pub fn restore(&mut self, snapshot: ProjectSnapshot) {
        self.pending_name = None;
        self.project = match snapshot.id {
            Some(id) => Some(Project {
                id,
                name: snapshot
                    .name
                    .unwrap_or_else(|| UNTITLED_PROJECT.to_string()),
                created_at: snapshot.created_at.unwrap_or_else(Utc::now),
            }),
            None => {
                self.pending_name = snapshot.name;
                None
            }
        };
        self.canvas = Canvas::new(&self.settings.canvas);
        self.canvas.seed_positions(snapshot.node_positions);
        self.set_text(snapshot.dbml_code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncSettings;

    #[test]
    fn test_starts_from_sample() {
        let ws = Workspace::default();
        let names: Vec<_> = ws.schema().tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["follows", "users", "posts"]);
        assert_eq!(ws.canvas().edges().len(), 3);
    }

    #[test]
    fn test_delete_node_rewrites_text() {
        let mut ws = Workspace::default();
        ws.delete_node("follows");
        assert!(!ws.text().contains("Table follows"));
        assert!(!ws.text().contains("follows."));
        assert_eq!(ws.canvas().nodes().len(), 2);
        assert_eq!(ws.canvas().edges().len(), 1);
    }

    #[test]
    fn test_connect_propagates_ref() {
        let mut ws = Workspace::default();
        let id = ws
            .connect("follows", "created_at-right", "posts", "created_at-left")
            .unwrap();
        assert!(ws.text().ends_with("Ref: follows.created_at > posts.created_at\n"));
        assert!(id.as_str().starts_with("rel-"));
        assert!(ws.canvas().edge(id.as_str()).is_some());
        assert!(ws.canvas().edges().iter().all(|e| !e.is_manual()));
    }

    #[test]
    fn test_connect_unknown_column_leaves_text() {
        let mut ws = Workspace::default();
        let before = ws.text().to_string();
        assert!(ws.connect("follows", "no_such-right", "posts", "id-left").is_none());
        assert!(ws.connect("follows", "created_at-right", "posts", "missing-left").is_none());
        assert_eq!(ws.text(), before);
        assert_eq!(ws.canvas().edges().len(), 3);
    }

    #[test]
    fn test_connect_returns_existing_edge_id() {
        let mut ws = Workspace::default();
        let id = ws.connect("posts", "user_id-right", "users", "id-left").unwrap();
        assert!(ws.canvas().edge(id.as_str()).is_some());
        assert_eq!(ws.canvas().edges().len(), 3);
    }

    #[test]
    fn test_connect_without_propagation() {
        let mut settings = Settings::default();
        settings.sync = SyncSettings {
            propagate_connections: false,
        };
        let mut ws = Workspace::new(settings);
        let before = ws.text().to_string();
        let id = ws
            .connect("follows", "created_at-right", "posts", "created_at-left")
            .unwrap();
        assert_eq!(id.as_str(), "manual-1");
        assert_eq!(ws.text(), before);

        ws.set_text(before);
        assert!(ws.canvas().edge("manual-1").is_some());
    }

    #[test]
    fn test_failed_import_leaves_text() {
        let mut ws = Workspace::default();
        let before = ws.text().to_string();
        let err = ws
            .import(ImportFormat::Sql, "CREATE TABLE broken (id INT")
            .unwrap_err();
        assert!(!err.to_string().is_empty());
        assert_eq!(ws.text(), before);
    }

    #[test]
    fn test_import_json_restores_layout() {
        let mut ws = Workspace::default();
        ws.move_node("users", 42.0, 24.0);
        let json = ws.export_json().unwrap();

        let mut other = Workspace::with_text(Settings::default(), "");
        other.import(ImportFormat::Json, &json).unwrap();
        assert_eq!(other.text(), ws.text());
        assert_eq!(
            other.canvas().node("users").unwrap().position,
            Position::new(42.0, 24.0)
        );
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut ws = Workspace::default();
        ws.move_node("posts", 7.0, 8.0);
        let snapshot = ws.snapshot();

        let mut restored = Workspace::with_text(Settings::default(), "");
        restored.restore(snapshot.clone());
        assert_eq!(restored.text(), ws.text());
        let again = restored.snapshot();
        assert_eq!(again.dbml_code, snapshot.dbml_code);
        assert_eq!(again.node_positions, snapshot.node_positions);
        assert_eq!(again.id, snapshot.id);
        assert_eq!(again.created_at, snapshot.created_at);
        assert!(again.updated_at >= snapshot.updated_at);
    }

    #[test]
    fn test_first_save_assigns_project_identity() {
        let mut ws = Workspace::default();
        let first = ws.snapshot();
        assert!(first.id.as_deref().unwrap().starts_with("project-"));
        assert_eq!(first.name.as_deref(), Some(UNTITLED_PROJECT));
        assert_eq!(first.created_at, first.updated_at);

        ws.set_project_name("Blog");
        let second = ws.snapshot();
        assert_eq!(second.id, first.id);
        assert_eq!(second.name.as_deref(), Some("Blog"));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
    }

    #[test]
    fn test_name_before_first_save() {
        let mut ws = Workspace::default();
        ws.set_project_name("Shop");
        assert_eq!(ws.snapshot().name.as_deref(), Some("Shop"));
    }

    #[test]
    fn test_restore_record_without_metadata() {
        let snapshot: ProjectSnapshot =
            serde_json::from_str(r#"{"dbmlCode":"Table a {\n  id int\n}"}"#).unwrap();
        assert_eq!(snapshot.id, None);
        assert_eq!(snapshot.updated_at, None);

        let mut ws = Workspace::default();
        ws.restore(snapshot);
        let saved = ws.snapshot();
        assert!(saved.id.is_some());
        assert_eq!(saved.name.as_deref(), Some(UNTITLED_PROJECT));
    }

    #[test]
    fn test_snapshot_serde_names() {
        let json = serde_json::to_value(Workspace::default().snapshot()).unwrap();
        assert!(json["dbmlCode"].is_string());
        assert!(json["nodePositions"]["users"]["x"].is_number());
        assert!(json["id"].is_string());
        assert_eq!(json["name"], UNTITLED_PROJECT);
        assert!(json["createdAt"].as_str().unwrap().ends_with('Z'));
        assert!(json["updatedAt"].is_string());

        let bare = serde_json::to_value(ProjectSnapshot::default()).unwrap();
        assert!(bare.get("id").is_none());
        assert!(bare.get("createdAt").is_none());
    }

    #[test]
    fn test_open_share_link() {
        let source = Workspace::with_text(Settings::default(), "Table a {\n  id int\n}\n");
        let link = source.share_link("https://example.com");

        let mut ws = Workspace::default();
        ws.open_share_link(&link).unwrap();
        assert_eq!(ws.text(), source.text());
        assert_eq!(ws.canvas().nodes().len(), 1);

        let before = ws.text().to_string();
        assert!(ws.open_share_link("https://example.com?diagram=%zz").is_err());
        assert_eq!(ws.text(), before);
    }

    #[test]
    fn test_press_delete_derived_edge_returns_on_edit() {
        let mut ws = Workspace::default();
        let id = ws.canvas().edges()[0].id().to_string();
        ws.click_edge(&id);
        assert!(ws.press_delete(Focus::Canvas).is_some());
        assert_eq!(ws.canvas().edges().len(), 2);

        let text = ws.text().to_string();
        ws.set_text(text);
        assert_eq!(ws.canvas().edges().len(), 3);
    }

    #[test]
    fn test_export_sql_uses_dialect() {
        let ws = Workspace::default();
        assert!(ws.export_sql(Dialect::MySQL).contains("CREATE TABLE `users`"));
        assert!(ws.export_default_sql().contains("CREATE TABLE \"users\""));
    }
}
