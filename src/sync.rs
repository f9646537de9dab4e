//! Canvas state and its reconciliation against freshly parsed schemas.
//!
//! Nodes are keyed by table name so a re-parse keeps their positions.
//! Derived edges are recomputed from the relationships on every sync;
//! manual edges survive until the user deletes them, their tables vanish,
//! or a derived edge appears with the same endpoints.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::ast::{Column, ColumnRef, Schema};
use crate::config::CanvasSettings;
use crate::geometry::{NodeBox, default_handles, parse_handle, resolve_handles};
use crate::graph::{Edge, EdgeId, Endpoints, Handles, Node, Position};
use crate::measure::NodeMetrics;

/// Where keyboard focus sits when Delete is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    TextSurface,
    Canvas,
}

#[derive(Debug, Clone)]
pub struct Canvas {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    selected: Option<EdgeId>,
    next_serial: u64,
    /// Positions for nodes that do not exist yet (restored layouts).
    seeds: BTreeMap<String, Position>,
    grid: CanvasSettings,
    metrics: NodeMetrics,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(&CanvasSettings::default())
    }
}

impl Canvas {
    pub fn new(settings: &CanvasSettings) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            selected: None,
            next_serial: 1,
            seeds: BTreeMap::new(),
            grid: settings.clone(),
            metrics: NodeMetrics::with_node_width(settings.node_width),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id().as_str() == id)
    }

    pub fn selected(&self) -> Option<&EdgeId> {
        self.selected.as_ref()
    }

    pub fn positions(&self) -> BTreeMap<String, Position> {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.position))
            .collect()
    }

    /// Apply saved positions: existing nodes move now, the rest are used
    /// when their table first appears.
    pub fn seed_positions(&mut self, positions: BTreeMap<String, Position>) {
        for (id, position) in positions {
            match self.nodes.iter_mut().find(|n| n.id == id) {
                Some(node) => node.position = position,
                None => {
                    self.seeds.insert(id, position);
                }
            }
        }
        self.route();
    }

    /// Reconcile against a newly parsed schema.
    pub fn sync(&mut self, schema: &Schema) {
        let previous: HashMap<String, Position> = self
            .nodes
            .drain(..)
            .map(|n| (n.id, n.position))
            .collect();

        let mut seen = HashSet::new();
        for table in &schema.tables {
            if !seen.insert(table.name.as_str()) {
                tracing::warn!(table = %table.name, "duplicate table, keeping the first");
                continue;
            }
            let index = self.nodes.len();
            let position = match previous.get(&table.name) {
                Some(position) => *position,
                None => self
                    .seeds
                    .remove(&table.name)
                    .unwrap_or_else(|| self.grid.grid_position(index)),
            };
            self.nodes.push(Node {
                id: table.name.clone(),
                position,
                columns: table.columns.clone(),
            });
        }

        let mut edges = Vec::new();
        let mut derived = HashSet::new();
        for rel in &schema.relationships {
            let endpoints = Endpoints::of(rel);
            if !derived.insert(endpoints.clone()) {
                continue;
            }
            let handles = default_handles(&endpoints.source.column, &endpoints.target.column);
            edges.push(Edge::Derived {
                endpoints,
                cardinality: rel.cardinality,
                handles,
            });
        }

        for edge in self.edges.drain(..).filter(Edge::is_manual) {
            let endpoints = edge.endpoints();
            if derived.contains(endpoints) {
                tracing::debug!(edge = %edge.id(), "manual edge superseded by relationship");
                continue;
            }
            if !seen.contains(endpoints.source.table.as_str())
                || !seen.contains(endpoints.target.table.as_str())
            {
                continue;
            }
            edges.push(edge);
        }
        self.edges = edges;

        let selection_survives = self
            .selected
            .as_ref()
            .is_some_and(|id| self.edges.iter().any(|e| &e.id() == id));
        if !selection_survives {
            self.selected = None;
        }

        self.route();
        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "synced canvas"
        );
    }

    /// Move a node and re-resolve every connector. Returns false for an
    /// unknown node.
    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        node.position = Position::new(x, y);
        self.route();
        true
    }

    /// Draw a manual connection between two column handles. The source
    /// handle must be an outgoing one, the target an incoming one, and both
    /// columns must exist on their nodes.
    pub fn connect(
        &mut self,
        source_node: &str,
        source_handle: &str,
        target_node: &str,
        target_handle: &str,
    ) -> Option<EdgeId> {
        let (source_column, source_kind) = parse_handle(source_handle)?;
        let (target_column, target_kind) = parse_handle(target_handle)?;
        if !source_kind.is_source() || target_kind.is_source() {
            return None;
        }
        let has_column = |node: &str, column: &str| {
            self.node(node)
                .is_some_and(|n| n.columns.iter().any(|c| c.name == column))
        };
        if !has_column(source_node, source_column) || !has_column(target_node, target_column) {
            tracing::debug!(source_handle, target_handle, "connection rejected");
            return None;
        }

        let serial = self.next_serial;
        self.next_serial += 1;
        let edge = Edge::Manual {
            serial,
            endpoints: Endpoints::new(
                ColumnRef::new(source_node, source_column),
                ColumnRef::new(target_node, target_column),
            ),
            handles: Handles {
                source_handle: source_handle.to_string(),
                target_handle: target_handle.to_string(),
            },
        };
        let id = edge.id();
        tracing::debug!(edge = %id, "connected");
        self.edges.push(edge);
        Some(id)
    }

    /// Toggle selection of one edge. Returns whether it is now selected.
    pub fn click_edge(&mut self, id: &str) -> bool {
        if self.selected.as_ref().is_some_and(|s| s.as_str() == id) {
            self.selected = None;
            return false;
        }
        match self.edge(id) {
            Some(edge) => {
                self.selected = Some(edge.id());
                true
            }
            None => false,
        }
    }

    pub fn click_pane(&mut self) {
        self.selected = None;
    }

    /// Remove the selected edge unless the text surface has focus. A derived
    /// edge comes back on the next sync since its `Ref:` line is untouched.
    pub fn delete_selected(&mut self, focus: Focus) -> Option<Edge> {
        if focus == Focus::TextSurface {
            return None;
        }
        let id = self.selected.take()?;
        let index = self.edges.iter().position(|e| e.id() == id)?;
        Some(self.edges.remove(index))
    }

    /// Snapshot for a renderer.
    pub fn view(&self) -> CanvasView<'_> {
        CanvasView {
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeView {
                    id: &n.id,
                    position: n.position,
                    width: self.metrics.display_width(n),
                    height: self.metrics.node_height(n.columns.len()),
                    columns: &n.columns,
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| {
                    let id = e.id();
                    EdgeView {
                        selected: self.selected.as_ref() == Some(&id),
                        id,
                        source: &e.endpoints().source.table,
                        target: &e.endpoints().target.table,
                        source_handle: &e.handles().source_handle,
                        target_handle: &e.handles().target_handle,
                        provenance: e.provenance(),
                    }
                })
                .collect(),
        }
    }

    fn route(&mut self) {
        let boxes: HashMap<&str, NodeBox> = self
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), self.metrics.node_box(n)))
            .collect();
        let width = self.metrics.node_width;

        for edge in &mut self.edges {
            let e = edge.endpoints();
            let handles = match (
                boxes.get(e.source.table.as_str()),
                boxes.get(e.target.table.as_str()),
            ) {
                (Some(s), Some(t)) => resolve_handles(s, t, width, &e.source.column, &e.target.column),
                _ => default_handles(&e.source.column, &e.target.column),
            };
            edge.set_handles(handles);
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CanvasView<'a> {
    pub nodes: Vec<NodeView<'a>>,
    pub edges: Vec<EdgeView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct NodeView<'a> {
    pub id: &'a str,
    pub position: Position,
    pub width: f64,
    pub height: f64,
    pub columns: &'a [Column],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeView<'a> {
    pub id: EdgeId,
    pub source: &'a str,
    pub target: &'a str,
    pub source_handle: &'a str,
    pub target_handle: &'a str,
    pub provenance: &'static str,
    pub selected: bool,
}
