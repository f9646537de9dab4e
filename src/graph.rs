//! Graph-side model of a diagram: one node per table, one edge per
//! relationship or hand-drawn connection.

use crate::ast::{Cardinality, Column, ColumnRef, Relationship};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A table on the canvas. The id is the table name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub position: Position,
    pub columns: Vec<Column>,
}

/// Column-level endpoints of an edge, source first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoints {
    pub source: ColumnRef,
    pub target: ColumnRef,
}

impl Endpoints {
    pub fn new(source: ColumnRef, target: ColumnRef) -> Self {
        Self { source, target }
    }

    pub fn of(rel: &Relationship) -> Self {
        Self::new(rel.from.clone(), rel.to.clone())
    }

    pub fn into_relationship(self, cardinality: Cardinality) -> Relationship {
        Relationship {
            from: self.source,
            to: self.target,
            cardinality,
        }
    }
}

/// Attachment handle ids on the source and target nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Handles {
    pub source_handle: String,
    pub target_handle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// `rel-` followed by the first 8 bytes of SHA-256 over the four
    /// endpoint names, hex encoded.
    pub fn derived(endpoints: &Endpoints) -> Self {
        let mut hasher = Sha256::new();
        for part in [
            &endpoints.source.table,
            &endpoints.source.column,
            &endpoints.target.table,
            &endpoints.target.column,
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();
        Self(format!("rel-{}", hex::encode(&digest[..8])))
    }

    pub fn manual(serial: u64) -> Self {
        Self(format!("manual-{}", serial))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An edge is either re-derived from the schema on every sync or was drawn
/// by hand and lives until deleted.
#[derive(Debug, Clone, PartialEq)]
pub enum Edge {
    Derived {
        endpoints: Endpoints,
        cardinality: Cardinality,
        handles: Handles,
    },
    Manual {
        serial: u64,
        endpoints: Endpoints,
        handles: Handles,
    },
}

impl Edge {
    pub fn id(&self) -> EdgeId {
        match self {
            Edge::Derived { endpoints, .. } => EdgeId::derived(endpoints),
            Edge::Manual { serial, .. } => EdgeId::manual(*serial),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        match self {
            Edge::Derived { endpoints, .. } | Edge::Manual { endpoints, .. } => endpoints,
        }
    }

    pub fn handles(&self) -> &Handles {
        match self {
            Edge::Derived { handles, .. } | Edge::Manual { handles, .. } => handles,
        }
    }

    pub fn set_handles(&mut self, new: Handles) {
        match self {
            Edge::Derived { handles, .. } | Edge::Manual { handles, .. } => *handles = new,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Edge::Manual { .. })
    }

    pub fn provenance(&self) -> &'static str {
        match self {
            Edge::Derived { .. } => "derived",
            Edge::Manual { .. } => "manual",
        }
    }
}
