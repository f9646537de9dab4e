//! Connector attachment.
//!
//! Every column row exposes four handles: `<col>-left` (incoming),
//! `<col>-left-source` (outgoing), `<col>-right` (outgoing) and
//! `<col>-right-target` (incoming). The resolver picks the pair that faces
//! the other node; it does not avoid crossings.

use crate::graph::Handles;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Left,
    LeftSource,
    Right,
    RightTarget,
}

impl Handle {
    pub fn suffix(self) -> &'static str {
        match self {
            Handle::Left => "left",
            Handle::LeftSource => "left-source",
            Handle::Right => "right",
            Handle::RightTarget => "right-target",
        }
    }

    /// Outgoing handles start connections.
    pub fn is_source(self) -> bool {
        matches!(self, Handle::LeftSource | Handle::Right)
    }

    pub fn id(self, column: &str) -> String {
        format!("{}-{}", column, self.suffix())
    }
}

/// Split a handle id into its column name and handle kind.
pub fn parse_handle(id: &str) -> Option<(&str, Handle)> {
    // Longer suffixes first so `x-left-source` is not read as column `x-left`
    [
        Handle::LeftSource,
        Handle::RightTarget,
        Handle::Left,
        Handle::Right,
    ]
    .into_iter()
    .find_map(|h| {
        let column = id.strip_suffix(h.suffix())?.strip_suffix('-')?;
        (!column.is_empty()).then_some((column, h))
    })
}

/// Axis-aligned box of a node, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeBox {
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Choose the (source, target) handle kinds for a connector.
pub fn pick_sides(source: &NodeBox, target: &NodeBox, node_width: f64) -> (Handle, Handle) {
    let dx = target.center_x() - source.center_x();
    let half = node_width / 2.0;

    if dx > half {
        (Handle::Right, Handle::Left)
    } else if dx < -half {
        (Handle::LeftSource, Handle::RightTarget)
    } else if target.center_y() >= source.center_y() {
        // Stacked, target below or level: loop out and back in on the right
        (Handle::Right, Handle::RightTarget)
    } else {
        (Handle::LeftSource, Handle::Left)
    }
}

pub fn resolve_handles(
    source: &NodeBox,
    target: &NodeBox,
    node_width: f64,
    from_column: &str,
    to_column: &str,
) -> Handles {
    let (s, t) = pick_sides(source, target, node_width);
    Handles {
        source_handle: s.id(from_column),
        target_handle: t.id(to_column),
    }
}

/// Handles used before node boxes are known.
pub fn default_handles(from_column: &str, to_column: &str) -> Handles {
    Handles {
        source_handle: Handle::Right.id(from_column),
        target_handle: Handle::Left.id(to_column),
    }
}
