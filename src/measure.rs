use crate::geometry::NodeBox;
use crate::graph::Node;
use unicode_width::UnicodeWidthStr;

/// Sizing of table nodes. Connector routing uses the fixed `node_width`;
/// `display_width` widens a node for long labels when it is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMetrics {
    pub node_width: f64,
    pub char_width: f64,
    pub header_height: f64,
    pub row_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self {
            node_width: 260.0,
            char_width: 8.0,
            header_height: 40.0,
            row_height: 28.0,
            padding_x: 12.0,
            padding_y: 8.0,
        }
    }
}

impl NodeMetrics {
    pub fn with_node_width(node_width: f64) -> Self {
        Self {
            node_width,
            ..Self::default()
        }
    }

    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    pub fn node_height(&self, rows: usize) -> f64 {
        self.header_height + rows as f64 * self.row_height + self.padding_y * 2.0
    }

    pub fn display_width(&self, node: &Node) -> f64 {
        let header_width = self.text_width(&node.id);

        let max_row_width = node
            .columns
            .iter()
            .map(|c| self.text_width(&c.name) + self.text_width(&c.typ) + self.char_width * 2.0)
            .fold(0.0, f64::max);

        let content_width = header_width.max(max_row_width) + self.padding_x * 2.0;
        content_width.max(self.node_width)
    }

    pub fn node_box(&self, node: &Node) -> NodeBox {
        NodeBox {
            x: node.position.x,
            y: node.position.y,
            width: self.node_width,
            height: self.node_height(node.columns.len()),
        }
    }
}
