//! The JSON interchange document used to save and restore a diagram.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ast::Schema;
use crate::graph::Position;

pub const DOCUMENT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramDocument {
    pub version: String,
    pub dbml_code: String,
    #[serde(rename = "parsedDBML")]
    pub parsed_dbml: Schema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_positions: Option<BTreeMap<String, Position>>,
    pub exported_at: String,
}

impl DiagramDocument {
    pub fn new(
        text: &str,
        schema: &Schema,
        positions: Option<BTreeMap<String, Position>>,
    ) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            dbml_code: text.to_string(),
            parsed_dbml: schema.clone(),
            node_positions: positions,
            exported_at: now_iso(),
        }
    }
}

/// Pretty-printed interchange document for `text`.
pub fn export_json(
    text: &str,
    schema: &Schema,
    positions: Option<BTreeMap<String, Position>>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&DiagramDocument::new(text, schema, positions))
}

/// Current UTC time, ISO-8601 with milliseconds.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(target_arch = "wasm32")]
pub fn now_iso() -> String {
    String::from(js_sys::Date::new_0().to_iso_string())
}
