use serde::{Deserialize, Serialize};

/// Parsed schema: the intermediate representation shared by the parser,
/// the importers, the generator and the canvas synchronizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub is_not_null: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_unique: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_increment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub from: ColumnRef,
    pub to: ColumnRef,
    #[serde(rename = "type")]
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    /// Map a `Ref:` operator to a cardinality. Unknown operators fall back
    /// to one-to-many.
    pub fn from_operator(op: &str) -> Self {
        match op {
            ">" => Self::ManyToOne,
            "<" => Self::OneToMany,
            "-" => Self::OneToOne,
            "<>" => Self::ManyToMany,
            _ => Self::OneToMany,
        }
    }

    pub fn operator(self) -> &'static str {
        match self {
            Self::ManyToOne => ">",
            Self::OneToMany => "<",
            Self::OneToOne => "-",
            Self::ManyToMany => "<>",
        }
    }
}

impl Schema {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Flag the "from" column of every relationship as a foreign key.
    /// Relationships naming a missing table or column are left alone.
    pub fn mark_foreign_keys(&mut self) {
        for rel in &self.relationships {
            let Some(table) = self.tables.iter_mut().find(|t| t.name == rel.from.table) else {
                continue;
            };
            if let Some(col) = table.columns.iter_mut().find(|c| c.name == rel.from.column) {
                col.is_foreign_key = true;
            }
        }
    }
}
