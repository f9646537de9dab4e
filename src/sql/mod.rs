//! SQL DDL import and export.

mod dialect;
mod generator;
mod parser;
mod types;

pub use dialect::{Dialect, UnknownDialect};
pub use generator::generate;
pub use parser::{parse_sql, SqlParseError};
pub use types::{canonical_type, dialect_type};
