//! Rows, positions, and the entries stored in identifier buckets.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record from a source: field name to scalar or nested value, in source order.
pub type Row = serde_json::Map<String, Value>;

/// A row's place in its source's single read pass.
pub type Position = u64;

/// Normalized identifier to the ordered entries sharing it.
pub type Buckets = IndexMap<String, Vec<IndexEntry>>;

/// A row together with the position it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The indexed row.
    pub row: Row,
    /// Position of the row in its source.
    pub position: Position,
}

impl IndexEntry {
    /// Create an entry for a row read at `position`.
    pub fn new(row: Row, position: Position) -> Self {
        Self { row, position }
    }
}

/// Extract the identifier string of `field` from a row.
///
/// Returns `None` when the field is missing, null, empty, or not a scalar.
pub fn identifier_of(row: &Row, field: &str) -> Option<String> {
    let value = row.get(field)?;
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Build a row from `(field, value)` pairs, keeping their order.
pub fn row_from<I, K>(fields: I) -> Row
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    fields.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
