//! Table-level schemas: per chunk, final, and readable.

use std::ops::Range;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::column::ColumnTypeDecision;
use super::types::TypeTag;

/// Decisions for every column of one chunk.
#[derive(Debug, Clone)]
pub struct ChunkSchema {
    index: usize,
    rows: Range<usize>,
    decisions: IndexMap<String, ColumnTypeDecision>,
}

impl ChunkSchema {
    pub(crate) fn new(
        index: usize,
        rows: Range<usize>,
        decisions: IndexMap<String, ColumnTypeDecision>,
    ) -> Self {
        Self {
            index,
            rows,
            decisions,
        }
    }

    /// Position of the chunk in row order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Row range of the source dataset covered by this chunk.
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Decision for a column.
    pub fn get(&self, column: &str) -> Option<&ColumnTypeDecision> {
        self.decisions.get(column)
    }

    /// Decisions in column order.
    pub fn decisions(&self) -> impl Iterator<Item = (&str, &ColumnTypeDecision)> {
        self.decisions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.decisions.keys().map(String::as_str)
    }

    /// Tags only, for diagnostics.
    pub fn summary(&self) -> ChunkSummary {
        ChunkSummary {
            index: self.index,
            start_row: self.rows.start,
            end_row: self.rows.end,
            tags: self
                .decisions
                .iter()
                .map(|(name, decision)| (name.clone(), decision.tag()))
                .collect(),
        }
    }
}

/// Serializable view of a [`ChunkSchema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub index: usize,
    pub start_row: usize,
    pub end_row: usize,
    pub tags: IndexMap<String, TypeTag>,
}

/// One reconciled type tag per column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinalSchema {
    columns: IndexMap<String, TypeTag>,
}

impl FinalSchema {
    /// Tag of a column.
    pub fn get(&self, column: &str) -> Option<TypeTag> {
        self.columns.get(column).copied()
    }

    /// Columns and tags in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TypeTag)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<(String, TypeTag)> for FinalSchema {
    fn from_iter<I: IntoIterator<Item = (String, TypeTag)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Column name to human-readable label, e.g. `{"age": "Number"}`.
pub type ReadableSchema = IndexMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_schema_serializes_as_map() {
        let schema: FinalSchema = vec![
            ("when".to_string(), TypeTag::DateTime),
            ("count".to_string(), TypeTag::Integer),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(json, r#"{"when":"date_time","count":"integer"}"#);
    }

    #[test]
    fn test_final_schema_keeps_first_order() {
        let schema: FinalSchema = vec![
            ("b".to_string(), TypeTag::Text),
            ("a".to_string(), TypeTag::Float),
            ("b".to_string(), TypeTag::Boolean),
        ]
        .into_iter()
        .collect();

        let names: Vec<&str> = schema.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(schema.get("b"), Some(TypeTag::Boolean));
    }
}
