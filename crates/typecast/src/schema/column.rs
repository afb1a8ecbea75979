//! Columns and per-column type decisions.

use std::ops::Range;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use super::types::{CellValue, Complex, FloatWidth, IntWidth, NativeRepr, TypeTag};

/// A named column of raw cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name (unique within a dataset).
    pub name: String,
    /// Cell values in row order.
    pub cells: Vec<CellValue>,
    /// Set when the column already holds categorical data.
    pub categorical: bool,
}

impl Column {
    /// Create a column of raw cells.
    pub fn new(name: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            cells,
            categorical: false,
        }
    }

    /// Create a column of text cells, treating empty strings as null.
    pub fn from_text<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        let cells = values
            .iter()
            .map(|v| {
                let v = v.as_ref();
                if v.is_empty() {
                    CellValue::Null
                } else {
                    CellValue::Text(v.to_string())
                }
            })
            .collect();
        Self::new(name, cells)
    }

    /// Mark the column as already categorical.
    pub fn into_categorical(mut self) -> Self {
        self.categorical = true;
        self
    }

    /// Number of cells (rows).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of missing cells.
    pub fn null_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_null()).count()
    }

    /// Representation shared by every non-null cell.
    ///
    /// Integer and float cells mix to Float; any other mix, and an all-null
    /// column, is Object.
    pub fn native_repr(&self) -> NativeRepr {
        let mut reprs = self.cells.iter().filter_map(CellValue::native_repr);
        let Some(first) = reprs.next() else {
            return NativeRepr::Object;
        };
        reprs.fold(first, NativeRepr::combine)
    }

    /// Copy of the rows in `range`.
    pub fn slice(&self, range: Range<usize>) -> Column {
        Column {
            name: self.name.clone(),
            cells: self.cells[range].to_vec(),
            categorical: self.categorical,
        }
    }
}

/// Converted values of a column, one variant per type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertedColumn {
    Boolean(Vec<Option<bool>>),
    Categorical {
        /// Sorted category labels.
        categories: Vec<String>,
        /// Index into `categories` per row.
        codes: Vec<Option<u32>>,
    },
    Integer {
        values: Vec<Option<i64>>,
        width: IntWidth,
    },
    Float {
        values: Vec<Option<f64>>,
        width: FloatWidth,
    },
    DateTime(Vec<Option<NaiveDateTime>>),
    Complex(Vec<Option<Complex>>),
    Duration(Vec<Option<TimeDelta>>),
    /// The original cells, untouched.
    Text(Vec<CellValue>),
}

impl ConvertedColumn {
    /// Tag for this representation.
    pub fn tag(&self) -> TypeTag {
        match self {
            ConvertedColumn::Boolean(_) => TypeTag::Boolean,
            ConvertedColumn::Categorical { .. } => TypeTag::Categorical,
            ConvertedColumn::Integer { .. } => TypeTag::Integer,
            ConvertedColumn::Float { .. } => TypeTag::Float,
            ConvertedColumn::DateTime(_) => TypeTag::DateTime,
            ConvertedColumn::Complex(_) => TypeTag::Complex,
            ConvertedColumn::Duration(_) => TypeTag::Duration,
            ConvertedColumn::Text(_) => TypeTag::Text,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            ConvertedColumn::Boolean(v) => v.len(),
            ConvertedColumn::Categorical { codes, .. } => codes.len(),
            ConvertedColumn::Integer { values, .. } => values.len(),
            ConvertedColumn::Float { values, .. } => values.len(),
            ConvertedColumn::DateTime(v) => v.len(),
            ConvertedColumn::Complex(v) => v.len(),
            ConvertedColumn::Duration(v) => v.len(),
            ConvertedColumn::Text(v) => v.len(),
        }
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of missing or failed values.
    pub fn null_count(&self) -> usize {
        match self {
            ConvertedColumn::Boolean(v) => count_none(v),
            ConvertedColumn::Categorical { codes, .. } => count_none(codes),
            ConvertedColumn::Integer { values, .. } => count_none(values),
            ConvertedColumn::Float { values, .. } => {
                values.iter().filter(|v| v.is_none_or(f64::is_nan)).count()
            }
            ConvertedColumn::DateTime(v) => count_none(v),
            ConvertedColumn::Complex(v) => count_none(v),
            ConvertedColumn::Duration(v) => count_none(v),
            ConvertedColumn::Text(v) => v.iter().filter(|c| c.is_null()).count(),
        }
    }

    /// Back to raw cells, so a converted column can be classified again.
    pub fn to_cells(&self) -> Vec<CellValue> {
        fn cells<T: Clone>(values: &[Option<T>], f: impl Fn(T) -> CellValue) -> Vec<CellValue> {
            values
                .iter()
                .map(|v| v.clone().map(&f).unwrap_or(CellValue::Null))
                .collect()
        }

        match self {
            ConvertedColumn::Boolean(v) => cells(v, CellValue::Bool),
            ConvertedColumn::Categorical { categories, codes } => codes
                .iter()
                .map(|code| {
                    code.and_then(|c| categories.get(c as usize))
                        .map(|s| CellValue::Text(s.clone()))
                        .unwrap_or(CellValue::Null)
                })
                .collect(),
            ConvertedColumn::Integer { values, .. } => cells(values, CellValue::Integer),
            ConvertedColumn::Float { values, .. } => cells(values, CellValue::Float),
            ConvertedColumn::DateTime(v) => cells(v, CellValue::DateTime),
            ConvertedColumn::Complex(v) => cells(v, CellValue::Complex),
            ConvertedColumn::Duration(v) => cells(v, CellValue::Duration),
            ConvertedColumn::Text(v) => v.clone(),
        }
    }
}

fn count_none<T>(values: &[Option<T>]) -> usize {
    values.iter().filter(|v| v.is_none()).count()
}

/// Which step of the classification cascade produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Lexical boolean mapping.
    Boolean,
    /// Low-cardinality or already-categorical column.
    Categorical,
    /// Column was already typed; only narrowed.
    Narrowed,
    /// Parsed from text by the fallback cascade.
    Parsed,
    /// Nothing was accepted; original text kept.
    Fallback,
}

/// The classifier's verdict for one column of one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTypeDecision {
    source: DecisionSource,
    null_count: usize,
    values: ConvertedColumn,
}

impl ColumnTypeDecision {
    pub(crate) fn new(source: DecisionSource, values: ConvertedColumn) -> Self {
        Self {
            source,
            null_count: values.null_count(),
            values,
        }
    }

    /// Inferred type tag.
    pub fn tag(&self) -> TypeTag {
        self.values.tag()
    }

    /// Cascade step that produced this decision.
    pub fn source(&self) -> DecisionSource {
        self.source
    }

    /// Missing or failed values after conversion.
    pub fn null_count(&self) -> usize {
        self.null_count
    }

    /// Fraction of missing or failed values (0.0 for an empty column).
    pub fn null_fraction(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.null_count as f64 / self.values.len() as f64
        }
    }

    /// Converted values.
    pub fn values(&self) -> &ConvertedColumn {
        &self.values
    }

    /// Rebuild a column holding the converted values.
    pub fn to_column(&self, name: impl Into<String>) -> Column {
        let column = Column::new(name, self.values.to_cells());
        if self.tag() == TypeTag::Categorical {
            column.into_categorical()
        } else {
            column
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_repr_of_mixed_numeric_column() {
        let column = Column::new(
            "x",
            vec![CellValue::Integer(1), CellValue::Null, CellValue::Float(2.5)],
        );
        assert_eq!(column.native_repr(), NativeRepr::Float);
    }

    #[test]
    fn test_native_repr_of_all_null_column_is_object() {
        let column = Column::new("x", vec![CellValue::Null, CellValue::Null]);
        assert_eq!(column.native_repr(), NativeRepr::Object);
    }

    #[test]
    fn test_null_count_of_text_column() {
        let column = Column::from_text("x", &["a", "b", "", "a"]);
        assert_eq!(column.null_count(), 1);
    }

    #[test]
    fn test_slice_copies_range() {
        let column = Column::from_text("x", &["a", "b", "c", "d"]);
        let slice = column.slice(1..3);
        assert_eq!(slice.len(), 2);
        assert_eq!(slice.cells[0], CellValue::Text("b".to_string()));
    }

    #[test]
    fn test_categorical_to_column_keeps_flag() {
        let decision = ColumnTypeDecision::new(
            DecisionSource::Categorical,
            ConvertedColumn::Categorical {
                categories: vec!["a".to_string(), "b".to_string()],
                codes: vec![Some(1), None, Some(0)],
            },
        );
        assert_eq!(decision.null_count(), 1);

        let column = decision.to_column("x");
        assert!(column.categorical);
        assert_eq!(column.cells[0], CellValue::Text("b".to_string()));
        assert_eq!(column.cells[1], CellValue::Null);
    }

    #[test]
    fn test_float_nan_counts_as_null() {
        let values = ConvertedColumn::Float {
            values: vec![Some(1.0), Some(f64::NAN), None],
            width: FloatWidth::F64,
        };
        assert_eq!(values.null_count(), 2);
    }
}
