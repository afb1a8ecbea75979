//! Per-column type classification.
//!
//! A column is tried against each representation in a fixed order and the
//! first conversion whose failure count stays under the null tolerance
//! wins:
//!
//! 1. boolean lexical mapping
//! 2. categorical (already categorical, or few distinct values)
//! 3. narrowing of columns that are already numeric or temporal
//! 4. number, date, complex number, duration parsed from text
//! 5. text, which always succeeds

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{NaiveDateTime, TimeDelta};

use crate::schema::{
    CellValue, Column, ColumnTypeDecision, ConvertedColumn, DecisionSource, FloatWidth, IntWidth,
    NativeRepr,
};

use super::config::InferenceJobConfig;
use super::parse::{self, Number};

/// Classifies single columns against an [`InferenceJobConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ColumnClassifier<'a> {
    config: &'a InferenceJobConfig,
}

impl<'a> ColumnClassifier<'a> {
    pub fn new(config: &'a InferenceJobConfig) -> Self {
        Self { config }
    }

    /// Decide the type of one column and convert its values.
    pub fn classify(&self, column: &Column) -> ColumnTypeDecision {
        if let Some(values) = self.accepted(self.try_boolean(column)) {
            return ColumnTypeDecision::new(DecisionSource::Boolean, values);
        }

        if let Some(values) = self.try_categorical(column).and_then(|v| self.accepted(v)) {
            return ColumnTypeDecision::new(DecisionSource::Categorical, values);
        }

        if let Some(values) = self.try_narrowing(column).and_then(|v| self.accepted(v)) {
            return ColumnTypeDecision::new(DecisionSource::Narrowed, values);
        }

        let cascade: [fn(&Self, &Column) -> ConvertedColumn; 4] = [
            Self::parse_numbers,
            Self::parse_dates,
            Self::parse_complex,
            Self::parse_durations,
        ];
        if let Some(values) = cascade
            .iter()
            .map(|attempt| attempt(self, column))
            .find(|values| self.is_acceptable(values))
        {
            return ColumnTypeDecision::new(DecisionSource::Parsed, values);
        }

        ColumnTypeDecision::new(
            DecisionSource::Fallback,
            ConvertedColumn::Text(column.cells.clone()),
        )
    }

    fn is_acceptable(&self, values: &ConvertedColumn) -> bool {
        self.config.accepts(values.null_count(), values.len())
    }

    fn accepted(&self, values: ConvertedColumn) -> Option<ConvertedColumn> {
        self.is_acceptable(&values).then_some(values)
    }

    fn try_boolean(&self, column: &Column) -> ConvertedColumn {
        ConvertedColumn::Boolean(
            column
                .cells
                .iter()
                .map(|cell| cell.display_text().and_then(|text| parse::parse_bool(&text)))
                .collect(),
        )
    }

    fn try_categorical(&self, column: &Column) -> Option<ConvertedColumn> {
        let texts: Vec<Option<String>> =
            column.cells.iter().map(CellValue::display_text).collect();

        let distinct: HashSet<&str> = texts.iter().flatten().map(String::as_str).collect();
        let limit = self.config.categorical_limit(column.len());
        if column.categorical || distinct.len() <= limit {
            return Some(categorize_by_text(&texts, distinct));
        }

        // Spellings of one value ("1.5", "1.50") count once
        let keys: Vec<Option<CategoryKey>> = column
            .cells
            .iter()
            .map(|cell| CategoryKey::of(cell, self.config.day_first))
            .collect();
        let distinct_keys: HashSet<&CategoryKey> = keys.iter().flatten().collect();
        if distinct_keys.len() > limit {
            return None;
        }
        Some(categorize_by_key(&texts, &keys))
    }

    fn try_narrowing(&self, column: &Column) -> Option<ConvertedColumn> {
        let converted = match column.native_repr() {
            NativeRepr::Integer => {
                let values: Vec<Option<i64>> = column
                    .cells
                    .iter()
                    .map(|cell| match cell {
                        CellValue::Integer(i) => Some(*i),
                        _ => None,
                    })
                    .collect();
                let width = IntWidth::narrowest(values.iter().flatten());
                ConvertedColumn::Integer { values, width }
            }
            NativeRepr::Float => {
                let values: Vec<Option<f64>> = column
                    .cells
                    .iter()
                    .map(|cell| match cell {
                        CellValue::Integer(i) => Some(*i as f64),
                        CellValue::Float(f) if !f.is_nan() => Some(*f),
                        _ => None,
                    })
                    .collect();
                let width = FloatWidth::narrowest(values.iter().flatten());
                ConvertedColumn::Float { values, width }
            }
            NativeRepr::DateTime => ConvertedColumn::DateTime(
                column
                    .cells
                    .iter()
                    .map(|cell| match cell {
                        CellValue::DateTime(dt) => Some(*dt),
                        _ => None,
                    })
                    .collect(),
            ),
            NativeRepr::Duration => ConvertedColumn::Duration(
                column
                    .cells
                    .iter()
                    .map(|cell| match cell {
                        CellValue::Duration(d) => Some(*d),
                        _ => None,
                    })
                    .collect(),
            ),
            NativeRepr::Complex => ConvertedColumn::Complex(
                column
                    .cells
                    .iter()
                    .map(|cell| match cell {
                        CellValue::Complex(c) => Some(*c),
                        _ => None,
                    })
                    .collect(),
            ),
            NativeRepr::Boolean | NativeRepr::Object => return None,
        };
        Some(converted)
    }

    fn parse_numbers(&self, column: &Column) -> ConvertedColumn {
        let numbers: Vec<Option<Number>> = column.cells.iter().map(parse::parse_number).collect();

        let all_integers = numbers
            .iter()
            .flatten()
            .all(|n| matches!(n, Number::Int(_)));

        if all_integers {
            ConvertedColumn::Integer {
                values: numbers
                    .into_iter()
                    .map(|n| match n {
                        Some(Number::Int(i)) => Some(i),
                        _ => None,
                    })
                    .collect(),
                width: IntWidth::I64,
            }
        } else {
            ConvertedColumn::Float {
                values: numbers.into_iter().map(|n| n.map(Number::as_f64)).collect(),
                width: FloatWidth::F64,
            }
        }
    }

    fn parse_dates(&self, column: &Column) -> ConvertedColumn {
        let day_first = self.config.day_first;
        ConvertedColumn::DateTime(
            column
                .cells
                .iter()
                .map(|cell| match cell {
                    CellValue::DateTime(dt) => Some(*dt),
                    CellValue::Text(text) => parse::parse_datetime(text, day_first),
                    _ => None,
                })
                .collect(),
        )
    }

    fn parse_complex(&self, column: &Column) -> ConvertedColumn {
        ConvertedColumn::Complex(
            column
                .cells
                .iter()
                .map(|cell| match cell {
                    CellValue::Complex(c) => Some(*c),
                    CellValue::Null => None,
                    other => other.display_text().and_then(|t| parse::parse_complex(&t)),
                })
                .collect(),
        )
    }

    fn parse_durations(&self, column: &Column) -> ConvertedColumn {
        ConvertedColumn::Duration(
            column
                .cells
                .iter()
                .map(|cell| match cell {
                    CellValue::Duration(d) => Some(*d),
                    CellValue::Text(text) => parse::parse_duration(text),
                    _ => None,
                })
                .collect(),
        )
    }
}

/// Identity of a cell's value for cardinality checks.
///
/// Keys follow the same cascade as the column conversions, so a text cell
/// and the typed cell it converts into share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CategoryKey {
    Flag(bool),
    Int(i64),
    Float(u64),
    DateTime(NaiveDateTime),
    Duration(TimeDelta),
    Complex(u64, u64),
    Text(String),
}

impl CategoryKey {
    fn of(cell: &CellValue, day_first: bool) -> Option<Self> {
        if cell.is_null() {
            return None;
        }
        let key = match cell {
            CellValue::Bool(b) => CategoryKey::Flag(*b),
            CellValue::Integer(_) | CellValue::Float(_) => {
                CategoryKey::number(parse::parse_number(cell)?)
            }
            CellValue::DateTime(dt) => CategoryKey::DateTime(*dt),
            CellValue::Duration(d) => CategoryKey::Duration(*d),
            CellValue::Complex(c) => CategoryKey::Complex(c.re.to_bits(), c.im.to_bits()),
            CellValue::Text(text) => {
                if let Some(number) = parse::parse_number(cell) {
                    CategoryKey::number(number)
                } else if let Some(dt) = parse::parse_datetime(text, day_first) {
                    CategoryKey::DateTime(dt)
                } else if let Some(c) = parse::parse_complex(text) {
                    CategoryKey::Complex(c.re.to_bits(), c.im.to_bits())
                } else if let Some(d) = parse::parse_duration(text) {
                    CategoryKey::Duration(d)
                } else {
                    CategoryKey::Text(text.clone())
                }
            }
            CellValue::Null => return None,
        };
        Some(key)
    }

    /// Whole floats share a key with the equal integer.
    fn number(number: Number) -> Self {
        match number {
            Number::Int(i) => CategoryKey::Int(i),
            Number::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => CategoryKey::Int(f as i64),
            Number::Float(f) => CategoryKey::Float(f.to_bits()),
        }
    }
}

/// Categories are the distinct display texts.
fn categorize_by_text(texts: &[Option<String>], distinct: HashSet<&str>) -> ConvertedColumn {
    let mut categories: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    categories.sort_by(|a, b| compare_categories(a, b));

    let lookup: HashMap<&str, u32> = categories
        .iter()
        .enumerate()
        .map(|(code, label)| (label.as_str(), code as u32))
        .collect();
    let codes = texts
        .iter()
        .map(|text| text.as_deref().and_then(|t| lookup.get(t).copied()))
        .collect();

    ConvertedColumn::Categorical { categories, codes }
}

/// Categories are the distinct keys, labelled with their first spelling.
fn categorize_by_key(texts: &[Option<String>], keys: &[Option<CategoryKey>]) -> ConvertedColumn {
    let mut labels: HashMap<&CategoryKey, &str> = HashMap::new();
    for (key, text) in keys.iter().zip(texts) {
        if let (Some(key), Some(text)) = (key, text) {
            labels.entry(key).or_insert(text.as_str());
        }
    }

    let mut categories: Vec<String> = labels.values().map(|label| label.to_string()).collect();
    categories.sort_by(|a, b| compare_categories(a, b));
    categories.dedup();

    let codes_by_label: HashMap<&str, u32> = categories
        .iter()
        .enumerate()
        .map(|(code, label)| (label.as_str(), code as u32))
        .collect();
    let codes = keys
        .iter()
        .map(|key| {
            key.as_ref()
                .and_then(|key| labels.get(key))
                .and_then(|label| codes_by_label.get(label).copied())
        })
        .collect();

    ConvertedColumn::Categorical { categories, codes }
}

/// Numbers sort before other labels and by value; other labels sort by text.
fn compare_categories(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
