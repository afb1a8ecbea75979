//! Core type definitions for cells and inferred column types.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Inferred type tag for a column.
///
/// Declaration order is not the widening order; see
/// [`crate::inference::widen`] for how tags combine across chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// true/false values.
    Boolean,
    /// Narrow-domain values stored as codes into a category list.
    Categorical,
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Calendar dates and timestamps.
    DateTime,
    /// Real/imaginary pairs.
    Complex,
    /// Time differences.
    Duration,
    /// Original textual representation; the fallback that never fails.
    Text,
}

impl TypeTag {
    /// All tags, in declaration order.
    pub const ALL: [TypeTag; 8] = [
        TypeTag::Boolean,
        TypeTag::Categorical,
        TypeTag::Integer,
        TypeTag::Float,
        TypeTag::DateTime,
        TypeTag::Complex,
        TypeTag::Duration,
        TypeTag::Text,
    ];

    /// snake_case name, as used in serialized schemas.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Boolean => "boolean",
            TypeTag::Categorical => "categorical",
            TypeTag::Integer => "integer",
            TypeTag::Float => "float",
            TypeTag::DateTime => "date_time",
            TypeTag::Complex => "complex",
            TypeTag::Duration => "duration",
            TypeTag::Text => "text",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = String;

    /// Case-insensitive; underscores, dashes and spaces are ignored so
    /// `date_time`, `DateTime` and `datetime` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "boolean" | "bool" => Ok(TypeTag::Boolean),
            "categorical" | "category" => Ok(TypeTag::Categorical),
            "integer" | "int" => Ok(TypeTag::Integer),
            "float" => Ok(TypeTag::Float),
            "datetime" => Ok(TypeTag::DateTime),
            "complex" => Ok(TypeTag::Complex),
            "duration" | "timedelta" => Ok(TypeTag::Duration),
            "text" | "string" => Ok(TypeTag::Text),
            _ => Err(format!("Unknown type tag: {}", s)),
        }
    }
}

/// The representation a column already has before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeRepr {
    Boolean,
    Integer,
    Float,
    DateTime,
    Duration,
    Complex,
    /// Text or a mix of cell kinds.
    Object,
}

impl NativeRepr {
    /// Combine the representations of two cells of the same column.
    pub(crate) fn combine(self, other: NativeRepr) -> NativeRepr {
        match (self, other) {
            (a, b) if a == b => a,
            (NativeRepr::Integer, NativeRepr::Float) | (NativeRepr::Float, NativeRepr::Integer) => {
                NativeRepr::Float
            }
            _ => NativeRepr::Object,
        }
    }
}

/// A complex number as a real/imaginary pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im.is_sign_negative() {
            write!(f, "({}-{}j)", self.re, -self.im)
        } else {
            write!(f, "({}+{}j)", self.re, self.im)
        }
    }
}

/// A single raw cell of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
    Duration(TimeDelta),
    Complex(Complex),
}

impl CellValue {
    /// Null markers and NaN floats are both missing values.
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Representation of this cell, or None for missing values.
    pub fn native_repr(&self) -> Option<NativeRepr> {
        if self.is_null() {
            return None;
        }
        Some(match self {
            CellValue::Bool(_) => NativeRepr::Boolean,
            CellValue::Integer(_) => NativeRepr::Integer,
            CellValue::Float(_) => NativeRepr::Float,
            CellValue::DateTime(_) => NativeRepr::DateTime,
            CellValue::Duration(_) => NativeRepr::Duration,
            CellValue::Complex(_) => NativeRepr::Complex,
            CellValue::Null | CellValue::Text(_) => NativeRepr::Object,
        })
    }

    /// Display text of a non-null cell.
    ///
    /// Whole floats keep a trailing `.0` so `1.0` never reads as the
    /// integer literal `1`.
    pub fn display_text(&self) -> Option<String> {
        if self.is_null() {
            return None;
        }
        Some(match self {
            CellValue::Bool(b) => b.to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(v) => format_float(*v),
            CellValue::Text(s) => s.clone(),
            CellValue::DateTime(dt) => dt.to_string(),
            CellValue::Duration(d) => format_duration(*d),
            CellValue::Complex(c) => c.to_string(),
            CellValue::Null => return None,
        })
    }
}

fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Formats a duration as `D days HH:MM:SS[.fffffffff]`.
fn format_duration(duration: TimeDelta) -> String {
    let negative = duration < TimeDelta::zero();
    let abs = if negative { -duration } else { duration };

    let total_seconds = abs.num_seconds();
    let nanos = (abs - TimeDelta::seconds(total_seconds))
        .num_nanoseconds()
        .unwrap_or(0);
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let sign = if negative { "-" } else { "" };
    if nanos == 0 {
        format!("{sign}{days} days {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{days} days {hours:02}:{minutes:02}:{seconds:02}.{nanos:09}")
    }
}

/// Storage width chosen when narrowing an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
}

impl IntWidth {
    /// Narrowest width that holds every value.
    pub fn narrowest<'a>(values: impl IntoIterator<Item = &'a i64>) -> Self {
        values
            .into_iter()
            .map(|&v| {
                if i8::try_from(v).is_ok() {
                    IntWidth::I8
                } else if i16::try_from(v).is_ok() {
                    IntWidth::I16
                } else if i32::try_from(v).is_ok() {
                    IntWidth::I32
                } else {
                    IntWidth::I64
                }
            })
            .max()
            .unwrap_or(IntWidth::I8)
    }
}

/// Storage width chosen when narrowing a float column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    /// F32 when every value survives a round trip through f32.
    pub fn narrowest<'a>(values: impl IntoIterator<Item = &'a f64>) -> Self {
        let lossless = values
            .into_iter()
            .all(|&v| v.is_nan() || (v as f32) as f64 == v);
        if lossless {
            FloatWidth::F32
        } else {
            FloatWidth::F64
        }
    }
}
