//! Schema types for representing columns and inferred table structure.

mod column;
mod table;
mod types;

pub use column::{Column, ColumnTypeDecision, ConvertedColumn, DecisionSource};
pub use table::{ChunkSchema, ChunkSummary, FinalSchema, ReadableSchema};
pub use types::{CellValue, Complex, FloatWidth, IntWidth, NativeRepr, TypeTag};
