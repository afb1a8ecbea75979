//! Ingestion of uploaded files into datasets.

mod parser;
mod source;

pub use parser::{is_null_marker, FileFormat, Parser, ParserConfig};
pub use source::{Chunk, Dataset, SourceMetadata};
