//! Error types for the typecast library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for typecast operations.
#[derive(Debug, Error)]
pub enum TypecastError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File extension outside the supported set.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The byte stream could not be shaped into a table.
    #[error("Parse error: {0}")]
    IngestionParse(String),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from the spreadsheet reader.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Empty file or no data to analyze.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// A chunk worker failed; the whole job is aborted.
    #[error("Inference failed in chunk {chunk}: {message}")]
    Inference { chunk: usize, message: String },

    /// Chunk schemas that cannot be reconciled into one schema.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The worker pool could not be started.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// Result store read/write failure.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// No job record with this id.
    #[error("Job record not found: {0}")]
    NotFound(u64),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse error category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedFormat,
    IngestionParse,
    Inference,
    Persistence,
    Config,
}

impl ErrorKind {
    /// Stable snake_case name, used in API error bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::IngestionParse => "ingestion_parse",
            ErrorKind::Inference => "inference",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Config => "config",
        }
    }
}

impl TypecastError {
    /// Which part of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TypecastError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            TypecastError::Io { .. }
            | TypecastError::IngestionParse(_)
            | TypecastError::Csv(_)
            | TypecastError::Spreadsheet(_)
            | TypecastError::EmptyData(_) => ErrorKind::IngestionParse,
            TypecastError::Inference { .. }
            | TypecastError::SchemaMismatch(_)
            | TypecastError::WorkerPool(_) => ErrorKind::Inference,
            TypecastError::Persistence(_)
            | TypecastError::NotFound(_)
            | TypecastError::Json(_) => ErrorKind::Persistence,
            TypecastError::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result type alias for typecast operations.
pub type Result<T> = std::result::Result<T, TypecastError>;
