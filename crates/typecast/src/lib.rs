//! Typecast: column type inference for uploaded tabular files.
//!
//! Typecast reads a CSV or spreadsheet upload, decides a semantic type for
//! every column, and reports a human-readable label per column.
//!
//! # Pipeline
//!
//! - **Ingestion**: `.csv` is decoded as Windows-1252; `.xlsx`/`.xls` read
//!   the first worksheet. Other extensions are rejected.
//! - **Chunking**: large datasets are split into contiguous row chunks that
//!   are classified in parallel, each chunk owned by one worker.
//! - **Classification**: each column of each chunk goes through a fixed
//!   cascade (boolean, categorical, narrowing, number, date, complex,
//!   duration) and falls back to text.
//! - **Reconciliation**: chunk verdicts are merged into one tag per column
//!   and mapped to labels such as `"Number"` or `"Date"`.
//!
//! # Example
//!
//! ```no_run
//! use typecast::Engine;
//!
//! let engine = Engine::new();
//! let report = engine.infer_file("upload.csv").unwrap();
//!
//! for (column, label) in &report.dtypes {
//!     println!("{column}: {label}");
//! }
//! ```

pub mod error;
pub mod inference;
pub mod input;
pub mod schema;
pub mod store;

mod engine;

pub use crate::engine::{Engine, EngineConfig, InferenceReport, JobOutcome};
pub use error::{ErrorKind, Result, TypecastError};
pub use inference::InferenceJobConfig;
pub use input::{Dataset, SourceMetadata};
pub use schema::{FinalSchema, ReadableSchema, TypeTag};
pub use store::{JobListing, JobRecord, JsonFileStore, MemoryStore, ResultStore};
