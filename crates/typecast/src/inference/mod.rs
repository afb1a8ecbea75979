//! Type inference: column classification, chunked execution, and schema
//! reconciliation.

mod classifier;
mod config;
mod label;
mod orchestrator;
mod parse;
mod reconcile;
mod worker;

pub use classifier::ColumnClassifier;
pub use config::InferenceJobConfig;
pub use label::{label_for_name, readable_label, readable_schema, FALLBACK_LABEL};
pub use orchestrator::{chunk_count, ChunkOrchestrator};
pub use parse::{parse_bool, parse_complex, parse_datetime, parse_duration, parse_number, Number};
pub use reconcile::{reconcile, widen};
pub use worker::{infer_chunk, ChunkWorker, ClassifyingWorker};
