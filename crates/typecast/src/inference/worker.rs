//! Classification of every column of one chunk.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, TypecastError};
use crate::input::Chunk;
use crate::schema::ChunkSchema;

use super::classifier::ColumnClassifier;
use super::config::InferenceJobConfig;

/// Unit of work run by the orchestrator for each chunk.
///
/// Implementations must not share mutable state between chunks; each call
/// owns its chunk outright.
pub trait ChunkWorker: Sync {
    fn infer(&self, chunk: Chunk, config: &InferenceJobConfig) -> Result<ChunkSchema>;
}

/// The default worker: runs the column classifier over each column.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyingWorker;

impl ChunkWorker for ClassifyingWorker {
    fn infer(&self, chunk: Chunk, config: &InferenceJobConfig) -> Result<ChunkSchema> {
        infer_chunk(chunk, config)
    }
}

/// Classify every column of `chunk`.
///
/// A column whose length disagrees with the chunk's row range cannot be
/// classified and fails the chunk.
pub fn infer_chunk(chunk: Chunk, config: &InferenceJobConfig) -> Result<ChunkSchema> {
    let classifier = ColumnClassifier::new(config);
    let rows = chunk.row_count();

    let mut decisions = IndexMap::with_capacity(chunk.columns().len());
    for column in chunk.columns() {
        if column.len() != rows {
            return Err(TypecastError::Inference {
                chunk: chunk.index(),
                message: format!(
                    "column '{}' has {} values, chunk has {} rows",
                    column.name,
                    column.len(),
                    rows
                ),
            });
        }
        decisions.insert(column.name.clone(), classifier.classify(column));
    }

    debug!(
        chunk = chunk.index(),
        rows,
        columns = decisions.len(),
        "Classified chunk"
    );

    Ok(ChunkSchema::new(chunk.index(), chunk.rows(), decisions))
}
