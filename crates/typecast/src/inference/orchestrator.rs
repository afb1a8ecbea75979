//! Splitting a dataset into chunks and running workers in parallel.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, error, info};

use crate::error::{Result, TypecastError};
use crate::input::{Chunk, Dataset};
use crate::schema::ChunkSchema;

use super::config::InferenceJobConfig;
use super::worker::{ChunkWorker, ClassifyingWorker};

/// Number of chunks a dataset of `row_count` rows is split into.
///
/// One chunk up to `min_chunk_row_count` rows; above that,
/// `max(min_parallelism, row_count / min_chunk_row_count)`.
pub fn chunk_count(row_count: usize, config: &InferenceJobConfig) -> usize {
    let min_rows = config.min_chunk_row_count.max(1);
    if row_count <= min_rows {
        1
    } else {
        config.min_parallelism.max(row_count / min_rows)
    }
}

/// Runs a [`ChunkWorker`] over every chunk of a dataset.
///
/// Each chunk is moved into exactly one worker. If any worker fails or
/// panics the whole run fails; no partial result is returned.
#[derive(Debug, Clone)]
pub struct ChunkOrchestrator<W = ClassifyingWorker> {
    config: InferenceJobConfig,
    worker: W,
}

impl ChunkOrchestrator<ClassifyingWorker> {
    pub fn new(config: InferenceJobConfig) -> Self {
        Self::with_worker(config, ClassifyingWorker)
    }
}

impl<W: ChunkWorker> ChunkOrchestrator<W> {
    /// Orchestrator running a custom worker.
    pub fn with_worker(config: InferenceJobConfig, worker: W) -> Self {
        Self { config, worker }
    }

    pub fn config(&self) -> &InferenceJobConfig {
        &self.config
    }

    /// Infer a schema for every chunk of `dataset`, in chunk order.
    pub fn run(&self, dataset: Dataset) -> Result<Vec<ChunkSchema>> {
        self.config.validate()?;

        let rows = dataset.row_count();
        let planned = chunk_count(rows, &self.config);

        if planned == 1 {
            debug!(rows, "Running single chunk inline");
            let schema = self.run_isolated(dataset.into_single_chunk())?;
            return Ok(vec![schema]);
        }

        let chunks = dataset.split(planned);
        drop(dataset);

        let workers = self
            .config
            .max_workers
            .map_or(chunks.len(), |max| max.min(chunks.len()))
            .max(1);
        info!(rows, chunks = chunks.len(), workers, "Dispatching chunks");

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("typecast-worker-{i}"))
            .build()
            .map_err(|e| TypecastError::WorkerPool(e.to_string()))?;

        let results: Vec<Result<ChunkSchema>> = pool.install(|| {
            chunks
                .into_par_iter()
                .map(|chunk| self.run_isolated(chunk))
                .collect()
        });

        results.into_iter().collect::<Result<Vec<_>>>().inspect_err(|e| {
            error!(error = %e, "Chunk inference failed, discarding job");
        })
    }

    /// Run the worker on one chunk, turning a panic into an error.
    fn run_isolated(&self, chunk: Chunk) -> Result<ChunkSchema> {
        let index = chunk.index();
        panic::catch_unwind(AssertUnwindSafe(|| self.worker.infer(chunk, &self.config)))
            .unwrap_or_else(|payload| {
                Err(TypecastError::Inference {
                    chunk: index,
                    message: format!("worker panicked: {}", panic_message(payload.as_ref())),
                })
            })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
