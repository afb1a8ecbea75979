//! Main Engine struct and public API.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::Result;
use crate::inference::{readable_schema, reconcile, ChunkOrchestrator, InferenceJobConfig};
use crate::input::{Dataset, Parser, ParserConfig, SourceMetadata};
use crate::schema::{ChunkSchema, ChunkSummary, FinalSchema, ReadableSchema};
use crate::store::{NewJobRecord, RecordId, ResultStore};

/// Configuration for an [`Engine`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Parser configuration.
    pub parser: ParserConfig,
    /// Thresholds and parallelism for each job.
    pub inference: InferenceJobConfig,
}

/// Result of inferring the column types of one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceReport {
    /// Metadata about the source file.
    pub source: SourceMetadata,
    /// Thresholds the job ran with.
    pub config: InferenceJobConfig,
    /// Reconciled type tag per column.
    pub schema: FinalSchema,
    /// Readable label per column.
    pub dtypes: ReadableSchema,
    /// Per-chunk tags before reconciliation.
    pub chunks: Vec<ChunkSummary>,
    /// Wall-clock time spent in inference, in milliseconds.
    pub elapsed_ms: u64,
}

/// A successful job as recorded in a result store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub id: RecordId,
    pub dtypes: ReadableSchema,
}

/// Ingests files and infers their column types.
pub struct Engine {
    config: EngineConfig,
    parser: Parser,
    orchestrator: ChunkOrchestrator,
}

impl Engine {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let orchestrator = ChunkOrchestrator::new(config.inference.clone());
        Self {
            config,
            parser,
            orchestrator,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Infer column types of a file on disk.
    pub fn infer_file(&self, path: impl AsRef<Path>) -> Result<InferenceReport> {
        let (dataset, source) = self.parser.parse_file(path)?;
        self.infer_parsed(dataset, source)
    }

    /// Infer column types of an uploaded file given its name and bytes.
    pub fn infer(&self, file_name: &str, bytes: &[u8]) -> Result<InferenceReport> {
        let (dataset, source) = self.parser.parse_bytes(file_name, bytes)?;
        self.infer_parsed(dataset, source)
    }

    /// Infer column types of an in-memory dataset.
    ///
    /// Returns the reconciled schema and the per-chunk schemas it was
    /// built from.
    pub fn infer_dataset(&self, dataset: Dataset) -> Result<(FinalSchema, Vec<ChunkSchema>)> {
        let chunks = self.orchestrator.run(dataset)?;
        let schema = reconcile(&chunks)?;
        Ok((schema, chunks))
    }

    fn infer_parsed(&self, dataset: Dataset, source: SourceMetadata) -> Result<InferenceReport> {
        let started = Instant::now();
        let (schema, chunks) = self.infer_dataset(dataset)?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            file = %source.file,
            rows = source.row_count,
            columns = source.column_count,
            chunks = chunks.len(),
            elapsed_ms,
            "Inferred column types"
        );

        Ok(InferenceReport {
            config: self.config.inference.clone(),
            dtypes: readable_schema(&schema),
            chunks: chunks.iter().map(ChunkSchema::summary).collect(),
            source,
            schema,
            elapsed_ms,
        })
    }

    /// Run a full job: ingest, infer, and record the outcome in `store`.
    ///
    /// A failed job is still recorded, with `completed = false` and an empty
    /// schema, before the original error is returned.
    pub fn run_job(
        &self,
        file_name: &str,
        bytes: &[u8],
        store: &dyn ResultStore,
    ) -> Result<JobOutcome> {
        match self.infer(file_name, bytes) {
            Ok(report) => {
                let record =
                    store.create(NewJobRecord::succeeded(file_name, report.dtypes.clone()))?;
                Ok(JobOutcome {
                    id: record.id,
                    dtypes: report.dtypes,
                })
            }
            Err(e) => {
                error!(file = file_name, kind = e.kind().as_str(), error = %e, "Inference job failed");
                if let Err(store_err) = store.create(NewJobRecord::failed(file_name)) {
                    error!(file = file_name, error = %store_err, "Could not record failed job");
                }
                Err(e)
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
