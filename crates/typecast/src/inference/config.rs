//! Per-job inference configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypecastError};

/// Thresholds and parallelism settings for one inference job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceJobConfig {
    /// Largest acceptable fraction of null/failed values for a conversion.
    pub null_tolerance_fraction: f64,
    /// Upper bound on distinct values for a categorical column.
    pub categorical_unique_ceiling: usize,
    /// Datasets with at most this many rows run as a single chunk.
    pub min_chunk_row_count: usize,
    /// Minimum chunk count once chunking is triggered.
    pub min_parallelism: usize,
    /// Read ambiguous numeric dates as day/month (true) or month/day.
    pub day_first: bool,
    /// Cap on worker threads (None = one worker per chunk).
    pub max_workers: Option<usize>,
}

impl Default for InferenceJobConfig {
    fn default() -> Self {
        Self {
            null_tolerance_fraction: 0.25,
            categorical_unique_ceiling: 100,
            min_chunk_row_count: 10_000,
            min_parallelism: 8,
            day_first: true,
            max_workers: None,
        }
    }
}

impl InferenceJobConfig {
    /// Check that the configuration can drive a job.
    pub fn validate(&self) -> Result<()> {
        if !(self.null_tolerance_fraction > 0.0 && self.null_tolerance_fraction <= 1.0) {
            return Err(TypecastError::Config(format!(
                "null_tolerance_fraction must be in (0, 1], got {}",
                self.null_tolerance_fraction
            )));
        }
        if self.min_chunk_row_count == 0 {
            return Err(TypecastError::Config(
                "min_chunk_row_count must be at least 1".to_string(),
            ));
        }
        if self.min_parallelism == 0 {
            return Err(TypecastError::Config(
                "min_parallelism must be at least 1".to_string(),
            ));
        }
        if self.max_workers == Some(0) {
            return Err(TypecastError::Config(
                "max_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `null_count` failures out of `row_count` values is acceptable.
    pub fn accepts(&self, null_count: usize, row_count: usize) -> bool {
        (null_count as f64) < row_count as f64 * self.null_tolerance_fraction
    }

    /// Most distinct values a column of `row_count` rows may have and still
    /// be categorical.
    pub fn categorical_limit(&self, row_count: usize) -> usize {
        self.categorical_unique_ceiling.min(row_count / 2)
    }

    /// Name of the date-order convention in force.
    pub fn date_convention(&self) -> &'static str {
        if self.day_first {
            "day-first"
        } else {
            "month-first"
        }
    }
}
