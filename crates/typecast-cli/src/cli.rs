//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use typecast::InferenceJobConfig;

/// Default location of the job record store.
pub const DEFAULT_STORE: &str = "typecast-jobs.json";

/// Typecast: infer column types of CSV and spreadsheet files
#[derive(Parser)]
#[command(name = "typecast")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer the column types of a data file
    Infer {
        /// Path to the data file (.csv, .xlsx or .xls)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Record the job in this store file
        #[arg(long)]
        store: Option<PathBuf>,

        #[command(flatten)]
        inference: InferenceArgs,
    },

    /// List recorded jobs, newest first
    Jobs {
        /// Path to the job store file
        #[arg(long, default_value = DEFAULT_STORE)]
        store: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the stored column labels of a job
    Update {
        /// Job record id
        #[arg(value_name = "ID")]
        id: u64,

        /// Column labels as a JSON object, e.g. '{"age": "Number"}'
        #[arg(long)]
        dtypes: String,

        /// Path to the job store file
        #[arg(long, default_value = DEFAULT_STORE)]
        store: PathBuf,
    },

    /// Serve the upload API over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for web server
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Persist job records to this file (in memory if omitted)
        #[arg(long)]
        store: Option<PathBuf>,

        #[command(flatten)]
        inference: InferenceArgs,
    },
}

/// Inference thresholds shared by `infer` and `serve`.
#[derive(Args, Debug, Clone)]
pub struct InferenceArgs {
    /// Largest fraction of nulls a conversion may produce (exclusive)
    #[arg(long, default_value_t = 0.25)]
    pub null_tolerance: f64,

    /// Most distinct values a categorical column may have
    #[arg(long, default_value_t = 100)]
    pub categorical_ceiling: usize,

    /// Datasets with at most this many rows are inferred as one chunk
    #[arg(long, default_value_t = 10_000)]
    pub min_chunk_rows: usize,

    /// Fewest chunks a large dataset is split into
    #[arg(long, default_value_t = 8)]
    pub min_parallelism: usize,

    /// Cap on worker threads (defaults to one per chunk)
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Read ambiguous numeric dates month-first (03/04 is March 4)
    #[arg(long)]
    pub month_first: bool,
}

impl InferenceArgs {
    pub fn into_config(self) -> InferenceJobConfig {
        InferenceJobConfig {
            null_tolerance_fraction: self.null_tolerance,
            categorical_unique_ceiling: self.categorical_ceiling,
            min_chunk_row_count: self.min_chunk_rows,
            min_parallelism: self.min_parallelism,
            day_first: !self.month_first,
            max_workers: self.max_workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags_match_default_config() {
        let cli = Cli::parse_from(["typecast", "infer", "data.csv"]);
        match cli.command {
            Commands::Infer { inference, .. } => {
                assert_eq!(inference.into_config(), InferenceJobConfig::default());
            }
            _ => panic!("expected infer"),
        }
    }

    #[test]
    fn test_month_first_flag() {
        let cli = Cli::parse_from([
            "typecast",
            "serve",
            "--port",
            "9000",
            "--month-first",
            "--max-workers",
            "4",
        ]);
        match cli.command {
            Commands::Serve {
                port, inference, ..
            } => {
                assert_eq!(port, 9000);
                let config = inference.into_config();
                assert!(!config.day_first);
                assert_eq!(config.max_workers, Some(4));
            }
            _ => panic!("expected serve"),
        }
    }
}
