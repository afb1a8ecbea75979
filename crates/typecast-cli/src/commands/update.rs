//! Update command - overwrite the column labels of a recorded job.

use std::path::PathBuf;

use colored::Colorize;
use typecast::{JsonFileStore, ReadableSchema, ResultStore};

pub fn run(id: u64, dtypes: String, store: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let dtypes: ReadableSchema = serde_json::from_str(&dtypes)
        .map_err(|e| format!("--dtypes must be a JSON object of column labels: {}", e))?;

    let record = JsonFileStore::open(&store)?.update_dtypes(id, dtypes)?;

    println!("{} {}", "Record Updated".green().bold(), record.id);
    for (column, label) in &record.data_types {
        println!("  {:<28} {}", column, label);
    }

    Ok(())
}
