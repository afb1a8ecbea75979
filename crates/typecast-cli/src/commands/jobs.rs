//! Jobs command - list recorded inference jobs.

use std::path::PathBuf;

use colored::Colorize;
use typecast::store::JobStatus;
use typecast::{JsonFileStore, ResultStore};

pub fn run(store: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let listing = JsonFileStore::open(&store)?.list()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if listing.is_empty() {
        println!("No jobs recorded in {}", store.display());
        return Ok(());
    }

    println!(
        "{} {}",
        "Jobs in".cyan().bold(),
        store.display().to_string().white()
    );
    println!();

    for job in &listing {
        let status = match job.status {
            JobStatus::Success => "Success".green(),
            JobStatus::Failed => "Failed".red(),
        };
        println!(
            "  {:>5}  {:<8} {:<32} {}",
            job.id,
            status,
            job.name,
            job.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
        for (column, label) in &job.dtypes {
            println!("         {:<28} {}", column, label);
        }
    }

    Ok(())
}
