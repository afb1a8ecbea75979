//! Infer command - classify the columns of one file.

use std::path::{Path, PathBuf};

use colored::Colorize;
use typecast::{Engine, EngineConfig, InferenceJobConfig, InferenceReport, JsonFileStore, TypeTag};

pub fn run(
    file: PathBuf,
    json_output: bool,
    store: Option<PathBuf>,
    inference: InferenceJobConfig,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    inference.validate()?;
    let engine = Engine::with_config(EngineConfig {
        inference,
        ..Default::default()
    });

    let Some(store_path) = store else {
        let report = engine.infer_file(&file)?;
        if json_output {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report, verbose);
        }
        return Ok(());
    };

    let bytes = std::fs::read(&file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    let store = JsonFileStore::open(&store_path)?;
    let outcome = engine.run_job(&file_name(&file), &bytes, &store)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "{} {} {}",
            "Recorded job".cyan().bold(),
            outcome.id.to_string().white().bold(),
            format!("in {}", store_path.display()).dimmed()
        );
        println!();
        for (column, label) in &outcome.dtypes {
            println!("  {:<28} {}", column, label.green());
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_report(report: &InferenceReport, verbose: bool) {
    println!(
        "{} {}",
        "Column types for".cyan().bold(),
        report.source.file.white()
    );
    println!(
        "  {} rows, {} columns, {} chunk(s), {} ms",
        report.source.row_count,
        report.source.column_count,
        report.chunks.len(),
        report.elapsed_ms
    );
    println!("  Dates read {}", report.config.date_convention());
    println!();

    for (column, tag) in report.schema.iter() {
        let label = report.dtypes.get(column).map(String::as_str).unwrap_or("");
        let label = match tag {
            TypeTag::Text => label.white(),
            TypeTag::Categorical => label.yellow(),
            _ => label.green(),
        };
        println!("  {:<28} {:<16} {}", column, label, tag.to_string().dimmed());
    }

    if verbose && report.chunks.len() > 1 {
        println!();
        println!("{}", "Chunks:".yellow().bold());
        for chunk in &report.chunks {
            let tags: Vec<String> = chunk
                .tags
                .iter()
                .map(|(column, tag)| format!("{column}={tag}"))
                .collect();
            println!(
                "  #{} rows {}..{}: {}",
                chunk.index,
                chunk.start_row,
                chunk.end_row,
                tags.join(", ")
            );
        }
    }
}
