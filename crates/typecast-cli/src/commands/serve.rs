//! Serve command - run the upload API.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use typecast::{Engine, EngineConfig, InferenceJobConfig, JsonFileStore, MemoryStore, ResultStore};

use crate::server::{app, state::AppState};

pub fn run(
    host: String,
    port: u16,
    store_path: Option<PathBuf>,
    inference: InferenceJobConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    inference.validate()?;
    let engine = Engine::with_config(EngineConfig {
        inference,
        ..Default::default()
    });

    let store: Arc<dyn ResultStore> = match &store_path {
        Some(path) => Arc::new(JsonFileStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };
    let state = AppState::new(engine, store);

    let url = format!("http://{}:{}", host, port);
    println!();
    println!(
        "{} {}",
        "Starting typecast server at".cyan().bold(),
        url.white().bold()
    );
    println!();
    match &store_path {
        Some(path) => println!("  Store: {}", path.display()),
        None => println!("  Store: in memory"),
    }
    println!();
    println!("Press {} to stop the server", "Ctrl+C".yellow().bold());
    println!();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(app::run_server(state, &host, port))?;

    println!("{}", "Shutting down...".yellow());
    Ok(())
}
