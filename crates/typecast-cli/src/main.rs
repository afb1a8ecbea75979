//! Typecast CLI - column type inference for tabular uploads.

mod cli;
mod commands;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Log to stderr; `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Infer {
            file,
            json,
            store,
            inference,
        } => commands::infer::run(file, json, store, inference.into_config(), cli.verbose),

        Commands::Jobs { store, json } => commands::jobs::run(store, json),

        Commands::Update { id, dtypes, store } => commands::update::run(id, dtypes, store),

        Commands::Serve {
            host,
            port,
            store,
            inference,
        } => commands::serve::run(host, port, store, inference.into_config()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
