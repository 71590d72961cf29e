//! todo - persistent task list CLI

use clap::Parser;
use todo_store::cli::Cli;
use todo_store::output::{emit_error, infer_command_name_from_args};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    let json = cli.json;

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(err) => {
            init_tracing("warn");
            let _ = emit_error(&command, &err, json);
            std::process::exit(err.exit_code());
        }
    };
    init_tracing(&config.log_level);

    match cli.run(config) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let _ = emit_error(&command, &err, json);
            std::process::exit(err.exit_code());
        }
    }
}

/// RUST_LOG wins over the configured level; invalid or huge filters are ignored.
fn init_tracing(configured: &str) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .or_else(|| EnvFilter::try_new(configured).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    // stdout carries command output only.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
