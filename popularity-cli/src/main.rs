//! Entry point for the `popularity` command-line interface.
#![forbid(unsafe_code)]

use std::process;

use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
#[expect(
    clippy::print_stderr,
    reason = "top-level errors are reported to the terminal before exiting"
)]
async fn main() {
    init_logging();
    if let Err(error) = popularity_cli::run().await {
        eprintln!("popularity: {error}");
        process::exit(1);
    }
}

/// Route `log` records to stderr, filtered by `RUST_LOG` (default `info`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
