#![forbid(unsafe_code)]

//! Binary entrypoint that watches the drop directory until the watch is lost
//! or the process is interrupted.

use clap::Parser;
use dropvault_app::{AppResult, Cli, run_app};

/// Parses flags, then blocks in the dispatch loop until shutdown.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app(Cli::parse()).await.map(|_| ())
}
