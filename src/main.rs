mod cli;
mod engine;
mod format;
mod model;
mod orchestrator;
mod telemetry;
#[cfg(feature = "tui")]
mod tui;
mod view;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = args.command.is_some() || cfg!(not(feature = "tui"));
    if is_non_tui {
        telemetry::init_stderr("warn");
    }

    match cli::run(args).await {
        Ok(()) => Ok(()),
        Err(e) if is_non_tui => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
        Err(e) => Err(e),
    }
}
