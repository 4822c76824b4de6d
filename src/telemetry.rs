//! Tracing subscriber setup.
//!
//! Subcommands log to stderr. The TUI owns the terminal, so interactive sessions log to
//! `<cache dir>/transcript-upload-cli/tui.log` instead. `RUST_LOG` overrides the level.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init_stderr(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg_attr(not(feature = "tui"), allow(dead_code))]
pub fn log_file_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("transcript-upload-cli").join("tui.log"))
}

/// Route logs to the TUI log file. Returns the file path in use.
#[cfg_attr(not(feature = "tui"), allow(dead_code))]
pub fn init_file(default_level: &str) -> Result<PathBuf> {
    let path = log_file_path().context("no cache directory available for the log file")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(path)
}
