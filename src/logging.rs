//! Tracing setup
//!
//! `RUST_LOG` wins when set. While the TUI owns the terminal, logs go to a
//! file so they don't corrupt the display; every other command writes to
//! stderr.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "featurewiz=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Route logs to `log_file`, creating its directory if needed
pub fn init_for_tui(log_file: Option<&Path>) -> Result<()> {
    let Some(log_file) = log_file else {
        // Nowhere safe to write; stay silent rather than draw over the UI
        return Ok(());
    };
    if let Some(dir) = log_file.parent() {
        std::fs::create_dir_all(dir).context("Failed to create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .context("Failed to open log file")?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false);

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
    {
        tracing::warn!(error = %err, "tracing already initialized");
    }
    Ok(())
}

pub fn init_for_cli() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
    {
        tracing::warn!(error = %err, "tracing already initialized");
    }
}
