use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::cli::Args;

/// Default filter directive for the given flags.
///
/// Priority below `RUST_LOG`: quiet (error) > verbose count > warn, so log
/// lines stay out of the console output unless asked for.
pub(crate) fn default_level(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub(crate) fn should_show_progress(quiet: bool) -> bool {
    !quiet
}

/// Installs the global subscriber, writing to `--log-file` when given.
pub(crate) fn init_tracing(args: &Args) -> Result<()> {
    let level = default_level(args.quiet, args.verbose);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    match args.log_file.as_deref() {
        Some(path) => {
            let file = open_log_file(path)?;
            let _ = tracing_subscriber::fmt()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_env_filter(filter)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .try_init();
        }
    }
    Ok(())
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))
}
