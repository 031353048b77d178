//! CLI entry point for simple-downloader.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use simple_downloader::crawler::Dispatcher;
use simple_downloader::download::{Downloader, TokioFileSystem};
use simple_downloader::failure::{self, Marker};
use simple_downloader::http::HttpClient;
use simple_downloader::traversal::{RunError, Traversal};
use tracing::{debug, error, info};

mod app;
mod cli;

use app::output::{self, ConsoleOutput};
use cli::{Args, Command};

/// Folder under the working directory used when `--path` is not given.
const SAVE_FOLDER_NAME: &str = "saves";

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    if let Err(e) = app::terminal::init_tracing(&args) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }
    debug!(?args, "CLI arguments parsed");

    let Command::Download { path, .. } = &args.command;
    let save_dir = match resolve_save_dir(path.as_deref()) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(2);
        }
    };

    match run(&args, &save_dir).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "unexpected error");
            println!(
                "{} Unknown Error: Please report it to the developer",
                Marker::Unknown
            );
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, save_dir: &Path) -> Result<ExitCode> {
    let Command::Download { url, .. } = &args.command;

    info!(url = %url, save_dir = %save_dir.display(), "start downloading");
    println!("{}", output::banner(url, save_dir));

    let client = Arc::new(HttpClient::new(args.client_config())?);
    let downloader = Downloader::new(args.downloader_config(), Arc::new(TokioFileSystem::new()));
    let console = Arc::new(ConsoleOutput::new(app::terminal::should_show_progress(
        args.quiet,
    )));
    let traversal = Traversal::new(client, Dispatcher::with_default_hosts(), downloader)
        .with_observer(console);

    match traversal.run(url, save_dir).await {
        Ok(counter) => {
            println!("{}", output::summary(&counter));
            Ok(ExitCode::SUCCESS)
        }
        Err(RunError { counter, source }) => {
            error!(error = %source, "run aborted");
            println!("{}", failure::describe(&source).line(url.as_str()));
            println!("{}", output::summary(&counter));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// An explicit path must be an existing directory; the default folder is
/// created on demand.
fn resolve_save_dir(path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = path {
        if !path.is_dir() {
            bail!(
                "save path \"{}\" does not exist or is not a directory",
                path.display()
            );
        }
        return Ok(path.to_path_buf());
    }

    let default = std::env::current_dir()
        .context("cannot determine the working directory")?
        .join(SAVE_FOLDER_NAME);
    std::fs::create_dir_all(&default)
        .with_context(|| format!("cannot create save folder {}", default.display()))?;
    Ok(default)
}
