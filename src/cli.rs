//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use simple_downloader::download::{DEFAULT_CHUNK_SIZE, DownloaderConfig};
use simple_downloader::http::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_REDIRECTS};
use simple_downloader::http::{ClientConfig, RequestDelay, RetryPolicy};
use url::Url;

/// Longest delay or timeout accepted on the command line, in seconds.
const MAX_SECONDS: f64 = 3600.0;

/// Download files and albums from file-sharing hosts.
///
/// Supports cyberdrop, bunkr and pixeldrain links. Albums are saved into a
/// sub-directory named after the album title.
#[derive(Parser, Debug)]
#[command(name = "simple-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors and hide the progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Minimum pause before each request, in seconds (0 disables)
    #[arg(long, global = true, default_value_t = 1.1, value_parser = parse_seconds)]
    pub delay: f64,

    /// Maximum pause before each request, in seconds; the pause is random between --delay and this
    #[arg(long, global = true, default_value_t = 3.1, value_parser = parse_seconds)]
    pub delay_max: f64,

    /// Redirects followed per request (0-30)
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_REDIRECTS as u8, value_parser = clap::value_parser!(u8).range(0..=30))]
    pub max_redirects: u8,

    /// Connect timeout in seconds
    #[arg(long, global = true, default_value_t = 3.03, value_parser = parse_timeout)]
    pub connect_timeout: f64,

    /// Read timeout in seconds
    #[arg(long, global = true, default_value_t = 42.0, value_parser = parse_timeout)]
    pub read_timeout: f64,

    /// Total attempts per request for transient failures (1-10)
    #[arg(short = 'r', long, global = true, default_value_t = DEFAULT_MAX_ATTEMPTS as u8, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub retries: u8,

    /// Bytes per disk write
    #[arg(long, global = true, default_value_t = DEFAULT_CHUNK_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..=16 * 1024 * 1024))]
    pub chunk_size: u64,

    /// Override the User-Agent header
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download a file or an album
    Download {
        /// File or album URL
        url: Url,

        /// Existing directory to save into (default: ./saves, created if missing)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

impl Args {
    /// HTTP client settings from the flags.
    pub fn client_config(&self) -> ClientConfig {
        let min = seconds_to_duration(self.delay);
        let max = seconds_to_duration(self.delay_max);
        let mut config = ClientConfig {
            delay: RequestDelay::from_bounds(min, Some(max)),
            connect_timeout: seconds_to_duration(self.connect_timeout),
            read_timeout: seconds_to_duration(self.read_timeout),
            max_redirects: usize::from(self.max_redirects),
            retry: RetryPolicy::with_max_attempts(u32::from(self.retries)),
            ..ClientConfig::default()
        };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent.clone_from(user_agent);
        }
        config
    }

    /// Downloader settings from the flags.
    pub fn downloader_config(&self) -> DownloaderConfig {
        DownloaderConfig {
            chunk_size: usize::try_from(self.chunk_size).unwrap_or(DEFAULT_CHUNK_SIZE),
        }
    }
}

/// Millisecond precision, so `3.03` maps to exactly 3030 ms.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn seconds_to_duration(secs: f64) -> Duration {
    Duration::from_millis((secs * 1000.0).round() as u64)
}

fn parse_seconds(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number of seconds"))?;
    if !secs.is_finite() || !(0.0..=MAX_SECONDS).contains(&secs) {
        return Err(format!("must be between 0 and {MAX_SECONDS} seconds"));
    }
    Ok(secs)
}

fn parse_timeout(value: &str) -> Result<f64, String> {
    let secs = parse_seconds(value)?;
    if secs == 0.0 {
        return Err("timeout must be greater than 0".to_string());
    }
    Ok(secs)
}
