//! Console output: banner, per-file progress bar, failure lines, summary.

use std::path::Path;
use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use simple_downloader::download::DownloadProgress;
use simple_downloader::failure::{self, Marker};
use simple_downloader::media::MediaFile;
use simple_downloader::traversal::{DownloadCounter, RunObserver, TaskError};
use url::Url;

const BAR_TEMPLATE: &str =
    "[+] {msg} {percent:>3}% [{bar:20}] {bytes}/{total_bytes} | {bytes_per_sec}";
const SPINNER_TEMPLATE: &str = "[+] {msg} {spinner} {bytes} | {bytes_per_sec}";

pub(crate) fn banner(url: &Url, save_dir: &Path) -> String {
    format!(
        "Downloading {url}\nSave path \"{}\"\n{}",
        save_dir.display(),
        "-".repeat(20)
    )
}

pub(crate) fn summary(counter: &DownloadCounter) -> String {
    format!(
        "{} Attempts: {}, successes: {}, failures: {}",
        Marker::Info,
        counter.attempts(),
        counter.successes(),
        counter.failures()
    )
}

/// Prints run events to stdout.
pub(crate) struct ConsoleOutput {
    show_progress: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleOutput {
    pub(crate) fn new(show_progress: bool) -> Self {
        Self {
            show_progress,
            bar: Mutex::new(None),
        }
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|mut slot| slot.take())
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(bar) = self.bar.lock().ok().and_then(|slot| slot.clone()) {
            f(&bar);
        }
    }

    fn new_bar(name: &str, total: Option<u64>) -> ProgressBar {
        let (bar, style) = match total {
            Some(len) => (
                ProgressBar::new(len),
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            ),
            None => (
                ProgressBar::new_spinner(),
                ProgressStyle::with_template(SPINNER_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            ),
        };
        bar.set_style(style.progress_chars("=> "));
        bar.set_message(name.to_string());
        bar
    }
}

impl DownloadProgress for ConsoleOutput {
    fn on_file_start(&self, name: &str, total: Option<u64>) {
        if !self.show_progress {
            return;
        }
        let bar = Self::new_bar(name, total);
        let previous = self.bar.lock().ok().and_then(|mut slot| slot.replace(bar));
        if let Some(previous) = previous {
            previous.finish_and_clear();
        }
    }

    fn on_progress(&self, _name: &str, bytes_delta: u64) {
        self.with_bar(|bar| bar.inc(bytes_delta));
    }

    fn on_file_complete(&self, _name: &str, _bytes: u64) {
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
        }
    }

    fn on_error(&self, _name: &str, _error: &str) {
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
        }
    }
}

impl RunObserver for ConsoleOutput {
    fn on_album(&self, title: &str, dir: &Path) {
        println!("{} Album \"{title}\" -> {}", Marker::Info, dir.display());
    }

    fn on_file_saved(&self, file: &MediaFile, _path: &Path, bytes: u64) {
        println!(
            "{} {} ({})",
            Marker::Success,
            file.filename,
            indicatif::HumanBytes(bytes)
        );
    }

    fn on_failure(&self, url: &Url, error: &TaskError) {
        println!("{}", failure::describe(error).line(url.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_layout() {
        let url = Url::parse("https://cyberdrop.me/a/abc").unwrap();
        let text = banner(&url, Path::new("/tmp/saves"));
        assert_eq!(
            text,
            "Downloading https://cyberdrop.me/a/abc\nSave path \"/tmp/saves\"\n--------------------"
        );
    }

    #[test]
    fn test_summary_line() {
        let counter = DownloadCounter::new();
        assert_eq!(summary(&counter), "[!] Attempts: 0, successes: 0, failures: 0");
    }

    #[test]
    fn test_hidden_progress_never_creates_bar() {
        let output = ConsoleOutput::new(false);
        output.on_file_start("a.mp4", Some(10));
        output.on_progress("a.mp4", 5);
        assert!(output.take_bar().is_none());
    }

    #[test]
    fn test_bar_lifecycle() {
        let output = ConsoleOutput::new(true);
        output.on_file_start("a.mp4", Some(10));
        output.on_progress("a.mp4", 4);
        output.with_bar(|bar| assert_eq!(bar.position(), 4));
        output.on_file_complete("a.mp4", 10);
        assert!(output.take_bar().is_none());
    }
}
