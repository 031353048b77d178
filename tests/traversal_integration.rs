//! End-to-end traversal tests: dispatch, album expansion, downloads and
//! counters against a mock host.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde_json::json;
use simple_downloader::crawler::{Cyberdrop, Dispatcher};
use simple_downloader::download::{
    DownloadError, DownloadProgress, Downloader, DownloaderConfig, FileSystem, FileWriter,
    TokioFileSystem,
};
use simple_downloader::http::HttpClient;
use simple_downloader::media::MediaFile;
use simple_downloader::traversal::{RunObserver, TaskError, Traversal};
use tempfile::TempDir;
use tokio::io::AsyncWrite;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::fixtures::{mock_server, quiet_config, recording_client_with};

macro_rules! require_mock_server {
    () => {{
        let Some(server) = mock_server().await else {
            return;
        };
        server
    }};
}

/// Records traversal events.
#[derive(Default)]
struct RecordingObserver {
    albums: Mutex<Vec<PathBuf>>,
    saved: Mutex<Vec<String>>,
    failures: Mutex<Vec<String>>,
}

impl DownloadProgress for RecordingObserver {}

impl RunObserver for RecordingObserver {
    fn on_album(&self, _title: &str, dir: &Path) {
        self.albums.lock().unwrap().push(dir.to_path_buf());
    }

    fn on_file_saved(&self, file: &MediaFile, _path: &Path, _bytes: u64) {
        self.saved.lock().unwrap().push(file.filename.to_string());
    }

    fn on_failure(&self, url: &Url, _error: &TaskError) {
        self.failures.lock().unwrap().push(url.to_string());
    }
}

/// Writer that reports a full disk on the first write.
struct FullDiskWriter;

impl AsyncWrite for FullDiskWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::StorageFull,
            "No space left on device",
        )))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Real directories, but every file write hits a full disk.
struct FullDisk;

#[async_trait]
impl FileSystem for FullDisk {
    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        TokioFileSystem::new().create_dir_all(path).await
    }

    async fn create_file(&self, _path: &Path) -> io::Result<FileWriter> {
        Ok(Box::new(FullDiskWriter))
    }

    async fn remove_file(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{p}", server.uri())).unwrap()
}

/// Mounts a cyberdrop-style album `/a/alb` titled `title` whose children
/// are `/f/<id>` for each `(id, name)`, plus the file API and stream bodies.
async fn mount_album(server: &MockServer, title: &str, files: &[(&str, &str)]) {
    let links: String = files
        .iter()
        .map(|(id, _)| format!(r#"<a class="image" href="/f/{id}">{id}</a>"#))
        .collect();
    let body = format!(r#"<h1>{title}</h1><div id="table">{links}</div>"#);
    Mock::given(method("GET"))
        .and(path("/a/alb"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html"))
        .mount(server)
        .await;

    for (id, name) in files {
        Mock::given(method("GET"))
            .and(path(format!("/api/f/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": name,
                "url": format!("{}/files/{name}", server.uri()),
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/files/{name}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(format!("content of {name}").into_bytes(), "image/jpeg"),
            )
            .mount(server)
            .await;
    }
}

fn dispatcher_for(server: &MockServer) -> Dispatcher {
    let api = url(server, "/api/");
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("127.0.0.1", "cyberdrop", move |client| {
        Box::new(Cyberdrop::with_api_base(client, api.clone()))
    });
    dispatcher
}

fn client() -> Arc<HttpClient> {
    recording_client_with(quiet_config(1)).0
}

// ==================== Counting Tests ====================

#[tokio::test]
async fn test_album_with_one_unsavable_file_counts_three_attempts() {
    let server = require_mock_server!();
    mount_album(
        &server,
        "Alb",
        &[("1", "one.jpg"), ("2", "two.jpg"), ("3", "three.jpg")],
    )
    .await;

    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("Alb").join("two.jpg")).unwrap();

    let observer = Arc::new(RecordingObserver::default());
    let traversal = Traversal::new(client(), dispatcher_for(&server), Downloader::default())
        .with_observer(observer.clone());
    let counter = traversal
        .run(&url(&server, "/a/alb"), temp.path())
        .await
        .unwrap();

    assert_eq!(counter.attempts(), 3);
    assert_eq!(counter.successes(), 2);
    assert_eq!(counter.failures(), 1);

    let album_dir = temp.path().join("Alb");
    assert_eq!(
        std::fs::read_to_string(album_dir.join("one.jpg")).unwrap(),
        "content of one.jpg"
    );
    assert_eq!(
        std::fs::read_to_string(album_dir.join("three.jpg")).unwrap(),
        "content of three.jpg"
    );
    assert_eq!(*observer.albums.lock().unwrap(), vec![album_dir]);
    assert_eq!(
        *observer.saved.lock().unwrap(),
        vec!["one.jpg".to_string(), "three.jpg".to_string()]
    );
    assert_eq!(
        *observer.failures.lock().unwrap(),
        vec![url(&server, "/f/2").to_string()]
    );
}

#[tokio::test]
async fn test_single_file_root_downloads_into_save_dir() {
    let server = require_mock_server!();
    mount_album(&server, "unused", &[("solo", "solo.png")]).await;

    let temp = TempDir::new().unwrap();
    let traversal = Traversal::new(client(), dispatcher_for(&server), Downloader::default());
    let counter = traversal
        .run(&url(&server, "/f/solo"), temp.path())
        .await
        .unwrap();

    assert_eq!((counter.attempts(), counter.successes()), (1, 1));
    assert!(temp.path().join("solo.png").is_file());
}

#[tokio::test]
async fn test_child_on_unsupported_host_is_counted_and_skipped() {
    let server = require_mock_server!();
    let body = r#"<h1>Mixed</h1><div id="table">
        <a class="image" href="https://unknown.example/f/9">elsewhere</a>
        <a class="image" href="/f/1">here</a>
    </div>"#;
    Mock::given(method("GET"))
        .and(path("/a/mixed"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&server)
        .await;
    mount_album(&server, "unused", &[("1", "one.jpg")]).await;

    let temp = TempDir::new().unwrap();
    let observer = Arc::new(RecordingObserver::default());
    let traversal = Traversal::new(client(), dispatcher_for(&server), Downloader::default())
        .with_observer(observer.clone());
    let counter = traversal
        .run(&url(&server, "/a/mixed"), temp.path())
        .await
        .unwrap();

    assert_eq!(counter.attempts(), 2);
    assert_eq!(counter.successes(), 1);
    assert_eq!(
        *observer.failures.lock().unwrap(),
        vec!["https://unknown.example/f/9".to_string()]
    );
    assert!(temp.path().join("Mixed").join("one.jpg").is_file());
}

#[tokio::test]
async fn test_nested_album_recurses_into_subdirectory() {
    let server = require_mock_server!();
    mount_album(&server, "unused", &[("1", "one.jpg"), ("2", "two.jpg")]).await;
    let outer = r#"<h1>Outer</h1><div id="table">
        <a class="image" href="/f/1">one</a>
        <a class="image" href="/a/inner">inner</a>
    </div>"#;
    let inner = r#"<h1>Inner</h1><div id="table">
        <a class="image" href="/f/2">two</a>
    </div>"#;
    for (p, body) in [("/a/outer", outer), ("/a/inner", inner)] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
            .mount(&server)
            .await;
    }

    let temp = TempDir::new().unwrap();
    let observer = Arc::new(RecordingObserver::default());
    let traversal = Traversal::new(client(), dispatcher_for(&server), Downloader::default())
        .with_observer(observer.clone());
    let counter = traversal
        .run(&url(&server, "/a/outer"), temp.path())
        .await
        .unwrap();

    // Only the two files count; neither album does.
    assert_eq!(counter.attempts(), 2);
    assert_eq!(counter.successes(), 2);
    assert_eq!(counter.failures(), 0);

    let outer_dir = temp.path().join("Outer");
    let inner_dir = outer_dir.join("Inner");
    assert!(outer_dir.join("one.jpg").is_file());
    assert_eq!(
        std::fs::read_to_string(inner_dir.join("two.jpg")).unwrap(),
        "content of two.jpg"
    );
    assert!(!outer_dir.join("two.jpg").exists());
    assert_eq!(*observer.albums.lock().unwrap(), vec![outer_dir, inner_dir]);
}

// ==================== Fatal Error Tests ====================

#[tokio::test]
async fn test_device_full_aborts_run_before_next_file() {
    let server = require_mock_server!();
    mount_album(&server, "Alb", &[("1", "one.jpg")]).await;
    Mock::given(method("GET"))
        .and(path("/api/f/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "two.jpg",
            "url": format!("{}/files/two.jpg", server.uri()),
        })))
        .expect(0)
        .mount(&server)
        .await;

    // Album lists 1 then 2; the second must never be requested.
    let body = r#"<h1>Alb</h1><div id="table">
        <a class="image" href="/f/1">1</a><a class="image" href="/f/2">2</a>
    </div>"#;
    Mock::given(method("GET"))
        .and(path("/a/full"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let downloader = Downloader::new(DownloaderConfig::default(), Arc::new(FullDisk));
    let traversal = Traversal::new(client(), dispatcher_for(&server), downloader);
    let err = traversal
        .run(&url(&server, "/a/full"), temp.path())
        .await
        .unwrap_err();

    assert!(matches!(
        err.source,
        TaskError::Download(DownloadError::DeviceFull { .. })
    ));
    assert!(err.source.is_fatal());
    assert_eq!(err.counter.attempts(), 1);
    assert_eq!(err.counter.successes(), 0);
}

// ==================== Album Directory Tests ====================

#[tokio::test]
async fn test_album_dir_falls_back_when_title_path_is_a_file() {
    let server = require_mock_server!();
    mount_album(&server, "Alb", &[("1", "one.jpg")]).await;

    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("Alb"), b"not a directory").unwrap();

    let traversal = Traversal::new(client(), dispatcher_for(&server), Downloader::default());
    let counter = traversal
        .run(&url(&server, "/a/alb"), temp.path())
        .await
        .unwrap();

    assert_eq!(counter.successes(), 1);
    assert!(
        temp.path()
            .join("unknown album")
            .join("one.jpg")
            .is_file()
    );
}

#[tokio::test]
async fn test_album_title_is_sanitized() {
    let server = require_mock_server!();
    mount_album(&server, "Trip: 2024/06?", &[("1", "one.jpg")]).await;

    let temp = TempDir::new().unwrap();
    let traversal = Traversal::new(client(), dispatcher_for(&server), Downloader::default());
    traversal
        .run(&url(&server, "/a/alb"), temp.path())
        .await
        .unwrap();

    assert!(temp.path().join("Trip_ 2024_06_").join("one.jpg").is_file());
}
