//! Integration tests for `Downloader::save` against a raw TCP responder that
//! can cut a body short, which a regular mock server cannot do.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use simple_downloader::download::{DownloadError, Downloader, NoProgress};
use simple_downloader::media::{Filename, MediaFile};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

mod support;
use support::fixtures::{localhost_available, quiet_config, recording_client_with};

const BODY_LEN: usize = 100;
const CUT_AT: usize = 10;

/// Serves a `BODY_LEN`-byte image on every connection, announcing the full
/// length but sending only `CUT_AT` bytes for the first `truncated` hits.
async fn spawn_server(truncated: usize) -> Option<(Url, Arc<AtomicUsize>)> {
    if !localhost_available() {
        eprintln!("skipping: cannot bind 127.0.0.1");
        return None;
    }
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let hit = seen.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let body = expected_body();
                let sent = if hit < truncated { &body[..CUT_AT] } else { &body[..] };
                let head = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: image/png\r\ncontent-length: {BODY_LEN}\r\nconnection: close\r\n\r\n"
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(sent).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    let url = Url::parse(&format!("http://{addr}/files/pic.png")).unwrap();
    Some((url, hits))
}

fn media_file(stream_url: Url) -> MediaFile {
    MediaFile::new(
        "pic.png",
        Filename::new("pic", ".png").unwrap(),
        stream_url.clone(),
        stream_url,
    )
}

fn expected_body() -> Vec<u8> {
    (0..BODY_LEN).map(|i| (i % 251) as u8).collect()
}

// ==================== Body Retry Tests ====================

#[tokio::test]
async fn test_save_restarts_file_after_broken_body() {
    let Some((url, hits)) = spawn_server(1).await else {
        return;
    };
    let temp = TempDir::new().unwrap();
    let (client, sleeper) = recording_client_with(quiet_config(5));
    let mut file = media_file(url);

    let written = Downloader::default()
        .save(&client, &mut file, temp.path(), &NoProgress)
        .await
        .unwrap();

    assert_eq!(written, BODY_LEN as u64);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(10)]);
    assert!(file.is_downloaded());
    assert_eq!(
        std::fs::read(temp.path().join("pic.png")).unwrap(),
        expected_body()
    );
}

#[tokio::test]
async fn test_save_removes_partial_file_when_body_keeps_breaking() {
    let Some((url, hits)) = spawn_server(usize::MAX).await else {
        return;
    };
    let temp = TempDir::new().unwrap();
    let (client, sleeper) = recording_client_with(quiet_config(2));
    let mut file = media_file(url);

    let err = Downloader::default()
        .save(&client, &mut file, temp.path(), &NoProgress)
        .await
        .unwrap_err();

    assert!(
        matches!(err, DownloadError::Interrupted { .. }),
        "unexpected error: {err:?}"
    );
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(10)]);
    assert!(!file.is_downloaded());
    assert!(!temp.path().join("pic.png").exists());
}

#[tokio::test]
async fn test_save_complete_body_marks_file_downloaded() {
    let Some((url, hits)) = spawn_server(0).await else {
        return;
    };
    let temp = TempDir::new().unwrap();
    let (client, sleeper) = recording_client_with(quiet_config(5));
    let mut file = media_file(url);
    assert!(!file.is_downloaded());

    Downloader::default()
        .save(&client, &mut file, temp.path(), &NoProgress)
        .await
        .unwrap();

    assert!(file.is_downloaded());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(sleeper.sleeps().is_empty());
    assert_eq!(
        std::fs::read(temp.path().join("pic.png")).unwrap(),
        expected_body()
    );
}
