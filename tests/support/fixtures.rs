//! Shared builders for integration tests: a recording sleeper, clients
//! that never actually wait, and a mock server that skips when localhost
//! is unavailable.

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use simple_downloader::http::{ClientConfig, HttpClient, RequestDelay, RetryPolicy, Sleeper};
use wiremock::MockServer;

/// True when a localhost port can be bound in this environment.
pub fn localhost_available() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Starts a mock server, or returns `None` (and says so) when sandboxed
/// without loopback networking.
#[allow(dead_code)]
pub async fn mock_server() -> Option<MockServer> {
    if !localhost_available() {
        eprintln!("skipping: cannot bind 127.0.0.1");
        return None;
    }
    Some(MockServer::start().await)
}

/// Records requested sleeps instead of waiting.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

#[allow(dead_code)]
impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Client config with no pre-request delay and the given attempt budget.
#[allow(dead_code)]
pub fn quiet_config(max_attempts: u32) -> ClientConfig {
    ClientConfig {
        delay: RequestDelay::None,
        retry: RetryPolicy::with_max_attempts(max_attempts),
        ..ClientConfig::default()
    }
}

/// Client whose sleeps are recorded, with the default five attempts.
#[allow(dead_code)]
pub fn recording_client() -> (Arc<HttpClient>, Arc<RecordingSleeper>) {
    recording_client_with(quiet_config(5))
}

#[allow(dead_code)]
pub fn recording_client_with(config: ClientConfig) -> (Arc<HttpClient>, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = HttpClient::with_sleeper(config, sleeper.clone()).unwrap();
    (Arc::new(client), sleeper)
}
