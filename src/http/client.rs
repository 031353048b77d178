//! Shared HTTP client with retry, backoff and pre-request delay.
//!
//! One [`HttpClient`] is built per invocation and handed (as `Arc`) to every
//! crawler and to the downloader, so all traffic shares a single connection
//! pool, User-Agent, timeout and redirect policy.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Response, redirect};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT, DEFAULT_MAX_REDIRECTS, READ_TIMEOUT};
use super::delay::{RequestDelay, Sleeper, TokioSleeper};
use super::error::FetchError;
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error, parse_retry_after};
use crate::user_agent;

/// Settings for an [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Pause applied once before every fetch.
    pub delay: RequestDelay,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Maximum silence while reading a response.
    pub read_timeout: Duration,
    /// Redirects followed before failing with too-many-redirects.
    pub max_redirects: usize,
    /// Attempts and backoff schedule.
    pub retry: RetryPolicy,
    /// Value of the User-Agent header.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            delay: RequestDelay::default(),
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            retry: RetryPolicy::default(),
            user_agent: user_agent::default_user_agent(),
        }
    }
}

/// A fully buffered text response.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects.
    pub url: Url,
    /// Response body.
    pub body: String,
}

/// HTTP client shared by crawlers and the downloader.
///
/// # Example
///
/// ```no_run
/// use simple_downloader::http::{ClientConfig, HttpClient};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(ClientConfig::default())?;
/// let page = client.fetch_text(&Url::parse("https://example.com/a/xyz")?).await?;
/// println!("{} bytes from {}", page.body.len(), page.url);
/// # Ok(())
/// # }
/// ```
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Creates a client that sleeps on the tokio timer.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the underlying client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    /// Creates a client with a custom [`Sleeper`] for delays and backoff.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the underlying client cannot be built.
    #[instrument(level = "debug", skip(sleeper))]
    pub fn with_sleeper(config: ClientConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .gzip(true)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|source| FetchError::ClientBuild { source })?;
        debug!(user_agent = %config.user_agent, "HTTP session opened");
        Ok(Self {
            client,
            config,
            sleeper,
        })
    }

    /// Returns the configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the retry policy shared by all requests.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.config.retry
    }

    /// Suspends for `duration` through the client's [`Sleeper`].
    pub async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            self.sleeper.sleep(duration).await;
        }
    }

    /// Fetches `url` in stream mode: status and content-type are checked,
    /// the body is left unread for the caller.
    ///
    /// # Errors
    ///
    /// Returns the last [`FetchError`] once retries are exhausted, or the
    /// first non-retryable one.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<Response, FetchError> {
        self.apply_delay().await;
        self.with_retry(url, || self.send(url)).await
    }

    /// Fetches `url` and buffers the body as text.
    ///
    /// Body read failures are retried like any other transport failure.
    ///
    /// # Errors
    ///
    /// Same as [`fetch`](Self::fetch).
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text(&self, url: &Url) -> Result<Page, FetchError> {
        self.apply_delay().await;
        self.with_retry(url, || async move {
            let response = self.send(url).await?;
            let final_url = response.url().clone();
            let body = response
                .text()
                .await
                .map_err(|e| self.map_reqwest_error(url, e))?;
            Ok(Page {
                url: final_url,
                body,
            })
        })
        .await
    }

    async fn apply_delay(&self) {
        let pause = self.config.delay.sample();
        debug!(delay_ms = pause.as_millis(), "pre-request delay");
        self.sleep(pause).await;
    }

    /// Runs `operation` until it succeeds, fails permanently, or attempts run out.
    async fn with_retry<T, F, Fut>(&self, url: &Url, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 1;
        loop {
            info!(url = %url, attempt, "requesting");
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let failure_type = classify_error(&error);
            match self.config.retry.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    if failure_type == FailureType::RateLimited {
                        let wait = error
                            .retry_after()
                            .and_then(parse_retry_after)
                            .unwrap_or(Duration::ZERO);
                        debug!(wait_secs = wait.as_secs(), "honoring Retry-After");
                        self.sleep(wait).await;
                    }
                    info!(
                        url = %url,
                        next_attempt,
                        delay_secs = delay.as_secs(),
                        error = %error,
                        "retrying request"
                    );
                    self.sleep(delay).await;
                    attempt = next_attempt;
                }
                RetryDecision::DoNotRetry { reason } => {
                    if failure_type != FailureType::Permanent {
                        warn!(url = %url, attempt, error = %error, reason = %reason, "giving up");
                    }
                    return Err(error);
                }
            }
        }
    }

    /// One GET exchange with status and content-type validation.
    async fn send(&self, url: &Url) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(std::string::ToString::to_string);
            return Err(FetchError::http_status_with_retry_after(
                url.as_str(),
                status.as_u16(),
                retry_after,
            ));
        }

        let has_content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| !v.trim().is_empty());
        if !has_content_type {
            debug!(headers = ?response.headers(), "response without content-type");
            return Err(FetchError::empty_content_type(url.as_str()));
        }

        Ok(response)
    }

    /// Maps a transport error to the matching [`FetchError`] kind.
    pub(crate) fn map_reqwest_error(&self, url: &Url, error: reqwest::Error) -> FetchError {
        let url = url.to_string();
        if error.is_redirect() {
            FetchError::TooManyRedirects {
                url,
                max: self.config.max_redirects,
            }
        } else if error.is_timeout() && error.is_connect() {
            FetchError::ConnectTimeout {
                url,
                timeout: self.config.connect_timeout,
            }
        } else if error.is_timeout() {
            FetchError::ReadTimeout {
                url,
                timeout: self.config.read_timeout,
            }
        } else if error.is_connect() || error.is_request() || error.is_body() || error.is_decode() {
            FetchError::connection(url, error)
        } else {
            FetchError::Request { url, source: error }
        }
    }
}

impl Drop for HttpClient {
    fn drop(&mut self) {
        debug!("HTTP session closed");
    }
}
