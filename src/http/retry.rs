//! Retry logic with exponential backoff for transient request failures.
//!
//! Each [`FetchError`] is mapped to a [`FailureType`]. Transient and
//! rate-limited failures are retried until the [`RetryPolicy`] runs out of
//! attempts; permanent ones fail at once.
//!
//! # Example
//!
//! ```
//! use simple_downloader::http::{
//!     FetchError, RetryPolicy, FailureType, RetryDecision, classify_error
//! };
//!
//! let policy = RetryPolicy::default();
//! let error = FetchError::http_status("https://example.com/f/1", 503);
//! let failure_type = classify_error(&error);
//!
//! match policy.should_retry(failure_type, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::FetchError;
use super::constants::{
    BACKOFF_MAX, BACKOFF_MIN, BACKOFF_MULTIPLIER, DEFAULT_MAX_ATTEMPTS, MAX_RETRY_AFTER,
    RETRY_STATUS_CODES,
};

/// Classification of request failure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: timeouts, connection resets, 5xx from the retry set.
    Transient,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: 404, too many redirects, empty content-type.
    Permanent,

    /// Server rate limiting (HTTP 429).
    ///
    /// Retried with backoff plus the server's Retry-After.
    RateLimited,
}

/// Decision on whether to retry a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Delay Calculation
///
/// ```text
/// delay(n) = clamp((2^n - 1) * multiplier, min_delay, max_delay)
/// ```
///
/// where `n` is the attempt that just failed. With defaults (5 attempts,
/// multiplier 10s, bounds 10s..160s) the waits are 10s, 30s, 70s, 150s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Multiplier of the `2^n - 1` growth.
    multiplier: Duration,

    /// Lower clamp.
    min_delay: Duration,

    /// Upper clamp.
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            multiplier: BACKOFF_MULTIPLIER,
            min_delay: BACKOFF_MIN,
            max_delay: BACKOFF_MAX,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom settings.
    ///
    /// `max_attempts` is raised to 1 if lower; `max_delay` is raised to
    /// `min_delay` if lower.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        multiplier: Duration,
        min_delay: Duration,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            multiplier,
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    /// Creates a policy with a custom `max_attempts`, using defaults for other settings.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Determines whether to retry a failed request.
    ///
    /// `attempt` is the attempt number that just failed (1-indexed).
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Backoff after attempt `attempt` failed.
    #[must_use]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32
            .checked_pow(attempt)
            .map_or(u32::MAX, |power| power - 1);
        self.multiplier
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .clamp(self.min_delay, self.max_delay)
    }

    /// Sum of every backoff wait when all attempts fail.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts).map(|n| self.calculate_delay(n)).sum()
    }
}

/// Classifies a fetch error into a failure type for retry decisions.
///
/// | Error | Type |
/// |-------|------|
/// | Connect/read timeout | Transient |
/// | Connection | Transient |
/// | HTTP 429 | RateLimited |
/// | HTTP 408, 500, 502, 503, 504 | Transient |
/// | Other HTTP status | Permanent |
/// | Too many redirects | Permanent |
/// | Empty content-type | Permanent |
/// | Other request/build errors | Permanent |
#[instrument]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::ConnectTimeout { .. }
        | FetchError::ReadTimeout { .. }
        | FetchError::Connection { .. } => FailureType::Transient,

        FetchError::HttpStatus { status: 429, .. } => FailureType::RateLimited,
        FetchError::HttpStatus { status, .. } if RETRY_STATUS_CODES.contains(status) => {
            FailureType::Transient
        }
        FetchError::HttpStatus { .. } => FailureType::Permanent,

        FetchError::TooManyRedirects { .. }
        | FetchError::EmptyContentType { .. }
        | FetchError::Request { .. }
        | FetchError::ClientBuild { .. } => FailureType::Permanent,
    }
}

/// Reads a `Retry-After` value: delta-seconds or an HTTP-date.
///
/// A date already past means "now" (zero). Waits longer than
/// [`MAX_RETRY_AFTER`] are capped. Negative or unparseable values give `None`.
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let value = header_value.trim();
    let wait = match value.parse::<u64>() {
        Ok(seconds) => Duration::from_secs(seconds),
        Err(_) => {
            let Ok(at) = httpdate::parse_http_date(value) else {
                debug!(value, "ignoring malformed Retry-After");
                return None;
            };
            at.duration_since(std::time::SystemTime::now())
                .unwrap_or(Duration::ZERO)
        }
    };

    if wait > MAX_RETRY_AFTER {
        warn!(
            requested_secs = wait.as_secs(),
            cap_secs = MAX_RETRY_AFTER.as_secs(),
            "Retry-After too long, capping"
        );
        return Some(MAX_RETRY_AFTER);
    }
    Some(wait)
}
