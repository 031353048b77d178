//! Constants for the HTTP client (timeouts, delays, retry schedule).

use std::time::Duration;

/// Lower bound of the default pre-request delay.
pub const DEFAULT_DELAY_MIN: Duration = Duration::from_millis(1100);

/// Upper bound of the default pre-request delay.
pub const DEFAULT_DELAY_MAX: Duration = Duration::from_millis(3100);

/// Default maximum number of redirects followed per request.
pub const DEFAULT_MAX_REDIRECTS: usize = 3;

/// Default HTTP connect timeout (3.03 seconds).
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(3030);

/// Default HTTP read timeout.
pub const READ_TIMEOUT: Duration = Duration::from_secs(42);

/// Default total attempts per request, initial attempt included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Backoff multiplier: wait for attempt `n` is `(2^n - 1) * multiplier`.
pub const BACKOFF_MULTIPLIER: Duration = Duration::from_secs(10);

/// Shortest backoff wait.
pub const BACKOFF_MIN: Duration = Duration::from_secs(10);

/// Longest backoff wait.
pub const BACKOFF_MAX: Duration = Duration::from_secs(160);

/// Maximum Retry-After header value (1 hour) to prevent excessive delays.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// HTTP status codes treated as transient.
pub const RETRY_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];
