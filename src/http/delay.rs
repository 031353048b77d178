//! Pre-request delay and the sleeping seam used by retry backoff.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::constants::{DEFAULT_DELAY_MAX, DEFAULT_DELAY_MIN};

/// Pause applied before every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDelay {
    /// No pause.
    None,
    /// Always the same pause.
    Fixed(Duration),
    /// Uniformly random pause in `[min, max]`.
    Jitter {
        /// Lower bound.
        min: Duration,
        /// Upper bound.
        max: Duration,
    },
}

impl Default for RequestDelay {
    fn default() -> Self {
        Self::Jitter {
            min: DEFAULT_DELAY_MIN,
            max: DEFAULT_DELAY_MAX,
        }
    }
}

impl RequestDelay {
    /// Builds a delay from optional bounds: nothing, a fixed value, or a range.
    #[must_use]
    pub fn from_bounds(min: Duration, max: Option<Duration>) -> Self {
        match max {
            Some(max) if max > min => Self::Jitter { min, max },
            _ if min.is_zero() => Self::None,
            _ => Self::Fixed(min),
        }
    }

    /// Draws the pause for the next request.
    #[must_use]
    pub fn sample(&self) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed(duration) => duration,
            Self::Jitter { min, max } if max > min => rand::thread_rng().gen_range(min..=max),
            Self::Jitter { min, .. } => min,
        }
    }
}

/// Source of suspensions for delays and backoff.
///
/// Production code uses [`TokioSleeper`]; tests substitute an implementation
/// that records durations instead of waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspends the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
