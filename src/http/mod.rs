//! HTTP retrieval with retry and backoff.
//!
//! Every request made by crawlers and the downloader goes through
//! [`HttpClient`]. It applies the pre-request delay and checks status and
//! content-type. Transient failures are retried on the [`RetryPolicy`]
//! schedule, and 429 responses additionally honor `Retry-After`.

mod client;
pub mod constants;
mod delay;
mod error;
mod retry;

pub use client::{ClientConfig, HttpClient, Page};
pub use delay::{RequestDelay, Sleeper, TokioSleeper};
pub use error::FetchError;
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error, parse_retry_after};
