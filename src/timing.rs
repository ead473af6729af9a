//! # Timed Round-Trip Invoker
//!
//! Wraps exactly one asynchronous call with two monotonic clock reads: one
//! immediately before the future is first polled and one immediately after it
//! resolves. The invoker knows nothing about the request; callers bind the
//! request parameters into the future before handing it over.
//!
//! Failures are returned unchanged. The invoker never retries, never swallows
//! an error and never rewrites it, with the single exception of the optional
//! timeout in [`timed_with_timeout`], which reports `BenchError::Timeout`.
//!
//! ```rust
//! # use sui_latency_bench::timing::timed;
//! # #[tokio::main]
//! # async fn main() {
//! let result = timed(async { Ok::<_, std::convert::Infallible>(42) }).await.unwrap();
//! assert_eq!(result.response, 42);
//! assert!(result.latency_ms() >= 0.0);
//! # }
//! ```

use crate::error::BenchError;
use std::future::Future;
use std::time::{Duration, Instant};

/// The response of one call together with its elapsed wall-clock time.
#[derive(Debug, Clone)]
pub struct Timed<T> {
    pub response: T,
    pub latency: Duration,
}

impl<T> Timed<T> {
    /// Elapsed time in fractional milliseconds.
    pub fn latency_ms(&self) -> f64 {
        duration_to_ms(self.latency)
    }
}

/// Execute `op` once and measure it.
pub async fn timed<F, T, E>(op: F) -> Result<Timed<T>, E>
where
    F: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let outcome = op.await;
    let latency = start.elapsed();

    outcome.map(|response| Timed { response, latency })
}

/// Execute `op` once and measure it, failing with `BenchError::Timeout` if
/// `timeout` is set and elapses first.
pub async fn timed_with_timeout<F, T, E>(op: F, timeout: Option<Duration>) -> Result<Timed<T>, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<BenchError>,
{
    match timeout {
        None => timed(op).await,
        Some(after) => {
            let start = Instant::now();
            let outcome = tokio::time::timeout(after, op).await;
            let latency = start.elapsed();

            match outcome {
                Ok(result) => result.map(|response| Timed { response, latency }),
                Err(_) => Err(BenchError::Timeout { after }.into()),
            }
        }
    }
}

/// Convert a duration to fractional milliseconds.
pub fn duration_to_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
