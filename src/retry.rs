//! Retry logic for requests to urlscan.io with exponential backoff.
//!
//! urlscan.io answers 429 for "too many requests", so that status sits in
//! the retry set alongside the transient server errors. Statuses outside the
//! set are never retried and go back to the caller as ordinary responses.

use anyhow::{Result, anyhow};
use log::{debug, error, warn};
use reqwest::StatusCode;
use reqwest::blocking::Response;
use std::thread;
use std::time::Duration;

/// Statuses worth a fresh attempt: rate limiting plus the transient server
/// errors.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Ceiling on a single inter-attempt delay.
const BACKOFF_MAX: Duration = Duration::from_secs(120);

/// How attempts are paced: `retries` bounds the total number of attempts,
/// `backoff` scales the exponentially growing delay between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            backoff: 1.0,
        }
    }
}

impl RetryPolicy {
    /// Total attempt budget. A policy of zero retries still sends once.
    pub fn attempts(&self) -> u32 {
        self.retries.max(1)
    }

    /// Delay slept after failed attempt `n` (1-based): `backoff` times
    /// 2^(n-1) seconds, so `backoff = 1` waits 1s, 2s, 4s and so on. Capped
    /// at two minutes; a non-finite or non-positive product sleeps zero.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let secs = self.backoff * 2f64.powi(attempt.saturating_sub(1) as i32);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(secs.min(BACKOFF_MAX.as_secs_f64()))
    }
}

/// True for statuses in [`RETRYABLE_STATUSES`].
pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status.as_u16())
}

/// True for transport errors a fresh attempt could cure. A request that
/// never became valid, or one that looped through redirects, will not
/// improve on retry.
fn is_retryable_error(error: &reqwest::Error) -> bool {
    !(error.is_builder() || error.is_redirect())
}

/// Runs `send` until it yields a response outside the retryable status set,
/// fails in a way no retry can cure, or the attempt budget is spent.
///
/// Responses with non-retryable statuses (404 included) come back `Ok` for
/// the caller to judge; only transport faults and exhausted retryable
/// statuses end in `Err`.
pub fn with_retry<F>(policy: &RetryPolicy, url: &str, mut send: F) -> Result<Response>
where
    F: FnMut() -> Result<Response, reqwest::Error>,
{
    let attempts = policy.attempts();
    let mut last_error = None;

    for attempt in 1..=attempts {
        let outcome = send();
        let delay = policy.delay_after(attempt);

        match outcome {
            Ok(response) if !is_retryable_status(response.status()) => return Ok(response),
            Ok(response) => {
                let status = response.status();
                if attempt < attempts {
                    warn!(
                        "{} answered HTTP {}, attempt {}/{}, retrying in {:?}...",
                        url, status, attempt, attempts, delay
                    );
                }
                last_error = Some(anyhow!(
                    "{} answered HTTP {} on attempt {}/{}",
                    url,
                    status,
                    attempt,
                    attempts
                ));
            }
            Err(e) => {
                if !is_retryable_error(&e) {
                    debug!("{}: not retrying: {}", url, e);
                    return Err(anyhow::Error::new(e)
                        .context(format!("request to {} could not be sent", url)));
                }
                if attempt < attempts {
                    warn!(
                        "{}: attempt {}/{} failed ({}), retrying in {:?}...",
                        url, attempt, attempts, e, delay
                    );
                }
                last_error =
                    Some(anyhow::Error::new(e).context(format!("request to {} failed", url)));
            }
        }

        if attempt < attempts {
            thread::sleep(delay);
        }
    }

    error!("{}: giving up after {} attempts", url, attempts);
    Err(last_error.unwrap_or_else(|| anyhow!("{}: failed after {} attempts", url, attempts)))
}
