//! Bounded retry for transient HTTP failures.
//!
//! [`send_with_retry`] re-sends a request built by a closure (builders are
//! consumed by `.send()`) when the failure looks transient: timeouts,
//! connection errors, HTTP 429 and HTTP 5xx. A 404 and every other 4xx are
//! permanent and returned immediately.

use std::time::Duration;

use crate::FetchError;

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry. Doubles on each further retry.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(1 << shift)
    }
}

/// How a response status should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx/3xx.
    Success,
    /// 404.
    NotFound,
    /// 429 or 5xx: worth another try.
    Retryable,
    /// Any other 4xx.
    Permanent,
}

/// Classifies an HTTP status code.
#[must_use]
pub const fn classify_status(status: u16) -> StatusClass {
    match status {
        404 => StatusClass::NotFound,
        429 | 500..=599 => StatusClass::Retryable,
        400..=499 => StatusClass::Permanent,
        _ => StatusClass::Success,
    }
}

/// Sends the request built by `build_request`, retrying transient failures
/// according to `policy`. Returns the first successful response.
///
/// # Errors
///
/// Returns [`FetchError::NotFound`] on 404, or [`FetchError::Unavailable`]
/// once the retry budget is spent or a permanent status is seen.
pub async fn send_with_retry<F>(
    build_request: F,
    policy: &RetryPolicy,
    url: &str,
) -> Result<reqwest::Response, FetchError>
where
    F: Fn() -> reqwest::RequestBuilder + Send + Sync,
{
    let mut last_reason = String::from("no attempt made");

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            log::warn!("  retry {attempt}/{} for {url} in {delay:?}...", policy.max_retries);
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                last_reason = e.to_string();
                if is_transient(&e) {
                    log::warn!("  transient error fetching {url}: {e}");
                    continue;
                }
                break;
            }
            Ok(response) => {
                let status = response.status();
                match classify_status(status.as_u16()) {
                    StatusClass::Success => return Ok(response),
                    StatusClass::NotFound => {
                        return Err(FetchError::NotFound {
                            url: url.to_string(),
                        });
                    }
                    StatusClass::Retryable => {
                        log::warn!("  HTTP {status} from {url}");
                        last_reason = format!("HTTP {status}");
                    }
                    StatusClass::Permanent => {
                        return Err(FetchError::Unavailable {
                            url: url.to_string(),
                            reason: format!("HTTP {status}"),
                        });
                    }
                }
            }
        }
    }

    Err(FetchError::Unavailable {
        url: url.to_string(),
        reason: last_reason,
    })
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
}
