//! Retry with exponential backoff for transient upstream failures.

use std::future::Future;
use std::time::Duration;

use crate::error::UpstreamError;

/// Returns `true` if `err` is transient and worth another attempt.
///
/// Retriable: [`UpstreamError::RateLimited`] (429), [`UpstreamError::Http`]
/// (connect failures and timeouts), and 5xx [`UpstreamError::UnexpectedStatus`].
/// Everything else (4xx, error bodies, parse failures) is returned as-is.
fn is_retriable(err: &UpstreamError) -> bool {
    match err {
        UpstreamError::RateLimited { .. } | UpstreamError::Http(_) => true,
        UpstreamError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Seconds to wait before retrying after `err` on the given attempt: the
/// exponential backoff, stretched to the upstream's `Retry-After` for 429s.
fn retry_delay_secs(err: &UpstreamError, attempt: u32, backoff_base_secs: u64) -> u64 {
    let backoff = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
    match err {
        UpstreamError::RateLimited {
            retry_after_secs, ..
        } => backoff.max(*retry_after_secs),
        _ => backoff,
    }
}

/// Executes `operation`, retrying transient errors up to `max_retries` extra
/// times with a sleep of `backoff_base_secs * 2^attempt` seconds in between,
/// or longer when a 429 asked for more.
///
/// With `max_retries = 2` the operation runs at most 3 times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut attempt = 0u32;

    loop {
        let last_err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };

        let delay_secs = retry_delay_secs(&last_err, attempt, backoff_base_secs);
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %last_err,
            "transient upstream error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited() -> UpstreamError {
        UpstreamError::RateLimited {
            endpoint: "profile".to_owned(),
            retry_after_secs: 0,
        }
    }

    #[test]
    fn server_errors_are_retriable_client_errors_are_not() {
        let server = UpstreamError::UnexpectedStatus {
            status: 503,
            url: "https://x/profile".to_owned(),
        };
        let client = UpstreamError::UnexpectedStatus {
            status: 403,
            url: "https://x/profile".to_owned(),
        };
        assert!(is_retriable(&server));
        assert!(!is_retriable(&client));
        assert!(is_retriable(&rate_limited()));
    }

    #[test]
    fn error_bodies_are_not_retriable() {
        let err = UpstreamError::Api {
            endpoint: "profile".to_owned(),
            message: "quota exceeded".to_owned(),
        };
        assert!(!is_retriable(&err));
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, UpstreamError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, UpstreamError>(rate_limited())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(UpstreamError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_api_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, UpstreamError>(UpstreamError::Api {
                    endpoint: "feed".to_owned(),
                    message: "nope".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(UpstreamError::Api { .. })));
    }

    #[test]
    fn rate_limit_delay_honours_retry_after() {
        let limited = UpstreamError::RateLimited {
            endpoint: "profile".to_owned(),
            retry_after_secs: 17,
        };
        assert_eq!(retry_delay_secs(&limited, 0, 2), 17);
        // Backoff wins once it outgrows the upstream's hint.
        assert_eq!(retry_delay_secs(&limited, 4, 2), 32);

        let server = UpstreamError::UnexpectedStatus {
            status: 503,
            url: "https://x/profile".to_owned(),
        };
        assert_eq!(retry_delay_secs(&server, 1, 2), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_out_retry_after_before_the_next_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let started = tokio::time::Instant::now();

        let result = retry_with_backoff(1, 1, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(UpstreamError::RateLimited {
                        endpoint: "profile".to_owned(),
                        retry_after_secs: 30,
                    })
                } else {
                    Ok::<u32, UpstreamError>(1)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}
