use std::time::Duration;

use crate::error::Error;

pub const MAX_RETRIES: u32 = 3;
const BACKOFF_SECONDS: &[u64] = &[1, 2, 4];

/// Whether an API error is a 429 that is worth retrying.
pub fn is_429_error(e: &Error) -> bool {
    e.status() == Some(429)
}

/// Backoff for the given zero-based retry attempt.
pub fn backoff_for(attempt: u32) -> Duration {
    let secs = BACKOFF_SECONDS
        .get(attempt as usize)
        .copied()
        .unwrap_or(4);
    Duration::from_secs(secs)
}

/// Await `$expr`, re-evaluating it after a backoff sleep while it keeps
/// failing with 429, up to `MAX_RETRIES` times.
///
/// `retry_api!(self.get_once(path, query))`
macro_rules! retry_api {
    ($expr:expr) => {{
        let mut _attempt: u32 = 0;
        loop {
            match $expr.await {
                Ok(val) => break Ok::<_, $crate::error::Error>(val),
                Err(e) => {
                    if $crate::api::rate_limit::is_429_error(&e)
                        && _attempt < $crate::api::rate_limit::MAX_RETRIES
                    {
                        let wait = $crate::api::rate_limit::backoff_for(_attempt);
                        log::warn!(
                            "Rate limited (429). Waiting {}s before retry {}/{}",
                            wait.as_secs(),
                            _attempt + 1,
                            $crate::api::rate_limit::MAX_RETRIES
                        );
                        tokio::time::sleep(wait).await;
                        _attempt += 1;
                    } else {
                        break Err(e);
                    }
                }
            }
        }
    }};
}

pub(crate) use retry_api;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_429_error() {
        let limited = Error::Status {
            status: 429,
            path: "/tasks".into(),
        };
        assert!(is_429_error(&limited));

        let server = Error::Status {
            status: 500,
            path: "/tasks".into(),
        };
        assert!(!is_429_error(&server));
        assert!(!is_429_error(&Error::Unauthorized("/tasks".into())));
    }

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(backoff_for(0), Duration::from_secs(1));
        assert_eq!(backoff_for(2), Duration::from_secs(4));
        assert_eq!(backoff_for(10), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_api_recovers_after_429() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let counter = AtomicU32::new(0);
        let calls = &counter;
        let attempt = move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(Error::Status {
                    status: 429,
                    path: "/users".into(),
                })
            } else {
                Ok(n)
            }
        };

        let result = retry_api!(attempt());
        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_api_does_not_retry_other_errors() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let counter = AtomicU32::new(0);
        let calls = &counter;
        let attempt = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Error::Status {
                status: 503,
                path: "/users".into(),
            })
        };

        let result = retry_api!(attempt());
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_api_gives_up_after_max_retries() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let counter = AtomicU32::new(0);
        let calls = &counter;
        let attempt = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Error::Status {
                status: 429,
                path: "/tasks".into(),
            })
        };

        let started = tokio::time::Instant::now();
        let result = retry_api!(attempt());
        assert_eq!(result.unwrap_err().status(), Some(429));
        assert_eq!(counter.load(Ordering::SeqCst), MAX_RETRIES + 1);
        assert_eq!(started.elapsed(), Duration::from_secs(1 + 2 + 4));
    }
}
