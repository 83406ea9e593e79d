// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded exponential backoff for external-service calls.
//!
//! Every call to an embedding, transcription, or captioning collaborator
//! goes through [`with_backoff`]. Only transient errors are retried;
//! validation and security errors surface immediately. Exhausting the
//! retry budget surfaces the last error rather than hanging.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::KeepsakeError;

/// Retry policy for one logical external call.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per `factor` afterwards.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub factor: u32,
    /// Hard timeout applied to each individual attempt.
    pub attempt_timeout: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            factor: 2,
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl BackoffPolicy {
    /// Delay to sleep after the given zero-based failed attempt.
    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * self.factor.saturating_pow(attempt)
    }
}

/// Run `op` with bounded exponential backoff under `policy`.
///
/// `service` names the collaborator for logging. Each attempt is wrapped
/// in a hard timeout; a timed-out attempt counts as transient.
pub async fn with_backoff<T, F, Fut>(
    policy: BackoffPolicy,
    service: &str,
    mut op: F,
) -> Result<T, KeepsakeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, KeepsakeError>>,
{
    let mut last_err = KeepsakeError::transient(service);
    for attempt in 0..policy.max_attempts {
        let result = tokio::time::timeout(policy.attempt_timeout, op()).await;
        match result {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) if !err.is_transient() => return Err(err),
            Ok(Err(err)) => {
                warn!(service, attempt, error = %err, "transient failure, will retry");
                last_err = err;
            }
            Err(_elapsed) => {
                warn!(service, attempt, "attempt timed out, will retry");
                last_err = KeepsakeError::Timeout {
                    duration: policy.attempt_timeout,
                };
            }
        }
        if attempt + 1 < policy.max_attempts {
            tokio::time::sleep(policy.delay_after(attempt)).await;
        }
    }
    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            factor: 2,
            attempt_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn succeeds_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = with_backoff(fast_policy(), "test", move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, KeepsakeError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = with_backoff(fast_policy(), "test", move || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(KeepsakeError::transient("test"))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_validation_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), _> = with_backoff(fast_policy(), "test", move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(KeepsakeError::Validation("bad input".into()))
            }
        })
        .await;
        assert!(matches!(result, Err(KeepsakeError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_attempts_and_surfaces_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), _> = with_backoff(fast_policy(), "test", move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(KeepsakeError::transient("embedding"))
            }
        })
        .await;
        assert!(matches!(result, Err(KeepsakeError::Transient { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn delay_grows_exponentially() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_after(0), Duration::from_millis(200));
        assert_eq!(policy.delay_after(1), Duration::from_millis(400));
        assert_eq!(policy.delay_after(2), Duration::from_millis(800));
    }
}
