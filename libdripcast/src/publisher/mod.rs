//! Publisher abstraction and implementations
//!
//! The publisher is the one remote side effect in the system. The core
//! treats it as a black box that either returns an external id or fails
//! with a classified [`PublishError`](crate::error::PublishError): the
//! runner must not assume retries happen inside the publisher, and must
//! not assume a duplicate rejection means the content was never posted
//! (it may have landed in a prior run whose history write failed).

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::RetryConfig;
use crate::error::{DripcastError, PublishError, Result};

pub mod command;
// Mock publisher is available for all builds (not just tests) to support
// integration tests
pub mod mock;

pub use command::CommandPublisher;
pub use mock::MockPublisher;

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish the text and return its external id
    ///
    /// # Errors
    ///
    /// Returns a [`PublishError`](crate::error::PublishError) classified as
    /// duplicate-rejected, rate-limited, or transient.
    async fn publish(&self, text: &str) -> Result<String>;

    /// Lowercase identifier for status output (e.g. "command", "mock")
    fn name(&self) -> &str;
}

fn is_retryable(error: &DripcastError, retry_rate_limited: bool) -> bool {
    match error {
        DripcastError::Publish(PublishError::Transient(_)) => true,
        DripcastError::Publish(PublishError::RateLimited(_)) => retry_rate_limited,
        _ => false,
    }
}

/// Publish with in-run retries and exponential backoff (1s, 2s, 4s...)
///
/// Only transient failures are retried by default; rate-limit responses
/// join the retry loop when `retry.retry_rate_limited` is set, otherwise
/// the scheduler's next invocation is the retry. Duplicate rejections are
/// never retried here (the runner compensates for them instead).
pub async fn publish_with_retry(
    publisher: &dyn Publisher,
    text: &str,
    retry: &RetryConfig,
) -> Result<String> {
    let max_attempts = retry.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match publisher.publish(text).await {
            Ok(external_id) => {
                if attempt > 1 {
                    info!(attempt, publisher = publisher.name(), "publish succeeded after retry");
                }
                return Ok(external_id);
            }
            Err(e) => {
                if is_retryable(&e, retry.retry_rate_limited) && attempt < max_attempts {
                    let delay_secs = 2_u64.pow(attempt - 1);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_secs,
                        error = %e,
                        "publish failed, retrying"
                    );
                    sleep(Duration::from_secs(delay_secs)).await;
                } else {
                    return Err(e);
                }
            }
        }
    }

    unreachable!("retry loop returns on the final attempt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::mock::MockPublisher;

    fn no_backoff(max_attempts: u32, retry_rate_limited: bool) -> RetryConfig {
        RetryConfig {
            max_attempts,
            retry_rate_limited,
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let publisher = MockPublisher::failing_then_success("flaky", 2);
        let retry = no_backoff(3, false);

        // Attempts 1 and 2 fail, attempt 3 succeeds; backoff adds ~3s
        let id = publish_with_retry(&publisher, "hello", &retry).await.unwrap();
        assert!(id.starts_with("flaky:mock-"));
        assert_eq!(publisher.publish_call_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_returns_last_error() {
        let publisher = MockPublisher::failing("down");
        let retry = no_backoff(2, false);

        let err = publish_with_retry(&publisher, "hello", &retry)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DripcastError::Publish(PublishError::Transient(_))
        ));
        assert_eq!(publisher.publish_call_count(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_not_retried_by_default() {
        let publisher = MockPublisher::rate_limited("busy");
        let retry = no_backoff(3, false);

        let err = publish_with_retry(&publisher, "hello", &retry)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DripcastError::Publish(PublishError::RateLimited(_))
        ));
        assert_eq!(publisher.publish_call_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_never_retried() {
        let publisher = MockPublisher::duplicate("strict");
        let retry = no_backoff(3, true);

        let err = publish_with_retry(&publisher, "hello", &retry)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DripcastError::Publish(PublishError::DuplicateRejected(_))
        ));
        assert_eq!(publisher.publish_call_count(), 1);
    }
}
