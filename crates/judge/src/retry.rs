use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::types::TestOutcome;

/// Error-text fragments that mark an outcome as transient. Closed set,
/// matched case-insensitively.
const RETRYABLE_KEYWORDS: &[&str] = &["timeout", "timed out", "connection", "unavailable"];

pub(crate) const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub(crate) const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// When and how often a failed test-case pipeline is re-attempted.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Fixed delay inserted between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Whether an error text names a transient failure category.
    pub fn is_retryable(error: &str) -> bool {
        let error = error.to_lowercase();
        RETRYABLE_KEYWORDS.iter().any(|k| error.contains(*k))
    }
}

/// Run a judging pipeline under the policy.
///
/// Each attempt is a fresh full pipeline run; a completed outcome is returned
/// as-is, never mutated. The inter-attempt backoff is raced against `cancel`,
/// and cancellation returns the last outcome without another attempt.
pub async fn run_with_retry<F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut attempt: F,
) -> TestOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TestOutcome>,
{
    let mut outcome = attempt().await;

    for n in 1..policy.max_attempts {
        let transient = !outcome.passed
            && outcome
                .error
                .as_deref()
                .is_some_and(RetryPolicy::is_retryable);
        if !transient {
            return outcome;
        }

        debug!(attempt = n + 1, "transient outcome, re-attempting");
        tokio::select! {
            _ = cancel.cancelled() => return outcome,
            _ = tokio::time::sleep(policy.backoff) => {}
        }
        outcome = attempt().await;
    }

    outcome
}
