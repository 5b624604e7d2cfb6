use std::time::Duration;

use sandbox_client::{Sandbox, SandboxVerdict, SubmissionToken};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::config::JudgeConfig;

/// Delay before the next attempt after a failed poll call.
const ERROR_DELAY: Duration = Duration::from_millis(500);

/// Progressive schedule: tight polls while the run is likely still queued,
/// slower once it has had a few seconds.
fn poll_delay(attempt: u32) -> Duration {
    match attempt {
        0..=9 => Duration::from_millis(200),
        10..=19 => Duration::from_millis(300),
        _ => Duration::from_millis(500),
    }
}

/// Poll a submission until it reaches a terminal status.
///
/// Returns `None` once the attempt ceiling is exhausted (the caller treats
/// this as an execution timeout). Failed poll calls count toward the ceiling
/// after a short fixed delay. Every poll call and every sleep is raced
/// against `cancel`; after cancellation no further sandbox calls are made.
pub async fn poll_until_terminal(
    sandbox: &dyn Sandbox,
    token: &SubmissionToken,
    config: &JudgeConfig,
    cancel: &CancellationToken,
) -> Option<SandboxVerdict> {
    for attempt in 0..config.max_poll_attempts {
        let polled = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            polled = sandbox.poll(token) => polled,
        };

        let delay = match polled {
            Ok(verdict) if verdict.is_terminal() => return Some(verdict),
            Ok(verdict) => {
                trace!(token = %token, status = verdict.status.id, attempt, "submission not terminal yet");
                poll_delay(attempt)
            }
            Err(e) => {
                warn!(token = %token, error = %e, attempt, "poll attempt failed");
                ERROR_DELAY
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    warn!(token = %token, attempts = config.max_poll_attempts, "submission never reached a terminal status");
    None
}
