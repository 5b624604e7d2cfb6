use std::sync::Arc;

use sandbox_client::Sandbox;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::classify::classify;
use crate::config::JudgeConfig;
use crate::languages::LanguageTable;
use crate::poller::poll_until_terminal;
use crate::retry::run_with_retry;
use crate::types::{JudgeRequest, JudgeVerdict, TestCase, TestOutcome, VerdictStatus};

/// Top-level judged-execution orchestrator.
///
/// Health-checks the sandbox, fans one task per test case onto a bounded
/// worker pool, collects outcomes in input order under an overall deadline,
/// and aggregates them into the final verdict. Internal failures surface as
/// ERROR outcomes or an ERROR verdict; `judge` itself never fails.
pub struct Judge {
    sandbox: Arc<dyn Sandbox>,
    languages: LanguageTable,
    config: JudgeConfig,
}

impl Judge {
    pub fn new(sandbox: Arc<dyn Sandbox>, languages: LanguageTable, config: JudgeConfig) -> Self {
        Self {
            sandbox,
            languages,
            config,
        }
    }

    pub async fn judge(&self, request: &JudgeRequest) -> JudgeVerdict {
        let run_id = Uuid::new_v4();
        let total = request.test_cases.len();

        info!(
            run_id = %run_id,
            language = %request.language,
            cases = total,
            "judging run started"
        );

        if total == 0 {
            return error_verdict("no test cases to run", &[]);
        }

        if !self.sandbox.health_check().await {
            warn!(run_id = %run_id, "execution service unavailable, aborting run");
            return error_verdict("execution service unavailable", &request.test_cases);
        }

        let outcomes = self.run_cases(run_id, request).await;
        let verdict = aggregate(outcomes);

        info!(
            run_id = %run_id,
            status = ?verdict.status,
            passed = verdict.passed,
            total = verdict.total,
            "judging run finished"
        );
        verdict
    }

    /// Fan out one task per test case onto the bounded pool and reassemble
    /// outcomes in input order under the overall deadline.
    async fn run_cases(&self, run_id: Uuid, request: &JudgeRequest) -> Vec<TestOutcome> {
        let total = request.test_cases.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let cancel = CancellationToken::new();
        let mut tasks: JoinSet<(usize, TestOutcome)> = JoinSet::new();

        for (index, case) in request.test_cases.iter().enumerate() {
            let task = CaseTask {
                sandbox: Arc::clone(&self.sandbox),
                source_code: request.source_code.clone(),
                language: request.language.clone(),
                language_id: self.languages.id_for(&request.language),
                case: case.clone(),
                config: self.config.clone(),
                cancel: cancel.clone(),
                run_id,
                index,
            };
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (task.index, failed(&task.case, "worker pool closed"));
                };
                let index = task.index;
                (index, task.run().await)
            });
        }

        let deadline = tokio::time::sleep(self.config.overall_deadline);
        tokio::pin!(deadline);

        let mut slots: Vec<Option<TestOutcome>> = vec![None; total];
        let mut deadline_hit = false;

        while !tasks.is_empty() {
            tokio::select! {
                _ = &mut deadline, if !deadline_hit => {
                    warn!(
                        run_id = %run_id,
                        outstanding = tasks.len(),
                        "overall deadline exceeded, abandoning outstanding cases"
                    );
                    deadline_hit = true;
                    cancel.cancel();
                    tasks.abort_all();
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((index, outcome))) => {
                        if let Some(slot) = slots.get_mut(index) {
                            *slot = Some(outcome);
                        }
                    }
                    Some(Err(e)) if e.is_cancelled() => {}
                    Some(Err(e)) => error!(run_id = %run_id, error = %e, "judging task failed"),
                    None => break,
                },
            }
        }

        let fill = if deadline_hit {
            "Execution timeout"
        } else {
            "execution task failed"
        };
        request
            .test_cases
            .iter()
            .zip(slots)
            .map(|(case, slot)| slot.unwrap_or_else(|| failed(case, fill)))
            .collect()
    }
}

/// Everything one test-case task needs, owned so it can move onto the pool.
struct CaseTask {
    sandbox: Arc<dyn Sandbox>,
    source_code: String,
    language: String,
    language_id: Option<u32>,
    case: TestCase,
    config: JudgeConfig,
    cancel: CancellationToken,
    run_id: Uuid,
    index: usize,
}

impl CaseTask {
    async fn run(self) -> TestOutcome {
        let Some(language_id) = self.language_id else {
            return failed(
                &self.case,
                format!("Unsupported language: {}", self.language),
            );
        };

        run_with_retry(&self.config.retry, &self.cancel, || {
            self.attempt(language_id)
        })
        .await
    }

    /// One full submit → poll → classify pipeline.
    async fn attempt(&self, language_id: u32) -> TestOutcome {
        let submit = self
            .sandbox
            .submit(&self.source_code, language_id, &self.case.input);
        let submitted = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return failed(&self.case, "Execution timeout"),
            submitted = submit => submitted,
        };

        let token = match submitted {
            Ok(token) => token,
            Err(e) => {
                warn!(run_id = %self.run_id, case = self.index, error = %e, "submit failed");
                return failed(&self.case, e.to_string());
            }
        };

        debug!(run_id = %self.run_id, case = self.index, token = %token, "submission accepted");

        let Some(verdict) = poll_until_terminal(
            self.sandbox.as_ref(),
            &token,
            &self.config,
            &self.cancel,
        )
        .await
        else {
            return failed(&self.case, "Execution timeout - code took too long to run");
        };

        classify(&verdict, &self.case.expected_output)
    }
}

/// A failed or never-run outcome that still carries the case's expected output.
fn failed(case: &TestCase, error: impl Into<String>) -> TestOutcome {
    TestOutcome {
        passed: false,
        expected: case.expected_output.trim().to_string(),
        actual: String::new(),
        error: Some(error.into()),
    }
}

/// Collapse per-case outcomes into the aggregate verdict.
fn aggregate(outcomes: Vec<TestOutcome>) -> JudgeVerdict {
    let total = outcomes.len();
    let passed = outcomes.iter().filter(|o| o.passed).count();

    let (status, message) = if total > 0 && passed == total {
        (VerdictStatus::Accepted, "All test cases passed!".to_string())
    } else {
        (
            VerdictStatus::WrongAnswer,
            format!("Passed {passed} out of {total} test cases"),
        )
    };

    JudgeVerdict {
        status,
        message,
        total,
        passed,
        outcomes,
    }
}

/// Verdict for runs that never reached the sandbox: one ERROR outcome per case.
fn error_verdict(message: &str, cases: &[TestCase]) -> JudgeVerdict {
    JudgeVerdict {
        status: VerdictStatus::Error,
        message: message.to_string(),
        total: cases.len(),
        passed: 0,
        outcomes: cases.iter().map(|c| failed(c, message)).collect(),
    }
}
