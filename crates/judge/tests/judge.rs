use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use judge::{
    Judge, JudgeConfig, JudgeRequest, LanguageTable, RetryPolicy, TestCase, VerdictStatus,
};
use sandbox_client::{
    ClientError, Sandbox, SandboxStatus, SandboxVerdict, SubmissionToken, status,
};
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// Fake sandbox
// ---------------------------------------------------------------------------

/// What the fake sandbox should do for a submission, keyed by its stdin.
#[derive(Clone)]
enum Script {
    /// Terminal acceptance with this stdout.
    Accept(String),
    /// Terminal acceptance, but submit stalls for the duration first.
    SlowAccept(Duration, String),
    /// Fail the first submit with this error, then accept with the stdout.
    FlakySubmit(String, String),
    /// Fail every submit with this error.
    FailSubmit(String),
    /// Never leave the queue.
    Queued,
}

/// Scripted in-memory execution service. Counts calls and tracks how many
/// submits are in flight at once so tests can observe the admission bound.
struct FakeSandbox {
    healthy: bool,
    scripts: HashMap<String, Script>,
    submits: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    next_token: AtomicUsize,
    submit_failures: Mutex<HashMap<String, usize>>,
    pending: Mutex<HashMap<String, Script>>,
}

impl FakeSandbox {
    fn new<S: Into<String>>(scripts: impl IntoIterator<Item = (S, Script)>) -> Self {
        Self {
            healthy: true,
            scripts: scripts
                .into_iter()
                .map(|(stdin, s)| (stdin.into(), s))
                .collect(),
            submits: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            next_token: AtomicUsize::new(0),
            submit_failures: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }
}

fn terminal(id: i32, stdout: Option<String>) -> SandboxVerdict {
    SandboxVerdict {
        stdout,
        stderr: None,
        compile_output: None,
        status: SandboxStatus {
            id,
            description: String::new(),
        },
    }
}

#[async_trait]
impl Sandbox for FakeSandbox {
    async fn submit(
        &self,
        _code: &str,
        _language_id: u32,
        stdin: &str,
    ) -> sandbox_client::Result<SubmissionToken> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let Some(script) = self.scripts.get(stdin).cloned() else {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(ClientError::Submit(format!("no script for stdin {stdin:?}")));
        };

        let result = match script {
            Script::SlowAccept(delay, stdout) => {
                tokio::time::sleep(delay).await;
                Ok(Script::Accept(stdout))
            }
            Script::FlakySubmit(error, stdout) => {
                let mut failures = self.submit_failures.lock().await;
                let seen = failures.entry(stdin.to_string()).or_insert(0);
                if *seen == 0 {
                    *seen = 1;
                    Err(ClientError::Submit(error))
                } else {
                    Ok(Script::Accept(stdout))
                }
            }
            Script::FailSubmit(error) => Err(ClientError::Submit(error)),
            other => Ok(other),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match result {
            Ok(script) => {
                let id = self.next_token.fetch_add(1, Ordering::SeqCst);
                let token = format!("tok-{id}");
                self.pending.lock().await.insert(token.clone(), script);
                Ok(SubmissionToken::new(token))
            }
            Err(e) => Err(e),
        }
    }

    async fn poll(&self, token: &SubmissionToken) -> sandbox_client::Result<SandboxVerdict> {
        let pending = self.pending.lock().await;
        match pending.get(token.as_str()) {
            Some(Script::Accept(stdout)) => {
                Ok(terminal(status::ACCEPTED, Some(stdout.clone())))
            }
            Some(Script::Queued) => Ok(terminal(status::IN_QUEUE, None)),
            Some(_) => Ok(terminal(status::IN_QUEUE, None)),
            None => Err(ClientError::Poll(format!("unknown token {token}"))),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn case(input: &str, expected: &str) -> TestCase {
    TestCase {
        input: input.into(),
        expected_output: expected.into(),
        is_sample: false,
        points: 10,
    }
}

fn request(language: &str, cases: Vec<TestCase>) -> JudgeRequest {
    JudgeRequest {
        source_code: "print(input()[::-1])".into(),
        language: language.into(),
        test_cases: cases,
    }
}

fn fast_config() -> JudgeConfig {
    JudgeConfig {
        retry: RetryPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(10),
        },
        ..JudgeConfig::default()
    }
}

fn judge_with(sandbox: Arc<FakeSandbox>, config: JudgeConfig) -> Judge {
    Judge::new(sandbox, LanguageTable::default(), config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn all_passing_cases_aggregate_to_accepted() {
    let sandbox = Arc::new(FakeSandbox::new([
        ("hello", Script::Accept("olleh\n".into())),
        ("world", Script::Accept("dlrow\n".into())),
    ]));
    let judge = judge_with(Arc::clone(&sandbox), fast_config());

    let verdict = judge
        .judge(&request(
            "python",
            vec![case("hello", "olleh"), case("world", "dlrow")],
        ))
        .await;

    assert_eq!(verdict.status, VerdictStatus::Accepted);
    assert_eq!(verdict.message, "All test cases passed!");
    assert_eq!(verdict.total, 2);
    assert_eq!(verdict.passed, 2);
    assert_eq!(verdict.outcomes.len(), 2);
    assert!(verdict.outcomes.iter().all(|o| o.passed));
    assert_eq!(verdict.outcomes[0].actual, "olleh");
    assert_eq!(sandbox.submit_count(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn partial_failures_aggregate_to_wrong_answer() {
    let sandbox = Arc::new(FakeSandbox::new([
        ("a", Script::Accept("1\n".into())),
        ("b", Script::Accept("wrong\n".into())),
        ("c", Script::Accept("3\n".into())),
    ]));
    let judge = judge_with(sandbox, fast_config());

    let verdict = judge
        .judge(&request(
            "python",
            vec![case("a", "1"), case("b", "2"), case("c", "3")],
        ))
        .await;

    assert_eq!(verdict.status, VerdictStatus::WrongAnswer);
    assert_eq!(verdict.message, "Passed 2 out of 3 test cases");
    assert_eq!(verdict.passed, 2);
    assert_eq!(
        verdict.passed,
        verdict.outcomes.iter().filter(|o| o.passed).count()
    );
    assert!(!verdict.outcomes[1].passed);
    assert_eq!(verdict.outcomes[1].error.as_deref(), Some("Wrong Answer"));
}

#[tokio::test(flavor = "multi_thread")]
async fn outcomes_keep_input_order_despite_completion_order() {
    // Earlier cases finish later: completion order is the reverse of input
    // order, so correct results prove post-hoc reassembly.
    let sandbox = Arc::new(FakeSandbox::new([
        ("a", Script::SlowAccept(Duration::from_millis(120), "1\n".into())),
        ("b", Script::SlowAccept(Duration::from_millis(60), "2\n".into())),
        ("c", Script::SlowAccept(Duration::from_millis(5), "3\n".into())),
    ]));
    let judge = judge_with(sandbox, fast_config());

    let verdict = judge
        .judge(&request(
            "python",
            vec![case("a", "1"), case("b", "2"), case("c", "3")],
        ))
        .await;

    assert_eq!(verdict.status, VerdictStatus::Accepted);
    let actuals: Vec<&str> = verdict.outcomes.iter().map(|o| o.actual.as_str()).collect();
    assert_eq!(actuals, ["1", "2", "3"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unsupported_language_never_touches_the_sandbox() {
    let sandbox = Arc::new(FakeSandbox::new([("a", Script::Accept("1\n".into()))]));
    let judge = judge_with(Arc::clone(&sandbox), fast_config());

    let verdict = judge
        .judge(&request("cobol", vec![case("a", "1"), case("b", "2")]))
        .await;

    assert_eq!(verdict.status, VerdictStatus::WrongAnswer);
    assert_eq!(verdict.outcomes.len(), 2);
    for outcome in &verdict.outcomes {
        assert!(!outcome.passed);
        let error = outcome.error.as_deref().unwrap_or_default();
        assert!(error.contains("Unsupported language: cobol"), "got: {error}");
    }
    assert_eq!(sandbox.submit_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn unavailable_service_short_circuits_with_error_verdict() {
    let sandbox =
        Arc::new(FakeSandbox::new([("a", Script::Accept("1\n".into()))]).unhealthy());
    let judge = judge_with(Arc::clone(&sandbox), fast_config());

    let verdict = judge
        .judge(&request("python", vec![case("a", "1"), case("b", "2")]))
        .await;

    assert_eq!(verdict.status, VerdictStatus::Error);
    assert!(verdict.message.contains("unavailable"), "got: {}", verdict.message);
    assert_eq!(verdict.total, 2);
    assert_eq!(verdict.passed, 0);
    assert_eq!(verdict.outcomes.len(), 2);
    assert_eq!(sandbox.submit_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_test_case_set_is_a_configuration_error() {
    let sandbox = Arc::new(FakeSandbox::new(Vec::<(&str, Script)>::new()));
    let judge = judge_with(Arc::clone(&sandbox), fast_config());

    let verdict = judge.judge(&request("python", vec![])).await;

    assert_eq!(verdict.status, VerdictStatus::Error);
    assert_eq!(verdict.total, 0);
    assert!(verdict.outcomes.is_empty());
    assert_eq!(sandbox.submit_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn transient_submit_failure_is_retried_once_and_recovers() {
    let sandbox = Arc::new(FakeSandbox::new([(
        "a",
        Script::FlakySubmit("connection error: refused".into(), "1\n".into()),
    )]));
    let judge = judge_with(Arc::clone(&sandbox), fast_config());

    let started = Instant::now();
    let verdict = judge.judge(&request("python", vec![case("a", "1")])).await;

    assert_eq!(verdict.status, VerdictStatus::Accepted);
    assert_eq!(sandbox.submit_count(), 2);
    // Exactly one backoff delay between the two attempts.
    assert!(started.elapsed() >= Duration::from_millis(10));
}

#[tokio::test(flavor = "multi_thread")]
async fn non_retryable_submit_failure_is_not_reattempted() {
    let sandbox = Arc::new(FakeSandbox::new([(
        "a",
        Script::FailSubmit("unexpected status 422 Unprocessable Entity".into()),
    )]));
    let judge = judge_with(Arc::clone(&sandbox), fast_config());

    let verdict = judge.judge(&request("python", vec![case("a", "1")])).await;

    assert_eq!(verdict.status, VerdictStatus::WrongAnswer);
    assert_eq!(sandbox.submit_count(), 1);
    let error = verdict.outcomes[0].error.as_deref().unwrap_or_default();
    assert!(error.contains("422"), "got: {error}");
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrency_stays_within_the_worker_pool_bound() {
    let scripts: Vec<(String, Script)> = (0..50)
        .map(|i| {
            (
                format!("in-{i}"),
                Script::SlowAccept(Duration::from_millis(20), format!("out-{i}\n")),
            )
        })
        .collect();
    let sandbox = Arc::new(FakeSandbox::new(scripts));

    let config = JudgeConfig {
        max_concurrent: 8,
        ..fast_config()
    };
    let judge = judge_with(Arc::clone(&sandbox), config);

    let cases: Vec<TestCase> = (0..50)
        .map(|i| case(&format!("in-{i}"), &format!("out-{i}")))
        .collect();
    let verdict = judge.judge(&request("python", cases)).await;

    assert_eq!(verdict.status, VerdictStatus::Accepted);
    assert_eq!(verdict.passed, 50);
    assert_eq!(sandbox.submit_count(), 50);
    let peak = sandbox.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 8, "observed {peak} concurrent submits");
}

#[tokio::test(flavor = "multi_thread")]
async fn overall_deadline_fills_unfinished_slots_with_timeouts() {
    let sandbox = Arc::new(FakeSandbox::new([
        ("a", Script::Queued),
        ("b", Script::Queued),
    ]));
    let config = JudgeConfig {
        overall_deadline: Duration::from_millis(150),
        ..fast_config()
    };
    let judge = judge_with(Arc::clone(&sandbox), config);

    let started = Instant::now();
    let verdict = judge
        .judge(&request("python", vec![case("a", "1"), case("b", "2")]))
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(verdict.total, 2);
    assert_eq!(verdict.passed, 0);
    assert_eq!(verdict.outcomes.len(), 2);
    for outcome in &verdict.outcomes {
        let error = outcome.error.as_deref().unwrap_or_default();
        assert!(error.contains("Execution timeout"), "got: {error}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn poll_ceiling_surfaces_as_execution_timeout() {
    let sandbox = Arc::new(FakeSandbox::new([("a", Script::Queued)]));
    let config = JudgeConfig {
        max_poll_attempts: 2,
        ..fast_config()
    };
    let judge = judge_with(Arc::clone(&sandbox), config);

    let verdict = judge.judge(&request("python", vec![case("a", "1")])).await;

    assert_eq!(verdict.status, VerdictStatus::WrongAnswer);
    let error = verdict.outcomes[0].error.as_deref().unwrap_or_default();
    assert!(
        error.contains("Execution timeout - code took too long to run"),
        "got: {error}"
    );
    // The timeout outcome is transient, so the whole pipeline ran twice.
    assert_eq!(sandbox.submit_count(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn verdict_invariants_hold_across_mixed_outcomes() {
    let sandbox = Arc::new(FakeSandbox::new([
        ("a", Script::Accept("1\n".into())),
        ("b", Script::FailSubmit("unexpected status 400 Bad Request".into())),
        ("c", Script::Accept("nope\n".into())),
    ]));
    let judge = judge_with(sandbox, fast_config());

    let verdict = judge
        .judge(&request(
            "python",
            vec![case("a", "1"), case("b", "2"), case("c", "3")],
        ))
        .await;

    assert_eq!(verdict.outcomes.len(), verdict.total);
    assert_eq!(
        verdict.passed,
        verdict.outcomes.iter().filter(|o| o.passed).count()
    );
    assert_eq!(verdict.status, VerdictStatus::WrongAnswer);
    // Every outcome still reports the trimmed expected output.
    assert_eq!(verdict.outcomes[1].expected, "2");
}
