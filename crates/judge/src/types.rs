use serde::{Deserialize, Serialize};

/// Boxed error for collaborator interfaces.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Immutable input to one judging run.
#[derive(Debug, Clone)]
pub struct JudgeRequest {
    pub source_code: String,
    /// Open language name, resolved against the coordinator's
    /// [`LanguageTable`](crate::LanguageTable); unknown names are rejected
    /// before any network call.
    pub language: String,
    pub test_cases: Vec<TestCase>,
}

fn default_points() -> u32 {
    10
}

/// One input/expected-output pair. Owned by the problem catalog; the
/// orchestrator only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub is_sample: bool,
    #[serde(default = "default_points")]
    pub points: u32,
}

/// Per-test-case result, reported in the same order as the input cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    pub passed: bool,
    pub expected: String,
    pub actual: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate classification of a judging run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerdictStatus {
    #[serde(rename = "AC")]
    Accepted,
    #[serde(rename = "WA")]
    WrongAnswer,
    #[serde(rename = "TLE")]
    TimeLimitExceeded,
    #[serde(rename = "CE")]
    CompileError,
    #[serde(rename = "RE")]
    RuntimeError,
    /// Orchestrator-level failure, distinct from any sandbox verdict.
    #[serde(rename = "ERROR")]
    Error,
}

/// Final, immutable result of one judging run.
///
/// `outcomes.len()` always equals the request's test-case count, even when
/// the run fails outright.
#[derive(Debug, Clone, Serialize)]
pub struct JudgeVerdict {
    pub status: VerdictStatus,
    pub message: String,
    pub total: usize,
    pub passed: usize,
    pub outcomes: Vec<TestOutcome>,
}
