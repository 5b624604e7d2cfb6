use serde::{Deserialize, Serialize};

/// Status ids reported by the execution service. Anything above
/// [`status::PROCESSING`] is terminal and will not change on further polling.
pub mod status {
    pub const IN_QUEUE: i32 = 1;
    pub const PROCESSING: i32 = 2;
    pub const ACCEPTED: i32 = 3;
    pub const WRONG_ANSWER: i32 = 4;
    pub const TIME_LIMIT_EXCEEDED: i32 = 5;
    pub const COMPILATION_ERROR: i32 = 6;
    pub const WALL_TIME_LIMIT_EXCEEDED: i32 = 13;
}

/// Opaque handle identifying one in-flight submission. Created by submit,
/// consumed by poll, discarded once the verdict is terminal. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmissionToken(String);

impl SubmissionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubmissionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Submission payload. Field names are the service's wire contract.
#[derive(Debug, Serialize)]
pub(crate) struct SubmissionBody<'a> {
    pub source_code: &'a str,
    pub language_id: u32,
    pub stdin: &'a str,
    pub cpu_time_limit: f64,
    pub wall_time_limit: f64,
    pub memory_limit: u32,
    pub stack_limit: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SandboxStatus {
    pub id: i32,
    #[serde(default)]
    pub description: String,
}

/// One submission's state as reported by the execution service.
#[derive(Debug, Clone, Deserialize)]
pub struct SandboxVerdict {
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    pub status: SandboxStatus,
}

impl SandboxVerdict {
    pub fn is_terminal(&self) -> bool {
        self.status.id > status::PROCESSING
    }
}
