use std::collections::HashMap;

use async_trait::async_trait;

use crate::types::{BoxError, TestCase};

/// Which slice of a problem's test cases a judging run wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSelection {
    /// Only the publicly visible sample cases.
    Sample,
    /// The full battery.
    Full,
}

/// Problem-catalog collaborator: supplies the ordered test cases for a
/// problem. Implementations own the data; the orchestrator only reads it.
#[async_trait]
pub trait TestCaseProvider: Send + Sync {
    async fn test_cases(
        &self,
        problem_id: &str,
        selection: CaseSelection,
    ) -> Result<Vec<TestCase>, BoxError>;
}

/// Catalog backed by a prebuilt map. Used by the CLI and tests.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    problems: HashMap<String, Vec<TestCase>>,
}

impl InMemoryProvider {
    pub fn new(problems: HashMap<String, Vec<TestCase>>) -> Self {
        Self { problems }
    }

    pub fn insert(&mut self, problem_id: impl Into<String>, cases: Vec<TestCase>) {
        self.problems.insert(problem_id.into(), cases);
    }
}

#[async_trait]
impl TestCaseProvider for InMemoryProvider {
    async fn test_cases(
        &self,
        problem_id: &str,
        selection: CaseSelection,
    ) -> Result<Vec<TestCase>, BoxError> {
        let cases = self
            .problems
            .get(problem_id)
            .ok_or_else(|| format!("unknown problem: {problem_id}"))?;

        Ok(match selection {
            CaseSelection::Full => cases.clone(),
            CaseSelection::Sample => cases.iter().filter(|c| c.is_sample).cloned().collect(),
        })
    }
}
