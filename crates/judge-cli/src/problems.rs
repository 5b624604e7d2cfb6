use std::collections::HashMap;
use std::path::Path;

use judge::{InMemoryProvider, TestCase};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Judge(String),
}

/// On-disk problem catalog: a list of problems with inline test cases.
#[derive(Debug, Deserialize)]
struct ProblemFile {
    problems: Vec<ProblemEntry>,
}

#[derive(Debug, Deserialize)]
struct ProblemEntry {
    id: String,
    test_cases: Vec<TestCase>,
}

/// Load a YAML problem catalog into an in-memory provider.
pub async fn load(path: &Path) -> Result<InMemoryProvider, CliError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Config(format!("read {}: {e}", path.display())))?;
    let file: ProblemFile = serde_yaml_ng::from_str(&content)
        .map_err(|e| CliError::Config(format!("parse {}: {e}", path.display())))?;

    if file.problems.is_empty() {
        return Err(CliError::Config(format!(
            "{}: no problems defined",
            path.display()
        )));
    }

    let problems: HashMap<String, Vec<TestCase>> = file
        .problems
        .into_iter()
        .map(|p| (p.id, p.test_cases))
        .collect();
    Ok(InMemoryProvider::new(problems))
}
