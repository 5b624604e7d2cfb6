use sandbox_client::{SandboxVerdict, status};

use crate::types::TestOutcome;

/// Map a terminal sandbox verdict onto the outcome for one test case.
///
/// Pure: the same verdict and expected output always yield the same outcome.
/// Both sides of the comparison are whitespace-trimmed, and the outcome's
/// `expected` is the trimmed expected output on every path.
pub fn classify(verdict: &SandboxVerdict, expected: &str) -> TestOutcome {
    let expected = expected.trim().to_string();

    match verdict.status.id {
        status::ACCEPTED => {
            let actual = trimmed(&verdict.stdout);
            let passed = actual == expected;
            TestOutcome {
                passed,
                expected,
                actual,
                error: (!passed).then(|| "Wrong Answer".to_string()),
            }
        }
        status::WRONG_ANSWER => TestOutcome {
            passed: false,
            expected,
            actual: trimmed(&verdict.stdout),
            error: Some("Wrong Answer".to_string()),
        },
        status::COMPILATION_ERROR => TestOutcome {
            passed: false,
            expected,
            actual: String::new(),
            error: Some(format!(
                "Compilation Error: {}",
                verdict.compile_output.as_deref().unwrap_or("Unknown")
            )),
        },
        status::TIME_LIMIT_EXCEEDED | status::WALL_TIME_LIMIT_EXCEEDED => TestOutcome {
            passed: false,
            expected,
            actual: String::new(),
            error: Some("Time Limit Exceeded".to_string()),
        },
        _ => {
            let mut error = format!("Runtime Error: {}", verdict.status.description);
            let stderr = trimmed(&verdict.stderr);
            if !stderr.is_empty() {
                error.push_str(" - ");
                error.push_str(&stderr);
            }
            TestOutcome {
                passed: false,
                expected,
                actual: String::new(),
                error: Some(error),
            }
        }
    }
}

fn trimmed(field: &Option<String>) -> String {
    field.as_deref().map(str::trim).unwrap_or_default().to_string()
}
