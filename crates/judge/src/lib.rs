//! Judged execution orchestration.
//!
//! Turns a `(code, language, test cases)` request into one pass/fail outcome
//! per test case plus an aggregate verdict, delegating actual execution to a
//! remote sandbox service behind the [`sandbox_client::Sandbox`] trait.

mod classify;
mod config;
mod coordinator;
mod languages;
mod poller;
mod provider;
mod retry;
mod types;

pub use classify::classify;
pub use config::JudgeConfig;
pub use coordinator::Judge;
pub use languages::LanguageTable;
pub use poller::poll_until_terminal;
pub use provider::{CaseSelection, InMemoryProvider, TestCaseProvider};
pub use retry::{RetryPolicy, run_with_retry};
pub use types::{BoxError, JudgeRequest, JudgeVerdict, TestCase, TestOutcome, VerdictStatus};
