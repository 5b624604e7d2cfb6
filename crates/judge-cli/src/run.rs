use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use judge::{
    CaseSelection, Judge, JudgeConfig, JudgeRequest, LanguageTable, TestCaseProvider,
    VerdictStatus,
};
use sandbox_client::{Sandbox, SandboxClient, SandboxConfig};

use crate::problems::{self, CliError};

#[derive(Args)]
pub struct RunArgs {
    /// Execution service base URL
    #[arg(long, env = "SANDBOX_URL", default_value = "http://localhost:2358")]
    sandbox_url: String,
    /// Path to the source file to judge
    #[arg(long)]
    source: PathBuf,
    /// Language the source is written in (e.g. python, cpp)
    #[arg(long)]
    language: String,
    /// YAML problem catalog
    #[arg(long)]
    problems: PathBuf,
    /// Problem to judge against
    #[arg(long)]
    problem_id: String,
    /// Judge only the publicly visible sample cases
    #[arg(long)]
    sample_only: bool,
    /// Maximum concurrently in-flight submissions
    #[arg(long, default_value_t = 8)]
    max_concurrent: usize,
}

#[derive(Args)]
pub struct HealthArgs {
    /// Execution service base URL
    #[arg(long, env = "SANDBOX_URL", default_value = "http://localhost:2358")]
    sandbox_url: String,
}

pub async fn run(args: RunArgs) -> Result<ExitCode, CliError> {
    let source_code = tokio::fs::read_to_string(&args.source)
        .await
        .map_err(|e| CliError::Config(format!("read {}: {e}", args.source.display())))?;

    let provider = problems::load(&args.problems).await?;
    let selection = if args.sample_only {
        CaseSelection::Sample
    } else {
        CaseSelection::Full
    };
    let test_cases = provider
        .test_cases(&args.problem_id, selection)
        .await
        .map_err(|e| CliError::Config(format!("problem {}: {e}", args.problem_id)))?;

    if test_cases.is_empty() {
        return Err(CliError::Config(format!(
            "no test cases found for problem {}",
            args.problem_id
        )));
    }

    let client = SandboxClient::new(SandboxConfig::new(args.sandbox_url))
        .map_err(|e| CliError::Config(e.to_string()))?;
    let config = JudgeConfig {
        max_concurrent: args.max_concurrent,
        ..JudgeConfig::default()
    };
    let judge = Judge::new(Arc::new(client), LanguageTable::default(), config);

    let request = JudgeRequest {
        source_code,
        language: args.language,
        test_cases,
    };
    let verdict = judge.judge(&request).await;

    let rendered = serde_json::to_string_pretty(&verdict)
        .map_err(|e| CliError::Judge(format!("render verdict: {e}")))?;
    println!("{rendered}");

    Ok(if verdict.status == VerdictStatus::Accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub async fn health(args: HealthArgs) -> Result<ExitCode, CliError> {
    let client = SandboxClient::new(SandboxConfig::new(args.sandbox_url))
        .map_err(|e| CliError::Config(e.to_string()))?;

    if client.health_check().await {
        println!("execution service is available");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("execution service is unavailable");
        Ok(ExitCode::FAILURE)
    }
}
