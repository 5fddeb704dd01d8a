//! Worker process: one request on stdin, one verdict on stdout.
//!
//! Stdout belongs to the response contract; all logging goes to stderr. The
//! process emits exactly one JSON object no matter what fails, then exits 0;
//! callers must treat the JSON, not the exit status, as authoritative.

use std::io::Read;

use tracing::{debug, error, info};

use wasm_python_judge_rs::prelude::*;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = grade_from_stdin().await;

    // Single point of emission.
    if let Err(e) = result.write_to(std::io::stdout()) {
        error!("failed to write response: {e}");
        std::process::exit(1);
    }
}

/// Read, parse, and grade the request, folding every failure into the
/// terminal error shape.
async fn grade_from_stdin() -> ExecutionResult {
    let mut raw = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
        return ExecutionResult::failure(
            Verdict::RuntimeError,
            format!("failed to read request: {e}"),
            0,
        );
    }

    let request = match ExecutionRequest::from_json(&raw) {
        Ok(request) => request,
        Err(e) => {
            return ExecutionResult::failure(
                Verdict::RuntimeError,
                format!("malformed request: {e}"),
                0,
            );
        }
    };

    let config = match JudgeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            return ExecutionResult::failure(Verdict::RuntimeError, e.to_string(), 0);
        }
    };
    debug!(
        timeout_ms = config.timeout.as_millis() as u64,
        profile = config.profile.name(),
        "judge configured"
    );

    let judge = match PythonJudge::new(config) {
        Ok(judge) => judge,
        Err(e) => {
            error!("judge construction failed: {e}");
            return ExecutionResult::failure(Verdict::RuntimeError, e.to_string(), 0);
        }
    };

    let result = judge.grade(&request).await;
    info!(
        verdict = %result.verdict,
        pass_count = result.pass_count,
        total = result.total,
        time_ms = result.time_ms,
        "run complete"
    );
    result
}
