//! Verdicts and the response contract.
//!
//! Verdict derivation lives entirely on the host: the guest bootstrap only
//! reports a raw tally or a failure record, and this module maps either one,
//! or a host-side [`JudgeError`], to the single response shape. The worker
//! binary calls [`ExecutionResult::write_to`] exactly once per process.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::{JudgeError, Result};
use crate::judge::namespace::RESULT_MARKER;

/// Final categorical outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Accepted")]
    Accepted,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    #[serde(rename = "Time Limit Exceeded")]
    TimeLimitExceeded,
    #[serde(rename = "Runtime Error")]
    RuntimeError,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Accepted => "Accepted",
            Verdict::WrongAnswer => "Wrong Answer",
            Verdict::TimeLimitExceeded => "Time Limit Exceeded",
            Verdict::RuntimeError => "Runtime Error",
        };
        f.write_str(s)
    }
}

/// The single response emitted per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub verdict: Verdict,
    #[serde(rename = "passCount")]
    pub pass_count: u32,
    pub total: u32,
    #[serde(rename = "timeMs")]
    pub time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Build the response from the guest's result record.
    ///
    /// `Accepted` iff at least one test ran and all passed; an empty test
    /// set can never be accepted.
    pub fn from_record(record: RunRecord, time_ms: u64) -> Self {
        match record {
            RunRecord::Ok { pass_count, total } => {
                let pass_count = pass_count.min(total);
                let verdict = if total > 0 && pass_count == total {
                    Verdict::Accepted
                } else {
                    Verdict::WrongAnswer
                };
                Self {
                    verdict,
                    pass_count,
                    total,
                    time_ms,
                    error: None,
                }
            }
            RunRecord::Error { kind, message } => {
                Self::failure(Verdict::RuntimeError, kind.describe(&message), time_ms)
            }
        }
    }

    /// Build the response for a host-side failure.
    ///
    /// Only the deadline guard produces `Time Limit Exceeded`; tripped
    /// resource ceilings stay `Runtime Error` but keep ceiling-specific
    /// diagnostics so the two remediation classes remain separable.
    pub fn from_error(error: &JudgeError, time_ms: u64) -> Self {
        match error {
            JudgeError::Timeout(budget) => Self::failure(
                Verdict::TimeLimitExceeded,
                format!("wall-clock limit of {}ms exceeded", budget.as_millis()),
                time_ms,
            ),
            JudgeError::OutOfFuel => Self::failure(
                Verdict::RuntimeError,
                "CPU fuel budget exhausted".to_string(),
                time_ms,
            ),
            JudgeError::MemoryLimitExceeded(detail) => Self::failure(
                Verdict::RuntimeError,
                format!("memory limit exceeded: {detail}"),
                time_ms,
            ),
            other => Self::failure(Verdict::RuntimeError, other.to_string(), time_ms),
        }
    }

    /// A zero-test terminal failure shape.
    pub fn failure(verdict: Verdict, error: String, time_ms: u64) -> Self {
        Self {
            verdict,
            pass_count: 0,
            total: 0,
            time_ms,
            error: Some(error),
        }
    }

    /// Serialize the response as one JSON line. The caller is the single
    /// point of emission.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        serde_json::to_writer(&mut writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

/// The record the bootstrap emits on guest stdout.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunRecord {
    Ok {
        #[serde(rename = "passCount")]
        pass_count: u32,
        total: u32,
    },
    Error { kind: RecordKind, message: String },
}

/// Which guest-side stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Candidate source did not compile.
    Compile,
    /// Candidate top-level code raised while loading.
    Load,
    /// No entry point resolved.
    Resolve,
    /// The bootstrap itself failed.
    Internal,
}

impl RecordKind {
    /// Render the diagnostic string for the response.
    fn describe(&self, message: &str) -> String {
        match self {
            RecordKind::Compile => format!("compile error: {message}"),
            RecordKind::Load => format!("load error: {message}"),
            // Resolve messages already name the missing entry point.
            RecordKind::Resolve => message.to_string(),
            RecordKind::Internal => format!("judge internal error: {message}"),
        }
    }
}

/// Extract the bootstrap's result record from captured guest stdout.
///
/// Scans from the end so stray earlier output cannot shadow the record; the
/// bootstrap emits exactly one marker line and candidate code cannot reach
/// stdout at all.
pub fn parse_record(stdout: &str) -> Result<RunRecord> {
    let line = stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(RESULT_MARKER))
        .ok_or_else(|| {
            JudgeError::ExecutionFailed("guest produced no result record".to_string())
        })?;

    serde_json::from_str(line.trim())
        .map_err(|e| JudgeError::MalformedRecord(format!("{e}: {}", line.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_all_passed_is_accepted() {
        let result = ExecutionResult::from_record(
            RunRecord::Ok {
                pass_count: 3,
                total: 3,
            },
            12,
        );
        assert_eq!(result.verdict, Verdict::Accepted);
        assert_eq!(result.pass_count, 3);
        assert_eq!(result.total, 3);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_partial_pass_is_wrong_answer() {
        let result = ExecutionResult::from_record(
            RunRecord::Ok {
                pass_count: 2,
                total: 3,
            },
            5,
        );
        assert_eq!(result.verdict, Verdict::WrongAnswer);
    }

    #[test]
    fn test_empty_test_set_is_never_accepted() {
        let result = ExecutionResult::from_record(
            RunRecord::Ok {
                pass_count: 0,
                total: 0,
            },
            1,
        );
        assert_eq!(result.verdict, Verdict::WrongAnswer);
    }

    #[test]
    fn test_pass_count_clamped_to_total() {
        let result = ExecutionResult::from_record(
            RunRecord::Ok {
                pass_count: 9,
                total: 2,
            },
            1,
        );
        assert!(result.pass_count <= result.total);
    }

    #[test]
    fn test_guest_error_record_is_runtime_error() {
        let result = ExecutionResult::from_record(
            RunRecord::Error {
                kind: RecordKind::Resolve,
                message: "no callable entry point named 'twoSum'".to_string(),
            },
            2,
        );
        assert_eq!(result.verdict, Verdict::RuntimeError);
        assert_eq!(result.pass_count, 0);
        assert_eq!(result.total, 0);
        assert!(result.error.unwrap().contains("twoSum"));
    }

    #[test]
    fn test_timeout_maps_to_tle() {
        let result =
            ExecutionResult::from_error(&JudgeError::Timeout(Duration::from_secs(3)), 3050);
        assert_eq!(result.verdict, Verdict::TimeLimitExceeded);
        assert_eq!(result.total, 0);
        assert!(result.error.unwrap().contains("3000ms"));
    }

    #[test]
    fn test_resource_ceilings_stay_distinguishable() {
        let fuel = ExecutionResult::from_error(&JudgeError::OutOfFuel, 100);
        assert_eq!(fuel.verdict, Verdict::RuntimeError);
        assert!(fuel.error.unwrap().contains("fuel"));

        let mem = ExecutionResult::from_error(
            &JudgeError::MemoryLimitExceeded("grow denied at 300MiB".to_string()),
            100,
        );
        assert_eq!(mem.verdict, Verdict::RuntimeError);
        assert!(mem.error.unwrap().contains("memory limit"));
    }

    #[test]
    fn test_parse_record_takes_last_marker_line() {
        let stdout = format!(
            "noise\n{m} {{\"status\":\"error\",\"kind\":\"compile\",\"message\":\"old\"}}\n\
             {m} {{\"status\":\"ok\",\"passCount\":1,\"total\":2}}\n",
            m = RESULT_MARKER
        );
        let record = parse_record(&stdout).unwrap();
        assert!(matches!(
            record,
            RunRecord::Ok {
                pass_count: 1,
                total: 2
            }
        ));
    }

    #[test]
    fn test_parse_record_missing_marker() {
        let err = parse_record("Traceback (most recent call last):\nboom\n").unwrap_err();
        assert!(matches!(err, JudgeError::ExecutionFailed(_)));
    }

    #[test]
    fn test_parse_record_malformed_json() {
        let stdout = format!("{RESULT_MARKER} not-json\n");
        let err = parse_record(&stdout).unwrap_err();
        assert!(matches!(err, JudgeError::MalformedRecord(_)));
    }

    #[test]
    fn test_wire_shape() {
        let result = ExecutionResult {
            verdict: Verdict::TimeLimitExceeded,
            pass_count: 0,
            total: 0,
            time_ms: 3001,
            error: Some("wall-clock limit of 3000ms exceeded".to_string()),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"verdict\":\"Time Limit Exceeded\""));
        assert!(json.contains("\"passCount\":0"));
        assert!(json.contains("\"timeMs\":3001"));

        let accepted = ExecutionResult::from_record(
            RunRecord::Ok {
                pass_count: 1,
                total: 1,
            },
            7,
        );
        let json = serde_json::to_string(&accepted).unwrap();
        assert!(json.contains("\"verdict\":\"Accepted\""));
        // No error field on success.
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_write_to_emits_one_line() {
        let result = ExecutionResult::failure(Verdict::RuntimeError, "boom".to_string(), 0);
        let mut buf = Vec::new();
        result.write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));
    }
}
