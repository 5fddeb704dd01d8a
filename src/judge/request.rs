//! Wire types for the grading request.
//!
//! One `ExecutionRequest` is deserialized per worker process, consumed by a
//! single run, and never reused. Test values are plain JSON values; the
//! bootstrap compares them inside the guest with Python's structural `==`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single grading request: candidate source, an optional declared entry
/// point, and the ordered test cases to run it against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Candidate source text. Untrusted.
    pub code: String,
    /// Declared entry-point identifier, if the caller knows it.
    #[serde(rename = "exportName", default, skip_serializing_if = "Option::is_none")]
    pub export_name: Option<String>,
    /// Ordered test cases. May be empty; an empty set can never be Accepted.
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

/// One test case: positional arguments and the expected return value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: TestInput,
    /// Expected return value, compared for deep structural equality.
    pub output: Value,
}

/// Arguments for one entry-point invocation, unpacked positionally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestInput {
    #[serde(default)]
    pub args: Vec<Value>,
}

impl ExecutionRequest {
    /// Parse a request from its JSON wire form.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Serialize back to the wire form fed to the guest over stdin.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
