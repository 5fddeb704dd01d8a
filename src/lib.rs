//! # Python Judge
//!
//! The grading core of a code-judging pipeline: given an untrusted Python
//! submission, a declared entry point, and a set of input/expected-output
//! test cases, it runs the submission under strict isolation and produces a
//! single pass/fail verdict.
//!
//! Execution happens inside a RustPython interpreter compiled to WebAssembly
//! (WASI preview 1), run under Wasmtime. The crate enforces:
//!
//! - **Memory limits**: linear-memory growth is capped per run
//! - **CPU limits**: wasm fuel metering bounds instruction count
//! - **Wall-clock deadline**: epoch-based preemption breaks infinite loops
//! - **Filesystem/network/process isolation**: the guest holds no WASI
//!   capabilities beyond three in-memory stdio pipes
//! - **Restricted namespace**: candidate code sees only an allow-listed
//!   capability table of builtins, with no import mechanism
//!
//! ## Example
//!
//! ```rust,ignore
//! use wasm_python_judge_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let judge = PythonJudge::new(JudgeConfig::default())?;
//!
//!     let request = ExecutionRequest::from_json(
//!         r#"{
//!             "code": "def twoSum(nums, target):\n    return [0, 1]",
//!             "exportName": "twoSum",
//!             "tests": [{"input": {"args": [[2, 7, 11, 15], 9]}, "output": [0, 1]}]
//!         }"#,
//!     ).expect("well-formed request");
//!
//!     let result = judge.grade(&request).await;
//!     assert_eq!(result.verdict, Verdict::Accepted);
//!     Ok(())
//! }
//! ```
//!
//! ## Security Model
//!
//! Two nested boundaries, enforced at different layers:
//!
//! 1. **wasm/WASI (hard boundary)**: no preopened directories, no sockets,
//!    no host environment. Whatever candidate code does inside the
//!    interpreter, it holds no host capability.
//! 2. **Allow-list (policy boundary)**: candidate globals carry only an
//!    explicit capability table; `__import__`, `open`, `eval`, attribute
//!    reflection helpers, and stdout are unreachable by name.
//!
//! Every run gets a fresh store and namespace; nothing survives into the
//! next request.

pub mod error;
pub mod judge;
pub mod prelude;

// Re-export main types at crate root for convenience
pub use error::{JudgeError, Result};
pub use judge::cache::{global_cache, ModuleCache, SharedEngine};
pub use judge::config::{JudgeConfig, JudgeConfigBuilder};
pub use judge::executor::{JudgeOptions, PythonJudge};
pub use judge::namespace::Profile;
pub use judge::report::{ExecutionResult, Verdict};
pub use judge::request::{ExecutionRequest, TestCase, TestInput};
