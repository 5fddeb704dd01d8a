//! Prelude module for convenient imports.

pub use crate::error::{JudgeError, Result};
pub use crate::judge::{
    config::JudgeConfig,
    executor::{JudgeOptions, PythonJudge},
    namespace::Profile,
    report::{ExecutionResult, Verdict},
    request::{ExecutionRequest, TestCase, TestInput},
};
