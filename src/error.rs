//! Error types for the judge core.

use thiserror::Error;

/// Errors that can occur while grading a submission.
///
/// These are host-side failures. Failures that happen *inside* the guest
/// interpreter (syntax errors, unresolved entry points, candidate
/// exceptions) are reported through the bootstrap result record instead and
/// never surface as a `JudgeError`.
#[derive(Error, Debug)]
pub enum JudgeError {
    /// The run exceeded the wall-clock budget.
    #[error("execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The guest tried to grow linear memory past the configured ceiling.
    #[error("memory limit exceeded: {0}")]
    MemoryLimitExceeded(String),

    /// The guest exhausted its CPU fuel budget.
    #[error("CPU fuel budget exhausted")]
    OutOfFuel,

    /// Failed to initialize the Wasm runtime.
    #[error("failed to initialize runtime: {0}")]
    RuntimeInit(#[source] anyhow::Error),

    /// Failed to load or instantiate the Python interpreter module.
    #[error("failed to load Python interpreter: {0}")]
    ModuleLoad(#[source] anyhow::Error),

    /// The guest died without emitting a result record, or the host-side
    /// plumbing around it failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The guest emitted a result record the host could not parse.
    #[error("malformed result record: {0}")]
    MalformedRecord(String),

    /// I/O error during execution.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The interpreter wasm file was not found.
    #[error("Python interpreter wasm not found at: {0}")]
    InterpreterNotFound(String),
}

impl JudgeError {
    /// Check if this error represents a wall-clock timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, JudgeError::Timeout(_))
    }

    /// Check if this error represents a tripped resource ceiling
    /// (memory or CPU fuel).
    pub fn is_resource_exceeded(&self) -> bool {
        matches!(
            self,
            JudgeError::MemoryLimitExceeded(_) | JudgeError::OutOfFuel
        )
    }
}

/// Result type alias for judge operations.
pub type Result<T> = std::result::Result<T, JudgeError>;
