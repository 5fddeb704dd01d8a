//! Guest stdio plumbing for one run.
//!
//! The request JSON goes in over guest stdin; the bootstrap's result record
//! comes back on guest stdout. Both are in-memory pipes, so the guest never
//! touches a real file descriptor. Output capacity is bounded: the bootstrap
//! writes one small record, and candidate code has no reachable way to write
//! to stdout at all, so the caps are generous.

use wasmtime_wasi::pipe::{MemoryInputPipe, MemoryOutputPipe};

/// Captured stdout ceiling. The result record is well under 1 KiB.
const STDOUT_CAPACITY: usize = 1024 * 1024;
/// Captured stderr ceiling. Interpreter tracebacks can get long.
const STDERR_CAPACITY: usize = 256 * 1024;

/// Stdio endpoints for a single guest run.
pub struct RunIo {
    /// Request payload fed to the guest.
    pub stdin: MemoryInputPipe,
    /// Captured guest stdout (result record channel).
    pub stdout: MemoryOutputPipe,
    /// Captured guest stderr (diagnostics only).
    pub stderr: MemoryOutputPipe,
}

impl RunIo {
    /// Create the pipes for one run, with the request JSON as guest stdin.
    pub fn new(request_json: String) -> Self {
        Self {
            stdin: MemoryInputPipe::new(request_json),
            stdout: MemoryOutputPipe::new(STDOUT_CAPACITY),
            stderr: MemoryOutputPipe::new(STDERR_CAPACITY),
        }
    }

    /// Captured stdout as a string.
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout.contents()).to_string()
    }

    /// Captured stderr as a string.
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr.contents()).to_string()
    }
}
