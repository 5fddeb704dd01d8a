//! Run orchestration: one fresh guest per request.
//!
//! A `PythonJudge` holds the engine, the compiled interpreter module, and the
//! rendered bootstrap. Every call to [`PythonJudge::grade`] builds a fresh
//! store, WASI context, and namespace, arms the resource governor and the
//! deadline guard, runs the guest to completion or interruption, and maps the
//! outcome to exactly one [`ExecutionResult`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use wasmtime::{Linker, Module, Store, Trap};
use wasmtime_wasi::preview1;
use wasmtime_wasi::{I32Exit, WasiCtxBuilder};

use crate::error::{JudgeError, Result};
use crate::judge::cache::{global_cache, SharedEngine};
use crate::judge::config::JudgeConfig;
use crate::judge::io::RunIo;
use crate::judge::limits::{StoreData, StoreLimiterExt};
use crate::judge::namespace::{render_bootstrap, Profile};
use crate::judge::report::{parse_record, ExecutionResult, RunRecord};
use crate::judge::request::ExecutionRequest;

/// Construction options for a judge instance.
#[derive(Default)]
pub struct JudgeOptions {
    no_cache: bool,
    engine: Option<SharedEngine>,
}

impl JudgeOptions {
    /// Compile the interpreter privately instead of using the global cache.
    pub fn no_cache() -> Self {
        Self {
            no_cache: true,
            engine: None,
        }
    }

    /// Reuse an existing engine instead of creating one.
    pub fn with_engine(engine: SharedEngine) -> Self {
        Self {
            no_cache: false,
            engine: Some(engine),
        }
    }
}

/// A grader for untrusted Python submissions.
#[derive(Debug)]
pub struct PythonJudge {
    config: JudgeConfig,
    engine: SharedEngine,
    module: Arc<Module>,
    bootstrap: String,
    cached_module: bool,
}

impl PythonJudge {
    /// Create a judge with the given configuration and default options.
    pub fn new(config: JudgeConfig) -> Result<Self> {
        Self::new_with_options(config, JudgeOptions::default())
    }

    /// Create a judge with explicit options.
    pub fn new_with_options(config: JudgeConfig, options: JudgeOptions) -> Result<Self> {
        let engine = match options.engine {
            Some(engine) => engine,
            None => SharedEngine::for_judging(config.max_fuel.is_some())?,
        };

        if config.max_memory.is_none() {
            tracing::warn!(
                "address-space ceiling disabled; relying on CPU fuel and wall-clock budgets"
            );
        }
        if config.max_fuel.is_none() {
            tracing::warn!("CPU fuel ceiling disabled; relying on the wall-clock budget");
        }

        let (module, cached_module) = if options.no_cache {
            (Arc::new(compile_module(&engine, &config)?), false)
        } else {
            (
                global_cache().get_or_compile(engine.engine(), &config.interpreter_path)?,
                true,
            )
        };

        let bootstrap = render_bootstrap(config.profile);

        Ok(Self {
            config,
            engine,
            module,
            bootstrap,
            cached_module,
        })
    }

    /// The allow-list profile this judge grants candidate code.
    pub fn profile(&self) -> Profile {
        self.config.profile
    }

    /// Whether the interpreter module came from the global cache.
    pub fn is_using_cached_module(&self) -> bool {
        self.cached_module
    }

    /// Grade one request.
    ///
    /// Total by construction: every host failure is folded into the verdict
    /// shape, so exactly one `ExecutionResult` exists per request no matter
    /// how the run ends.
    pub async fn grade(&self, request: &ExecutionRequest) -> ExecutionResult {
        let started = Instant::now();
        let outcome = self.run_guest(request).await;
        let elapsed = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(record) => ExecutionResult::from_record(record, elapsed),
            Err(error) => {
                tracing::debug!(%error, "run ended without a guest tally");
                ExecutionResult::from_error(&error, elapsed)
            }
        }
    }

    async fn run_guest(&self, request: &ExecutionRequest) -> Result<RunRecord> {
        let request_json = request
            .to_json()
            .map_err(|e| JudgeError::ExecutionFailed(format!("failed to encode request: {e}")))?;

        let bootstrap = self.bootstrap.clone();
        let timeout = self.config.timeout;
        let tick = self.config.epoch_tick_interval;
        let ticks = deadline_ticks(timeout, tick);
        let max_memory = self.config.max_memory;
        let max_fuel = self.config.max_fuel;
        let engine = self.engine.clone();
        let module = Arc::clone(&self.module);

        // Deadline guard: tick the engine epoch until the run is over. The
        // store's epoch deadline preempts the guest mid-loop at ~timeout.
        let ticker_engine = engine.clone();
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                ticker_engine.increment_epoch();
            }
        });

        let exec_engine = engine.clone();
        let exec = tokio::task::spawn_blocking(move || {
            run_guest_sync(
                &exec_engine,
                &module,
                &bootstrap,
                request_json,
                timeout,
                ticks,
                max_memory,
                max_fuel,
            )
        });

        // Backstop for a wedged host call; the in-guest epoch trap is the
        // primary mechanism and fires first in the normal timeout path.
        let grace = tick * 4 + Duration::from_millis(50);
        let result = tokio::select! {
            joined = exec => {
                ticker.abort();
                match joined {
                    Ok(inner) => inner,
                    Err(e) => Err(JudgeError::ExecutionFailed(format!(
                        "execution task panicked: {e}"
                    ))),
                }
            }
            _ = tokio::time::sleep(timeout + grace) => {
                ticker.abort();
                // Force the epoch past the deadline so the abandoned guest
                // cannot keep burning the blocking thread.
                for _ in 0..=ticks {
                    engine.increment_epoch();
                }
                Err(JudgeError::Timeout(timeout))
            }
        };

        result
    }
}

/// Epoch ticks until the deadline trap, with one tick of slack for the
/// interval's immediate first fire.
fn deadline_ticks(timeout: Duration, tick: Duration) -> u64 {
    let tick_ms = tick.as_millis().max(1);
    timeout.as_millis().div_ceil(tick_ms) as u64 + 1
}

/// Compile the interpreter without going through the global cache.
fn compile_module(engine: &SharedEngine, config: &JudgeConfig) -> Result<Module> {
    let wasm_bytes = std::fs::read(&config.interpreter_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            JudgeError::InterpreterNotFound(config.interpreter_path.display().to_string())
        } else {
            JudgeError::Io(e)
        }
    })?;
    Module::new(engine.engine(), &wasm_bytes)
        .map_err(|e| JudgeError::ModuleLoad(anyhow::anyhow!("failed to compile module: {}", e)))
}

/// Synchronous guest run on the blocking pool.
#[allow(clippy::too_many_arguments)]
fn run_guest_sync(
    engine: &SharedEngine,
    module: &Module,
    bootstrap: &str,
    request_json: String,
    timeout: Duration,
    deadline_ticks: u64,
    max_memory: Option<u64>,
    max_fuel: Option<u64>,
) -> Result<RunRecord> {
    let io = RunIo::new(request_json);

    // No preopens, no sockets, no host environment: the only capabilities the
    // guest gets are the three in-memory stdio pipes.
    let wasi_ctx = WasiCtxBuilder::new()
        .args(&["python", "-c", bootstrap])
        .stdin(io.stdin.clone())
        .stdout(io.stdout.clone())
        .stderr(io.stderr.clone())
        .build_p1();

    let store_data = StoreData::new(max_memory, wasi_ctx);
    let mut store = Store::new(engine.engine(), store_data);
    store.configure_limiter();

    store.epoch_deadline_trap();
    store.set_epoch_deadline(deadline_ticks);

    if let Some(fuel) = max_fuel {
        store
            .set_fuel(fuel)
            .map_err(|e| JudgeError::RuntimeInit(anyhow::anyhow!("failed to set fuel: {}", e)))?;
    }

    let mut linker = Linker::new(engine.engine());
    preview1::add_to_linker_sync(&mut linker, |data: &mut StoreData| &mut data.wasi)
        .map_err(|e| JudgeError::RuntimeInit(anyhow::anyhow!("failed to link WASI: {}", e)))?;

    let instance = linker.instantiate(&mut store, module).map_err(|e| {
        if store.data().limiter.limit_exceeded() {
            return JudgeError::MemoryLimitExceeded(
                "memory limit exceeded during instantiation".to_string(),
            );
        }
        JudgeError::ModuleLoad(anyhow::anyhow!("failed to instantiate: {}", e))
    })?;

    let start = instance
        .get_typed_func::<(), ()>(&mut store, "_start")
        .map_err(|e| {
            JudgeError::ModuleLoad(anyhow::anyhow!("failed to get _start function: {}", e))
        })?;

    let exit_code = match start.call(&mut store, ()) {
        Ok(()) => 0,
        Err(e) => classify_guest_error(&store, e, timeout)?,
    };

    let stdout = io.stdout_str();
    if exit_code != 0 {
        // A record trumps the exit status; the bootstrap exits nonzero only
        // when the interpreter itself is dying.
        if let Ok(record) = parse_record(&stdout) {
            return Ok(record);
        }
        return Err(JudgeError::ExecutionFailed(format!(
            "interpreter exited with status {exit_code}: {}",
            snippet(&io.stderr_str())
        )));
    }

    parse_record(&stdout).map_err(|e| match e {
        JudgeError::ExecutionFailed(_) => JudgeError::ExecutionFailed(format!(
            "guest produced no result record; stderr: {}",
            snippet(&io.stderr_str())
        )),
        other => other,
    })
}

/// Map a `_start` error to a ceiling-specific judge error, or recover the
/// WASI exit status.
fn classify_guest_error(
    store: &Store<StoreData>,
    error: anyhow::Error,
    timeout: Duration,
) -> Result<i32> {
    if store.data().limiter.limit_exceeded() {
        return Err(JudgeError::MemoryLimitExceeded(
            "memory limit exceeded during execution".to_string(),
        ));
    }

    match error.downcast_ref::<Trap>() {
        Some(Trap::Interrupt) => return Err(JudgeError::Timeout(timeout)),
        Some(Trap::OutOfFuel) => return Err(JudgeError::OutOfFuel),
        _ => {}
    }

    if let Some(exit) = error.downcast_ref::<I32Exit>() {
        return Ok(exit.0);
    }

    Err(JudgeError::ExecutionFailed(error.to_string()))
}

/// First few hundred characters of a diagnostic stream.
fn snippet(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    trimmed.chars().take(400).collect()
}
