//! Compiled-module caching and engine sharing.
//!
//! Compiling `rustpython.wasm` is by far the most expensive part of judge
//! construction. The cache stores compiled modules keyed by canonical path so
//! a resident worker (or a test suite) pays compilation once; every run still
//! gets its own store, namespace, and limits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use wasmtime::{Engine, Module};

use crate::error::{JudgeError, Result};

/// Thread-safe cache of compiled interpreter modules, keyed by canonical
/// path.
#[derive(Debug, Default)]
pub struct ModuleCache {
    cache: RwLock<HashMap<PathBuf, Arc<Module>>>,
}

impl ModuleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Get a cached module or compile it if not present.
    pub fn get_or_compile(&self, engine: &Engine, path: impl AsRef<Path>) -> Result<Arc<Module>> {
        let path = path.as_ref();

        let canonical_path = std::fs::canonicalize(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                JudgeError::InterpreterNotFound(path.display().to_string())
            } else {
                JudgeError::Io(e)
            }
        })?;

        {
            let cache = self.cache.read().unwrap();
            if let Some(module) = cache.get(&canonical_path) {
                return Ok(Arc::clone(module));
            }
        }

        // Compile outside any lock; compilation takes seconds.
        let wasm_bytes = std::fs::read(&canonical_path).map_err(JudgeError::Io)?;
        let module = Module::new(engine, &wasm_bytes).map_err(|e| {
            JudgeError::ModuleLoad(anyhow::anyhow!("failed to compile module: {}", e))
        })?;
        let module = Arc::new(module);

        {
            let mut cache = self.cache.write().unwrap();
            // Another thread may have compiled while we were.
            if let Some(existing) = cache.get(&canonical_path) {
                return Ok(Arc::clone(existing));
            }
            cache.insert(canonical_path, Arc::clone(&module));
        }

        Ok(module)
    }

    /// Clear all cached modules.
    pub fn clear(&self) {
        self.cache.write().unwrap().clear();
    }

    /// Number of cached modules.
    pub fn len(&self) -> usize {
        self.cache.read().unwrap().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-wide module cache, used by `PythonJudge::new` unless opted out.
static GLOBAL_CACHE: std::sync::LazyLock<ModuleCache> = std::sync::LazyLock::new(ModuleCache::new);

/// Get the global module cache.
pub fn global_cache() -> &'static ModuleCache {
    &GLOBAL_CACHE
}

/// A shareable wasmtime engine configured for judging.
///
/// The engine owns the epoch counter, so judges sharing an engine share one
/// interruption domain. One judge instance grades one request at a time; the
/// deadline arithmetic assumes a single active ticker per engine.
#[derive(Clone)]
pub struct SharedEngine {
    engine: Arc<Engine>,
}

impl std::fmt::Debug for SharedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedEngine")
            .field("engine", &"<wasmtime::Engine>")
            .finish()
    }
}

impl SharedEngine {
    /// Create an engine with epoch interruption and fuel metering as
    /// requested. Fuel must be decided at engine construction time; a judge
    /// with a CPU ceiling needs `consume_fuel = true`.
    pub fn for_judging(consume_fuel: bool) -> Result<Self> {
        let mut config = wasmtime::Config::new();
        config.epoch_interruption(true);
        config.consume_fuel(consume_fuel);

        let engine = Engine::new(&config)
            .map_err(|e| JudgeError::RuntimeInit(anyhow::anyhow!("{}", e)))?;
        Ok(Self {
            engine: Arc::new(engine),
        })
    }

    /// Wrap an existing engine.
    pub fn from_arc(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Reference to the underlying engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The shared handle.
    pub fn arc(&self) -> Arc<Engine> {
        Arc::clone(&self.engine)
    }
}

impl std::ops::Deref for SharedEngine {
    type Target = Engine;

    fn deref(&self) -> &Self::Target {
        &self.engine
    }
}
