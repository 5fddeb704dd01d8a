//! Resource ceilings for a single run.
//!
//! The address-space governor is a wasmtime [`ResourceLimiter`] attached to
//! each run's store; it denies linear-memory growth past the configured
//! ceiling and records the denial so the executor can report it as a
//! distinguishable error instead of a generic guest crash. The CPU ceiling
//! (fuel) lives on the store itself and is armed by the executor.

use wasmtime::{ResourceLimiter, Store};

/// Per-run resource limiter enforcing memory and table-size ceilings.
pub struct RunLimiter {
    /// Maximum linear memory in bytes. `None` disables the ceiling
    /// (degraded mode, warned about at judge construction).
    max_memory: Option<u64>,
    /// Peak memory allocation observed.
    peak_memory: u64,
    /// Maximum table elements.
    max_table_elements: u64,
    /// Whether a ceiling was tripped.
    limit_exceeded: bool,
}

impl RunLimiter {
    /// Create a limiter with the given memory ceiling.
    pub fn new(max_memory: Option<u64>) -> Self {
        Self {
            max_memory,
            peak_memory: 0,
            max_table_elements: 10_000,
            limit_exceeded: false,
        }
    }

    /// Whether any ceiling was tripped during the run.
    pub fn limit_exceeded(&self) -> bool {
        self.limit_exceeded
    }

    /// Peak memory usage observed, in bytes.
    pub fn peak_memory(&self) -> u64 {
        self.peak_memory
    }

    /// The configured memory ceiling, if one is enforced.
    pub fn max_memory(&self) -> Option<u64> {
        self.max_memory
    }
}

impl ResourceLimiter for RunLimiter {
    fn memory_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        let desired_bytes = desired as u64;

        if let Some(ceiling) = self.max_memory {
            if desired_bytes > ceiling {
                self.limit_exceeded = true;
                return Ok(false);
            }
        }

        if desired_bytes > self.peak_memory {
            self.peak_memory = desired_bytes;
        }
        Ok(true)
    }

    fn table_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        if desired as u64 > self.max_table_elements {
            self.limit_exceeded = true;
            return Ok(false);
        }
        Ok(true)
    }
}

/// Store data for one run: the limiter plus the guest's WASI context.
///
/// A fresh `StoreData` is built per request and dropped with the store on
/// every exit path, so no guest state survives into the next run.
pub struct StoreData {
    /// The resource limiter.
    pub limiter: RunLimiter,
    /// WASI Preview 1 context for the guest.
    pub wasi: wasmtime_wasi::preview1::WasiP1Ctx,
}

impl StoreData {
    /// Create store data with the given memory ceiling and WASI context.
    pub fn new(max_memory: Option<u64>, wasi: wasmtime_wasi::preview1::WasiP1Ctx) -> Self {
        Self {
            limiter: RunLimiter::new(max_memory),
            wasi,
        }
    }
}

/// Extension trait wiring the limiter into a store.
pub trait StoreLimiterExt {
    /// Attach the limiter carried in the store data.
    fn configure_limiter(&mut self);
}

impl StoreLimiterExt for Store<StoreData> {
    fn configure_limiter(&mut self) {
        self.limiter(|data| &mut data.limiter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_allows_within_ceiling() {
        let mut limiter = RunLimiter::new(Some(1024 * 1024));

        let allowed = limiter.memory_growing(0, 512 * 1024, None).unwrap();
        assert!(allowed);
        assert!(!limiter.limit_exceeded());
        assert_eq!(limiter.peak_memory(), 512 * 1024);
    }

    #[test]
    fn test_limiter_denies_over_ceiling() {
        let mut limiter = RunLimiter::new(Some(1024 * 1024));

        let allowed = limiter.memory_growing(0, 2 * 1024 * 1024, None).unwrap();
        assert!(!allowed);
        assert!(limiter.limit_exceeded());
    }

    #[test]
    fn test_disabled_ceiling_always_allows() {
        let mut limiter = RunLimiter::new(None);

        let allowed = limiter
            .memory_growing(0, 4 * 1024 * 1024 * 1024, None)
            .unwrap();
        assert!(allowed);
        assert!(!limiter.limit_exceeded());
    }

    #[test]
    fn test_table_growth_bounded() {
        let mut limiter = RunLimiter::new(None);

        assert!(limiter.table_growing(0, 100, None).unwrap());
        assert!(!limiter.table_growing(0, 1_000_000, None).unwrap());
        assert!(limiter.limit_exceeded());
    }
}
