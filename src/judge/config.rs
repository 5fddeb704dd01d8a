//! Judge configuration with builder pattern.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{JudgeError, Result};
use crate::judge::namespace::Profile;

/// Configuration for the judge.
///
/// Both resource ceilings are optional: disabling one degrades enforcement to
/// the remaining budgets instead of aborting startup. The degradation is
/// logged at judge construction so operators can see it.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Wall-clock budget for one whole run (load + resolve + all tests).
    pub timeout: Duration,
    /// Address-space ceiling in bytes. `None` disables it.
    pub max_memory: Option<u64>,
    /// CPU ceiling as a wasm fuel budget. `None` disables it.
    pub max_fuel: Option<u64>,
    /// Path to the RustPython wasm interpreter.
    pub interpreter_path: PathBuf,
    /// Epoch tick interval driving the deadline guard.
    pub epoch_tick_interval: Duration,
    /// Allow-list profile for the restricted namespace.
    pub profile: Profile,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            max_memory: Some(256 * 1024 * 1024),
            max_fuel: Some(5_000_000_000),
            interpreter_path: PathBuf::from("assets/rustpython.wasm"),
            epoch_tick_interval: Duration::from_millis(10),
            profile: Profile::default(),
        }
    }
}

impl JudgeConfig {
    /// Create a new builder.
    pub fn builder() -> JudgeConfigBuilder {
        JudgeConfigBuilder::default()
    }

    /// Build a config from environment variables, on top of the defaults:
    ///
    /// - `JUDGE_WASM`: interpreter path
    /// - `JUDGE_TIMEOUT_MS`: wall-clock budget in milliseconds
    /// - `JUDGE_MEMORY_BYTES`: memory ceiling; `0` or `none` disables
    /// - `JUDGE_FUEL`: CPU fuel budget; `0` or `none` disables
    /// - `JUDGE_PROFILE`: `minimal` or `relaxed`
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Ok(path) = std::env::var("JUDGE_WASM") {
            builder = builder.interpreter_path(path);
        }
        if let Some(ms) = parse_env_limit("JUDGE_TIMEOUT_MS")? {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Ok(raw) = std::env::var("JUDGE_MEMORY_BYTES") {
            builder = builder.set_max_memory(parse_limit("JUDGE_MEMORY_BYTES", &raw)?);
        }
        if let Ok(raw) = std::env::var("JUDGE_FUEL") {
            builder = builder.set_max_fuel(parse_limit("JUDGE_FUEL", &raw)?);
        }
        if let Ok(raw) = std::env::var("JUDGE_PROFILE") {
            let profile = raw.parse::<Profile>().map_err(JudgeError::Config)?;
            builder = builder.profile(profile);
        }

        Ok(builder.build())
    }
}

/// Parse a numeric env var, treating absence as `None`.
fn parse_env_limit(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => Ok(parse_limit(key, &raw)?),
        Err(_) => Ok(None),
    }
}

/// Parse a limit value; `0` and `none` mean disabled.
fn parse_limit(key: &str, raw: &str) -> Result<Option<u64>> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let value: u64 = trimmed
        .parse()
        .map_err(|_| JudgeError::Config(format!("{key}: expected integer or 'none', got {raw:?}")))?;
    Ok(if value == 0 { None } else { Some(value) })
}

/// Builder for [`JudgeConfig`].
#[derive(Debug, Clone, Default)]
pub struct JudgeConfigBuilder {
    timeout: Option<Duration>,
    max_memory: Option<Option<u64>>,
    max_fuel: Option<Option<u64>>,
    interpreter_path: Option<PathBuf>,
    epoch_tick_interval: Option<Duration>,
    profile: Option<Profile>,
}

impl JudgeConfigBuilder {
    /// Set the wall-clock budget.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the memory ceiling in bytes.
    pub fn max_memory(self, bytes: u64) -> Self {
        self.set_max_memory(Some(bytes))
    }

    /// Set or disable the memory ceiling.
    pub fn set_max_memory(mut self, bytes: Option<u64>) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Set the CPU fuel budget.
    pub fn max_fuel(self, fuel: u64) -> Self {
        self.set_max_fuel(Some(fuel))
    }

    /// Set or disable the CPU fuel budget.
    pub fn set_max_fuel(mut self, fuel: Option<u64>) -> Self {
        self.max_fuel = Some(fuel);
        self
    }

    /// Set the path to the RustPython wasm interpreter.
    pub fn interpreter_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.interpreter_path = Some(path.into());
        self
    }

    /// Set the epoch tick interval for the deadline guard.
    pub fn epoch_tick_interval(mut self, interval: Duration) -> Self {
        self.epoch_tick_interval = Some(interval);
        self
    }

    /// Set the allow-list profile.
    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Build the config, filling unset fields from the defaults.
    pub fn build(self) -> JudgeConfig {
        let default = JudgeConfig::default();
        JudgeConfig {
            timeout: self.timeout.unwrap_or(default.timeout),
            max_memory: self.max_memory.unwrap_or(default.max_memory),
            max_fuel: self.max_fuel.unwrap_or(default.max_fuel),
            interpreter_path: self.interpreter_path.unwrap_or(default.interpreter_path),
            epoch_tick_interval: self
                .epoch_tick_interval
                .unwrap_or(default.epoch_tick_interval),
            profile: self.profile.unwrap_or(default.profile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JudgeConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.max_memory, Some(256 * 1024 * 1024));
        assert!(config.max_fuel.is_some());
        assert_eq!(config.profile, Profile::Relaxed);
    }

    #[test]
    fn test_builder() {
        let config = JudgeConfig::builder()
            .timeout(Duration::from_secs(5))
            .max_memory(32 * 1024 * 1024)
            .max_fuel(1_000_000)
            .profile(Profile::Minimal)
            .build();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_memory, Some(32 * 1024 * 1024));
        assert_eq!(config.max_fuel, Some(1_000_000));
        assert_eq!(config.profile, Profile::Minimal);
    }

    #[test]
    fn test_builder_can_disable_ceilings() {
        let config = JudgeConfig::builder()
            .set_max_memory(None)
            .set_max_fuel(None)
            .build();

        assert_eq!(config.max_memory, None);
        assert_eq!(config.max_fuel, None);
    }

    #[test]
    fn test_parse_limit_values() {
        assert_eq!(parse_limit("K", "1024").unwrap(), Some(1024));
        assert_eq!(parse_limit("K", "0").unwrap(), None);
        assert_eq!(parse_limit("K", "none").unwrap(), None);
        assert_eq!(parse_limit("K", " NONE ").unwrap(), None);
        assert!(parse_limit("K", "lots").is_err());
    }
}
