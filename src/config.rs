use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use crate::error::{Result, TestbedError};

pub const ENV_CONFIG: &str = "GEMM_TESTBED_CONFIG";
pub const ENV_POOL_INIT: &str = "GEMM_TESTBED_POOL_INIT";
pub const ENV_POOL_MAX: &str = "GEMM_TESTBED_POOL_MAX";
pub const ENV_CACHE: &str = "GEMM_TESTBED_CACHE";
pub const ENV_PERSIST_CACHE: &str = "GEMM_TESTBED_PERSIST_CACHE";
pub const ENV_DEVICE_CC: &str = "GEMM_TESTBED_DEVICE_CC";
pub const ENV_REQUIRED_CC: &str = "GEMM_TESTBED_REQUIRED_CC";
pub const ENV_SEED: &str = "GEMM_TESTBED_SEED";

/// Process-wide settings read once at bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TestbedConfig {
    pub pool_init_bytes: usize,
    pub pool_max_bytes: usize,
    /// Compiled-kernel cache file; `None` uses the default location.
    pub cache_path: Option<PathBuf>,
    /// Write compiled kernels back to the cache file.
    pub persist_cache: bool,
    /// Compute capability reported by the emulated device.
    pub device_capability: u32,
    /// Minimum compute capability the SM80 scenarios need.
    pub required_capability: u32,
    pub seed: u64,
}

impl Default for TestbedConfig {
    fn default() -> Self {
        Self {
            pool_init_bytes: 1 << 24,
            pool_max_bytes: 1 << 24,
            cache_path: None,
            persist_cache: true,
            device_capability: 80,
            required_capability: 80,
            seed: 2080,
        }
    }
}

impl TestbedConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Defaults, then the JSON file named by `GEMM_TESTBED_CONFIG`, then
    /// individual `GEMM_TESTBED_*` variables.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(ENV_CONFIG) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Some(v) = env_parse(ENV_POOL_INIT)? {
            config.pool_init_bytes = v;
        }
        if let Some(v) = env_parse(ENV_POOL_MAX)? {
            config.pool_max_bytes = v;
        }
        if let Ok(path) = std::env::var(ENV_CACHE) {
            config.cache_path = Some(PathBuf::from(path));
        }
        if let Some(v) = env_parse(ENV_PERSIST_CACHE)? {
            config.persist_cache = v;
        }
        if let Some(v) = env_parse(ENV_DEVICE_CC)? {
            config.device_capability = v;
        }
        if let Some(v) = env_parse(ENV_REQUIRED_CC)? {
            config.required_capability = v;
        }
        if let Some(v) = env_parse(ENV_SEED)? {
            config.seed = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_init_bytes > self.pool_max_bytes {
            return Err(TestbedError::Config(format!(
                "pool init size {} exceeds max size {}",
                self.pool_init_bytes, self.pool_max_bytes
            )));
        }
        Ok(())
    }

    /// In-memory cache, nothing written to disk.
    pub fn ephemeral() -> Self {
        Self {
            persist_cache: false,
            ..Self::default()
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| TestbedError::Config(format!("{}={} is not a valid value", key, raw))),
        Err(_) => Ok(None),
    }
}
