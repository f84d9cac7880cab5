//! Process-wide runtime: the memory pool and the compiled-kernel cache.
//!
//! [`bootstrap`] builds both exactly once; every test case afterwards reads
//! the same [`Runtime`].

pub mod cache;
pub mod pool;

use std::sync::{Mutex, OnceLock};
use tracing::{debug, info};
use crate::config::TestbedConfig;
use crate::error::Result;

pub use cache::{default_cache_path, KernelCache};
pub use pool::{MemoryPool, PoolBuffer};

#[derive(Debug)]
pub struct Runtime {
    pub config: TestbedConfig,
    pub pool: MemoryPool,
    pub cache: KernelCache,
}

static RUNTIME: OnceLock<Runtime> = OnceLock::new();
static INIT: Mutex<()> = Mutex::new(());

impl Runtime {
    /// Standalone runtime, not registered globally.
    pub fn new(config: TestbedConfig) -> Result<Self> {
        config.validate()?;
        let pool = MemoryPool::new(config.pool_init_bytes, config.pool_max_bytes);
        let cache = if config.persist_cache {
            match &config.cache_path {
                Some(path) => KernelCache::load_from(path),
                None => KernelCache::load_from_default(),
            }
        } else {
            KernelCache::in_memory()
        };
        Ok(Self { config, pool, cache })
    }

    pub fn global() -> Option<&'static Runtime> {
        RUNTIME.get()
    }
}

/// Allocates the pool and loads the kernel cache once per process. Later
/// calls, from any thread, return the runtime built by the first one and
/// ignore their `config`.
pub fn bootstrap(config: &TestbedConfig) -> Result<&'static Runtime> {
    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime);
    }
    let _guard = INIT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(runtime) = RUNTIME.get() {
        debug!("runtime already bootstrapped");
        return Ok(runtime);
    }
    let runtime = Runtime::new(config.clone())?;
    info!(
        pool_init = runtime.pool.init_bytes(),
        pool_max = runtime.pool.max_bytes(),
        cached_kernels = runtime.cache.len(),
        "runtime bootstrapped"
    );
    Ok(RUNTIME.get_or_init(|| runtime))
}
