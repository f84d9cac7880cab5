use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};
use crate::backend::CompiledKernel;
use crate::core::operation::GemmOperationUniversal;
use crate::error::Result;

/// `~/.gemm_testbed/compiled_kernels.json`
pub fn default_cache_path() -> PathBuf {
    let mut path = if let Ok(home) = std::env::var("USERPROFILE") {
        PathBuf::from(home)
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home)
    } else {
        PathBuf::from(".")
    };
    path.push(".gemm_testbed");
    path.push("compiled_kernels.json");
    path
}

#[derive(Serialize, Deserialize, Default)]
struct KernelCacheFile {
    entries: HashMap<String, CompiledKernel>,
}

/// Compiled kernels keyed by [`GemmOperationUniversal::cache_key`] and target arch.
#[derive(Debug)]
pub struct KernelCache {
    entries: RwLock<HashMap<String, CompiledKernel>>,
    file_path: Option<PathBuf>,
}

impl KernelCache {
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            file_path: None,
        }
    }

    /// Loads `path`; a missing file gives an empty cache and a corrupt one is
    /// discarded with a warning. Inserts are written back to `path`.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<KernelCacheFile>(&content) {
                Ok(file) => {
                    info!(path = %path.display(), kernels = file.entries.len(), "loaded compiled-kernel cache");
                    file.entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "discarding unreadable kernel cache");
                    HashMap::new()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "no kernel cache on disk yet");
                HashMap::new()
            }
        };
        Self {
            entries: RwLock::new(entries),
            file_path: Some(path),
        }
    }

    pub fn load_from_default() -> Self {
        Self::load_from(default_cache_path())
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<CompiledKernel> {
        self.entries.read().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&self, key: String, kernel: CompiledKernel) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, kernel);
        }
        if let Err(e) = self.save() {
            warn!(error = %e, "failed to save kernel cache");
        }
    }

    pub fn key(operation: &GemmOperationUniversal, target_arch: u32) -> String {
        format!("{}@sm{}", operation.cache_key(), target_arch)
    }

    /// Cached kernel for `operation` on `target_arch`, compiling and inserting
    /// it on a miss. A hit recorded for a different operation is recompiled.
    pub fn get_or_compile<F>(
        &self,
        operation: &GemmOperationUniversal,
        target_arch: u32,
        compile: F,
    ) -> Result<CompiledKernel>
    where
        F: FnOnce(&GemmOperationUniversal) -> Result<CompiledKernel>,
    {
        let key = Self::key(operation, target_arch);
        if let Some(kernel) = self.get(&key) {
            if kernel.operation == *operation && kernel.target_arch == target_arch {
                debug!(kernel = %kernel.name, "kernel cache hit");
                return Ok(kernel);
            }
            warn!(key = %key, "stale kernel cache entry, recompiling");
        }
        let kernel = compile(operation)?;
        self.insert(key, kernel.clone());
        Ok(kernel)
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        let file = KernelCacheFile {
            entries: self.entries.read().map(|e| e.clone()).unwrap_or_default(),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}
