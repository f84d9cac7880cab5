use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;
use crate::error::{Result, TestbedError};

/// Byte-budgeted pool backing every tensor the testbed allocates.
///
/// Starts with `init_bytes` reserved and grows on demand up to `max_bytes`;
/// allocations that would exceed `max_bytes` fail.
#[derive(Debug)]
pub struct MemoryPool {
    init_bytes: usize,
    max_bytes: usize,
    state: Arc<PoolState>,
}

#[derive(Debug, Default)]
struct PoolState {
    allocated: AtomicUsize,
    reserved: AtomicUsize,
    high_water: AtomicUsize,
}

impl MemoryPool {
    pub fn new(init_bytes: usize, max_bytes: usize) -> Self {
        let state = PoolState::default();
        state.reserved.store(init_bytes.min(max_bytes), Ordering::Relaxed);
        debug!(init_bytes, max_bytes, "memory pool created");
        Self {
            init_bytes,
            max_bytes,
            state: Arc::new(state),
        }
    }

    /// Zero-initialised buffer of `len` f32 elements.
    pub fn allocate(&self, len: usize) -> Result<PoolBuffer> {
        let bytes = len
            .checked_mul(std::mem::size_of::<f32>())
            .ok_or_else(|| TestbedError::InvalidArguments(format!("allocation of {} elements overflows", len)))?;

        let mut current = self.state.allocated.load(Ordering::Relaxed);
        loop {
            let next = current.checked_add(bytes).filter(|&n| n <= self.max_bytes).ok_or(
                TestbedError::PoolExhausted {
                    requested: bytes,
                    allocated: current,
                    max: self.max_bytes,
                },
            )?;
            match self.state.allocated.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.grow_to(next);
                    self.state.high_water.fetch_max(next, Ordering::Relaxed);
                    break;
                }
                Err(actual) => current = actual,
            }
        }

        Ok(PoolBuffer {
            data: vec![0.0; len],
            bytes,
            state: Arc::clone(&self.state),
        })
    }

    fn grow_to(&self, needed: usize) {
        let reserved = self.state.reserved.load(Ordering::Relaxed);
        if needed > reserved {
            // Double until the request fits, never past max.
            let mut target = reserved.max(1);
            while target < needed {
                target = target.saturating_mul(2);
            }
            let target = target.min(self.max_bytes);
            if self.state.reserved.fetch_max(target, Ordering::Relaxed) < target {
                debug!(from = reserved, to = target, "memory pool grown");
            }
        }
    }

    pub fn allocated_bytes(&self) -> usize {
        self.state.allocated.load(Ordering::Acquire)
    }

    pub fn capacity_bytes(&self) -> usize {
        self.state.reserved.load(Ordering::Relaxed)
    }

    pub fn high_water_bytes(&self) -> usize {
        self.state.high_water.load(Ordering::Relaxed)
    }

    pub fn init_bytes(&self) -> usize {
        self.init_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

/// Pool-accounted f32 storage; returns its bytes to the pool on drop.
#[derive(Debug)]
pub struct PoolBuffer {
    data: Vec<f32>,
    bytes: usize,
    state: Arc<PoolState>,
}

impl PoolBuffer {
    pub fn size_bytes(&self) -> usize {
        self.bytes
    }
}

impl Deref for PoolBuffer {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.data
    }
}

impl DerefMut for PoolBuffer {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

impl Drop for PoolBuffer {
    fn drop(&mut self) {
        self.state.allocated.fetch_sub(self.bytes, Ordering::AcqRel);
    }
}
