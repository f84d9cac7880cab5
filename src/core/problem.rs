use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GemmMode {
    Gemm,
    /// Independent problems laid out back to back in each tensor.
    Batched,
    /// K split into slices whose partial sums are reduced in a second pass.
    GemmSplitKParallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProblemSize {
    pub m: usize,
    pub n: usize,
    pub k: usize,
}

impl ProblemSize {
    pub const fn new(m: usize, n: usize, k: usize) -> Self {
        Self { m, n, k }
    }

    pub fn mnk(&self) -> u64 {
        self.m as u64 * self.n as u64 * self.k as u64
    }
}

impl fmt::Display for ProblemSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.m, self.n, self.k)
    }
}
