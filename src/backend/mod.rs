//! Kernel compiler and launcher boundary.
//!
//! A [`Backend`] turns an operation descriptor into a [`CompiledKernel`] and
//! launches it on host-visible buffers. [`EmulatedBackend`] models an SM80
//! device on the CPU.

pub mod emulated;

use serde::{Deserialize, Serialize};
use crate::core::math::OperandPrecision;
use crate::core::operation::GemmOperationUniversal;
use crate::core::problem::{GemmMode, ProblemSize};
use crate::core::shape::GemmShape;
use crate::doctor::DeviceQuery;
use crate::error::Result;

pub use emulated::EmulatedBackend;

/// Result of compiling one operation for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledKernel {
    pub name: String,
    pub operation: GemmOperationUniversal,
    pub target_arch: u32,
    pub warp_shape: GemmShape,
    pub threads_per_block: u32,
    pub shared_memory_bytes: usize,
    pub operand_precision: OperandPrecision,
}

/// Launch arguments. Every tensor is densely packed in its operand's layout,
/// with batches back to back.
#[derive(Debug)]
pub struct GemmArguments<'a> {
    pub mode: GemmMode,
    pub problem: ProblemSize,
    /// Batches for [`GemmMode::Batched`], split-k slices for
    /// [`GemmMode::GemmSplitKParallel`], ignored for [`GemmMode::Gemm`].
    pub batch_count: usize,
    pub alpha: f32,
    pub beta: f32,
    pub a: &'a [f32],
    pub b: &'a [f32],
    pub c: &'a [f32],
    pub d: &'a mut [f32],
    /// Split-k partial sums; empty for the other modes.
    pub workspace: &'a mut [f32],
}

impl GemmArguments<'_> {
    /// Number of batches stored in A, B, C and D.
    pub fn tensor_batches(mode: GemmMode, batch_count: usize) -> usize {
        match mode {
            GemmMode::Batched => batch_count,
            GemmMode::Gemm | GemmMode::GemmSplitKParallel => 1,
        }
    }

    pub fn workspace_len(mode: GemmMode, problem: ProblemSize, batch_count: usize) -> usize {
        match mode {
            GemmMode::GemmSplitKParallel => batch_count * problem.m * problem.n,
            GemmMode::Gemm | GemmMode::Batched => 0,
        }
    }
}

pub trait Backend: Send + Sync {
    fn device(&self) -> &dyn DeviceQuery;

    /// Builds a kernel for `operation`, rejecting configurations the target cannot run.
    fn compile(&self, operation: &GemmOperationUniversal) -> Result<CompiledKernel>;

    fn launch(&self, kernel: &CompiledKernel, args: GemmArguments<'_>) -> Result<()>;
}
