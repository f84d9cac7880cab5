//! # gemm-testbed: declarative GEMM kernels, verified
//!
//! Describes a GEMM kernel variant as plain values, assembles them into an
//! operation, and verifies the compiled kernel against a host reference over
//! a battery of problem sizes.
//!
//! ## Core Modules
//!
//! - **[`core`]**: Kernel descriptors (math instruction, tiling, tensors, epilogue, swizzle) and the assembler.
//! - **[`doctor`]**: Device queries and the compute-capability gate.
//! - **[`runtime`]**: Process-wide memory pool and compiled-kernel cache.
//! - **[`backend`]**: Compiler/launcher boundary and the emulated SM80 device.
//! - **[`testbed`]**: Problem battery, reference comparison, `run_and_verify`.
//! - **[`scenarios`]**: The SM80 f32 scenarios and their skip/pass/fail outcome.
//!
//! ## Features
//!
//! - `cuda`: Probe a physical device's compute capability through `cudarc`.

pub mod backend;
pub mod config;
pub mod core;
pub mod doctor;
pub mod error;
pub mod kernels;
pub mod runtime;
pub mod scenarios;
pub mod testbed;

pub use crate::backend::{Backend, CompiledKernel, EmulatedBackend, GemmArguments};
pub use crate::config::TestbedConfig;
pub use crate::core::{assemble, GemmOperationUniversal};
pub use crate::error::{Result, TestbedError};
pub use crate::runtime::{bootstrap, Runtime};
pub use crate::scenarios::{run_case, Harness, Outcome};
pub use crate::testbed::{run_and_verify, test_all_gemm, TestMode, Testbed};
