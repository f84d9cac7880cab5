//! Verification harness: runs an operation over a problem battery and checks
//! every result against the host reference.

pub mod compare;
pub mod problem;

use std::fmt;
use std::str::FromStr;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use crate::backend::{Backend, CompiledKernel, EmulatedBackend, GemmArguments};
use crate::config::TestbedConfig;
use crate::core::element::ElementKind;
use crate::core::operation::GemmOperationUniversal;
use crate::doctor::EmulatedDevice;
use crate::error::{Result, TestbedError};
use crate::kernels::reference_gemm;
use crate::runtime::{bootstrap, Runtime};

pub use compare::{compare, ComparisonReport, Tolerance};
pub use problem::{battery_alignment, init_scope, problem_battery, ProblemCase};

/// Which problem battery to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestMode {
    Universal,
    Multistage,
}

impl FromStr for TestMode {
    type Err = TestbedError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "universal" => Ok(TestMode::Universal),
            "multistage" => Ok(TestMode::Multistage),
            other => Err(TestbedError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestMode::Universal => write!(f, "universal"),
            TestMode::Multistage => write!(f, "multistage"),
        }
    }
}

/// Compiles through the runtime's kernel cache, stages tensors in its pool
/// and launches on `backend`.
pub struct Testbed<'r, B: Backend> {
    runtime: &'r Runtime,
    backend: B,
}

impl<'r, B: Backend> Testbed<'r, B> {
    pub fn new(runtime: &'r Runtime, backend: B) -> Self {
        Self { runtime, backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn compile(&self, op: &GemmOperationUniversal) -> Result<CompiledKernel> {
        let target = self.backend.device().compute_capability();
        self.runtime
            .cache
            .get_or_compile(op, target, |op| self.backend.compile(op))
    }

    /// `Ok(true)` when every problem of the battery matches the reference.
    /// Compile and launch errors are returned, not folded into `false`.
    pub fn run_all(&self, op: &GemmOperationUniversal, mode: TestMode) -> Result<bool> {
        let kernel = self.compile(op)?;
        let cases = problem_battery(op, mode);
        info!(kernel = %kernel.name, %mode, cases = cases.len(), "verifying");

        for (index, case) in cases.iter().enumerate() {
            let report = self.run(&kernel, case, index as u64)?;
            if !report.passed() {
                warn!(
                    kernel = %kernel.name,
                    problem = %case.problem,
                    mode = ?case.mode,
                    batch = case.batch_count,
                    mismatches = report.mismatches,
                    first = ?report.first_mismatch,
                    "result differs from reference"
                );
                return Ok(false);
            }
            debug!(problem = %case.problem, mode = ?case.mode, batch = case.batch_count, "case passed");
        }
        Ok(true)
    }

    /// Launches one case with inputs seeded from the configured seed and `index`.
    pub fn run(&self, kernel: &CompiledKernel, case: &ProblemCase, index: u64) -> Result<ComparisonReport> {
        let op = &kernel.operation;
        let p = case.problem;
        let pool = &self.runtime.pool;
        let batches = GemmArguments::tensor_batches(case.mode, case.batch_count);

        let mut rng = StdRng::seed_from_u64(self.runtime.config.seed.wrapping_add(index));
        let mut a = pool.allocate(batches * p.m * p.k)?;
        let mut b = pool.allocate(batches * p.k * p.n)?;
        let mut c = pool.allocate(batches * p.m * p.n)?;
        let mut d = pool.allocate(batches * p.m * p.n)?;
        let mut workspace = pool.allocate(GemmArguments::workspace_len(case.mode, p, case.batch_count))?;
        fill_uniform(&mut rng, &mut a, op.a.element);
        fill_uniform(&mut rng, &mut b, op.b.element);
        fill_uniform(&mut rng, &mut c, op.c.element);

        self.backend.launch(
            kernel,
            GemmArguments {
                mode: case.mode,
                problem: p,
                batch_count: case.batch_count,
                alpha: case.alpha,
                beta: case.beta,
                a: &a,
                b: &b,
                c: &c,
                d: &mut d,
                workspace: &mut workspace,
            },
        )?;

        let expected = reference_gemm(op, p, batches, case.alpha, case.beta, &a, &b, &c);
        Ok(compare(&d, &expected, Tolerance::for_operation(op)))
    }
}

/// Integers drawn uniformly from `[-scope, scope]`, exact in every element kind.
fn fill_uniform(rng: &mut StdRng, buf: &mut [f32], element: ElementKind) {
    let scope = init_scope(element);
    for v in buf.iter_mut() {
        *v = element.round(rng.gen_range(-scope..=scope) as f32);
    }
}

/// Bootstraps the process runtime from the environment and verifies `op`
/// on the emulated device. Any error is logged and reported as `false`.
pub fn run_and_verify(op: &GemmOperationUniversal, mode: &str) -> bool {
    let verdict = (|| -> Result<bool> {
        let mode: TestMode = mode.parse()?;
        let runtime = bootstrap(&TestbedConfig::from_env()?)?;
        let backend = EmulatedBackend::new(EmulatedDevice::new(runtime.config.device_capability));
        Testbed::new(runtime, backend).run_all(op, mode)
    })();
    match verdict {
        Ok(passed) => passed,
        Err(e) => {
            error!(kernel = %op.procedural_name(), error = %e, "verification aborted");
            false
        }
    }
}

pub use self::run_and_verify as test_all_gemm;
