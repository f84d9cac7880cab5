//! SM80 f32 GEMM scenarios and the gate/build/verify sequence that runs them.

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use crate::backend::Backend;
use crate::core::element::ElementKind;
use crate::core::epilogue::LinearCombination;
use crate::core::layout::Layout;
use crate::core::math::{MathInstruction, MathOperation, OpcodeClass};
use crate::core::operation::{assemble, GemmOperationUniversal};
use crate::core::swizzle::SwizzlingFunctor;
use crate::core::tensor::TensorDescription;
use crate::core::tile::TileDescription;
use crate::doctor::{CapabilityGate, DeviceQuery, GateDecision, SM80};
use crate::error::Result;
use crate::testbed::{TestMode, Testbed};

/// Verdict of one test case. Skips are not failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Passed,
    Skipped(String),
    Failed(String),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Anything that can verify an operation end to end.
pub trait Harness {
    fn verify(&self, op: &GemmOperationUniversal, mode: TestMode) -> Result<bool>;

    fn run_and_verify(&self, op: &GemmOperationUniversal, mode: TestMode) -> bool {
        self.verify(op, mode).unwrap_or_else(|e| {
            error!(kernel = %op.procedural_name(), error = %e, "verification aborted");
            false
        })
    }
}

impl<B: Backend> Harness for Testbed<'_, B> {
    fn verify(&self, op: &GemmOperationUniversal, mode: TestMode) -> Result<bool> {
        self.run_all(op, mode)
    }
}

/// Gate, then build, then verify. `build` only runs when the gate passes.
pub fn run_case<F, H>(gate: &CapabilityGate, device: &dyn DeviceQuery, build: F, harness: &H, mode: TestMode) -> Outcome
where
    F: FnOnce() -> GemmOperationUniversal,
    H: Harness + ?Sized,
{
    if let GateDecision::Skip(reason) = gate.check(device) {
        return Outcome::Skipped(reason);
    }
    let op = build();
    match harness.verify(&op, mode) {
        Ok(true) => {
            info!(kernel = %op.procedural_name(), "passed");
            Outcome::Passed
        }
        Ok(false) => Outcome::Failed(format!("{} did not match the reference", op.procedural_name())),
        Err(e) => Outcome::Failed(e.to_string()),
    }
}

fn sm80_f32_tensor_op(
    math_operation: MathOperation,
    layout_a: Layout,
    threadblock_shape: [u32; 3],
) -> GemmOperationUniversal {
    let math_inst = MathInstruction::new(
        [16, 8, 8],
        ElementKind::F32,
        ElementKind::F32,
        ElementKind::F32,
        OpcodeClass::TensorOp,
        math_operation,
    );
    let tile_description = TileDescription::new(threadblock_shape, 3, [2, 2, 1], math_inst);

    let a = TensorDescription::new(ElementKind::F32, layout_a, 4);
    let b = TensorDescription::new(ElementKind::F32, Layout::ColumnMajor, 4);
    let c = TensorDescription::new(ElementKind::F32, Layout::RowMajor, 4);

    let epilogue_functor = LinearCombination::new(
        c.element,
        c.alignment,
        math_inst.element_accumulator,
        ElementKind::F32,
    );

    assemble(
        SM80,
        tile_description,
        a,
        b,
        c,
        epilogue_functor,
        SwizzlingFunctor::Identity1,
    )
}

/// Row-major A, operands rounded to bf16 on the way into the tensor cores.
pub fn f32t_f32n_f32t_tensor_op_bf16_f32_128x128x32() -> GemmOperationUniversal {
    sm80_f32_tensor_op(MathOperation::MultiplyAddFastBf16, Layout::RowMajor, [128, 128, 32])
}

pub fn f32n_f32n_f32t_tensor_op_f32_128x128x32() -> GemmOperationUniversal {
    sm80_f32_tensor_op(MathOperation::MultiplyAdd, Layout::ColumnMajor, [128, 128, 32])
}

/// Three-pass split-tf32 accumulation.
pub fn f32n_f32n_f32t_tensor_op_fast_accurate_f32_64x64x32() -> GemmOperationUniversal {
    sm80_f32_tensor_op(MathOperation::MultiplyAddFastF32, Layout::ColumnMajor, [64, 64, 32])
}

#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub build: fn() -> GemmOperationUniversal,
    pub mode: TestMode,
}

pub fn sm80_scenarios() -> [Scenario; 3] {
    [
        Scenario {
            name: "test_SM80_Device_Gemm_f32t_f32n_f32t_tensor_op_bf16_f32_128x128x32_64x64x32",
            build: f32t_f32n_f32t_tensor_op_bf16_f32_128x128x32,
            mode: TestMode::Universal,
        },
        Scenario {
            name: "test_SM80_Device_Gemm_f32n_f32n_f32t_tensor_op_f32_128x128x32_64x64x32",
            build: f32n_f32n_f32t_tensor_op_f32_128x128x32,
            mode: TestMode::Universal,
        },
        Scenario {
            name: "test_SM80_Device_Gemm_f32n_f32n_f32t_tensor_op_fast_accurate_f32_64x64x32_32x32x32",
            build: f32n_f32n_f32t_tensor_op_fast_accurate_f32_64x64x32,
            mode: TestMode::Universal,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use crate::doctor::FixedDevice;
    use crate::error::TestbedError;

    struct Canned {
        verdict: bool,
        calls: Cell<usize>,
    }

    impl Harness for Canned {
        fn verify(&self, _op: &GemmOperationUniversal, _mode: TestMode) -> Result<bool> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.verdict)
        }
    }

    struct Broken;

    impl Harness for Broken {
        fn verify(&self, op: &GemmOperationUniversal, _mode: TestMode) -> Result<bool> {
            Err(TestbedError::Compile {
                name: op.procedural_name(),
                reason: "no".to_string(),
            })
        }
    }

    #[test]
    fn test_skip_never_builds() {
        let harness = Canned { verdict: true, calls: Cell::new(0) };
        let outcome = run_case(
            &CapabilityGate::sm80(),
            &FixedDevice(79),
            || panic!("built on an unqualified device"),
            &harness,
            TestMode::Universal,
        );
        assert_eq!(
            outcome,
            Outcome::Skipped("Device compute capability is insufficient for SM80 tests.".to_string())
        );
        assert_eq!(harness.calls.get(), 0);
    }

    #[test]
    fn test_verdict_mapping() {
        let gate = CapabilityGate::sm80();
        let pass = Canned { verdict: true, calls: Cell::new(0) };
        let fail = Canned { verdict: false, calls: Cell::new(0) };
        let build = f32n_f32n_f32t_tensor_op_f32_128x128x32;

        assert_eq!(run_case(&gate, &FixedDevice(80), build, &pass, TestMode::Universal), Outcome::Passed);
        assert!(run_case(&gate, &FixedDevice(86), build, &fail, TestMode::Universal).is_failure());
        assert!(run_case(&gate, &FixedDevice(80), build, &Broken, TestMode::Universal).is_failure());
        assert_eq!(pass.calls.get(), 1);
        assert!(!Broken.run_and_verify(&build(), TestMode::Universal));
    }

    #[test]
    fn test_constructors_are_deterministic() {
        for scenario in sm80_scenarios() {
            assert_eq!((scenario.build)(), (scenario.build)());
        }
        let bf16 = f32t_f32n_f32t_tensor_op_bf16_f32_128x128x32();
        assert_eq!(bf16.a.layout, Layout::RowMajor);
        assert_eq!(bf16.tile_description.warp_shape().map(|w| w.m), Some(64));
        let accurate = f32n_f32n_f32t_tensor_op_fast_accurate_f32_64x64x32();
        assert_eq!(
            accurate.procedural_name(),
            "cutlass_sm80_tensorop_s16x8x8gemm_fast_f32_f32_64x64_32x3_nn_align4"
        );
    }
}
