use crate::core::element::ElementKind;
use crate::core::math::OpcodeClass;
use crate::core::operation::GemmOperationUniversal;
use crate::core::problem::{GemmMode, ProblemSize};
use crate::testbed::TestMode;

/// One launch of the battery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProblemCase {
    pub mode: GemmMode,
    pub problem: ProblemSize,
    /// Batches, or split-k slices for [`GemmMode::GemmSplitKParallel`].
    pub batch_count: usize,
    pub alpha: f32,
    pub beta: f32,
}

/// Problem alignment the battery sizes are built around: 1 for SIMT,
/// otherwise one 128-bit access of the narrower operand.
pub fn battery_alignment(op: &GemmOperationUniversal) -> usize {
    let math = &op.tile_description.math_instruction;
    match math.opcode_class {
        OpcodeClass::Simt => 1,
        OpcodeClass::TensorOp => {
            let bits = op.a.element.size_bits().min(op.b.element.size_bits()).max(1);
            (128 / bits) as usize
        }
    }
}

/// Split-k on the device is only exercised before SM90.
fn universal_modes(arch: u32) -> Vec<GemmMode> {
    if arch < 90 {
        vec![GemmMode::Gemm, GemmMode::GemmSplitKParallel]
    } else {
        vec![GemmMode::Gemm]
    }
}

/// Every problem `run_and_verify` launches for `op` in `mode`, in order.
pub fn problem_battery(op: &GemmOperationUniversal, mode: TestMode) -> Vec<ProblemCase> {
    let align = battery_alignment(op);
    let td = &op.tile_description;
    let tb_k = td.threadblock_shape.k as usize;
    let stages = td.stages as usize;
    let mut cases = Vec::new();

    match mode {
        TestMode::Universal => {
            let ms = [align, 512 - 3 * align];
            let ns = [align, 512 - 2 * align];
            let ks = [align, tb_k * stages - align, tb_k * stages * 3 - align];
            for gemm_mode in universal_modes(op.arch) {
                for batch_count in [1usize, 2, 3, 5, 7] {
                    for &m in &ms {
                        for &n in &ns {
                            for &k in &ks {
                                if k / batch_count < 2 * tb_k {
                                    continue;
                                }
                                let mode = match gemm_mode {
                                    GemmMode::Gemm if batch_count > 1 => GemmMode::Batched,
                                    other => other,
                                };
                                cases.push(ProblemCase {
                                    mode,
                                    problem: ProblemSize::new(m, n, k),
                                    batch_count,
                                    alpha: 1.0,
                                    beta: 2.0,
                                });
                            }
                        }
                    }
                }
            }
            // Empty reduction: D must come out as beta * C.
            cases.push(ProblemCase {
                mode: GemmMode::Gemm,
                problem: ProblemSize::new(ms[1], ns[1], 0),
                batch_count: 1,
                alpha: 1.0,
                beta: 2.0,
            });
        }
        TestMode::Multistage => {
            let inst_k = td.math_instruction.instruction_shape.k as usize;
            for m in [16usize, 528] {
                for n in [16usize, 528] {
                    for k in [tb_k, tb_k * stages + inst_k] {
                        cases.push(ProblemCase {
                            mode: GemmMode::Gemm,
                            problem: ProblemSize::new(m, n, k),
                            batch_count: 1,
                            alpha: 1.0,
                            beta: 0.0,
                        });
                    }
                }
            }
        }
    }
    cases
}

/// Half-width of the integer range inputs are drawn from.
pub fn init_scope(element: ElementKind) -> i32 {
    match element.size_bits() {
        0..=8 => 1,
        16 => 4,
        _ => 8,
    }
}
