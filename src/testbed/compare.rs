use serde::Serialize;
use crate::core::math::MathOperation;
use crate::core::operation::GemmOperationUniversal;

/// Acceptance rule for a device result against the host reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Tolerance {
    Exact,
    /// `|d - r| <= tol * max(|r|, 1)`
    Relative(f32),
}

impl Tolerance {
    pub fn for_operation(op: &GemmOperationUniversal) -> Self {
        if op.c.element.is_integer() {
            return Tolerance::Exact;
        }
        match op.tile_description.math_instruction.math_operation {
            MathOperation::MultiplyAdd | MathOperation::MultiplyAddSaturate => Tolerance::Exact,
            MathOperation::MultiplyAddFastBf16 | MathOperation::MultiplyAddFastF16 => Tolerance::Relative(1e-2),
            MathOperation::MultiplyAddFastF32 => Tolerance::Relative(1e-5),
        }
    }

    pub fn accepts(&self, got: f32, expected: f32) -> bool {
        match *self {
            Tolerance::Exact => got == expected || (got.is_nan() && expected.is_nan()),
            Tolerance::Relative(tol) => (got - expected).abs() <= tol * expected.abs().max(1.0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub elements: usize,
    pub mismatches: usize,
    pub max_abs_error: f32,
    /// `(index, got, expected)` of the first rejected element.
    pub first_mismatch: Option<(usize, f32, f32)>,
}

impl ComparisonReport {
    pub fn passed(&self) -> bool {
        self.mismatches == 0
    }
}

pub fn compare(got: &[f32], expected: &[f32], tolerance: Tolerance) -> ComparisonReport {
    let mut report = ComparisonReport {
        elements: expected.len(),
        mismatches: got.len().abs_diff(expected.len()),
        max_abs_error: 0.0,
        first_mismatch: None,
    };
    for (i, (&g, &e)) in got.iter().zip(expected).enumerate() {
        let err = (g - e).abs();
        if err > report.max_abs_error {
            report.max_abs_error = err;
        }
        if !tolerance.accepts(g, e) {
            report.mismatches += 1;
            report.first_mismatch.get_or_insert((i, g, e));
        }
    }
    report
}
