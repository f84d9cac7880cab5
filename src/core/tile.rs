use serde::{Deserialize, Serialize};
use crate::core::math::MathInstruction;
use crate::core::shape::GemmShape;

pub const WARP_SIZE: u32 = 32;

/// Threadblock tiling and software pipelining of one kernel variant.
///
/// `threadblock_shape` is expected to be tileable by
/// `warp_count x instruction_shape`; the compiler enforces it, not this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileDescription {
    pub threadblock_shape: GemmShape,
    pub stages: u32,
    pub warp_count: GemmShape,
    pub math_instruction: MathInstruction,
}

impl TileDescription {
    pub fn new(
        threadblock_shape: impl Into<GemmShape>,
        stages: u32,
        warp_count: impl Into<GemmShape>,
        math_instruction: MathInstruction,
    ) -> Self {
        Self {
            threadblock_shape: threadblock_shape.into(),
            stages,
            warp_count: warp_count.into(),
            math_instruction,
        }
    }

    /// Per-warp tile, `None` when a warp count is zero.
    pub fn warp_shape(&self) -> Option<GemmShape> {
        self.threadblock_shape.checked_div(self.warp_count)
    }

    pub fn threads_per_block(&self) -> u64 {
        self.warp_count.product() * WARP_SIZE as u64
    }

    /// `128x128_32x3`: threadblock M x N, then K x stages.
    pub fn procedural_name(&self) -> String {
        let tb = self.threadblock_shape;
        format!("{}x{}_{}x{}", tb.m, tb.n, tb.k, self.stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::element::ElementKind;
    use crate::core::math::{MathOperation, OpcodeClass};

    fn tile(tb: [u32; 3]) -> TileDescription {
        let math = MathInstruction::new(
            [16, 8, 8],
            ElementKind::F32,
            ElementKind::F32,
            ElementKind::F32,
            OpcodeClass::TensorOp,
            MathOperation::MultiplyAdd,
        );
        TileDescription::new(tb, 3, [2, 2, 1], math)
    }

    #[test]
    fn test_warp_shape() {
        assert_eq!(tile([128, 128, 32]).warp_shape(), Some(GemmShape::new(64, 64, 32)));
        assert_eq!(tile([64, 64, 32]).warp_shape(), Some(GemmShape::new(32, 32, 32)));
        assert_eq!(tile([128, 128, 32]).threads_per_block(), 128);
    }

    #[test]
    fn test_zero_warp_count_is_not_rejected_here() {
        let mut t = tile([128, 128, 32]);
        t.warp_count = GemmShape::new(0, 2, 1);
        assert_eq!(t.warp_shape(), None);
        assert_eq!(t.procedural_name(), "128x128_32x3");
    }
}
