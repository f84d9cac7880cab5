use serde::{Deserialize, Serialize};
use crate::core::epilogue::EpilogueFunctor;
use crate::core::swizzle::SwizzlingFunctor;
use crate::core::tensor::TensorDescription;
use crate::core::tile::TileDescription;

/// Everything needed to build one universal GEMM kernel variant.
///
/// Built once per test case and handed to the harness. Field consistency
/// (operand elements vs. the math instruction, tile divisibility) is left to
/// the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GemmOperationUniversal {
    pub arch: u32,
    pub tile_description: TileDescription,
    pub a: TensorDescription,
    pub b: TensorDescription,
    pub c: TensorDescription,
    pub epilogue_functor: EpilogueFunctor,
    pub swizzling_functor: SwizzlingFunctor,
}

/// Pure aggregation of the configuration pieces into an operation.
pub fn assemble(
    arch: u32,
    tile_description: TileDescription,
    a: TensorDescription,
    b: TensorDescription,
    c: TensorDescription,
    epilogue_functor: impl Into<EpilogueFunctor>,
    swizzling_functor: SwizzlingFunctor,
) -> GemmOperationUniversal {
    GemmOperationUniversal {
        arch,
        tile_description,
        a,
        b,
        c,
        epilogue_functor: epilogue_functor.into(),
        swizzling_functor,
    }
}

impl GemmOperationUniversal {
    /// e.g. `cutlass_sm80_tensorop_s16x8x8gemm_fast_bf16_f32_128x128_32x3_tn_align4`
    pub fn procedural_name(&self) -> String {
        let math = &self.tile_description.math_instruction;
        let mut name = format!(
            "cutlass_sm{}_{}_{}gemm",
            self.arch,
            math.opcode_class.short_name(),
            math.procedural_name()
        );
        let op = math.math_operation.short_name();
        if !op.is_empty() {
            name.push('_');
            name.push_str(op);
        }
        name.push_str(&format!(
            "_{}_{}_{}{}_align{}",
            self.a.element.short_name(),
            self.tile_description.procedural_name(),
            self.a.layout.short_name(),
            self.b.layout.short_name(),
            self.a.alignment
        ));
        name
    }

    /// Stable key covering every field; identical operations share a key.
    pub fn cache_key(&self) -> String {
        let td = &self.tile_description;
        let math = &td.math_instruction;
        let operand = |t: &TensorDescription| {
            format!("{}{}{}", t.element.short_name(), t.layout.short_name(), t.alignment)
        };
        format!(
            "{}|warps{}|inst{}|math_{}_{}_{}|{}_{}_{}|{}x{}|{}",
            self.procedural_name(),
            td.warp_count,
            math.instruction_shape,
            math.element_a.short_name(),
            math.element_b.short_name(),
            math.element_accumulator.short_name(),
            operand(&self.a),
            operand(&self.b),
            operand(&self.c),
            self.epilogue_functor.procedural_name(),
            self.epilogue_functor.alignment(),
            self.swizzling_functor.short_name(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::element::ElementKind;
    use crate::core::epilogue::LinearCombination;
    use crate::core::layout::Layout;
    use crate::core::math::{MathInstruction, MathOperation, OpcodeClass};

    fn operation(op: MathOperation, a_layout: Layout) -> GemmOperationUniversal {
        let math = MathInstruction::new(
            [16, 8, 8],
            ElementKind::F32,
            ElementKind::F32,
            ElementKind::F32,
            OpcodeClass::TensorOp,
            op,
        );
        let tile = TileDescription::new([128, 128, 32], 3, [2, 2, 1], math);
        let a = TensorDescription::new(ElementKind::F32, a_layout, 4);
        let b = TensorDescription::new(ElementKind::F32, Layout::ColumnMajor, 4);
        let c = TensorDescription::new(ElementKind::F32, Layout::RowMajor, 4);
        let epilogue = LinearCombination::new(c.element, c.alignment, math.element_accumulator, ElementKind::F32);
        assemble(80, tile, a, b, c, epilogue, SwizzlingFunctor::Identity1)
    }

    #[test]
    fn test_procedural_name() {
        let op = operation(MathOperation::MultiplyAddFastBf16, Layout::RowMajor);
        assert_eq!(
            op.procedural_name(),
            "cutlass_sm80_tensorop_s16x8x8gemm_fast_bf16_f32_128x128_32x3_tn_align4"
        );
        let op = operation(MathOperation::MultiplyAdd, Layout::ColumnMajor);
        assert_eq!(
            op.procedural_name(),
            "cutlass_sm80_tensorop_s16x8x8gemm_f32_128x128_32x3_nn_align4"
        );
    }

    #[test]
    fn test_value_equality_and_keys() {
        let x = operation(MathOperation::MultiplyAddFastF32, Layout::ColumnMajor);
        let y = operation(MathOperation::MultiplyAddFastF32, Layout::ColumnMajor);
        assert_eq!(x, y);
        assert_eq!(x.cache_key(), y.cache_key());

        let mut z = y;
        z.swizzling_functor = SwizzlingFunctor::Identity4;
        assert_ne!(x, z);
        assert_ne!(x.cache_key(), z.cache_key());
    }

    #[test]
    fn test_simt_keys_differ_by_instruction_shape() {
        let simt = |shape: [u32; 3]| {
            let math = MathInstruction::new(
                shape,
                ElementKind::F32,
                ElementKind::F32,
                ElementKind::F32,
                OpcodeClass::Simt,
                MathOperation::MultiplyAdd,
            );
            let tile = TileDescription::new([128, 128, 8], 4, [2, 4, 1], math);
            let t = TensorDescription::new(ElementKind::F32, Layout::RowMajor, 1);
            let epilogue = LinearCombination::new(t.element, t.alignment, ElementKind::F32, ElementKind::F32);
            assemble(80, tile, t, t, t, epilogue, SwizzlingFunctor::Identity1)
        };
        let x = simt([1, 1, 1]);
        let y = simt([2, 2, 1]);
        assert_ne!(x, y);
        assert_eq!(x.procedural_name(), y.procedural_name());
        assert_ne!(x.cache_key(), y.cache_key());
    }

    #[test]
    fn test_serde_round_trip() {
        let op = operation(MathOperation::MultiplyAdd, Layout::RowMajor);
        let json = serde_json::to_string(&op).unwrap();
        let back: GemmOperationUniversal = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
    }
}
