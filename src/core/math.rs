use serde::{Deserialize, Serialize};
use crate::core::element::ElementKind;
use crate::core::shape::GemmShape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpcodeClass {
    Simt,
    TensorOp,
}

impl OpcodeClass {
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Simt => "simt",
            Self::TensorOp => "tensorop",
        }
    }
}

/// Accumulation strategy of the hardware math op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MathOperation {
    MultiplyAdd,
    MultiplyAddSaturate,
    /// f32 operands rounded to bf16 before the multiply.
    MultiplyAddFastBf16,
    /// f32 operands rounded to f16 before the multiply.
    MultiplyAddFastF16,
    /// f32 operands split into two tf32 halves, three products per step.
    MultiplyAddFastF32,
}

impl MathOperation {
    pub fn short_name(self) -> &'static str {
        match self {
            Self::MultiplyAdd => "",
            Self::MultiplyAddSaturate => "sat",
            Self::MultiplyAddFastBf16 => "fast_bf16",
            Self::MultiplyAddFastF16 => "fast_f16",
            Self::MultiplyAddFastF32 => "fast_f32",
        }
    }
}

/// How operands are converted on their way into the math op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperandPrecision {
    Native,
    Rounded(ElementKind),
    SplitTf32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MathInstruction {
    pub instruction_shape: GemmShape,
    pub element_a: ElementKind,
    pub element_b: ElementKind,
    pub element_accumulator: ElementKind,
    pub opcode_class: OpcodeClass,
    pub math_operation: MathOperation,
}

impl MathInstruction {
    pub fn new(
        instruction_shape: impl Into<GemmShape>,
        element_a: ElementKind,
        element_b: ElementKind,
        element_accumulator: ElementKind,
        opcode_class: OpcodeClass,
        math_operation: MathOperation,
    ) -> Self {
        Self {
            instruction_shape: instruction_shape.into(),
            element_a,
            element_b,
            element_accumulator,
            opcode_class,
            math_operation,
        }
    }

    pub fn operand_precision(&self) -> OperandPrecision {
        if self.opcode_class == OpcodeClass::Simt {
            return OperandPrecision::Native;
        }
        match self.math_operation {
            MathOperation::MultiplyAddFastBf16 => OperandPrecision::Rounded(ElementKind::BF16),
            MathOperation::MultiplyAddFastF16 => OperandPrecision::Rounded(ElementKind::F16),
            MathOperation::MultiplyAddFastF32 => OperandPrecision::SplitTf32,
            // f32 tensor cores consume tf32
            MathOperation::MultiplyAdd | MathOperation::MultiplyAddSaturate => {
                if self.element_a == ElementKind::F32 {
                    OperandPrecision::Rounded(ElementKind::TF32)
                } else {
                    OperandPrecision::Native
                }
            }
        }
    }

    /// Lowest SM architecture that has this math op.
    pub fn minimum_arch(&self) -> u32 {
        match self.opcode_class {
            OpcodeClass::Simt => 50,
            OpcodeClass::TensorOp => match self.operand_precision() {
                OperandPrecision::Native => 70,
                _ => 80,
            },
        }
    }

    /// `s16x8x8` for tensor ops (accumulator prefix + shape), empty for SIMT.
    pub fn procedural_name(&self) -> String {
        let prefix = match self.element_accumulator {
            ElementKind::F16 => "h",
            ElementKind::F64 => "d",
            ElementKind::S32 | ElementKind::S8 => "i",
            _ => "s",
        };
        match self.opcode_class {
            OpcodeClass::TensorOp => format!("{}{}", prefix, self.instruction_shape),
            OpcodeClass::Simt => prefix.to_string(),
        }
    }
}
