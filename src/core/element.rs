use half::{bf16, f16};
use serde::{Deserialize, Serialize};

/// Numeric element kinds a kernel operand, accumulator or epilogue can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    F16,
    BF16,
    TF32,
    F32,
    F64,
    S8,
    S32,
}

impl ElementKind {
    pub fn size_bits(self) -> u32 {
        match self {
            Self::S8 => 8,
            Self::F16 | Self::BF16 => 16,
            Self::TF32 | Self::F32 | Self::S32 => 32,
            Self::F64 => 64,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::S8 | Self::S32)
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::TF32 => "tf32",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::S8 => "s8",
            Self::S32 => "s32",
        }
    }

    /// Value observed after storing `value` in this element kind.
    pub fn round(self, value: f32) -> f32 {
        match self {
            Self::F16 => f16::from_f32(value).to_f32(),
            Self::BF16 => bf16::from_f32(value).to_f32(),
            Self::TF32 => round_to_tf32(value),
            Self::F32 | Self::F64 => value,
            Self::S8 => value.round().clamp(i8::MIN as f32, i8::MAX as f32),
            Self::S32 => value.round().clamp(i32::MIN as f32, i32::MAX as f32),
        }
    }
}

/// Round-to-nearest-even onto the 10-bit tf32 mantissa.
pub fn round_to_tf32(value: f32) -> f32 {
    if !value.is_finite() {
        return value;
    }
    let bits = value.to_bits();
    let lsb = (bits >> 13) & 1;
    let rounded = bits.wrapping_add(0x0FFF + lsb) & !0x1FFF;
    f32::from_bits(rounded)
}

/// Splits `value` into `big + small`, both tf32-representable.
/// Three tf32 products over these halves recover close to f32 accuracy.
pub fn split_tf32(value: f32) -> (f32, f32) {
    let big = round_to_tf32(value);
    let small = round_to_tf32(value - big);
    (big, small)
}
