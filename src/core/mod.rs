//! # Kernel configuration
//!
//! Plain immutable descriptors of one GEMM kernel variant, composed bottom-up:
//!
//! - **[`math`]:** the hardware math instruction (shape, element kinds, accumulation strategy).
//! - **[`tile`]:** threadblock tiling, pipeline stages and warp layout; owns the math instruction.
//! - **[`tensor`]:** element kind, layout and alignment of each operand.
//! - **[`epilogue`]:** how accumulators combine with `C` into `D`.
//! - **[`swizzle`]:** block-index-to-tile mapping.
//! - **[`operation`]:** the assembled kernel descriptor.

pub mod element;
pub mod layout;
pub mod shape;
pub mod problem;
pub mod math;
pub mod tile;
pub mod tensor;
pub mod epilogue;
pub mod swizzle;
pub mod operation;

pub use element::ElementKind;
pub use epilogue::{EpilogueFunctor, LinearCombination};
pub use layout::Layout;
pub use math::{MathInstruction, MathOperation, OpcodeClass, OperandPrecision};
pub use operation::{assemble, GemmOperationUniversal};
pub use problem::{GemmMode, ProblemSize};
pub use shape::{Dim3, GemmShape};
pub use swizzle::SwizzlingFunctor;
pub use tensor::TensorDescription;
pub use tile::TileDescription;
