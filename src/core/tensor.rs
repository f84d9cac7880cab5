use serde::{Deserialize, Serialize};
use crate::core::element::ElementKind;
use crate::core::layout::Layout;

/// Element kind, layout and vector alignment (in elements) of one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorDescription {
    pub element: ElementKind,
    pub layout: Layout,
    pub alignment: u32,
}

impl TensorDescription {
    pub fn new(element: ElementKind, layout: Layout, alignment: u32) -> Self {
        Self { element, layout, alignment }
    }

    pub fn access_bits(&self) -> u64 {
        self.alignment as u64 * self.element.size_bits() as u64
    }
}
