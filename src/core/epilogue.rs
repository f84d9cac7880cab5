use serde::{Deserialize, Serialize};
use crate::core::element::ElementKind;

/// `D = alpha * accum + beta * C`, computed in `element_epilogue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinearCombination {
    pub element_output: ElementKind,
    pub alignment: u32,
    pub element_accumulator: ElementKind,
    pub element_epilogue: ElementKind,
}

impl LinearCombination {
    pub fn new(
        element_output: ElementKind,
        alignment: u32,
        element_accumulator: ElementKind,
        element_epilogue: ElementKind,
    ) -> Self {
        Self {
            element_output,
            alignment,
            element_accumulator,
            element_epilogue,
        }
    }

    /// The source is not read when `beta == 0`, so NaNs in C never leak into D.
    pub fn apply(&self, alpha: f32, accum: f32, beta: f32, source: f32) -> f32 {
        let compute = self.element_epilogue;
        let accum = compute.round(self.element_accumulator.round(accum));
        let scaled = compute.round(alpha * accum);
        let out = if beta == 0.0 {
            scaled
        } else {
            compute.round(scaled + compute.round(beta * source))
        };
        self.element_output.round(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpilogueFunctor {
    LinearCombination(LinearCombination),
}

impl EpilogueFunctor {
    pub fn apply(&self, alpha: f32, accum: f32, beta: f32, source: f32) -> f32 {
        match self {
            Self::LinearCombination(lc) => lc.apply(alpha, accum, beta, source),
        }
    }

    pub fn element_output(&self) -> ElementKind {
        match self {
            Self::LinearCombination(lc) => lc.element_output,
        }
    }

    pub fn element_accumulator(&self) -> ElementKind {
        match self {
            Self::LinearCombination(lc) => lc.element_accumulator,
        }
    }

    pub fn alignment(&self) -> u32 {
        match self {
            Self::LinearCombination(lc) => lc.alignment,
        }
    }

    pub fn procedural_name(&self) -> String {
        match self {
            Self::LinearCombination(lc) => format!(
                "lincomb_{}_{}_{}",
                lc.element_output.short_name(),
                lc.element_accumulator.short_name(),
                lc.element_epilogue.short_name()
            ),
        }
    }
}

impl From<LinearCombination> for EpilogueFunctor {
    fn from(lc: LinearCombination) -> Self {
        Self::LinearCombination(lc)
    }
}
