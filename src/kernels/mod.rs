//! Host-side kernels used to check device results.

pub mod reference;

pub use reference::reference_gemm;
