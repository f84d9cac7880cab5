//! Device capability probing and the compute-capability gate.

pub mod capabilities;
pub mod gate;

pub use capabilities::{detect, probe_cuda, DeviceQuery, EmulatedDevice, FixedDevice};
#[cfg(feature = "cuda")]
pub use capabilities::CudaDevice;
pub use gate::{CapabilityGate, GateDecision, SM80};
