use tracing::info;
use super::capabilities::DeviceQuery;

pub const SM80: u32 = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    /// Precondition not met; the case is skipped, not failed.
    Skip(String),
}

/// Minimum compute capability a group of cases needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityGate {
    pub required: u32,
    pub reason: String,
}

impl CapabilityGate {
    pub fn new(required: u32) -> Self {
        Self {
            required,
            reason: format!("Device compute capability is insufficient for SM{} tests.", required),
        }
    }

    pub fn sm80() -> Self {
        Self::new(SM80)
    }

    pub fn check(&self, device: &dyn DeviceQuery) -> GateDecision {
        let cc = device.compute_capability();
        if cc < self.required {
            info!(device = %device.name(), cc, required = self.required, "capability gate: skip");
            GateDecision::Skip(self.reason.clone())
        } else {
            GateDecision::Proceed
        }
    }
}
