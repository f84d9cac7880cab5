use serde::{Deserialize, Serialize};
use tracing::info;
use crate::config::TestbedConfig;

/// Anything that can report a device's compute capability (`major * 10 + minor`).
pub trait DeviceQuery: Send + Sync {
    fn name(&self) -> String;

    fn compute_capability(&self) -> u32;
}

/// A device with a hard-wired capability, for tests and overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedDevice(pub u32);

impl DeviceQuery for FixedDevice {
    fn name(&self) -> String {
        format!("fixed_sm{}", self.0)
    }

    fn compute_capability(&self) -> u32 {
        self.0
    }
}

/// The host-side SM model the emulated backend executes on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmulatedDevice {
    pub compute_capability: u32,
    pub max_shared_memory: usize,
    pub max_threads_per_block: usize,
    pub warp_size: u32,
}

impl EmulatedDevice {
    pub fn new(compute_capability: u32) -> Self {
        // Shared memory opt-in limits per SM generation.
        let max_shared_memory = match compute_capability {
            cc if cc >= 90 => 227 * 1024,
            80 | 87 => 163 * 1024,
            cc if cc >= 86 => 99 * 1024,
            cc if cc >= 75 => 64 * 1024,
            cc if cc >= 70 => 96 * 1024,
            _ => 48 * 1024,
        };
        Self {
            compute_capability,
            max_shared_memory,
            max_threads_per_block: 1024,
            warp_size: 32,
        }
    }
}

impl Default for EmulatedDevice {
    fn default() -> Self {
        Self::new(80)
    }
}

impl DeviceQuery for EmulatedDevice {
    fn name(&self) -> String {
        format!("emulated_sm{}", self.compute_capability)
    }

    fn compute_capability(&self) -> u32 {
        self.compute_capability
    }
}

/// Physical CUDA device queried through the driver API.
/// Reports capability 0 when no device or driver is present.
#[cfg(feature = "cuda")]
#[derive(Debug, Clone, Copy)]
pub struct CudaDevice {
    pub ordinal: usize,
}

#[cfg(feature = "cuda")]
impl CudaDevice {
    pub fn new(ordinal: usize) -> Self {
        Self { ordinal }
    }
}

#[cfg(feature = "cuda")]
impl DeviceQuery for CudaDevice {
    fn name(&self) -> String {
        match cudarc::driver::CudaDevice::new(self.ordinal) {
            Ok(dev) => dev.name().unwrap_or_else(|_| "Unknown CUDA Device".to_string()),
            Err(_) => format!("cuda:{} (unavailable)", self.ordinal),
        }
    }

    fn compute_capability(&self) -> u32 {
        use cudarc::driver::sys::CUdevice_attribute;
        match cudarc::driver::CudaDevice::new(self.ordinal) {
            Ok(dev) => {
                let major = dev
                    .attribute(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MAJOR)
                    .unwrap_or(0) as u32;
                let minor = dev
                    .attribute(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MINOR)
                    .unwrap_or(0) as u32;
                major * 10 + minor
            }
            Err(e) => {
                tracing::debug!(ordinal = self.ordinal, error = ?e, "no CUDA device");
                0
            }
        }
    }
}

/// Capability of the first CUDA device, if one can be opened.
pub fn probe_cuda() -> Option<u32> {
    #[cfg(feature = "cuda")]
    {
        let cc = CudaDevice::new(0).compute_capability();
        if cc > 0 {
            return Some(cc);
        }
    }
    None
}

/// Device the gate should check: the first CUDA device when one answers,
/// otherwise the emulated device at the configured capability.
pub fn detect(config: &TestbedConfig) -> Box<dyn DeviceQuery> {
    #[cfg(feature = "cuda")]
    {
        if let Some(cc) = probe_cuda() {
            info!(cc, "using CUDA device 0");
            return Box::new(CudaDevice::new(0));
        }
    }
    let device = EmulatedDevice::new(config.device_capability);
    info!(device = %device.name(), "no CUDA device, using the emulated device");
    Box::new(device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emulated_limits() {
        let sm80 = EmulatedDevice::default();
        assert_eq!(sm80.compute_capability(), 80);
        assert_eq!(sm80.max_shared_memory, 163 * 1024);
        assert_eq!(EmulatedDevice::new(86).max_shared_memory, 99 * 1024);
        assert_eq!(sm80.name(), "emulated_sm80");
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_detect_falls_back_to_emulated() {
        let config = TestbedConfig {
            device_capability: 86,
            ..TestbedConfig::ephemeral()
        };
        let device = detect(&config);
        assert_eq!(device.compute_capability(), 86);
        assert_eq!(device.name(), "emulated_sm86");
        assert_eq!(detect(&TestbedConfig::default()).compute_capability(), 80);
    }

    #[test]
    fn test_fixed_device() {
        assert_eq!(FixedDevice(79).compute_capability(), 79);
    }
}
