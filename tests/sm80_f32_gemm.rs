use serial_test::serial;
use gemm_testbed::doctor::{CapabilityGate, DeviceQuery, EmulatedDevice, FixedDevice};
use gemm_testbed::scenarios::{self, run_case, Harness, Outcome};
use gemm_testbed::{bootstrap, run_and_verify, EmulatedBackend, GemmOperationUniversal, TestMode, Testbed, TestbedConfig};

/// Full universal battery on the emulated SM80 device.
fn verify_scenario(build: fn() -> GemmOperationUniversal) {
    let runtime = bootstrap(&TestbedConfig::ephemeral()).unwrap();
    let device = EmulatedDevice::new(runtime.config.device_capability);
    let testbed = Testbed::new(runtime, EmulatedBackend::new(device.clone()));
    let outcome = run_case(&CapabilityGate::sm80(), &device, build, &testbed, TestMode::Universal);
    assert_eq!(outcome, Outcome::Passed);
    assert_eq!(runtime.pool.allocated_bytes(), 0);
}

#[test]
#[serial]
fn sm80_device_gemm_f32t_f32n_f32t_tensor_op_bf16_f32_128x128x32() {
    verify_scenario(scenarios::f32t_f32n_f32t_tensor_op_bf16_f32_128x128x32);
}

#[test]
#[serial]
fn sm80_device_gemm_f32n_f32n_f32t_tensor_op_f32_128x128x32() {
    verify_scenario(scenarios::f32n_f32n_f32t_tensor_op_f32_128x128x32);
}

#[test]
#[serial]
fn sm80_device_gemm_f32n_f32n_f32t_tensor_op_fast_accurate_f32_64x64x32() {
    verify_scenario(scenarios::f32n_f32n_f32t_tensor_op_fast_accurate_f32_64x64x32);
}

#[test]
#[serial]
fn equal_operations_share_a_verdict() {
    bootstrap(&TestbedConfig::ephemeral()).unwrap();
    let x = scenarios::f32t_f32n_f32t_tensor_op_bf16_f32_128x128x32();
    let y = scenarios::f32t_f32n_f32t_tensor_op_bf16_f32_128x128x32();
    assert_eq!(x, y);
    assert!(run_and_verify(&x, "multistage"));
    assert!(run_and_verify(&y, "multistage"));
    assert!(!run_and_verify(&x, "diagonal"));
}

struct AlwaysPass;

impl Harness for AlwaysPass {
    fn verify(&self, _op: &GemmOperationUniversal, _mode: TestMode) -> gemm_testbed::Result<bool> {
        Ok(true)
    }
}

#[test]
fn gate_boundary() {
    let gate = CapabilityGate::sm80();
    let build = scenarios::f32n_f32n_f32t_tensor_op_f32_128x128x32;

    let outcome = run_case(&gate, &FixedDevice(79), build, &AlwaysPass, TestMode::Universal);
    assert!(matches!(outcome, Outcome::Skipped(_)));
    assert!(!outcome.is_failure());

    assert_eq!(run_case(&gate, &FixedDevice(80), build, &AlwaysPass, TestMode::Universal), Outcome::Passed);
}

#[test]
#[serial]
fn sm75_device_skips_every_scenario() {
    let runtime = bootstrap(&TestbedConfig::ephemeral()).unwrap();
    let device = EmulatedDevice::new(75);
    let testbed = Testbed::new(runtime, EmulatedBackend::new(device.clone()));
    assert_eq!(device.compute_capability(), 75);
    for scenario in scenarios::sm80_scenarios() {
        let outcome = run_case(&CapabilityGate::sm80(), &device, scenario.build, &testbed, scenario.mode);
        assert!(matches!(outcome, Outcome::Skipped(_)), "{}: {:?}", scenario.name, outcome);
    }
}
