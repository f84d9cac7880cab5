use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use gemm_testbed::doctor::{detect, CapabilityGate, EmulatedDevice};
use gemm_testbed::scenarios::{run_case, sm80_scenarios, Outcome};
use gemm_testbed::{bootstrap, EmulatedBackend, TestbedConfig, Testbed};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match TestbedConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "bad configuration");
            return ExitCode::FAILURE;
        }
    };
    let runtime = match bootstrap(&config) {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "bootstrap failed");
            return ExitCode::FAILURE;
        }
    };

    let detected = detect(&runtime.config);
    let gate = CapabilityGate::new(runtime.config.required_capability);
    info!(device = %detected.name(), cc = detected.compute_capability(), "running SM80 scenarios");
    let testbed = Testbed::new(
        runtime,
        EmulatedBackend::new(EmulatedDevice::new(runtime.config.device_capability)),
    );

    let mut failed = 0;
    for scenario in sm80_scenarios() {
        match run_case(&gate, detected.as_ref(), scenario.build, &testbed, scenario.mode) {
            Outcome::Passed => println!("PASS {}", scenario.name),
            Outcome::Skipped(reason) => println!("SKIP {} ({})", scenario.name, reason),
            Outcome::Failed(reason) => {
                failed += 1;
                println!("FAIL {} ({})", scenario.name, reason);
            }
        }
    }

    info!(
        pool_high_water = runtime.pool.high_water_bytes(),
        cached_kernels = runtime.cache.len(),
        "done"
    );
    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
