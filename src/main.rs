use std::process::ExitCode;

use swarm_gate::config::GateConfig;
use swarm_gate::errors::GateResult;
use swarm_gate::gate::{run_gate, GateOutcome};
use swarm_gate::logging::init_logging;
use swarm_gate::workload::ChatAgentWorkload;

/// Register this worker with MachineID, validate, and run the Swarm agent
/// only when the service allows it. Configured entirely through the
/// environment; see `swarm_gate::config`.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(GateOutcome::Completed { output, .. }) => {
            println!("✔ Swarm result:");
            println!("{output}");
            println!();
            println!("Done. swarm_agent completed successfully.");
            ExitCode::SUCCESS
        }
        Ok(GateOutcome::Denied(_)) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> GateResult<GateOutcome> {
    let config = GateConfig::load()?;
    init_logging(&config.logging.level);

    // Fail on missing credentials before touching the network.
    config.validate()?;
    let workload = ChatAgentWorkload::from_config(&config)?;

    run_gate(&config, &workload).await
}
