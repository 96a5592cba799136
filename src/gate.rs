//! Register-then-validate gate in front of the delegated workload.
//!
//! The sequence is strictly linear:
//! 1. validate configuration (no network before this passes),
//! 2. register the device,
//! 3. validate the device, whatever the register status was,
//! 4. run the workload only when the service says `allowed`.
//!
//! There is no retry and no grace period. Operators who want periodic
//! revalidation re-run the whole sequence.

use tracing::{info, info_span, warn, Instrument};

use crate::client::machineid::MachineIdClient;
use crate::client::responses::{Decision, RegisterStatus};
use crate::config::GateConfig;
use crate::errors::{GateError, GateResult};
use crate::workload::Workload;

/// Terminal state of one gate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Validation said no; the workload was not started.
    Denied(Decision),
    /// Validation allowed the run and the workload finished.
    Completed {
        decision: Decision,
        register_status: RegisterStatus,
        output: String,
    },
}

impl GateOutcome {
    pub fn decision(&self) -> &Decision {
        match self {
            GateOutcome::Denied(decision) => decision,
            GateOutcome::Completed { decision, .. } => decision,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.decision().allowed
    }
}

/// Run the full register/validate/gate sequence for one device.
pub async fn run_gate<W: Workload>(config: &GateConfig, workload: &W) -> GateResult<GateOutcome> {
    config.validate()?;

    let span = info_span!("gate", device_id = %config.machineid.device_id);
    gate_sequence(config, workload).instrument(span).await
}

async fn gate_sequence<W: Workload>(config: &GateConfig, workload: &W) -> GateResult<GateOutcome> {
    println!("✔ MACHINEID_ORG_KEY loaded: {}", config.masked_org_key());
    println!("Using base_url: {}", config.machineid.base_url);
    println!("Using device_id: {}", config.machineid.device_id);
    println!();

    let client = MachineIdClient::new(config)?;

    let registered = client.register().await?;

    // Validate is authoritative even after limit_reached.
    let delay = config.validate_delay();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let decision: Decision = client.validate().await?.into();

    if !decision.allowed {
        println!("🚫 Execution denied (hard gate). Swarm run will NOT start.");
        println!("   {decision}");
        warn!(
            code = ?decision.code,
            request_id = ?decision.request_id,
            "Execution denied"
        );
        return Ok(GateOutcome::Denied(decision));
    }

    println!("✅ Execution allowed. Starting Swarm run.\n");
    info!(request_id = ?decision.request_id, "Execution allowed");

    let output = workload
        .run()
        .await
        .map_err(|e| GateError::Workload(e.to_string()))?;

    info!("Workload completed");
    Ok(GateOutcome::Completed {
        decision,
        register_status: registered.status,
        output,
    })
}
