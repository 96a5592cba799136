//! swarm-gate - a device-gated Swarm worker.
//!
//! A worker registers itself with the MachineID device service, asks for a
//! validation decision, and only runs its agent workload when `allowed` is
//! true.
//!
//! # Example
//!
//! ```rust,no_run
//! use swarm_gate::config::GateConfig;
//! use swarm_gate::gate::run_gate;
//! use swarm_gate::workload::ChatAgentWorkload;
//!
//! # async fn demo() -> swarm_gate::errors::GateResult<()> {
//! let config = GateConfig::load()?;
//! let workload = ChatAgentWorkload::from_config(&config)?;
//! let outcome = run_gate(&config, &workload).await?;
//! println!("allowed={}", outcome.is_allowed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod gate;
pub mod logging;
pub mod workload;

pub mod client {
    pub mod machineid;
    pub mod responses;

    pub use machineid::MachineIdClient;
}
