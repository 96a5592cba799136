//! Configuration system for the swarm gate.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `swarm_gate.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `MACHINEID_ORG_KEY` - Organization key (required)
//! - `MACHINEID_DEVICE_ID` - Device identifier (default `swarm:worker-01`)
//! - `MACHINEID_BASE_URL` - MachineID API base URL
//! - `MACHINEID_TIMEOUT_SECS` - Per-request timeout in seconds
//! - `MACHINEID_VALIDATE_DELAY_MS` - Pause between register and validate
//! - `OPENAI_API_KEY` - Credential for the delegated agent workload
//! - `OPENAI_BASE_URL` - Chat-completions API base URL
//! - `SWARM_AGENT_MODEL` - Model used by the agent workload
//! - `SWARM_GATE_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
//!
//! Values are trimmed, and a blank value counts as unset.

use config::Config;
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::errors::{GateError, GateResult};

pub const DEFAULT_DEVICE_ID: &str = "swarm:worker-01";
pub const DEFAULT_BASE_URL: &str = "https://machineid.io";
pub const DEFAULT_TIMEOUT_SECS: u64 = 12;
pub const DEFAULT_VALIDATE_DELAY_MS: u64 = 1000;
pub const DEFAULT_AGENT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_AGENT_MODEL: &str = "gpt-4o";

/// Number of org key characters shown in console output.
const ORG_KEY_VISIBLE_CHARS: usize = 12;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// MachineID registration/validation settings
    pub machineid: MachineIdConfig,
    /// Delegated agent workload settings
    pub agent: AgentConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// MachineID client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MachineIdConfig {
    /// Organization key sent as `x-org-key`
    pub org_key: String,
    /// Device identifier within the organization's quota
    pub device_id: String,
    /// API base URL, without trailing slash
    pub base_url: String,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Pause between register and validate, in milliseconds
    pub validate_delay_ms: u64,
}

impl Default for MachineIdConfig {
    fn default() -> Self {
        Self {
            org_key: String::new(),
            device_id: DEFAULT_DEVICE_ID.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            validate_delay_ms: DEFAULT_VALIDATE_DELAY_MS,
        }
    }
}

/// Agent workload configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Bearer credential for the chat-completions backend
    pub api_key: String,
    /// API base URL, without trailing slash
    pub api_base: String,
    /// Model name
    pub model: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_AGENT_API_BASE.to_string(),
            model: DEFAULT_AGENT_MODEL.to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Read an environment variable, trimmed. Blank values are treated as unset.
pub fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_number(name: &str) -> Option<i64> {
    env_value(name).and_then(|v| v.parse::<i64>().ok())
}

impl GateConfig {
    /// Build a configuration in code, with defaults for everything but the org key.
    pub fn new(org_key: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.machineid.org_key = org_key.into();
        config
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.machineid.device_id = device_id.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.machineid.base_url = base_url.into();
        self.normalize();
        self
    }

    pub fn with_validate_delay(mut self, delay: Duration) -> Self {
        self.machineid.validate_delay_ms =
            u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Load configuration from file and environment.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. `swarm_gate.toml` file (optional)
    /// 3. Environment variables
    ///
    /// The result is normalized but not validated; call [`GateConfig::validate`].
    pub fn load() -> GateResult<Self> {
        let settings = Config::builder()
            .set_default("machineid.org_key", "")?
            .set_default("machineid.device_id", DEFAULT_DEVICE_ID)?
            .set_default("machineid.base_url", DEFAULT_BASE_URL)?
            .set_default("machineid.timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .set_default(
                "machineid.validate_delay_ms",
                DEFAULT_VALIDATE_DELAY_MS as i64,
            )?
            .set_default("agent.api_key", "")?
            .set_default("agent.api_base", DEFAULT_AGENT_API_BASE)?
            .set_default("agent.model", DEFAULT_AGENT_MODEL)?
            .set_default("logging.level", "warn")?
            .add_source(config::File::with_name("swarm_gate").required(false))
            .set_override_option("machineid.org_key", env_value("MACHINEID_ORG_KEY"))?
            .set_override_option("machineid.device_id", env_value("MACHINEID_DEVICE_ID"))?
            .set_override_option("machineid.base_url", env_value("MACHINEID_BASE_URL"))?
            .set_override_option(
                "machineid.timeout_secs",
                env_number("MACHINEID_TIMEOUT_SECS"),
            )?
            .set_override_option(
                "machineid.validate_delay_ms",
                env_number("MACHINEID_VALIDATE_DELAY_MS"),
            )?
            .set_override_option("agent.api_key", env_value("OPENAI_API_KEY"))?
            .set_override_option("agent.api_base", env_value("OPENAI_BASE_URL"))?
            .set_override_option("agent.model", env_value("SWARM_AGENT_MODEL"))?
            .set_override_option("logging.level", env_value("SWARM_GATE_LOG_LEVEL"))?
            .build()
            .map_err(|e| GateError::Config(format!("failed to build config: {e}")))?;

        let mut config: GateConfig = settings
            .try_deserialize()
            .map_err(|e| GateError::Config(format!("failed to deserialize config: {e}")))?;
        config.normalize();
        Ok(config)
    }

    /// Trim values, fall back to the default device id, and strip trailing slashes.
    fn normalize(&mut self) {
        let m = &mut self.machineid;
        m.org_key = m.org_key.trim().to_string();
        m.device_id = m.device_id.trim().to_string();
        if m.device_id.is_empty() {
            m.device_id = DEFAULT_DEVICE_ID.to_string();
        }
        m.base_url = m.base_url.trim().trim_end_matches('/').to_string();

        let a = &mut self.agent;
        a.api_key = a.api_key.trim().to_string();
        a.api_base = a.api_base.trim().trim_end_matches('/').to_string();
    }

    /// Validate the configuration.
    pub fn validate(&self) -> GateResult<()> {
        if self.machineid.org_key.trim().is_empty() {
            return Err(GateError::Config(
                "Missing MACHINEID_ORG_KEY.\n\
                 Example:\n  export MACHINEID_ORG_KEY=org_your_key_here\n  \
                 export OPENAI_API_KEY=sk_your_openai_key_here"
                    .to_string(),
            ));
        }

        if self.machineid.device_id.trim().is_empty() {
            return Err(GateError::Config(
                "machineid.device_id cannot be empty".to_string(),
            ));
        }

        let base = &self.machineid.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(GateError::Config(format!(
                "machineid.base_url must start with http:// or https://, got '{base}'"
            )));
        }

        if self.machineid.timeout_secs == 0 {
            return Err(GateError::Config(
                "machineid.timeout_secs must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(GateError::Config(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }

    /// Org key prefix safe to print, e.g. `org_abcdefgh...`.
    pub fn masked_org_key(&self) -> String {
        let visible: String = self
            .machineid
            .org_key
            .chars()
            .take(ORG_KEY_VISIBLE_CHARS)
            .collect();
        format!("{visible}...")
    }

    pub fn register_url(&self) -> String {
        format!("{}/api/v1/devices/register", self.machineid.base_url)
    }

    pub fn validate_url(&self) -> String {
        format!("{}/api/v1/devices/validate", self.machineid.base_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.machineid.timeout_secs)
    }

    pub fn validate_delay(&self) -> Duration {
        Duration::from_millis(self.machineid.validate_delay_ms)
    }
}
