//! HTTP client for the MachineID device endpoints.

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::client::responses::{
    DeviceRequest, RegisterResponse, RegisterStatus, ServerErrorBody, ValidateResponse,
};
use crate::config::GateConfig;
use crate::errors::{GateError, GateResult};

/// Header carrying the organization key.
pub const ORG_KEY_HEADER: &str = "x-org-key";

/// Client bound to one organization key and one device identity.
#[derive(Debug, Clone)]
pub struct MachineIdClient {
    http: Client,
    register_url: String,
    validate_url: String,
    org_key: String,
    device_id: String,
}

impl MachineIdClient {
    pub fn new(config: &GateConfig) -> GateResult<Self> {
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            register_url: config.register_url(),
            validate_url: config.validate_url(),
            org_key: config.machineid.org_key.clone(),
            device_id: config.machineid.device_id.clone(),
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Register this device with the organization.
    ///
    /// Every status the service reports is returned as `Ok`, including
    /// `limit_reached`; only transport failures and non-2xx responses are errors.
    pub async fn register(&self) -> GateResult<RegisterResponse> {
        println!("→ Registering device '{}'", self.device_id);

        let resp: RegisterResponse = self.post_json(&self.register_url).await?;

        println!("✔ register status={}", resp.status);
        info!(device_id = %self.device_id, status = %resp.status, "Device registered");

        if !resp.status.is_registered() {
            if resp.status == RegisterStatus::LimitReached {
                println!("🚫 Plan limit reached on register. Validation decides whether this worker may start.");
                warn!(device_id = %self.device_id, "Plan device limit reached at register");
            } else {
                warn!(device_id = %self.device_id, error = ?resp.error, "Unrecognized register status");
            }
        }

        Ok(resp)
    }

    /// Ask the service whether this device may run now.
    pub async fn validate(&self) -> GateResult<ValidateResponse> {
        println!("→ Validating device '{}'", self.device_id);

        let resp: ValidateResponse = self.post_json(&self.validate_url).await?;

        println!(
            "✔ decision allowed={} code={} request_id={}",
            resp.allowed,
            resp.code.as_deref().unwrap_or("None"),
            resp.request_id.as_deref().unwrap_or("None"),
        );
        info!(
            device_id = %self.device_id,
            allowed = resp.allowed,
            code = ?resp.code,
            request_id = ?resp.request_id,
            "Device validated"
        );

        Ok(resp)
    }

    async fn post_json<T: DeserializeOwned>(&self, url: &str) -> GateResult<T> {
        let payload = DeviceRequest {
            device_id: &self.device_id,
        };
        debug!(url = %url, device_id = %self.device_id, "POST");

        let resp = self
            .http
            .post(url)
            .header(ORG_KEY_HEADER, &self.org_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(server_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            GateError::InvalidResponse(format!(
                "Non-JSON or malformed response (HTTP {}): {e}",
                status.as_u16()
            ))
        })
    }
}

/// Build a `GateError::Server`, preferring the service's own `error` message.
fn server_error(status: u16, body: &str) -> GateError {
    let message = serde_json::from_str::<ServerErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| format!("HTTP {status}"));

    GateError::Server { status, message }
}
