//! Wire types for the MachineID device API.
//!
//! These mirror the JSON the service returns from
//! `/api/v1/devices/register` and `/api/v1/devices/validate`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Treat an explicit JSON `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Request body shared by register and validate.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DeviceRequest<'a> {
    #[serde(rename = "deviceId")]
    pub device_id: &'a str,
}

/// Lifecycle status returned by the register call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    /// Newly registered
    Ok,
    /// Already registered
    Exists,
    /// Previously revoked, now restored
    Restored,
    /// Plan device cap hit
    LimitReached,
    /// Unknown or missing status (forward compatibility)
    #[serde(other)]
    #[default]
    Unknown,
}

impl RegisterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegisterStatus::Ok => "ok",
            RegisterStatus::Exists => "exists",
            RegisterStatus::Restored => "restored",
            RegisterStatus::LimitReached => "limit_reached",
            RegisterStatus::Unknown => "unknown",
        }
    }

    /// True when the device holds a registration slot after the call.
    pub fn is_registered(&self) -> bool {
        matches!(
            self,
            RegisterStatus::Ok | RegisterStatus::Exists | RegisterStatus::Restored
        )
    }
}

impl fmt::Display for RegisterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of `POST /api/v1/devices/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: RegisterStatus,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `POST /api/v1/devices/validate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateResponse {
    /// Missing or null `allowed` counts as a denial.
    #[serde(default, deserialize_with = "null_as_default")]
    pub allowed: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Final decision of the gate, as printed and returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub code: Option<String>,
    pub request_id: Option<String>,
}

impl From<ValidateResponse> for Decision {
    fn from(resp: ValidateResponse) -> Self {
        Self {
            allowed: resp.allowed,
            code: resp.code,
            request_id: resp.request_id,
        }
    }
}

fn or_none(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("None")
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allowed={} code={} request_id={}",
            self.allowed,
            or_none(&self.code),
            or_none(&self.request_id)
        )
    }
}

/// Error body the service sends with 4xx/5xx responses: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ServerErrorBody {
    pub error: Option<String>,
}
