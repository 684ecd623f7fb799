use serde::{Deserialize, Serialize};

use crate::error::{RELAY_FAILURE_MESSAGE, RELAY_SUCCESS_MESSAGE};

pub const STATUS_ROUTE: &str = "/";
pub const HEALTH_ROUTE: &str = "/healthz";
pub const CONTACT_ROUTE: &str = "/api/enviar-email";

/// Body of `POST /api/enviar-email`. Every field is optional on the wire so a
/// missing field surfaces as a validation error instead of a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "telefone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "mensagem", default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    pub message: String,
}

impl RelayResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    pub fn delivered() -> Self {
        Self::ok(RELAY_SUCCESS_MESSAGE)
    }

    pub fn undelivered() -> Self {
        Self::failed(RELAY_FAILURE_MESSAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub message: String,
    pub status: String,
}

impl ServiceStatus {
    pub fn online(site_name: &str) -> Self {
        Self {
            message: format!("Backend da {site_name} está funcionando!"),
            status: "online".to_string(),
        }
    }
}
