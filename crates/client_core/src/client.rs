use std::error::Error as _;

use reqwest::Client;
use shared::{
    domain::ContactSubmission,
    protocol::{RelayResponse, CONTACT_ROUTE, STATUS_ROUTE},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
    #[error("backend unreachable at {0}")]
    BackendUnreachable(Url),
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for ClientError {
    /// Keeps the whole source chain so the OS-level cause ("connection
    /// refused", "dns error") is visible to callers matching on the text.
    fn from(err: reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        ClientError::Transport(message)
    }
}

/// What the relay answered. `body` is `None` when the response was not the
/// expected JSON shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReply {
    pub status: u16,
    pub body: Option<RelayResponse>,
}

impl RelayReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.body.as_ref().is_some_and(|b| b.success)
    }

    pub fn server_message(&self) -> Option<&str> {
        self.body
            .as_ref()
            .map(|b| b.message.as_str())
            .filter(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct RelayClient {
    http: Client,
    server_url: Url,
}

impl RelayClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_http_client(server_url, Client::new())
    }

    /// Uses a caller-built `reqwest::Client`, e.g. one with custom proxy or
    /// TLS settings.
    pub fn with_http_client(server_url: &str, http: Client) -> Result<Self, ClientError> {
        let mut url = Url::parse(server_url).map_err(|e| ClientError::InvalidServerUrl {
            url: server_url.to_string(),
            reason: e.to_string(),
        })?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self {
            http,
            server_url: url,
        })
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    fn endpoint(&self, route: &str) -> Result<Url, ClientError> {
        self.server_url
            .join(route.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidServerUrl {
                url: format!("{}{route}", self.server_url),
                reason: e.to_string(),
            })
    }

    /// `GET /` on the relay; true only for a 2xx answer.
    pub async fn probe(&self) -> bool {
        let Ok(url) = self.endpoint(STATUS_ROUTE) else {
            return false;
        };
        match self.http.get(url).send().await {
            Ok(res) if res.status().is_success() => {
                debug!(server = %self.server_url, "relay backend reachable");
                true
            }
            Ok(res) => {
                warn!(server = %self.server_url, status = %res.status(), "relay backend returned an error");
                false
            }
            Err(err) => {
                warn!(server = %self.server_url, error = %err, "relay backend unreachable");
                false
            }
        }
    }

    pub async fn submit(&self, submission: &ContactSubmission) -> Result<RelayReply, ClientError> {
        let res = self
            .http
            .post(self.endpoint(CONTACT_ROUTE)?)
            .json(&submission.to_request())
            .send()
            .await?;
        let status = res.status().as_u16();
        let body = res.json::<RelayResponse>().await.ok();
        debug!(status, decoded = body.is_some(), "relay answered");
        Ok(RelayReply { status, body })
    }
}
