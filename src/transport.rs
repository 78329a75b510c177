//! Message transport - delivery into the external messaging network
//!
//! The bridge treats delivery as one opaque operation: hand an address and
//! a body to the transport, observe success or failure. Connection and
//! session management for the network belong to the gateway process this
//! module talks to, not to the bridge.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Mutex;

/// Outbound delivery, shared between the HTTP path and the scheduler.
///
/// Implementations must tolerate concurrent calls; the bridge holds one
/// instance behind an `Arc` and never serializes access itself. No retry
/// and no timeout are applied on top of `send`.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(&self, address: &str, body: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct GatewaySend<'a> {
    address: &'a str,
    body: &'a str,
}

/// Transport backed by the local gateway's HTTP endpoint
pub struct HttpGateway {
    client: reqwest::Client,
    url: String,
}

impl HttpGateway {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl MessageTransport for HttpGateway {
    async fn send(&self, address: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&GatewaySend { address, body })
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "gateway returned {}: {}",
                status,
                text.trim()
            )));
        }

        Ok(())
    }
}

/// In-memory transport that records deliveries instead of performing them.
/// Used by the test suites; also handy for dry runs.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delivery to `address` fail from now on
    pub fn fail_for(&self, address: &str) {
        self.failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(address.to_string());
    }

    /// Deliveries recorded so far, in attempt order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send(&self, address: &str, body: &str) -> Result<()> {
        let refused = self
            .failing
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(address);
        if refused {
            return Err(Error::Transport(format!("delivery to {} refused", address)));
        }

        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((address.to_string(), body.to_string()));
        Ok(())
    }
}
