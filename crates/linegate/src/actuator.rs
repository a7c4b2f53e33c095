//! Best-effort actuator notification.
//!
//! One HTTP POST per decision, bounded by a short client timeout. At most
//! one attempt: no retry, no queueing. A dropped notification is an
//! accepted risk - the audit row remains the authoritative record.

use linegate_protocol::{Decision, VerdictPayload};
use reqwest::{StatusCode, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Upper bound on one notification round trip.
pub const ACTUATOR_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors from a single notification attempt.
///
/// The pipeline logs these and moves on; they never propagate to the scan
/// loop.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to build actuator client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Actuator request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Actuator returned {status}")]
    Status { status: StatusCode },
}

#[derive(Debug, Clone)]
pub struct ActuatorNotifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl ActuatorNotifier {
    pub fn new(endpoint: Url) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(ACTUATOR_TIMEOUT)
            .build()
            .map_err(NotifyError::Client)?;
        Ok(Self { client, endpoint })
    }

    /// Send the decision for one scanned code.
    ///
    /// The response body is ignored; only success/failure matters.
    pub async fn notify(&self, code: &str, decision: &Decision) -> Result<(), NotifyError> {
        let payload = VerdictPayload::from_decision(code, decision);
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(NotifyError::Request)?;

        if !response.status().is_success() {
            return Err(NotifyError::Status {
                status: response.status(),
            });
        }

        debug!(
            "Actuator acknowledged {} for {}",
            payload.status, payload.device_id
        );
        Ok(())
    }
}
