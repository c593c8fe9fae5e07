//! `ServiceClient` over HTTP, using a blocking `ureq` agent. `ServiceProbe`
//! runs the same call on the blocking pool.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::application::ports::{ServiceClient, ServiceProbe};
use crate::domain::service::{ServiceReply, hello_request};

/// Per-request timeout. Task results are fetched after the service has
/// finished the work, so a short budget is enough.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct UreqServiceClient {
    base_url: String,
    agent: ureq::Agent,
}

impl UreqServiceClient {
    #[must_use]
    pub fn new(host: &str, port: u16) -> Self {
        Self::with_timeout(host, port, DEFAULT_REQUEST_TIMEOUT)
    }

    #[must_use]
    pub fn with_timeout(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            base_url: format!("http://{host}:{port}/"),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl ServiceClient for UreqServiceClient {
    fn call(&self, request: &Value) -> Result<ServiceReply> {
        tracing::debug!(url = %self.base_url, %request, "service request");
        let response = match self.agent.post(&self.base_url).send_json(request) {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, _)) => {
                anyhow::bail!("service at {} answered HTTP {code}", self.base_url)
            }
            Err(e) => {
                return Err(e).with_context(|| format!("cannot reach service at {}", self.base_url));
            }
        };
        response
            .into_json::<ServiceReply>()
            .with_context(|| format!("invalid reply from {}", self.base_url))
    }
}

impl ServiceProbe for UreqServiceClient {
    async fn hello(&self) -> Result<ServiceReply> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.call(&hello_request()))
            .await
            .map_err(|e| anyhow::anyhow!("spawn_blocking panicked: {e}"))?
    }
}
