//! Network infrastructure: implements `NetworkProbe` using `spawn_blocking`.

use std::time::Duration;

use anyhow::Result;

use crate::application::ports::NetworkProbe;

/// Production implementation that performs real TCP connects.
pub struct TokioNetworkProbe {
    connect_timeout: Duration,
}

impl TokioNetworkProbe {
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TokioNetworkProbe {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl NetworkProbe for TokioNetworkProbe {
    async fn check_tcp_connectivity(&self, host: &str, port: u16) -> Result<bool> {
        let addr = format!("{host}:{port}");
        let timeout = self.connect_timeout;
        let result = tokio::task::spawn_blocking(move || {
            let addr: std::net::SocketAddr = addr
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid address {addr}: {e}"))?;
            Ok::<bool, anyhow::Error>(std::net::TcpStream::connect_timeout(&addr, timeout).is_ok())
        })
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking panicked: {e}"))??;
        Ok(result)
    }
}
