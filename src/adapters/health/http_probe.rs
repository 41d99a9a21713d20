//! `reqwest`-backed [`HealthProbe`].

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::ports::{HealthProbe, ProbeOutcome};

/// Plain `GET` with a fixed timeout. Redirects are followed; the final
/// status is reported.
#[derive(Clone)]
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

impl HttpHealthProbe {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::debug!(url, status, "health probe answered");
                ProbeOutcome::Status(status)
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "health probe failed");
                ProbeOutcome::Unreachable(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_reports_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(503)
            .create_async()
            .await;

        let probe = HttpHealthProbe::new(Duration::from_secs(2));
        let outcome = probe.probe(&format!("{}/health", server.url())).await;

        mock.assert_async().await;
        assert_eq!(outcome, ProbeOutcome::Status(503));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let probe = HttpHealthProbe::new(Duration::from_millis(500));
        let outcome = probe.probe("http://127.0.0.1:9/health").await;
        assert!(matches!(outcome, ProbeOutcome::Unreachable(_)));
    }
}
