use std::time::{Duration, Instant};

use crate::error::ProbeError;

/// What came back from a completed probe, whatever the status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub latency_ms: u64,
}

impl ProbeResponse {
    /// 2xx
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Checker trait for probing a target
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Issue one request against `target`. Transport failures are errors; any HTTP status
    /// is a response.
    async fn check(&self, target: &str) -> Result<ProbeResponse, ProbeError>;
}

/// HTTP/HTTPS checker
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new(timeout_seconds: u64) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("vigil/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Use a preconfigured client (proxy settings, TLS roots, ...)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, target: &str) -> Result<ProbeResponse, ProbeError> {
        let start = Instant::now();

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        let latency_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(url = target, status = response.status().as_u16(), latency_ms, "probe completed");

        Ok(ProbeResponse { status: response.status().as_u16(), latency_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use tokio::net::TcpListener;

    fn local_checker() -> HttpChecker {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .no_proxy()
            .build()
            .unwrap();
        HttpChecker::with_client(client)
    }

    #[test]
    fn test_ok_class_statuses() {
        let response = |status| ProbeResponse { status, latency_ms: 0 };
        assert!(response(200).is_ok());
        assert!(response(204).is_ok());
        assert!(!response(199).is_ok());
        assert!(!response(301).is_ok());
        assert!(!response(500).is_ok());
    }

    #[tokio::test]
    async fn test_http_check_reports_status() {
        let mut server = Server::new_async().await;
        let healthy = server.mock("GET", "/health").with_status(200).expect(1).create_async().await;
        let broken = server.mock("GET", "/broken").with_status(500).expect(1).create_async().await;
        let checker = local_checker();

        let ok = checker.check(&format!("{}/health", server.url())).await.unwrap();
        assert_eq!(ok.status, 200);
        assert!(ok.is_ok());

        let failing = checker.check(&format!("{}/broken", server.url())).await.unwrap();
        assert_eq!(failing.status, 500);
        assert!(!failing.is_ok());

        healthy.assert_async().await;
        broken.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_check_sends_one_get() {
        let mut server = Server::new_async().await;
        let get = server.mock("GET", "/status").with_status(204).expect(1).create_async().await;

        // Any other method would miss the mock and get mockito's 501
        let response = local_checker().check(&format!("{}/status", server.url())).await.unwrap();
        assert_eq!(response.status, 204);

        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_check_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let checker = local_checker();
        let result = checker.check(&format!("http://{addr}/")).await;
        assert!(matches!(result, Err(ProbeError::Request(_))));
    }
}
