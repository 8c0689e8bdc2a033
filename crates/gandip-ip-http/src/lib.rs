// # HTTP IP Source
//
// This crate provides the IP resolver for the Gandi updater.
//
// ## Architecture
//
// Issues a single GET to an address echo service (e.g. api.ipify.org) and
// returns the response body as the current IP. The body is not parsed: the
// only processing is stripping surrounding whitespace, so "203.0.113.7\n"
// compares equal to a record value of "203.0.113.7". Families are told apart
// by using one endpoint per family, never by inspecting the answer.
//
// Non-2xx answers and transport failures are returned as errors; nothing is
// retried.

use gandip_core::config::{AddressFamily, IpGetterConfig};
use gandip_core::traits::IpSource;
use gandip_core::{Error, Result};

use std::time::Duration;

/// Default HTTP timeout for IP lookups
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// Address family the URL answers for
    family: AddressFamily,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL answering with a bare address (e.g., "https://api.ipify.org")
    /// - `family`: Family the URL resolves
    pub fn new(url: impl Into<String>, family: AddressFamily) -> Self {
        Self {
            url: url.into(),
            family,
            client: reqwest::Client::builder()
                .timeout(DEFAULT_HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Build one source per enabled family
    pub fn from_config(config: &IpGetterConfig) -> Vec<Self> {
        config
            .enabled_families()
            .into_iter()
            .filter_map(|family| {
                config
                    .url_for(family)
                    .map(|url| Self::new(url.to_string(), family))
            })
            .collect()
    }

    /// The configured URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Turn an echo-service body into the address string
pub fn ip_from_body(body: &str) -> String {
    body.trim().to_string()
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<String> {
        tracing::debug!("Fetching {} address from {}", self.family, self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ip_source(format!(
                "{} answered HTTP {}",
                self.url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        Ok(ip_from_body(&body))
    }

    fn family(&self) -> AddressFamily {
        self.family
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_body_is_taken_verbatim() {
        assert_eq!(ip_from_body("203.0.113.7\n"), "203.0.113.7");
        assert_eq!(ip_from_body("  2001:db8::7 \r\n"), "2001:db8::7");
        // Not validated: whatever the service says is the address
        assert_eq!(ip_from_body("not-an-ip"), "not-an-ip");
        assert_eq!(ip_from_body(""), "");
    }

    #[test]
    fn test_from_config_skips_disabled_family() {
        let config = IpGetterConfig {
            ipv4: Some("http://ip.example.net/".to_string()),
            ipv6: None,
        };

        let sources = HttpIpSource::from_config(&config);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].family(), AddressFamily::V4);
        assert_eq!(sources[0].url(), "http://ip.example.net/");
    }

    #[test]
    fn test_from_default_config() {
        let sources = HttpIpSource::from_config(&IpGetterConfig::default());
        let families: Vec<_> = sources.iter().map(|s| s.family()).collect();
        assert_eq!(families, vec![AddressFamily::V4, AddressFamily::V6]);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let source = HttpIpSource::new("http://127.0.0.1:9/", AddressFamily::V4);
        let result = source.current().await;
        assert!(matches!(result, Err(Error::IpSource(_))));
    }

    /// Answer the first connection with a canned plain-text response
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        url
    }

    #[tokio::test]
    async fn test_echo_body_is_the_address() {
        let url = serve_once("200 OK", "203.0.113.7\n").await;
        let source = HttpIpSource::new(url, AddressFamily::V4);

        assert_eq!(source.current().await.unwrap(), "203.0.113.7");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let url = serve_once("500 Internal Server Error", "203.0.113.7").await;
        let source = HttpIpSource::new(url, AddressFamily::V4);

        let result = source.current().await;
        assert!(matches!(result, Err(Error::IpSource(message)) if message.contains("500")));
    }

    #[tokio::test]
    async fn test_not_found_is_an_error() {
        let url = serve_once("404 Not Found", "").await;
        let source = HttpIpSource::new(url, AddressFamily::V6);

        assert!(matches!(source.current().await, Err(Error::IpSource(_))));
    }
}
