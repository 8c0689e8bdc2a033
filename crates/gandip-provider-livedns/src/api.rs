//! LiveDNS HTTP API
//!
//! The wire types and the thin client the provider talks through. The
//! [`LiveDnsApi`] trait is the seam the provider's diff logic is tested at.
//!
//! ## Endpoints
//!
//! - `GET    /domains/{fqdn}/records`               list every rrset of the zone
//! - `PUT    /domains/{fqdn}/records`               replace the zone's whole record list;
//!   rrsets missing from the body are deleted
//! - `GET    /domains/{fqdn}/records/{name}/{type}` fetch one rrset (404 = absent)
//! - `POST   /domains/{fqdn}/records/{name}/{type}` create one rrset
//! - `PUT    /domains/{fqdn}/records/{name}/{type}` replace one rrset

use async_trait::async_trait;
use gandip_core::config::RecordType;
use gandip_core::traits::Record;
use gandip_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the API key
const API_KEY_HEADER: &str = "X-Api-Key";

/// A record set as the API returns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rrset {
    /// Record name relative to the zone
    pub rrset_name: String,
    /// Record type ("A", "AAAA", "MX", ...)
    pub rrset_type: String,
    /// TTL in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrset_ttl: Option<u32>,
    /// Values
    #[serde(default)]
    pub rrset_values: Vec<String>,
}

impl Rrset {
    /// Convert to the core record model; `None` for types not managed here
    pub fn to_record(&self) -> Option<Record> {
        RecordType::parse(&self.rrset_type).map(|record_type| Record {
            name: self.rrset_name.clone(),
            record_type,
            values: self.rrset_values.clone(),
            ttl: self.rrset_ttl.unwrap_or(gandip_core::config::DEFAULT_TTL),
        })
    }
}

/// Body of a single-record create or replace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RrsetValues {
    /// TTL in seconds
    pub rrset_ttl: u32,
    /// Values
    pub rrset_values: Vec<String>,
}

/// Body of a batch replace
#[derive(Debug, Serialize)]
struct RrsetItems<'a> {
    items: &'a [Rrset],
}

/// The LiveDNS operations the provider relies on
#[async_trait]
pub trait LiveDnsApi: Send + Sync {
    /// Fetch one rrset; `Ok(None)` when the API answers 404
    async fn get_record(
        &self,
        fqdn: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<Rrset>>;

    /// List every rrset of the zone
    async fn list_records(&self, fqdn: &str) -> Result<Vec<Rrset>>;

    /// Create one rrset
    async fn create_record(
        &self,
        fqdn: &str,
        name: &str,
        record_type: RecordType,
        body: &RrsetValues,
    ) -> Result<()>;

    /// Replace one rrset
    async fn replace_record(
        &self,
        fqdn: &str,
        name: &str,
        record_type: RecordType,
        body: &RrsetValues,
    ) -> Result<()>;

    /// Replace the zone's record list with `items` in one request
    async fn replace_records(&self, fqdn: &str, items: &[Rrset]) -> Result<()>;
}

/// reqwest-backed LiveDNS client
pub struct HttpLiveDnsApi {
    /// API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for HttpLiveDnsApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLiveDnsApi")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpLiveDnsApi {
    /// Create a new client
    ///
    /// # Security
    ///
    /// The API key will NEVER be logged or displayed in error messages.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("LiveDNS API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn records_url(&self, fqdn: &str) -> String {
        format!("{}/domains/{}/records", self.base_url, fqdn)
    }

    fn record_url(&self, fqdn: &str, name: &str, record_type: RecordType) -> String {
        format!(
            "{}/domains/{}/records/{}/{}",
            self.base_url, fqdn, name, record_type
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder, context: &str) -> Result<reqwest::Response> {
        let response = request
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| Error::provider("livedns", format!("{}: HTTP request failed: {}", context, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::from_status("livedns", status.as_u16(), context, &error_text));
        }

        Ok(response)
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| Error::provider("livedns", format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl LiveDnsApi for HttpLiveDnsApi {
    async fn get_record(
        &self,
        fqdn: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<Rrset>> {
        let context = format!("GET record {}/{}", name, record_type);
        let request = self.client.get(self.record_url(fqdn, name, record_type));

        match self.send(request, &context).await {
            Ok(response) => Ok(Some(Self::parse(response).await?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_records(&self, fqdn: &str) -> Result<Vec<Rrset>> {
        let request = self.client.get(self.records_url(fqdn));
        let response = self.send(request, "GET records").await?;
        Self::parse(response).await
    }

    async fn create_record(
        &self,
        fqdn: &str,
        name: &str,
        record_type: RecordType,
        body: &RrsetValues,
    ) -> Result<()> {
        let context = format!("POST record {}/{}", name, record_type);
        let request = self
            .client
            .post(self.record_url(fqdn, name, record_type))
            .json(body);
        self.send(request, &context).await?;
        Ok(())
    }

    async fn replace_record(
        &self,
        fqdn: &str,
        name: &str,
        record_type: RecordType,
        body: &RrsetValues,
    ) -> Result<()> {
        let context = format!("PUT record {}/{}", name, record_type);
        let request = self
            .client
            .put(self.record_url(fqdn, name, record_type))
            .json(body);
        self.send(request, &context).await?;
        Ok(())
    }

    async fn replace_records(&self, fqdn: &str, items: &[Rrset]) -> Result<()> {
        let request = self
            .client
            .put(self.records_url(fqdn))
            .json(&RrsetItems { items });
        self.send(request, "PUT records").await?;
        Ok(())
    }
}
