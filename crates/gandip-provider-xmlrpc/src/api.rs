//! Legacy zone API over XML-RPC
//!
//! Every method takes the API key as its first parameter. Zones are
//! versioned: edits go into a draft version which is then made active.
//!
//! ## Methods
//!
//! - `domain.zone.list`            zones of the account
//! - `domain.zone.record.list`     records of one zone version, optionally filtered
//! - `domain.zone.version.new`     create a draft copy of the active version
//! - `domain.zone.record.update`   rewrite one record of a draft
//! - `domain.zone.record.delete`   remove one record from a draft
//! - `domain.zone.version.set`     activate a version
//! - `domain.zone.version.delete`  delete an inactive version
//!
//! Request encoding and response decoding, faults included, are done by
//! `serde_xmlrpc`. A `<fault>` answer becomes [`Error::Fault`].

use async_trait::async_trait;
use gandip_core::{Error, Result};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_xmlrpc::Value;
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A zone as listed by `domain.zone.list`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    /// Active version
    pub version: i64,
}

/// A record as listed by `domain.zone.record.list`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZoneRecord {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
    #[serde(default)]
    pub ttl: Option<i64>,
}

/// Record filter for `domain.zone.record.list`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter<'a> {
    pub name: Option<&'a str>,
    pub record_type: Option<&'a str>,
}

impl RecordFilter<'_> {
    fn to_value(self) -> Value {
        let mut members = Vec::new();
        if let Some(name) = self.name {
            members.push(("name", Value::String(name.to_string())));
        }
        if let Some(record_type) = self.record_type {
            members.push(("type", Value::String(record_type.to_string())));
        }
        structure(members)
    }
}

/// New content for `domain.zone.record.update`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub name: String,
    pub record_type: String,
    pub value: String,
}

impl RecordUpdate {
    fn to_value(&self) -> Value {
        structure([
            ("name", Value::String(self.name.clone())),
            ("type", Value::String(self.record_type.clone())),
            ("value", Value::String(self.value.clone())),
        ])
    }
}

/// The zone operations the provider relies on
#[async_trait]
pub trait ZoneApi: Send + Sync {
    async fn list_zones(&self) -> Result<Vec<Zone>>;

    async fn list_records(
        &self,
        zone_id: i64,
        version: i64,
        filter: RecordFilter<'_>,
    ) -> Result<Vec<ZoneRecord>>;

    /// Create a draft copy of the active version, returns its number
    async fn new_version(&self, zone_id: i64) -> Result<i64>;

    async fn update_record(
        &self,
        zone_id: i64,
        version: i64,
        record_id: i64,
        update: &RecordUpdate,
    ) -> Result<()>;

    async fn delete_record(&self, zone_id: i64, version: i64, record_id: i64) -> Result<()>;

    async fn set_version(&self, zone_id: i64, version: i64) -> Result<()>;

    async fn delete_version(&self, zone_id: i64, version: i64) -> Result<()>;
}

/// reqwest-backed XML-RPC client
pub struct XmlRpcZoneApi {
    /// API key
    /// ⚠️ NEVER log this value
    api_key: String,

    endpoint: String,

    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for XmlRpcZoneApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlRpcZoneApi")
            .field("api_key", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl XmlRpcZoneApi {
    /// Create a new client
    ///
    /// # Security
    ///
    /// The API key will NEVER be logged or displayed in error messages.
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("XML-RPC API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Build the parameter list of a call, the API key first
    fn params(&self, rest: impl IntoIterator<Item = Value>) -> Vec<Value> {
        std::iter::once(Value::String(self.api_key.clone()))
            .chain(rest)
            .collect()
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        tracing::debug!("XML-RPC call {}", method);

        let body = serde_xmlrpc::request_to_string(method, params)
            .map_err(|e| Error::protocol(format!("{}: cannot encode call: {}", method, e)))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::provider("xmlrpc", format!("{}: HTTP request failed: {}", method, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::provider("xmlrpc", format!("{}: failed to read response: {}", method, e)))?;

        if !status.is_success() {
            return Err(Error::from_status("xmlrpc", status.as_u16(), method, &text));
        }

        decode_response(method, &text)
    }
}

#[async_trait]
impl ZoneApi for XmlRpcZoneApi {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.call("domain.zone.list", self.params([])).await
    }

    async fn list_records(
        &self,
        zone_id: i64,
        version: i64,
        filter: RecordFilter<'_>,
    ) -> Result<Vec<ZoneRecord>> {
        let params = self.params([int(zone_id)?, int(version)?, filter.to_value()]);
        self.call("domain.zone.record.list", params).await
    }

    async fn new_version(&self, zone_id: i64) -> Result<i64> {
        self.call("domain.zone.version.new", self.params([int(zone_id)?]))
            .await
    }

    async fn update_record(
        &self,
        zone_id: i64,
        version: i64,
        record_id: i64,
        update: &RecordUpdate,
    ) -> Result<()> {
        let params = self.params([
            int(zone_id)?,
            int(version)?,
            structure([("id", int(record_id)?)]),
            update.to_value(),
        ]);
        let _: IgnoredAny = self.call("domain.zone.record.update", params).await?;
        Ok(())
    }

    async fn delete_record(&self, zone_id: i64, version: i64, record_id: i64) -> Result<()> {
        let params = self.params([
            int(zone_id)?,
            int(version)?,
            structure([("id", int(record_id)?)]),
        ]);
        let _: IgnoredAny = self.call("domain.zone.record.delete", params).await?;
        Ok(())
    }

    async fn set_version(&self, zone_id: i64, version: i64) -> Result<()> {
        let params = self.params([int(zone_id)?, int(version)?]);
        let _: IgnoredAny = self.call("domain.zone.version.set", params).await?;
        Ok(())
    }

    async fn delete_version(&self, zone_id: i64, version: i64) -> Result<()> {
        let params = self.params([int(zone_id)?, int(version)?]);
        let _: IgnoredAny = self.call("domain.zone.version.delete", params).await?;
        Ok(())
    }
}

/// Decode a `methodResponse` body, mapping `<fault>` to [`Error::Fault`]
fn decode_response<T: DeserializeOwned>(method: &str, text: &str) -> Result<T> {
    serde_xmlrpc::response_from_str(text).map_err(|e| match e {
        serde_xmlrpc::Error::Fault(fault) => {
            Error::fault(i64::from(fault.fault_code), fault.fault_string)
        }
        other => Error::protocol(format!("{}: {}", method, other)),
    })
}

/// Ids and version numbers travel as 32-bit `<int>`
fn int(value: i64) -> Result<Value> {
    i32::try_from(value)
        .map(Value::Int)
        .map_err(|_| Error::protocol(format!("{} does not fit in an XML-RPC int", value)))
}

fn structure<'a>(members: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
    Value::Struct(
        members
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}
