// # DNS Provider Trait
//
// Defines the interface for reading and updating records via a registrar API.
//
// ## Implementations
//
// - LiveDNS JSON API: `gandip-provider-livedns` crate
// - Legacy XML-RPC API (versioned zones): `gandip-provider-xmlrpc` crate
//
// ## Usage
//
// ```rust,ignore
// use gandip_core::{DnsProvider, RecordType, UpdateRequest};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//     let names = vec!["@".to_string(), "www".to_string()];
//
//     let results = provider.update_records(&UpdateRequest {
//         zone: "example.com",
//         names: &names,
//         record_type: RecordType::A,
//         ip: "203.0.113.7",
//         ttl: 10800,
//     }).await?;
//
//     Ok(())
// }
// ```

use crate::config::RecordType;
use async_trait::async_trait;

/// A record as published in the zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Record name, relative to the zone
    pub name: String,
    /// Record type, determines the address family of `values`
    pub record_type: RecordType,
    /// Published values, in registrar order
    pub values: Vec<String>,
    /// Time-to-live in seconds
    pub ttl: u32,
}

impl Record {
    /// Whether `ip` is among the published values
    pub fn contains(&self, ip: &str) -> bool {
        self.values.iter().any(|value| value == ip)
    }

    /// Whether any published value differs from `ip`
    pub fn differs_from(&self, ip: &str) -> bool {
        self.values.is_empty() || self.values.iter().any(|value| value != ip)
    }
}

/// One reconciliation request for a single record type
#[derive(Debug, Clone, Copy)]
pub struct UpdateRequest<'a> {
    /// Zone (domain) name
    pub zone: &'a str,
    /// Requested record names
    pub names: &'a [String],
    /// Record type to manage
    pub record_type: RecordType,
    /// Desired value
    pub ip: &'a str,
    /// TTL for created or replaced records
    pub ttl: u32,
}

/// Outcome for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    /// Record did not exist and was created
    Created {
        /// Record name
        name: String,
        /// The new value
        ip: String,
    },
    /// Record existed with other value(s) and was rewritten
    Updated {
        /// Record name
        name: String,
        /// Values before the update
        previous: Vec<String>,
        /// The new value
        ip: String,
    },
    /// Record already carried the address (no-op)
    Unchanged {
        /// Record name
        name: String,
        /// The current value
        ip: String,
    },
}

impl UpdateResult {
    /// Record name
    pub fn name(&self) -> &str {
        match self {
            UpdateResult::Created { name, .. }
            | UpdateResult::Updated { name, .. }
            | UpdateResult::Unchanged { name, .. } => name,
        }
    }

    /// Address the record carries after the run
    pub fn ip(&self) -> &str {
        match self {
            UpdateResult::Created { ip, .. }
            | UpdateResult::Updated { ip, .. }
            | UpdateResult::Unchanged { ip, .. } => ip,
        }
    }

    /// Whether the zone was modified for this record
    pub fn is_change(&self) -> bool {
        !matches!(self, UpdateResult::Unchanged { .. })
    }
}

/// Trait for registrar API clients
///
/// Both registrar generations implement this so the `Updater` never has to
/// know which one it is talking to. Each implementation owns its own diff
/// granularity (per record, any-differs batch, versioned draft).
///
/// # Forbidden Capabilities
/// - ❌ Implement retry logic or backoff, errors go straight to the caller
/// - ❌ Cache state between runs
/// - ❌ Resolve IP addresses (owned by `IpSource`)
///
/// A zone or record that does not exist is "nothing to do" or "create it",
/// never an error, unless the implementation documents otherwise.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Fetch the current state of the requested records
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Record>)`: The records that exist; missing names are omitted
    /// - `Err(Error)`: If the request failed
    async fn get_records(
        &self,
        zone: &str,
        names: &[String],
        record_type: RecordType,
    ) -> Result<Vec<Record>, crate::Error>;

    /// Bring the requested records to `request.ip`
    ///
    /// # Idempotency
    ///
    /// Calling this twice with the same request must not issue any
    /// mutating call the second time.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<UpdateResult>)`: One entry per record considered
    /// - `Err(Error)`: If any request failed
    async fn update_records(
        &self,
        request: &UpdateRequest<'_>,
    ) -> Result<Vec<UpdateResult>, crate::Error>;

    /// Check if this provider can manage the given record type
    fn supports_record_type(&self, _record_type: RecordType) -> bool {
        true
    }

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
