// # Gandi Legacy XML-RPC Provider
//
// This crate provides the provider for the legacy XML-RPC API, where zones
// are versioned and edits are made in a draft version.
//
// ## Update Flow
//
// 1. Find the zone by name (`domain.zone.list`), absent zone = nothing to do
// 2. List the records of the active version, keep the requested A records
// 3. If every requested name already holds exactly the current IP, stop
// 4. `domain.zone.version.new` creates the draft
// 5. Each requested name is looked up again inside the draft: its first A
//    record is rewritten with `domain.zone.record.update` and any further A
//    records of that name are removed with `domain.zone.record.delete`, so
//    the name ends up with the single value `[ip]`
// 6. `domain.zone.version.set` activates the draft
//
// If step 5 or 6 fails the draft is deleted (best effort) and the error is
// returned. The active version is never touched before step 6.
//
// ## Scope
//
// Only A records are managed. Records are matched on name and type, so an
// MX or TXT record sharing a requested name is left alone.

pub mod api;

use api::{RecordFilter, RecordUpdate, XmlRpcZoneApi, Zone, ZoneApi, ZoneRecord};
use async_trait::async_trait;
use gandip_core::config::{DEFAULT_TTL, ProviderConfig, RecordType};
use gandip_core::traits::{DnsProvider, Record, UpdateRequest, UpdateResult};
use gandip_core::{Error, Result};

/// Provider for the versioned-zone XML-RPC API
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, zones and records are read as usual but no
/// version is created, edited or activated.
pub struct ZoneVersionProvider<A = XmlRpcZoneApi> {
    api: A,
    dry_run: bool,
}

impl<A> std::fmt::Debug for ZoneVersionProvider<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneVersionProvider")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl ZoneVersionProvider<XmlRpcZoneApi> {
    /// Create a provider talking to the real API
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, dry_run: bool) -> Result<Self> {
        Ok(Self::with_api(XmlRpcZoneApi::new(api_key, endpoint)?, dry_run))
    }

    /// Create a provider from configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        match config {
            ProviderConfig::XmlRpc {
                api_key,
                endpoint,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!("XML-RPC provider running in DRY-RUN mode - no changes will be made");
                }
                Self::new(api_key.clone(), endpoint.clone(), *dry_run)
            }
            _ => Err(Error::config("Invalid config for XML-RPC provider")),
        }
    }
}

impl<A: ZoneApi> ZoneVersionProvider<A> {
    /// Create a provider over any API implementation
    pub fn with_api(api: A, dry_run: bool) -> Self {
        Self { api, dry_run }
    }

    /// First zone named `name`, if any
    pub async fn get_zone(&self, name: &str) -> Result<Option<Zone>> {
        let zone = self
            .api
            .list_zones()
            .await?
            .into_iter()
            .find(|zone| zone.name == name);
        tracing::debug!("Zone {} is {:?}", name, zone);
        Ok(zone)
    }

    /// First A record named `name` in `version` of the zone
    pub async fn get_record(&self, zone: &Zone, version: i64, name: &str) -> Result<Option<ZoneRecord>> {
        Ok(self.records_named(zone, version, name).await?.into_iter().next())
    }

    /// Every A record named `name` in `version` of the zone
    async fn records_named(&self, zone: &Zone, version: i64, name: &str) -> Result<Vec<ZoneRecord>> {
        let filter = RecordFilter {
            name: Some(name),
            record_type: Some(RecordType::A.as_str()),
        };
        Ok(self
            .api
            .list_records(zone.id, version, filter)
            .await?
            .into_iter()
            .filter(|record| record.name == name && record.record_type == RecordType::A.as_str())
            .collect())
    }

    /// Requested A records of the active version
    async fn matching_records(&self, zone: &Zone, names: &[String]) -> Result<Vec<ZoneRecord>> {
        let all = self
            .api
            .list_records(zone.id, zone.version, RecordFilter::default())
            .await?;
        tracing::debug!("Zone {} version {} has {} record(s)", zone.name, zone.version, all.len());

        Ok(all
            .into_iter()
            .filter(|record| {
                names.contains(&record.name) && record.record_type == RecordType::A.as_str()
            })
            .collect())
    }

    /// Bring every name to the single value `ip` inside the draft
    async fn edit_draft(&self, zone: &Zone, draft: i64, names: &[&str], ip: &str) -> Result<()> {
        for &name in names {
            let records = self.records_named(zone, draft, name).await?;
            let Some((first, extra)) = records.split_first() else {
                tracing::error!(
                    "Did not find record {} in new version {} of zone {}",
                    name,
                    draft,
                    zone.name
                );
                return Err(Error::not_found(format!(
                    "record {} missing from draft version {} of zone {}",
                    name, draft, zone.name
                )));
            };

            let update = RecordUpdate {
                name: name.to_string(),
                record_type: RecordType::A.as_str().to_string(),
                value: ip.to_string(),
            };
            tracing::debug!("Updating record {} (id {}) in draft {}", name, first.id, draft);
            self.api.update_record(zone.id, draft, first.id, &update).await?;

            for record in extra {
                tracing::debug!(
                    "Removing extra value {} of {} (id {}) from draft {}",
                    record.value,
                    name,
                    record.id,
                    draft
                );
                self.api.delete_record(zone.id, draft, record.id).await?;
            }
        }

        Ok(())
    }

    /// Delete an abandoned draft; failures are only logged
    async fn discard(&self, zone: &Zone, draft: i64) {
        match self.api.delete_version(zone.id, draft).await {
            Ok(()) => tracing::warn!("Discarded draft version {} of zone {}", draft, zone.name),
            Err(e) => tracing::warn!(
                "Failed to discard draft version {} of zone {}: {}",
                draft,
                zone.name,
                e
            ),
        }
    }
}

#[async_trait]
impl<A: ZoneApi> DnsProvider for ZoneVersionProvider<A> {
    async fn get_records(
        &self,
        zone: &str,
        names: &[String],
        record_type: RecordType,
    ) -> Result<Vec<Record>> {
        if !self.supports_record_type(record_type) {
            return Ok(Vec::new());
        }
        let Some(zone) = self.get_zone(zone).await? else {
            return Ok(Vec::new());
        };

        let matched = self.matching_records(&zone, names).await?;
        Ok(group_by_name(matched, record_type))
    }

    async fn update_records(&self, request: &UpdateRequest<'_>) -> Result<Vec<UpdateResult>> {
        if !self.supports_record_type(request.record_type) {
            return Err(Error::dns_provider(format!(
                "XML-RPC API only manages A records, not {}",
                request.record_type
            )));
        }

        tracing::info!(
            "Updating XML-RPC A records {:?} in {} -> {} [{}]",
            request.names,
            request.zone,
            request.ip,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        let Some(zone) = self.get_zone(request.zone).await? else {
            tracing::warn!("Zone {} not found, nothing to update", request.zone);
            return Ok(Vec::new());
        };

        let matched = self.matching_records(&zone, request.names).await?;
        if matched.is_empty() {
            tracing::info!(
                "No A record named {:?} in {}, nothing to update",
                request.names,
                zone.name
            );
            return Ok(Vec::new());
        }

        let records = group_by_name(matched, RecordType::A);

        // A name holding the IP next to other values is still rewritten
        let results: Vec<UpdateResult> = records
            .iter()
            .map(|record| {
                if record.values.len() == 1 && record.values[0] == request.ip {
                    UpdateResult::Unchanged {
                        name: record.name.clone(),
                        ip: request.ip.to_string(),
                    }
                } else {
                    UpdateResult::Updated {
                        name: record.name.clone(),
                        previous: record.values.clone(),
                        ip: request.ip.to_string(),
                    }
                }
            })
            .collect();

        if !results.iter().any(UpdateResult::is_change) {
            return Ok(results);
        }

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would create a new version of zone {} and set {:?} to {}",
                zone.name,
                request.names,
                request.ip
            );
            return Ok(results);
        }

        let draft = self.api.new_version(zone.id).await?;
        tracing::info!("Created draft version {} of zone {}", draft, zone.name);

        let names: Vec<&str> = records.iter().map(|record| record.name.as_str()).collect();
        let outcome = match self.edit_draft(&zone, draft, &names, request.ip).await {
            Ok(()) => self.api.set_version(zone.id, draft).await,
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            self.discard(&zone, draft).await;
            return Err(e);
        }

        tracing::info!("Activated version {} of zone {}", draft, zone.name);
        Ok(results)
    }

    fn supports_record_type(&self, record_type: RecordType) -> bool {
        record_type == RecordType::A
    }

    fn provider_name(&self) -> &'static str {
        "xmlrpc"
    }
}

/// Merge zone records sharing a name into one record with several values
fn group_by_name(zone_records: Vec<ZoneRecord>, record_type: RecordType) -> Vec<Record> {
    let mut records: Vec<Record> = Vec::new();
    for zone_record in zone_records {
        match records.iter_mut().find(|r| r.name == zone_record.name) {
            Some(record) => record.values.push(zone_record.value),
            None => records.push(Record {
                name: zone_record.name,
                record_type,
                values: vec![zone_record.value],
                ttl: zone_record
                    .ttl
                    .and_then(|ttl| u32::try_from(ttl).ok())
                    .unwrap_or(DEFAULT_TTL),
            }),
        }
    }
    records
}
