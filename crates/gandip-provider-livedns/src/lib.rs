// # Gandi LiveDNS Provider
//
// This crate provides the LiveDNS (JSON over HTTPS) provider for the updater.
//
// ## Update Modes
//
// - **Per record** (`UpdateMode::PerRecord`): each requested name is fetched
//   on its own. A record that already lists the current IP among its values
//   is skipped, a missing record is created (POST) and any other record is
//   replaced (PUT) with `[ip]` and the configured TTL. Records are independent,
//   a failure halfway leaves the earlier ones updated.
//
// - **Batch** (`UpdateMode::Batch`): the whole zone is listed once and filtered
//   to the requested names and record type. If *any* of them carries a value
//   other than the current IP, *all* of them are rewritten in a single PUT,
//   including the ones that were already correct. Requested names missing
//   from the zone are not created in this mode.
//
//   LiveDNS treats `PUT /domains/{fqdn}/records` as a replacement of the
//   zone's entire record list: any rrset left out of the body is deleted.
//   The batch therefore carries every rrset of the listing, untouched except
//   for the requested ones.
//
//   The two modes disagree on purpose: both behaviours exist in deployed
//   versions of this tool and neither is documented as authoritative, so the
//   batch semantics are kept as-is rather than aligned with per-record mode.
//
// ## Error Handling
//
// No retries. Any transport failure or non-2xx answer aborts the update,
// except a 404 on a single-record GET, which means "record does not exist".
//
// ## Security Requirements
//
// - API key NEVER appears in logs
// - Provider MUST fail fast if the key is empty

pub mod api;

use api::{HttpLiveDnsApi, LiveDnsApi, Rrset, RrsetValues};
use async_trait::async_trait;
use gandip_core::config::{ProviderConfig, RecordType, UpdateMode};
use gandip_core::traits::{DnsProvider, Record, UpdateRequest, UpdateResult};
use gandip_core::{Error, Result};

/// LiveDNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests
/// - Log the intended POST/PUT payloads
/// - **NOT** actually modify DNS records
pub struct LiveDnsProvider<A = HttpLiveDnsApi> {
    /// API client
    api: A,

    /// Per-record or batch updates
    mode: UpdateMode,

    /// Dry-run mode: if true, perform GET requests but skip POST/PUT
    dry_run: bool,
}

impl<A> std::fmt::Debug for LiveDnsProvider<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveDnsProvider")
            .field("mode", &self.mode)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl LiveDnsProvider<HttpLiveDnsApi> {
    /// Create a provider talking to the real API
    ///
    /// # Parameters
    ///
    /// - `api_key`: LiveDNS API key
    /// - `base_url`: API base URL
    /// - `mode`: Per-record or batch updates
    /// - `dry_run`: If true, perform GET requests but skip POST/PUT
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        mode: UpdateMode,
        dry_run: bool,
    ) -> Result<Self> {
        Ok(Self::with_api(
            HttpLiveDnsApi::new(api_key, base_url)?,
            mode,
            dry_run,
        ))
    }

    /// Create a provider from configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        match config {
            ProviderConfig::LiveDns {
                api_key,
                base_url,
                mode,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!("LiveDNS provider running in DRY-RUN mode - no changes will be made");
                }
                Self::new(api_key.clone(), base_url.clone(), *mode, *dry_run)
            }
            _ => Err(Error::config("Invalid config for LiveDNS provider")),
        }
    }
}

impl<A: LiveDnsApi> LiveDnsProvider<A> {
    /// Create a provider over any API implementation
    pub fn with_api(api: A, mode: UpdateMode, dry_run: bool) -> Self {
        Self { api, mode, dry_run }
    }

    /// The configured update mode
    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    /// Fetch one record by name; `None` if it does not exist
    pub async fn get_record_by_name(
        &self,
        fqdn: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<Rrset>> {
        let rrset = self.api.get_record(fqdn, name, record_type).await?;
        tracing::debug!("Record {}/{} in {} is {:?}", name, record_type, fqdn, rrset);
        Ok(rrset)
    }

    async fn update_per_record(&self, request: &UpdateRequest<'_>) -> Result<Vec<UpdateResult>> {
        let mut results = Vec::with_capacity(request.names.len());

        for name in request.names {
            let existing = self
                .get_record_by_name(request.zone, name, request.record_type)
                .await?;

            if let Some(rrset) = &existing
                && rrset.rrset_values.iter().any(|value| value == request.ip)
            {
                results.push(UpdateResult::Unchanged {
                    name: name.clone(),
                    ip: request.ip.to_string(),
                });
                continue;
            }

            let body = RrsetValues {
                rrset_ttl: request.ttl,
                rrset_values: vec![request.ip.to_string()],
            };

            let result = match existing {
                None => {
                    if self.dry_run {
                        tracing::info!(
                            "[DRY-RUN] Would POST {}/{} with payload: {:?}",
                            name,
                            request.record_type,
                            body
                        );
                    } else {
                        self.api
                            .create_record(request.zone, name, request.record_type, &body)
                            .await?;
                    }
                    UpdateResult::Created {
                        name: name.clone(),
                        ip: request.ip.to_string(),
                    }
                }
                Some(rrset) => {
                    if self.dry_run {
                        tracing::info!(
                            "[DRY-RUN] Would PUT {}/{} with payload: {:?}",
                            name,
                            request.record_type,
                            body
                        );
                    } else {
                        self.api
                            .replace_record(request.zone, name, request.record_type, &body)
                            .await?;
                    }
                    UpdateResult::Updated {
                        name: name.clone(),
                        previous: rrset.rrset_values,
                        ip: request.ip.to_string(),
                    }
                }
            };

            results.push(result);
        }

        Ok(results)
    }

    async fn update_batch(&self, request: &UpdateRequest<'_>) -> Result<Vec<UpdateResult>> {
        let zone = self.api.list_records(request.zone).await?;
        tracing::debug!("Zone {} has {} rrset(s)", request.zone, zone.len());

        let matched: Vec<Rrset> = zone
            .iter()
            .filter(|rrset| is_requested(rrset, request.names, request.record_type))
            .cloned()
            .collect();

        if matched.is_empty() {
            tracing::info!(
                "No {} record named {:?} in {}, nothing to update",
                request.record_type,
                request.names,
                request.zone
            );
            return Ok(Vec::new());
        }

        let stale = matched
            .iter()
            .filter_map(Rrset::to_record)
            .any(|record| record.differs_from(request.ip));

        if !stale {
            return Ok(matched
                .into_iter()
                .map(|rrset| UpdateResult::Unchanged {
                    name: rrset.rrset_name,
                    ip: request.ip.to_string(),
                })
                .collect());
        }

        let items: Vec<Rrset> = zone
            .into_iter()
            .map(|rrset| {
                if is_requested(&rrset, request.names, request.record_type) {
                    Rrset {
                        rrset_ttl: Some(request.ttl),
                        rrset_values: vec![request.ip.to_string()],
                        ..rrset
                    }
                } else {
                    rrset
                }
            })
            .collect();

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would PUT {} rrset(s) in one batch, {} rewritten: {:?}",
                items.len(),
                matched.len(),
                items
            );
        } else {
            tracing::debug!(
                "Rewriting {} of {} rrset(s) in one batch",
                matched.len(),
                items.len()
            );
            self.api.replace_records(request.zone, &items).await?;
        }

        Ok(matched
            .into_iter()
            .map(|rrset| UpdateResult::Updated {
                name: rrset.rrset_name,
                previous: rrset.rrset_values,
                ip: request.ip.to_string(),
            })
            .collect())
    }

    async fn matching_records(
        &self,
        fqdn: &str,
        names: &[String],
        record_type: RecordType,
    ) -> Result<Vec<Rrset>> {
        let all = self.api.list_records(fqdn).await?;
        tracing::debug!("Zone {} has {} rrset(s)", fqdn, all.len());

        Ok(all
            .into_iter()
            .filter(|rrset| is_requested(rrset, names, record_type))
            .collect())
    }
}

fn is_requested(rrset: &Rrset, names: &[String], record_type: RecordType) -> bool {
    names.contains(&rrset.rrset_name) && rrset.rrset_type == record_type.as_str()
}

#[async_trait]
impl<A: LiveDnsApi> DnsProvider for LiveDnsProvider<A> {
    async fn get_records(
        &self,
        zone: &str,
        names: &[String],
        record_type: RecordType,
    ) -> Result<Vec<Record>> {
        let rrsets = match self.mode {
            UpdateMode::Batch => self.matching_records(zone, names, record_type).await?,
            UpdateMode::PerRecord => {
                let mut found = Vec::new();
                for name in names {
                    if let Some(rrset) = self.get_record_by_name(zone, name, record_type).await? {
                        found.push(rrset);
                    }
                }
                found
            }
        };

        Ok(rrsets.iter().filter_map(Rrset::to_record).collect())
    }

    async fn update_records(&self, request: &UpdateRequest<'_>) -> Result<Vec<UpdateResult>> {
        tracing::info!(
            "Updating LiveDNS {} records {:?} in {} -> {} [mode: {:?}, {}]",
            request.record_type,
            request.names,
            request.zone,
            request.ip,
            self.mode,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        match self.mode {
            UpdateMode::PerRecord => self.update_per_record(request).await,
            UpdateMode::Batch => self.update_batch(request).await,
        }
    }

    fn provider_name(&self) -> &'static str {
        "livedns"
    }
}
