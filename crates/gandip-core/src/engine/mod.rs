//! Core update engine
//!
//! The Updater is responsible for:
//! - Resolving the current IP for every enabled address family
//! - Handing the desired state to the DnsProvider, which diffs and updates
//! - Notifying the operator once if anything changed
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  IpSource   │─── current IP (per family) ───┐
//! └─────────────┘                               │
//!                                               ▼
//!                                      ┌──────────────┐
//!                                      │   Updater    │
//!                                      └──────────────┘
//!                                               │
//!                     ┌─────────────────────────┴───────────┐
//!                     ▼                                     ▼
//!             ┌──────────────┐                      ┌─────────────┐
//!             │ DnsProvider  │                      │  Notifier   │
//!             │ (diff+update)│                      │ (optional)  │
//!             └──────────────┘                      └─────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. For each enabled family, resolve the current IP
//! 2. Empty answer → skip the family
//! 3. Call `DnsProvider::update_records()` for the family's record type
//! 4. After all families, notify once if any record was created or updated
//!
//! Everything runs sequentially. The first error aborts the run; nothing is
//! retried and nothing already applied is rolled back.

use crate::config::{AddressFamily, UpdaterConfig};
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, IpSource, Notification, Notifier, Record, UpdateRequest, UpdateResult};
use tracing::{debug, error, info, warn};

/// Outcome of one `Updater::run()`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Per-record outcomes, in the order they were reported
    pub results: Vec<UpdateResult>,
    /// Families that were not reconciled (empty IP or unsupported type)
    pub skipped: Vec<AddressFamily>,
    /// Whether a notification was sent
    pub notified: bool,
}

impl RunReport {
    /// Records that were created or updated
    pub fn changes(&self) -> Vec<UpdateResult> {
        self.results
            .iter()
            .filter(|result| result.is_change())
            .cloned()
            .collect()
    }

    /// Whether the run left the zone untouched
    pub fn is_up_to_date(&self) -> bool {
        self.results.iter().all(|result| !result.is_change())
    }
}

/// State of one family as seen by `Updater::status()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyStatus {
    /// Address family
    pub family: AddressFamily,
    /// Address currently reported by the IP source
    pub ip: String,
    /// Matching records currently published
    pub records: Vec<Record>,
}

impl FamilyStatus {
    /// Requested names whose record is missing or carries another value
    pub fn stale(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter(|name| {
                !self
                    .records
                    .iter()
                    .any(|record| &record.name == *name && record.contains(&self.ip))
            })
            .cloned()
            .collect()
    }
}

/// Outcome of `Updater::status()`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// One entry per enabled family
    pub families: Vec<FamilyStatus>,
}

/// Core update engine
///
/// Holds one IP source per enabled address family, the registrar client and
/// an optional notifier. A run is a single pass, there is no loop and no
/// state carried between runs.
pub struct Updater {
    /// IP sources, one per enabled family
    sources: Vec<Box<dyn IpSource>>,

    /// Registrar client
    provider: Box<dyn DnsProvider>,

    /// Change notifier
    notifier: Option<Box<dyn Notifier>>,

    /// Zone (domain) name
    zone: String,

    /// Requested record names
    records: Vec<String>,

    /// TTL for created or replaced records
    ttl: u32,
}

impl Updater {
    /// Create a new updater
    ///
    /// # Parameters
    ///
    /// - `sources`: One IP source per enabled address family
    /// - `provider`: Registrar client
    /// - `config`: Updater configuration
    pub fn new(
        sources: Vec<Box<dyn IpSource>>,
        provider: Box<dyn DnsProvider>,
        config: UpdaterConfig,
    ) -> Result<Self> {
        config.validate()?;

        if sources.is_empty() {
            return Err(Error::config("At least one IP source is required"));
        }

        Ok(Self {
            sources,
            provider,
            notifier: None,
            zone: config.zone,
            records: config.records,
            ttl: config.ttl,
        })
    }

    /// Attach a notifier
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(RunReport)`: Every family was processed
    /// - `Err(Error)`: A resolver, registrar or notifier call failed
    pub async fn run(&self) -> Result<RunReport> {
        info!(
            "Record update started: zone {} via {}",
            self.zone,
            self.provider.provider_name()
        );

        let mut report = RunReport::default();

        for source in &self.sources {
            let family = source.family();
            let record_type = family.record_type();

            if !self.provider.supports_record_type(record_type) {
                warn!(
                    "Provider {} does not manage {} records, skipping {}",
                    self.provider.provider_name(),
                    record_type,
                    family
                );
                report.skipped.push(family);
                continue;
            }

            let ip = source.current().await?;
            debug!("Current {} address is {:?}", family, ip);

            if ip.is_empty() {
                warn!("IP getter returned an empty {} address, skipping", family);
                report.skipped.push(family);
                continue;
            }

            let request = UpdateRequest {
                zone: &self.zone,
                names: &self.records,
                record_type,
                ip: &ip,
                ttl: self.ttl,
            };

            let results = match self.provider.update_records(&request).await {
                Ok(results) => results,
                Err(e) => {
                    error!(
                        "{} update through {} failed: {}",
                        family,
                        self.provider.provider_name(),
                        e
                    );
                    return Err(e);
                }
            };

            for result in &results {
                log_result(record_type, result);
            }

            if results.iter().any(UpdateResult::is_change) {
                info!("{} address has changed since last update. New ip is {}", family, ip);
            } else {
                info!("{} address has not changed", family);
            }

            report.results.extend(results);
        }

        let changes = report.changes();
        if let Some(notifier) = &self.notifier
            && !changes.is_empty()
        {
            let notification = Notification {
                zone: self.zone.clone(),
                changes,
            };
            notifier.notify(&notification).await?;
            report.notified = true;
            info!("Change notification sent for {}", notification.new_ips());
        }

        info!("Record update finished");
        Ok(report)
    }

    /// Read-only view of the current IPs and published records
    pub async fn status(&self) -> Result<StatusReport> {
        let mut report = StatusReport::default();

        for source in &self.sources {
            let family = source.family();
            let ip = source.current().await?;
            let records = self
                .provider
                .get_records(&self.zone, &self.records, family.record_type())
                .await?;

            debug!("{} address is {:?}, {} record(s) found", family, ip, records.len());
            report.families.push(FamilyStatus {
                family,
                ip,
                records,
            });
        }

        Ok(report)
    }

    /// Requested record names
    pub fn records(&self) -> &[String] {
        &self.records
    }
}

fn log_result(record_type: crate::config::RecordType, result: &UpdateResult) {
    match result {
        UpdateResult::Created { name, ip } => {
            info!("Created {} record {} -> {}", record_type, name, ip);
        }
        UpdateResult::Updated { name, previous, ip } => {
            info!(
                "Updated {} record {} -> {} (previous: {:?})",
                record_type, name, ip, previous
            );
        }
        UpdateResult::Unchanged { name, ip } => {
            debug!("{} record {} already up to date ({})", record_type, name, ip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordType;

    #[test]
    fn test_report_changes() {
        let report = RunReport {
            results: vec![
                UpdateResult::Unchanged {
                    name: "@".to_string(),
                    ip: "203.0.113.7".to_string(),
                },
                UpdateResult::Created {
                    name: "www".to_string(),
                    ip: "203.0.113.7".to_string(),
                },
            ],
            skipped: Vec::new(),
            notified: false,
        };

        assert!(!report.is_up_to_date());
        assert_eq!(report.changes().len(), 1);
        assert_eq!(report.changes()[0].name(), "www");
        assert!(RunReport::default().is_up_to_date());
    }

    #[test]
    fn test_family_status_stale() {
        let status = FamilyStatus {
            family: AddressFamily::V4,
            ip: "203.0.113.7".to_string(),
            records: vec![Record {
                name: "@".to_string(),
                record_type: RecordType::A,
                values: vec!["203.0.113.7".to_string()],
                ttl: 10800,
            }],
        };

        let names = vec!["@".to_string(), "www".to_string()];
        assert_eq!(status.stale(&names), vec!["www".to_string()]);
    }
}
