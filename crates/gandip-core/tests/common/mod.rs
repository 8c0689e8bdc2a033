//! Test doubles and common utilities for updater contract tests
//!
//! The doubles share their counters through `Arc`, so a test keeps a clone
//! and hands another clone to the `Updater`.

#![allow(dead_code)]

use gandip_core::config::{AddressFamily, IpGetterConfig, RecordType, UpdaterConfig};
use gandip_core::error::{Error, Result};
use gandip_core::traits::{
    DnsProvider, IpSource, Notification, Notifier, Record, UpdateRequest, UpdateResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IP source answering with a fixed (but replaceable) address
#[derive(Clone)]
pub struct MockIpSource {
    family: AddressFamily,
    ip: Arc<Mutex<Result<String>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockIpSource {
    pub fn new(family: AddressFamily, ip: &str) -> Self {
        Self {
            family,
            ip: Arc::new(Mutex::new(Ok(ip.to_string()))),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose every lookup fails
    pub fn failing(family: AddressFamily) -> Self {
        let source = Self::new(family, "");
        *source.ip.lock().unwrap() = Err(Error::ip_source("connection refused"));
        source
    }

    /// Change the address returned by subsequent lookups
    pub fn set_ip(&self, ip: &str) {
        *self.ip.lock().unwrap() = Ok(ip.to_string());
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for MockIpSource {
    async fn current(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match &*self.ip.lock().unwrap() {
            Ok(ip) => Ok(ip.clone()),
            Err(e) => Err(Error::ip_source(e.to_string())),
        }
    }

    fn family(&self) -> AddressFamily {
        self.family
    }
}

/// An in-memory zone with per-record create/replace semantics
#[derive(Clone)]
pub struct MockDnsProvider {
    zone: Arc<Mutex<HashMap<(String, RecordType), Vec<String>>>>,
    update_call_count: Arc<AtomicUsize>,
    write_count: Arc<AtomicUsize>,
    written: Arc<Mutex<Vec<(String, RecordType, String)>>>,
    supported: Vec<RecordType>,
    fail_with: Option<fn() -> Error>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            zone: Arc::new(Mutex::new(HashMap::new())),
            update_call_count: Arc::new(AtomicUsize::new(0)),
            write_count: Arc::new(AtomicUsize::new(0)),
            written: Arc::new(Mutex::new(Vec::new())),
            supported: vec![RecordType::A, RecordType::Aaaa],
            fail_with: None,
        }
    }

    /// Only manage the given record types
    pub fn supporting(mut self, supported: &[RecordType]) -> Self {
        self.supported = supported.to_vec();
        self
    }

    /// Fail every update_records() call
    pub fn failing(self) -> Self {
        self.failing_with(|| Error::provider("mock", "registrar unavailable"))
    }

    /// Fail every update_records() call with the given error
    pub fn failing_with(mut self, error: fn() -> Error) -> Self {
        self.fail_with = Some(error);
        self
    }

    /// Seed a published record
    pub fn with_record(self, name: &str, record_type: RecordType, values: &[&str]) -> Self {
        self.zone.lock().unwrap().insert(
            (name.to_string(), record_type),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Published values of a record
    pub fn values(&self, name: &str, record_type: RecordType) -> Option<Vec<String>> {
        self.zone
            .lock()
            .unwrap()
            .get(&(name.to_string(), record_type))
            .cloned()
    }

    /// Get the number of times update_records() was called
    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of create/replace writes
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Every write as (name, type, value)
    pub fn written(&self) -> Vec<(String, RecordType, String)> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn get_records(
        &self,
        _zone: &str,
        names: &[String],
        record_type: RecordType,
    ) -> Result<Vec<Record>> {
        let zone = self.zone.lock().unwrap();
        Ok(names
            .iter()
            .filter_map(|name| {
                zone.get(&(name.clone(), record_type)).map(|values| Record {
                    name: name.clone(),
                    record_type,
                    values: values.clone(),
                    ttl: 10800,
                })
            })
            .collect())
    }

    async fn update_records(&self, request: &UpdateRequest<'_>) -> Result<Vec<UpdateResult>> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.fail_with {
            return Err(error());
        }

        let mut zone = self.zone.lock().unwrap();
        let mut results = Vec::new();

        for name in request.names {
            let key = (name.clone(), request.record_type);
            let result = match zone.get(&key) {
                Some(values) if values.iter().any(|v| v == request.ip) => {
                    UpdateResult::Unchanged {
                        name: name.clone(),
                        ip: request.ip.to_string(),
                    }
                }
                Some(values) => UpdateResult::Updated {
                    name: name.clone(),
                    previous: values.clone(),
                    ip: request.ip.to_string(),
                },
                None => UpdateResult::Created {
                    name: name.clone(),
                    ip: request.ip.to_string(),
                },
            };

            if result.is_change() {
                zone.insert(key, vec![request.ip.to_string()]);
                self.write_count.fetch_add(1, Ordering::SeqCst);
                self.written.lock().unwrap().push((
                    name.clone(),
                    request.record_type,
                    request.ip.to_string(),
                ));
            }
            results.push(result);
        }

        Ok(results)
    }

    fn supports_record_type(&self, record_type: RecordType) -> bool {
        self.supported.contains(&record_type)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A notifier that records what it was asked to send
#[derive(Clone)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    fail: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// A notifier whose delivery always fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Notifications delivered (or attempted, for a failing notifier)
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err(Error::notify("535 authentication failed"));
        }
        Ok(())
    }
}

/// Helper to create a minimal UpdaterConfig for testing
pub fn minimal_config(records: &[&str]) -> UpdaterConfig {
    UpdaterConfig::new("example.com", records.iter().map(|r| r.to_string()).collect())
        .with_ip_getters(IpGetterConfig::default())
}
