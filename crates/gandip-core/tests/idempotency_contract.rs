//! Contract Test: Reconciliation & Idempotency
//!
//! Constraints verified:
//! - A stale record is rewritten exactly once, to the resolved address
//! - A run with an unchanged address issues no write
//! - Running twice in a row writes nothing the second time

mod common;

use common::*;
use gandip_core::Updater;
use gandip_core::config::{AddressFamily, RecordType};

#[tokio::test]
async fn stale_record_is_updated_exactly_once() {
    let source = MockIpSource::new(AddressFamily::V4, "203.0.113.7");
    let provider = MockDnsProvider::new().with_record("www", RecordType::A, &["203.0.113.5"]);

    let updater = Updater::new(
        vec![Box::new(source)],
        Box::new(provider.clone()),
        minimal_config(&["www"]),
    )
    .expect("updater construction succeeds");

    let report = updater.run().await.expect("run succeeds");

    assert_eq!(provider.write_count(), 1);
    assert_eq!(
        provider.written(),
        vec![("www".to_string(), RecordType::A, "203.0.113.7".to_string())]
    );
    assert_eq!(report.changes().len(), 1);
    assert_eq!(
        provider.values("www", RecordType::A),
        Some(vec!["203.0.113.7".to_string()])
    );
}

#[tokio::test]
async fn matching_record_is_left_untouched() {
    let source = MockIpSource::new(AddressFamily::V4, "203.0.113.7");
    let provider = MockDnsProvider::new().with_record("www", RecordType::A, &["203.0.113.7"]);

    let updater = Updater::new(
        vec![Box::new(source)],
        Box::new(provider.clone()),
        minimal_config(&["www"]),
    )
    .expect("updater construction succeeds");

    let report = updater.run().await.expect("run succeeds");

    assert_eq!(provider.write_count(), 0, "Expected no write for an up-to-date record");
    assert!(report.is_up_to_date());
    assert!(!report.notified);
}

#[tokio::test]
async fn second_run_with_same_ip_writes_nothing() {
    let source = MockIpSource::new(AddressFamily::V4, "203.0.113.7");
    let provider = MockDnsProvider::new().with_record("@", RecordType::A, &["198.51.100.1"]);

    let updater = Updater::new(
        vec![Box::new(source)],
        Box::new(provider.clone()),
        minimal_config(&["@", "www"]),
    )
    .expect("updater construction succeeds");

    let first = updater.run().await.expect("first run succeeds");
    assert_eq!(first.changes().len(), 2, "@ is updated and www is created");
    let writes_after_first = provider.write_count();

    let second = updater.run().await.expect("second run succeeds");

    assert!(second.is_up_to_date());
    assert_eq!(
        provider.write_count(),
        writes_after_first,
        "Second run with an unchanged IP must not write"
    );
}

#[tokio::test]
async fn address_change_between_runs_is_picked_up() {
    let source = MockIpSource::new(AddressFamily::V4, "203.0.113.7");
    let provider = MockDnsProvider::new();

    let updater = Updater::new(
        vec![Box::new(source.clone())],
        Box::new(provider.clone()),
        minimal_config(&["home"]),
    )
    .expect("updater construction succeeds");

    updater.run().await.expect("first run succeeds");
    source.set_ip("203.0.113.9");
    let report = updater.run().await.expect("second run succeeds");

    assert_eq!(provider.write_count(), 2);
    assert_eq!(
        report.results,
        vec![gandip_core::UpdateResult::Updated {
            name: "home".to_string(),
            previous: vec!["203.0.113.7".to_string()],
            ip: "203.0.113.9".to_string(),
        }]
    );
}

#[tokio::test]
async fn status_does_not_write() {
    let source = MockIpSource::new(AddressFamily::V4, "203.0.113.7");
    let provider = MockDnsProvider::new().with_record("www", RecordType::A, &["203.0.113.5"]);

    let updater = Updater::new(
        vec![Box::new(source)],
        Box::new(provider.clone()),
        minimal_config(&["@", "www"]),
    )
    .expect("updater construction succeeds");

    let status = updater.status().await.expect("status succeeds");

    assert_eq!(provider.update_call_count(), 0);
    assert_eq!(status.families.len(), 1);
    assert_eq!(status.families[0].records.len(), 1);
    assert_eq!(
        status.families[0].stale(updater.records()),
        vec!["@".to_string(), "www".to_string()]
    );
}
