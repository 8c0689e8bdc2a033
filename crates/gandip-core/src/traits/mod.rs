//! Core traits for the updater
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Resolve the current public IP
//! - [`DnsProvider`]: Read and update records via a registrar API
//! - [`Notifier`]: Tell the operator that the zone changed

pub mod dns_provider;
pub mod ip_source;
pub mod notifier;

pub use dns_provider::{DnsProvider, Record, UpdateRequest, UpdateResult};
pub use ip_source::IpSource;
pub use notifier::{Notification, Notifier};
