// # gandip-core
//
// Core library for the Gandi dynamic-DNS updater.
//
// ## Architecture Overview
//
// One invocation performs a single reconciliation pass:
// - **IpSource**: Resolves the caller's current public IP for one address family
// - **DnsProvider**: Reads and updates records through a registrar API
// - **Notifier**: Reports a change to the operator once the zone was updated
// - **Updater**: Orchestrates IP resolution → provider diff/update → notification
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Orchestration is separate from the registrar clients
// 2. **Interchangeable Backends**: Both registrar APIs implement `DnsProvider`
// 3. **Explicit Configuration**: Every component is built from a config value, no globals
// 4. **Fail Fast**: No retries, the first failure aborts the run
// 5. **Idempotency**: A second run with an unchanged IP issues no update call

pub mod config;
pub mod engine;
pub mod error;
pub mod traits;

// Re-export core types for convenience
pub use config::{
    AddressFamily, IpGetterConfig, ProviderConfig, RecordType, SmtpConfig, UpdateMode,
    UpdaterConfig,
};
pub use engine::{FamilyStatus, RunReport, StatusReport, Updater};
pub use error::{Error, Result};
pub use traits::{DnsProvider, IpSource, Notification, Notifier, Record, UpdateRequest, UpdateResult};
