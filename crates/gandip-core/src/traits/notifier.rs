use crate::traits::UpdateResult;
use async_trait::async_trait;

/// What changed during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Zone the records belong to
    pub zone: String,
    /// Created or updated records only
    pub changes: Vec<UpdateResult>,
}

impl Notification {
    /// The distinct new addresses, in first-seen order, joined by ", "
    pub fn new_ips(&self) -> String {
        let mut ips: Vec<&str> = Vec::new();
        for change in &self.changes {
            if !ips.contains(&change.ip()) {
                ips.push(change.ip());
            }
        }
        ips.join(", ")
    }
}

/// Trait for change notifiers
///
/// Called at most once per run, after every DNS update has been applied.
/// A failure is reported to the caller but the DNS changes stay in place.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification
    async fn notify(&self, notification: &Notification) -> Result<(), crate::Error>;
}
