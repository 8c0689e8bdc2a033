// # IP Source Trait
//
// Defines the interface for resolving the caller's current public address.
//
// ## Implementations
//
// - HTTP echo services: `gandip-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use gandip_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("{} address is {}", source.family(), current_ip);
//
//     Ok(())
// }
// ```

use crate::config::AddressFamily;
use async_trait::async_trait;

/// Trait for IP source implementations
///
/// The returned address is an opaque string. It is compared to record values
/// by exact string equality and never parsed.
///
/// # Forbidden Capabilities
/// - ❌ Perform DNS updates (use `DnsProvider`)
/// - ❌ Implement retry logic, a failed lookup aborts the run
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current IP address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The current address, possibly empty if the service
    ///   answered with an empty body
    /// - `Err(Error)`: If the service could not be reached or answered non-2xx
    async fn current(&self) -> Result<String, crate::Error>;

    /// The address family this source resolves
    fn family(&self) -> AddressFamily;
}
