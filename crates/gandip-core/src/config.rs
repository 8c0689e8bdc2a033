//! Configuration types for the updater
//!
//! Every component is constructed from one of these value objects. Nothing in
//! the workspace reads process-wide mutable configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default record TTL in seconds (3 hours)
pub const DEFAULT_TTL: u32 = 10800;

/// Default IPv4 address echo service
pub const DEFAULT_IPV4_GETTER: &str = "https://api.ipify.org";

/// Default IPv6 address echo service
pub const DEFAULT_IPV6_GETTER: &str = "https://api6.ipify.org";

/// Default base URL of the LiveDNS JSON API
pub const DEFAULT_LIVEDNS_URL: &str = "https://dns.api.gandi.net/api/v5";

/// Default endpoint of the legacy XML-RPC API
pub const DEFAULT_XMLRPC_URL: &str = "https://rpc.gandi.net/xmlrpc/";

/// Default SMTP submission port
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Default subject and body of the change notification
pub const DEFAULT_MAIL_TEMPLATE: &str = "Home's IP address has changed to {ip}";

/// Updater configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Zone (domain) the records live in, e.g. "example.com"
    pub zone: String,

    /// Record names to keep up to date, relative to the zone ("@", "www", ...)
    pub records: Vec<String>,

    /// TTL written with every created or replaced record
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Address echo services, one per family
    #[serde(default)]
    pub ip_getters: IpGetterConfig,
}

impl UpdaterConfig {
    /// Create a new configuration with default TTL and IP getters
    pub fn new(zone: impl Into<String>, records: Vec<String>) -> Self {
        Self {
            zone: zone.into(),
            records,
            ttl: DEFAULT_TTL,
            ip_getters: IpGetterConfig::default(),
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the IP getters
    pub fn with_ip_getters(mut self, ip_getters: IpGetterConfig) -> Self {
        self.ip_getters = ip_getters;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone.trim().is_empty() {
            return Err(crate::Error::config("Zone cannot be empty"));
        }

        if self.records.is_empty() {
            return Err(crate::Error::config("No records configured"));
        }

        if let Some(name) = self.records.iter().find(|name| name.trim().is_empty()) {
            return Err(crate::Error::config(format!(
                "Record name cannot be empty: {:?}",
                name
            )));
        }

        if self.ttl == 0 {
            return Err(crate::Error::config("TTL must be > 0"));
        }

        self.ip_getters.validate()
    }
}

/// IP getter URLs per address family
///
/// A `None` entry disables that family for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpGetterConfig {
    /// URL answering with the caller's IPv4 address
    pub ipv4: Option<String>,
    /// URL answering with the caller's IPv6 address
    pub ipv6: Option<String>,
}

impl IpGetterConfig {
    /// URL for a family, if that family is enabled
    pub fn url_for(&self, family: AddressFamily) -> Option<&str> {
        match family {
            AddressFamily::V4 => self.ipv4.as_deref(),
            AddressFamily::V6 => self.ipv6.as_deref(),
        }
    }

    /// Families enabled in this configuration, IPv4 first
    pub fn enabled_families(&self) -> Vec<AddressFamily> {
        AddressFamily::ALL
            .into_iter()
            .filter(|family| self.url_for(*family).is_some())
            .collect()
    }

    /// Validate the getter URLs
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ipv4.is_none() && self.ipv6.is_none() {
            return Err(crate::Error::config(
                "Both IPv4 and IPv6 are disabled, nothing to update",
            ));
        }

        for url in [&self.ipv4, &self.ipv6].into_iter().flatten() {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "IP getter URL must use HTTP or HTTPS scheme. Got: {}",
                    url
                )));
            }
        }

        Ok(())
    }
}

impl Default for IpGetterConfig {
    fn default() -> Self {
        Self {
            ipv4: Some(DEFAULT_IPV4_GETTER.to_string()),
            ipv6: Some(DEFAULT_IPV6_GETTER.to_string()),
        }
    }
}

/// IP address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

impl AddressFamily {
    /// Both families, in the order they are processed
    pub const ALL: [AddressFamily; 2] = [AddressFamily::V4, AddressFamily::V6];

    /// The record type carrying addresses of this family
    pub fn record_type(self) -> RecordType {
        match self {
            AddressFamily::V4 => RecordType::A,
            AddressFamily::V6 => RecordType::Aaaa,
        }
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    #[serde(rename = "A")]
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name of the type, as both registrar APIs spell it
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Parse a wire name; anything other than A/AAAA is not managed here
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "A" => Some(RecordType::A),
            "AAAA" => Some(RecordType::Aaaa),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the LiveDNS client applies changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// One GET per requested record, then POST (absent) or PUT (stale)
    #[default]
    PerRecord,

    /// One listing of the whole zone, then a single PUT of every requested
    /// record as soon as any of them is stale
    Batch,
}

/// Registrar API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// LiveDNS JSON API
    LiveDns {
        /// API key sent as `X-Api-Key`
        api_key: String,
        /// Base URL of the API
        #[serde(default = "default_livedns_url")]
        base_url: String,
        /// Per-record or batch updates
        #[serde(default)]
        mode: UpdateMode,
        /// Perform reads only, log the writes that would happen
        #[serde(default)]
        dry_run: bool,
    },

    /// Legacy XML-RPC API with versioned zones
    XmlRpc {
        /// API key passed as the first argument of every call
        api_key: String,
        /// XML-RPC endpoint
        #[serde(default = "default_xmlrpc_url")]
        endpoint: String,
        /// Perform reads only, log the writes that would happen
        #[serde(default)]
        dry_run: bool,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        let (api_key, url) = match self {
            ProviderConfig::LiveDns {
                api_key, base_url, ..
            } => (api_key, base_url),
            ProviderConfig::XmlRpc {
                api_key, endpoint, ..
            } => (api_key, endpoint),
        };

        if api_key.trim().is_empty() {
            return Err(crate::Error::config("API key cannot be empty"));
        }

        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "{} API URL must use HTTP or HTTPS scheme. Got: {}",
                self.type_name(),
                url
            )));
        }

        Ok(())
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ProviderConfig::LiveDns { .. } => "livedns",
            ProviderConfig::XmlRpc { .. } => "xmlrpc",
        }
    }

    /// Whether mutations are suppressed
    pub fn dry_run(&self) -> bool {
        match self {
            ProviderConfig::LiveDns { dry_run, .. } | ProviderConfig::XmlRpc { dry_run, .. } => {
                *dry_run
            }
        }
    }
}

// The API key never appears in Debug output
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::LiveDns {
                base_url,
                mode,
                dry_run,
                ..
            } => f
                .debug_struct("LiveDns")
                .field("api_key", &"<REDACTED>")
                .field("base_url", base_url)
                .field("mode", mode)
                .field("dry_run", dry_run)
                .finish(),
            ProviderConfig::XmlRpc {
                endpoint, dry_run, ..
            } => f
                .debug_struct("XmlRpc")
                .field("api_key", &"<REDACTED>")
                .field("endpoint", endpoint)
                .field("dry_run", dry_run)
                .finish(),
        }
    }
}

/// SMTP notification configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay host
    pub host: String,

    /// SMTP submission port (STARTTLS)
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Login
    pub username: String,

    /// Password
    pub password: String,

    /// Sender address
    pub from: String,

    /// Recipient address
    pub to: String,

    /// Subject, `{ip}` is replaced with the new address(es)
    #[serde(default = "default_mail_template")]
    pub subject_template: String,

    /// Body, `{ip}` is replaced with the new address(es)
    #[serde(default = "default_mail_template")]
    pub body_template: String,
}

impl SmtpConfig {
    /// Validate the SMTP configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.host.trim().is_empty() {
            return Err(crate::Error::config("SMTP host cannot be empty"));
        }
        if self.port == 0 {
            return Err(crate::Error::config("SMTP port must be > 0"));
        }
        if !self.from.contains('@') {
            return Err(crate::Error::config(format!(
                "Sender is not an email address: {}",
                self.from
            )));
        }
        if !self.to.contains('@') {
            return Err(crate::Error::config(format!(
                "Recipient is not an email address: {}",
                self.to
            )));
        }
        Ok(())
    }

    /// Render the subject for a new address
    pub fn subject(&self, ip: &str) -> String {
        self.subject_template.replace("{ip}", ip)
    }

    /// Render the body for a new address
    pub fn body(&self, ip: &str) -> String {
        self.body_template.replace("{ip}", ip)
    }
}

// The SMTP password never appears in Debug output
impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// Resolve the API key argument
///
/// If `arg` names an existing file, the key is the file's content with
/// surrounding whitespace removed. Otherwise `arg` is the key itself.
pub fn load_api_key(arg: &str) -> Result<String, crate::Error> {
    let path = Path::new(arg);
    let key = if path.is_file() {
        std::fs::read_to_string(path)?.trim().to_string()
    } else {
        arg.to_string()
    };

    if key.is_empty() {
        return Err(crate::Error::config("API key cannot be empty"));
    }

    Ok(key)
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

fn default_livedns_url() -> String {
    DEFAULT_LIVEDNS_URL.to_string()
}

fn default_xmlrpc_url() -> String {
    DEFAULT_XMLRPC_URL.to_string()
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_mail_template() -> String {
    DEFAULT_MAIL_TEMPLATE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = UpdaterConfig::new("example.com", vec!["www".to_string()]);
        assert_eq!(config.ttl, 10800);
        assert_eq!(
            config.ip_getters.enabled_families(),
            vec![AddressFamily::V4, AddressFamily::V6]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_records_rejected() {
        let config = UpdaterConfig::new("example.com", Vec::new());
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_both_families_disabled_rejected() {
        let config = UpdaterConfig::new("example.com", vec!["@".to_string()]).with_ip_getters(
            IpGetterConfig {
                ipv4: None,
                ipv6: None,
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_family_is_skipped() {
        let getters = IpGetterConfig {
            ipv4: Some("http://ip.example.net/".to_string()),
            ipv6: None,
        };
        assert_eq!(getters.enabled_families(), vec![AddressFamily::V4]);
        assert_eq!(getters.url_for(AddressFamily::V6), None);
    }

    #[test]
    fn test_record_type_mapping() {
        assert_eq!(AddressFamily::V4.record_type(), RecordType::A);
        assert_eq!(AddressFamily::V6.record_type(), RecordType::Aaaa);
        assert_eq!(RecordType::parse("AAAA"), Some(RecordType::Aaaa));
        assert_eq!(RecordType::parse("MX"), None);
        assert_eq!(serde_json::to_string(&RecordType::Aaaa).unwrap(), "\"AAAA\"");
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let config = ProviderConfig::LiveDns {
            api_key: "secret_key_12345".to_string(),
            base_url: DEFAULT_LIVEDNS_URL.to_string(),
            mode: UpdateMode::PerRecord,
            dry_run: false,
        };

        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("LiveDns"));
    }

    #[test]
    fn test_provider_config_from_json() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{"type": "xml_rpc", "api_key": "abc"}"#).unwrap();
        assert_eq!(config.type_name(), "xmlrpc");
        assert!(!config.dry_run());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let config = ProviderConfig::XmlRpc {
            api_key: "  ".to_string(),
            endpoint: DEFAULT_XMLRPC_URL.to_string(),
            dry_run: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mail_templates() {
        let config: SmtpConfig = serde_json::from_str(
            r#"{"host": "smtp.example.net", "username": "u", "password": "p",
                "from": "home@example.net", "to": "me@example.net"}"#,
        )
        .unwrap();
        assert_eq!(config.port, 587);
        assert_eq!(
            config.subject("203.0.113.7"),
            "Home's IP address has changed to 203.0.113.7"
        );
        assert!(config.validate().is_ok());
        assert!(!format!("{:?}", config).contains("\"p\""));
    }

    #[test]
    fn test_load_api_key_literal() {
        assert_eq!(load_api_key("abcdef").unwrap(), "abcdef");
    }

    #[test]
    fn test_load_api_key_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  key-from-file  ").unwrap();

        let key = load_api_key(file.path().to_str().unwrap()).unwrap();
        assert_eq!(key, "key-from-file");
    }

    #[test]
    fn test_load_api_key_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(load_api_key(file.path().to_str().unwrap()).is_err());
    }
}
