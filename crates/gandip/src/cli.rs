//! Command line interface
//!
//! Every flag can also be given through a `GANDIP_*` environment variable.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use gandip_core::config::{
    DEFAULT_IPV4_GETTER, DEFAULT_IPV6_GETTER, DEFAULT_LIVEDNS_URL, DEFAULT_MAIL_TEMPLATE,
    DEFAULT_SMTP_PORT, DEFAULT_TTL, DEFAULT_XMLRPC_URL,
};
use gandip_core::{IpGetterConfig, ProviderConfig, SmtpConfig, UpdateMode, UpdaterConfig};
use tracing::Level;

/// Registrar API generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Api {
    /// LiveDNS JSON API
    Livedns,
    /// Legacy XML-RPC API with versioned zones
    Xmlrpc,
}

/// Update Gandi DNS records with the current public IP address
#[derive(Debug, Parser)]
#[command(name = "gandip", version)]
pub struct Args {
    /// API key, or path to a file containing it
    #[arg(env = "GANDIP_API_KEY", hide_env_values = true)]
    pub key: String,

    /// Zone (domain) the records belong to
    #[arg(env = "GANDIP_ZONE")]
    pub zone: String,

    /// Record names to update, relative to the zone ("@" for the apex)
    #[arg(required = true, env = "GANDIP_RECORDS", value_delimiter = ',')]
    pub records: Vec<String>,

    /// TTL of created or replaced records, in seconds
    #[arg(long, env = "GANDIP_TTL", default_value_t = DEFAULT_TTL)]
    pub ttl: u32,

    /// Do not update A records
    #[arg(long, env = "GANDIP_NOIPV4")]
    pub noipv4: bool,

    /// Do not update AAAA records
    #[arg(long, env = "GANDIP_NOIPV6")]
    pub noipv6: bool,

    /// URL answering with the public IPv4 address
    #[arg(long, env = "GANDIP_IP_GETTER", default_value = DEFAULT_IPV4_GETTER)]
    pub ip_getter: String,

    /// URL answering with the public IPv6 address
    #[arg(long, env = "GANDIP_IP6_GETTER", default_value = DEFAULT_IPV6_GETTER)]
    pub ip6_getter: String,

    /// Registrar API to talk to
    #[arg(long, env = "GANDIP_API", value_enum, default_value_t = Api::Livedns)]
    pub api: Api,

    /// Override the API URL
    #[arg(long, env = "GANDIP_API_URL")]
    pub api_url: Option<String>,

    /// LiveDNS only: rewrite all records in one request when any is stale
    #[arg(long, env = "GANDIP_BATCH")]
    pub batch: bool,

    /// Read everything, log the changes, write nothing
    #[arg(long, env = "GANDIP_DRY_RUN")]
    pub dry_run: bool,

    /// Print the current IPs and records, then exit
    #[arg(long)]
    pub status: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GANDIP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// SMTP relay for change notifications
    #[arg(long, env = "GANDIP_SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// SMTP submission port (STARTTLS)
    #[arg(long, env = "GANDIP_SMTP_PORT", default_value_t = DEFAULT_SMTP_PORT)]
    pub smtp_port: u16,

    /// SMTP login
    #[arg(long, env = "GANDIP_SMTP_USER")]
    pub smtp_user: Option<String>,

    /// SMTP password
    #[arg(long, env = "GANDIP_SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Sender of the notification (defaults to the recipient)
    #[arg(long, env = "GANDIP_MAIL_FROM")]
    pub mail_from: Option<String>,

    /// Recipient of the notification
    #[arg(long, env = "GANDIP_MAIL_TO")]
    pub mail_to: Option<String>,
}

impl Args {
    /// Validate the arguments
    ///
    /// Value objects validate themselves when they are built; this covers what
    /// only makes sense on the command line.
    pub fn validate(&self) -> Result<()> {
        validate_domain_name(&self.zone)?;

        for record in &self.records {
            validate_record_name(record)?;
        }

        if self.noipv4 && self.noipv6 {
            anyhow::bail!("--noipv4 and --noipv6 together leave nothing to update");
        }

        if self.batch && self.api != Api::Livedns {
            anyhow::bail!("--batch is only supported with --api livedns");
        }

        if self.ttl == 0 {
            anyhow::bail!("--ttl must be > 0");
        }

        self.log_level()?;

        Ok(())
    }

    /// Parsed log level
    pub fn log_level(&self) -> Result<Level> {
        self.log_level.parse().map_err(|_| {
            anyhow::anyhow!(
                "Log level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                self.log_level
            )
        })
    }

    pub fn updater_config(&self) -> UpdaterConfig {
        let ip_getters = IpGetterConfig {
            ipv4: (!self.noipv4).then(|| self.ip_getter.clone()),
            ipv6: (!self.noipv6).then(|| self.ip6_getter.clone()),
        };

        // The registrar APIs address zones without the root dot
        let zone = self.zone.trim_end_matches('.');

        UpdaterConfig::new(zone, self.records.clone())
            .with_ttl(self.ttl)
            .with_ip_getters(ip_getters)
    }

    pub fn provider_config(&self, api_key: String) -> ProviderConfig {
        match self.api {
            Api::Livedns => ProviderConfig::LiveDns {
                api_key,
                base_url: self
                    .api_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LIVEDNS_URL.to_string()),
                mode: if self.batch {
                    UpdateMode::Batch
                } else {
                    UpdateMode::PerRecord
                },
                dry_run: self.dry_run,
            },
            Api::Xmlrpc => ProviderConfig::XmlRpc {
                api_key,
                endpoint: self
                    .api_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_XMLRPC_URL.to_string()),
                dry_run: self.dry_run,
            },
        }
    }

    /// Notification settings; `None` unless both relay and recipient are set
    pub fn smtp_config(&self) -> Option<SmtpConfig> {
        let host = self.smtp_host.clone()?;
        let to = self.mail_to.clone()?;

        Some(SmtpConfig {
            host,
            port: self.smtp_port,
            username: self.smtp_user.clone().unwrap_or_default(),
            password: self.smtp_password.clone().unwrap_or_default(),
            from: self.mail_from.clone().unwrap_or_else(|| to.clone()),
            to,
            subject_template: DEFAULT_MAIL_TEMPLATE.to_string(),
            body_template: DEFAULT_MAIL_TEMPLATE.to_string(),
        })
    }

    /// Whether some SMTP flags were given but not enough to send mail
    pub fn smtp_incomplete(&self) -> bool {
        self.smtp_config().is_none()
            && (self.smtp_host.is_some() || self.mail_to.is_some() || self.smtp_user.is_some())
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks, not comprehensive but catches common errors.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.trim_end_matches('.').split('.') {
        validate_label(domain, label)?;
    }

    Ok(())
}

/// Validate a record name relative to the zone
///
/// Accepts "@" for the apex, a leading "*" wildcard label and underscores.
fn validate_record_name(name: &str) -> Result<()> {
    if name == "@" {
        return Ok(());
    }
    if name.is_empty() {
        anyhow::bail!("Record name cannot be empty");
    }

    for (i, label) in name.split('.').enumerate() {
        if i == 0 && label == "*" {
            continue;
        }
        validate_label(name, &label.replace('_', ""))?;
    }

    Ok(())
}

fn validate_label(name: &str, label: &str) -> Result<()> {
    if label.is_empty() {
        anyhow::bail!("Name has empty label: '{}'", name);
    }

    if label.len() > 63 {
        anyhow::bail!(
            "Label too long: {} chars (max 63). Label: '{}'",
            label.len(),
            label
        );
    }

    if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
        anyhow::bail!(
            "Label contains invalid characters. Label: '{}'. \
            Valid: alphanumeric and hyphen only.",
            label
        );
    }

    if label.starts_with('-') || label.ends_with('-') {
        anyhow::bail!("Label cannot start or end with hyphen. Label: '{}'", label);
    }

    Ok(())
}
