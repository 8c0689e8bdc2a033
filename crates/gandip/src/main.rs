// # gandip - Gandi dynamic DNS updater
//
// Thin integration layer: parse the command line, set up logging, build the
// IP sources, the registrar client and the optional notifier, then run one
// reconciliation pass. All DNS logic lives in the library crates.
//
// ## Example
//
// ```bash
// # LiveDNS, key read from a file, A and AAAA for the apex and www
// gandip ~/.gandi.key example.com @ www
//
// # Legacy API, IPv4 only, mail when the address changes
// gandip --api xmlrpc --noipv6 \
//     --smtp-host smtp.example.com --smtp-user me --smtp-password secret \
//     --mail-to me@example.com \
//     ~/.gandi.key example.com home
// ```
//
// Typically run from cron; there is no loop and no state between runs.

mod cli;

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use cli::Args;
use gandip_core::config::load_api_key;
use gandip_core::{DnsProvider, IpSource, ProviderConfig, StatusReport, Updater};
use gandip_ip_http::HttpIpSource;
use gandip_notify_smtp::SmtpNotifier;
use gandip_provider_livedns::LiveDnsProvider;
use gandip_provider_xmlrpc::ZoneVersionProvider;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Success
/// - 1: Configuration or startup error
/// - 2: Runtime error (resolver, registrar or notifier failure)
#[derive(Debug, Clone, Copy)]
enum GandipExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<GandipExitCode> for ExitCode {
    fn from(code: GandipExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => GandipExitCode::Success,
                _ => GandipExitCode::ConfigError,
            }
            .into();
        }
    };

    if let Err(e) = args.validate() {
        eprintln!("Configuration validation error: {}", e);
        return GandipExitCode::ConfigError.into();
    }

    let log_level = match args.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return GandipExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return GandipExitCode::ConfigError.into();
    }

    // Every call is awaited in turn, one thread is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return GandipExitCode::RuntimeError.into();
        }
    };

    // The mail transport spawns its connection pool on the runtime
    let _guard = rt.enter();

    let updater = match build_updater(&args) {
        Ok(updater) => updater,
        Err(e) => {
            error!("Configuration error: {}", e);
            return GandipExitCode::ConfigError.into();
        }
    };

    let result = rt.block_on(async {
        if args.status {
            updater.status().await.map(|report| print_status(&report, updater.records()))
        } else {
            updater.run().await.map(|report| {
                info!(
                    "{} record(s) changed, {} family(ies) skipped{}",
                    report.changes().len(),
                    report.skipped.len(),
                    if report.notified { ", notification sent" } else { "" }
                );
            })
        }
    });

    match result {
        Ok(()) => GandipExitCode::Success.into(),
        Err(e) => {
            error!("Update failed: {}", e);
            GandipExitCode::RuntimeError.into()
        }
    }
}

/// Build the updater and its components from the command line
fn build_updater(args: &Args) -> Result<Updater> {
    let api_key = load_api_key(&args.key)?;

    let config = args.updater_config();
    config.validate()?;

    let provider_config = args.provider_config(api_key);
    provider_config.validate()?;

    info!(
        "Configuration loaded: zone {}, {} record(s), provider {:?}",
        config.zone,
        config.records.len(),
        provider_config
    );

    let provider: Box<dyn DnsProvider> = match &provider_config {
        ProviderConfig::LiveDns { .. } => Box::new(LiveDnsProvider::from_config(&provider_config)?),
        ProviderConfig::XmlRpc { .. } => {
            Box::new(ZoneVersionProvider::from_config(&provider_config)?)
        }
    };

    let sources: Vec<Box<dyn IpSource>> = HttpIpSource::from_config(&config.ip_getters)
        .into_iter()
        .map(|source| Box::new(source) as Box<dyn IpSource>)
        .collect();

    let mut updater = Updater::new(sources, provider, config)?;

    if let Some(smtp) = args.smtp_config() {
        info!("Change notifications go to {} via {}", smtp.to, smtp.host);
        updater = updater.with_notifier(Box::new(SmtpNotifier::new(smtp)?));
    } else if args.smtp_incomplete() {
        warn!("Mail notification disabled: both --smtp-host and --mail-to are required");
    }

    Ok(updater)
}

fn print_status(report: &StatusReport, names: &[String]) {
    for status in &report.families {
        println!("{} address: {}", status.family, status.ip);

        let stale = status.stale(names);
        for name in names {
            let record_type = status.family.record_type().as_str();
            match status.records.iter().find(|record| &record.name == name) {
                Some(record) => println!(
                    "  {:<20} {:<4} {:<7} {}{}",
                    name,
                    record_type,
                    record.ttl,
                    record.values.join(", "),
                    if stale.contains(name) { "  (stale)" } else { "" }
                ),
                None => println!("  {:<20} {:<4} {:<7} (missing)", name, record_type, "-"),
            }
        }
    }
}
