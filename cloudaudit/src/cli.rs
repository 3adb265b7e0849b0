//! CLI argument parsing for cloudaudit
use crate::duration::parse_duration;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "cloudaudit",
    version,
    about = "Cloud organisation audit log export tool",
    long_about = "Export audit logs of a cloud organisation into compliance-ready JSON files, optionally split into daily, weekly or monthly chunks",
    after_help = "DURATIONS:
  Standard units: ns, us, ms, s, m, h (e.g. 90m, 1h30m, 2.5h)
  Calendar units: d (24h), w (7d), mo (30d), y (365d) (e.g. 7d, 1mo5d, 1y)

EXAMPLES:
  # Last 30 days, one file per day
  cloudaudit export --since 30d --daily -o exports/audit.json

  # January 2024 to stdout
  cloudaudit export --from 2024-01-01 --to 2024-01-31 -o -

  # Deletions by a service account, one file per month
  cloudaudit export --since 1y --monthly --service-account ci-bot --action delete

Run 'cloudaudit help-env' for the environment variables."
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export audit logs for a time range
    Export(ExportArgs),

    /// Display help for environment variables
    HelpEnv,
}

/// Arguments of `cloudaudit export`
///
/// Range flags are kept as given; they are checked together when the export
/// configuration is built.
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Export logs from this long ago until now, e.g. 24h, 7d, 1mo5d
    /// Cannot be used with --from/--to
    #[arg(long)]
    pub since: Option<String>,

    /// First day of the range (YYYY-MM-DD, local time, inclusive)
    #[arg(long)]
    pub from: Option<String>,

    /// Last day of the range (YYYY-MM-DD, local time, inclusive)
    #[arg(long)]
    pub to: Option<String>,

    /// Write one file per calendar day
    #[arg(long)]
    pub daily: bool,

    /// Write one file per calendar week (Monday to Sunday)
    #[arg(long)]
    pub weekly: bool,

    /// Write one file per calendar month
    #[arg(long)]
    pub monthly: bool,

    /// Output file, or '-' for stdout (single chunk only)
    /// With a split, the chunk dates are inserted before the extension
    #[arg(short, long)]
    pub output: Option<String>,

    /// Maximum time to download one chunk, e.g. 5m, 30m, 1h
    #[arg(long, default_value = "5m", value_parser = validate_chunk_timeout)]
    pub chunk_download_timeout: Duration,

    /// Records requested per page
    #[arg(long, default_value_t = 100, value_parser = validate_page_size)]
    pub page_size: u32,

    /// Free-text search across log fields
    #[arg(long)]
    pub search_text: Option<String>,

    /// Only logs produced by this service account
    #[arg(long)]
    pub service_account: Option<String>,

    /// Only logs produced by this user
    #[arg(long)]
    pub user_identity: Option<String>,

    /// Only logs where this identity impersonated another
    #[arg(long)]
    pub impersonator_identity: Option<String>,

    /// Action to include; repeat for several
    #[arg(long = "action")]
    pub actions: Vec<String>,

    /// Resource type to include; repeat for several
    #[arg(long = "resource-type")]
    pub resource_types: Vec<String>,

    /// Only logs about this resource
    #[arg(long)]
    pub resource_identity: Option<String>,

    /// Only logs of this (sub-)organisation
    #[arg(long)]
    pub organisation_identity: Option<String>,

    /// Include logs produced by system services
    #[arg(long)]
    pub include_system_services: bool,

    /// Only logs with this HTTP response status
    #[arg(long, value_parser = clap::value_parser!(u16).range(100..=599))]
    pub response_status: Option<u16>,
}

impl Default for ExportArgs {
    fn default() -> Self {
        Self {
            since: None,
            from: None,
            to: None,
            daily: false,
            weekly: false,
            monthly: false,
            output: None,
            chunk_download_timeout: crate::config::DEFAULT_CHUNK_TIMEOUT,
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            search_text: None,
            service_account: None,
            user_identity: None,
            impersonator_identity: None,
            actions: Vec::new(),
            resource_types: Vec::new(),
            resource_identity: None,
            organisation_identity: None,
            include_system_services: false,
            response_status: None,
        }
    }
}

/// Validate the chunk download timeout (a positive duration)
fn validate_chunk_timeout(s: &str) -> Result<Duration, String> {
    let delta = parse_duration(s).map_err(|e| e.to_string())?;
    match delta.to_std() {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(format!("Chunk download timeout must be positive (got '{s}')")),
    }
}

/// Validate page size (> 0)
fn validate_page_size(s: &str) -> Result<u32, String> {
    let value: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == 0 {
        return Err("Page size must be greater than 0".to_string());
    }
    Ok(value)
}
