//! Export configuration built once from the command line
use crate::chunk::SplitPolicy;
use crate::cli::ExportArgs;
use crate::error::{ExportError, Result};
use crate::filter::FilterCriteria;
use crate::range::{RangeOptions, ResolvedRange, resolve_range};
use chrono::{DateTime, Local, TimeZone};
use std::time::Duration;

/// Default deadline for downloading one chunk
pub const DEFAULT_CHUNK_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default records per page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Everything an export needs, validated
///
/// Built once by [`ExportConfig::from_args`] and only read afterwards.
#[derive(Debug, Clone)]
pub struct ExportConfig<Tz: TimeZone = Local> {
    range: ResolvedRange<Tz>,
    policy: SplitPolicy,
    output: Option<String>,
    chunk_timeout: Duration,
    page_size: u32,
    filters: FilterCriteria,
}

impl<Tz: TimeZone> ExportConfig<Tz> {
    /// Validate `args` and resolve the range relative to `now`
    ///
    /// # Errors
    ///
    /// Range errors from [`resolve_range`], or `InvalidConfig` for a zero
    /// timeout or page size.
    pub fn from_args(args: &ExportArgs, now: DateTime<Tz>) -> Result<Self> {
        let range = resolve_range(
            &RangeOptions {
                since: args.since.clone(),
                from: args.from.clone(),
                to: args.to.clone(),
            },
            now,
        )?;

        if args.chunk_download_timeout.is_zero() {
            return Err(ExportError::InvalidConfig(
                "Chunk download timeout must be positive".to_string(),
            ));
        }
        if args.page_size == 0 {
            return Err(ExportError::InvalidConfig(
                "Page size must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            range,
            policy: SplitPolicy::from_flags(args.daily, args.weekly, args.monthly),
            output: args
                .output
                .as_deref()
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string),
            chunk_timeout: args.chunk_download_timeout,
            page_size: args.page_size,
            filters: FilterCriteria {
                search_text: args.search_text.clone(),
                service_account: args.service_account.clone(),
                user_identity: args.user_identity.clone(),
                impersonator_identity: args.impersonator_identity.clone(),
                actions: args.actions.clone(),
                resource_types: args.resource_types.clone(),
                resource_identity: args.resource_identity.clone(),
                organisation_identity: args.organisation_identity.clone(),
                include_system_services: args.include_system_services,
                response_status: args.response_status,
            },
        })
    }

    #[must_use]
    pub fn range(&self) -> &ResolvedRange<Tz> {
        &self.range
    }

    #[must_use]
    pub fn policy(&self) -> SplitPolicy {
        self.policy
    }

    /// Output path, `-` for stdout, or `None` for default file names
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    #[must_use]
    pub fn chunk_timeout(&self) -> Duration {
        self.chunk_timeout
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::range::RangeSelection;
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_from_args() {
        let args = ExportArgs {
            since: Some("7d".to_string()),
            weekly: true,
            output: Some(" out/audit.json ".to_string()),
            service_account: Some("ci-bot".to_string()),
            page_size: 50,
            ..ExportArgs::default()
        };
        let config = ExportConfig::from_args(&args, now()).unwrap();
        assert_eq!(config.policy(), SplitPolicy::Weekly);
        assert_eq!(config.output(), Some("out/audit.json"));
        assert_eq!(config.page_size(), 50);
        assert_eq!(config.chunk_timeout(), DEFAULT_CHUNK_TIMEOUT);
        assert!(config.filters().is_active());
        assert_eq!(config.range().window.end, now());
        assert!(matches!(
            config.range().selection,
            RangeSelection::Duration { .. }
        ));
    }

    #[test]
    fn test_split_precedence() {
        let args = ExportArgs {
            since: Some("7d".to_string()),
            daily: true,
            monthly: true,
            ..ExportArgs::default()
        };
        let config = ExportConfig::from_args(&args, now()).unwrap();
        assert_eq!(config.policy(), SplitPolicy::Monthly);
    }

    #[test]
    fn test_empty_output_means_default_names() {
        let args = ExportArgs {
            since: Some("1d".to_string()),
            output: Some("  ".to_string()),
            ..ExportArgs::default()
        };
        let config = ExportConfig::from_args(&args, now()).unwrap();
        assert_eq!(config.output(), None);
        assert!(!config.filters().is_active());
    }

    #[test]
    fn test_range_errors_surface() {
        let result = ExportConfig::from_args(&ExportArgs::default(), now());
        assert!(matches!(result, Err(ExportError::Validation(_))));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let args = ExportArgs {
            since: Some("1d".to_string()),
            page_size: 0,
            ..ExportArgs::default()
        };
        assert!(matches!(
            ExportConfig::from_args(&args, now()),
            Err(ExportError::InvalidConfig(_))
        ));

        let args = ExportArgs {
            since: Some("1d".to_string()),
            chunk_download_timeout: Duration::ZERO,
            ..ExportArgs::default()
        };
        assert!(matches!(
            ExportConfig::from_args(&args, now()),
            Err(ExportError::InvalidConfig(_))
        ));
    }
}
