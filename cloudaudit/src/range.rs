//! Time range resolution for exports
//!
//! A range is either relative (`--since 7d`, ending now) or an explicit pair
//! of calendar dates (`--from 2024-01-01 --to 2024-01-31`) covering whole
//! local days.
use crate::calendar::{end_of_day, localize, localize_end, start_of_day};
use crate::duration::parse_duration;
use crate::error::{ExportError, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::fmt;

/// Date format accepted by `--from` and `--to`
pub const FORMAT_DATE: &str = "%Y-%m-%d";

/// A closed time interval `[start, end]`
#[derive(Debug, Clone)]
pub struct TimeWindow<Tz: TimeZone = Local> {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> TimeWindow<Tz> {
    /// Whether `instant` lies inside the window, bounds included
    pub fn contains<Tz2: TimeZone>(&self, instant: &DateTime<Tz2>) -> bool {
        let instant = instant.with_timezone(&self.start.timezone());
        self.start <= instant && instant <= self.end
    }
}

impl<Tz: TimeZone> PartialEq for TimeWindow<Tz> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

/// How the export range was specified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSelection {
    /// Relative to now, e.g. `--since 30d`
    Duration { since: String },
    /// Explicit calendar dates, both inclusive
    Custom {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

impl RangeSelection {
    /// Range type as written into artifacts and default file names
    #[must_use]
    pub fn range_type(&self) -> &'static str {
        match self {
            Self::Duration { .. } => "duration",
            Self::Custom { .. } => "custom",
        }
    }
}

impl fmt::Display for RangeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duration { since } => write!(f, "last {since}"),
            Self::Custom {
                start_date,
                end_date,
            } => write!(f, "{start_date} to {end_date}"),
        }
    }
}

/// Raw range flags as given on the command line
#[derive(Debug, Clone, Default)]
pub struct RangeOptions {
    pub since: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// A validated range: how it was specified plus the resulting window
#[derive(Debug, Clone)]
pub struct ResolvedRange<Tz: TimeZone = Local> {
    pub selection: RangeSelection,
    pub window: TimeWindow<Tz>,
}

/// Resolve range flags into a window, in the time zone of `now`
///
/// # Errors
///
/// Returns `Validation` when both or neither range modes are given, when only
/// one of `--from`/`--to` is given, or when the end precedes the start.
/// Returns `Parse` for malformed durations or dates.
pub fn resolve_range<Tz: TimeZone>(
    options: &RangeOptions,
    now: DateTime<Tz>,
) -> Result<ResolvedRange<Tz>> {
    match (&options.since, &options.from, &options.to) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(ExportError::Validation(
            "--since cannot be combined with --from/--to; choose one range mode".to_string(),
        )),
        (None, None, None) => Err(ExportError::Validation(
            "A time range is required: use --since <duration> or --from <YYYY-MM-DD> --to <YYYY-MM-DD>"
                .to_string(),
        )),
        (None, Some(_), None) | (None, None, Some(_)) => Err(ExportError::Validation(
            "--from and --to must be used together".to_string(),
        )),
        (Some(since), None, None) => {
            let duration = parse_duration(since)?;
            let start = now.clone().checked_sub_signed(duration).ok_or_else(|| {
                ExportError::Parse(format!("Duration '{since}' reaches outside the supported date range"))
            })?;
            let window = checked_window(start, now)?;
            Ok(ResolvedRange {
                selection: RangeSelection::Duration {
                    since: since.clone(),
                },
                window,
            })
        }
        (None, Some(from), Some(to)) => {
            let start_date = parse_date(from, "--from")?;
            let end_date = parse_date(to, "--to")?;
            let tz = now.timezone();
            let start = localize(&tz, start_of_day(start_date));
            let end = localize_end(&tz, end_of_day(end_date));
            let window = checked_window(start, end)?;
            Ok(ResolvedRange {
                selection: RangeSelection::Custom {
                    start_date,
                    end_date,
                },
                window,
            })
        }
    }
}

fn checked_window<Tz: TimeZone>(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<TimeWindow<Tz>> {
    if end < start {
        return Err(ExportError::Validation(format!(
            "End of range ({}) is before its start ({})",
            end.to_rfc3339(),
            start.to_rfc3339()
        )));
    }
    Ok(TimeWindow { start, end })
}

fn parse_date(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), FORMAT_DATE).map_err(|e| {
        ExportError::Parse(format!(
            "Invalid {flag} date: '{value}'. Expected YYYY-MM-DD ({e})"
        ))
    })
}
