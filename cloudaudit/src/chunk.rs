//! Calendar-aligned chunk planning
//!
//! Splits an export window into consecutive chunks that end on day, week
//! (Sunday) or month boundaries. The first chunk starts at the window start,
//! the last ends at the window end, and each chunk ends one nanosecond before
//! the next begins.
use crate::calendar::{
    end_of_day, end_of_month, end_of_week, localize, localize_end, start_of_next_day,
    start_of_next_month, start_of_next_week,
};
use crate::range::TimeWindow;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use log::warn;
use std::fmt;

/// Granularity used to partition an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitPolicy {
    /// One chunk for the whole window
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl SplitPolicy {
    /// Pick a policy from the `--daily`, `--weekly` and `--monthly` flags
    ///
    /// When several flags are set the coarsest wins: monthly, then weekly,
    /// then daily.
    #[must_use]
    pub fn from_flags(daily: bool, weekly: bool, monthly: bool) -> Self {
        let policy = if monthly {
            Self::Monthly
        } else if weekly {
            Self::Weekly
        } else if daily {
            Self::Daily
        } else {
            Self::None
        };

        if [daily, weekly, monthly].iter().filter(|set| **set).count() > 1 {
            warn!("Several split flags given; using {policy} split");
        }
        policy
    }

    /// Wall-clock end of the period containing `date`, and the start of the next
    fn period_bounds(self, date: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match self {
            Self::None => None,
            Self::Daily => Some((end_of_day(date), start_of_next_day(date))),
            Self::Weekly => Some((end_of_week(date), start_of_next_week(date))),
            Self::Monthly => Some((end_of_month(date), start_of_next_month(date))),
        }
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "no",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        };
        f.write_str(name)
    }
}

/// One planned sub-interval of an export
#[derive(Debug, Clone)]
pub struct Chunk<Tz: TimeZone = Local> {
    /// Position in the plan, starting at 1
    pub index: usize,
    /// Number of chunks in the plan
    pub total: usize,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> Chunk<Tz> {
    /// The chunk's bounds as a window
    #[must_use]
    pub fn window(&self) -> TimeWindow<Tz> {
        TimeWindow {
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }
}

impl<Tz: TimeZone> PartialEq for Chunk<Tz> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.total == other.total
            && self.start == other.start
            && self.end == other.end
    }
}

/// Partition `window` into chunks according to `policy`
///
/// A zero-length window yields a single chunk for every policy.
pub fn split<Tz: TimeZone>(window: &TimeWindow<Tz>, policy: SplitPolicy) -> Vec<Chunk<Tz>> {
    let bounds = if policy == SplitPolicy::None || window.start >= window.end {
        vec![(window.start.clone(), window.end.clone())]
    } else {
        calendar_bounds(window, policy)
    };

    let total = bounds.len();
    bounds
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| Chunk {
            index: i.saturating_add(1),
            total,
            start,
            end,
        })
        .collect()
}

fn calendar_bounds<Tz: TimeZone>(
    window: &TimeWindow<Tz>,
    policy: SplitPolicy,
) -> Vec<(DateTime<Tz>, DateTime<Tz>)> {
    let tz = window.start.timezone();
    let mut bounds = Vec::new();
    let mut cursor = window.start.clone();

    while cursor < window.end {
        let Some((period_end, next_start)) = policy.period_bounds(cursor.naive_local().date())
        else {
            break;
        };

        let mut chunk_end = localize_end(&tz, period_end);
        if chunk_end > window.end {
            chunk_end = window.end.clone();
        }

        bounds.push((cursor, chunk_end.clone()));

        if chunk_end >= window.end {
            break;
        }
        cursor = localize(&tz, next_start);
    }

    bounds
}
