//! View filters over the record store
//!
//! Pure transforms: the output depends only on the records, the filter kind
//! and the evaluation time. Every sort is stable so equal keys keep arrival
//! order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, TimeDelta, TimeZone, Utc};

use crate::constants;
use crate::models::ProfitRecord;

/// Longest DST gap searched when local midnight does not exist
const MAX_GAP_MINUTES: i64 = 3 * 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Everything, newest first
    #[default]
    All,
    /// Records dated within the current local day, newest first
    Today,
    /// Largest amounts first, capped at `TOP_LIMIT`
    Top,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::All => write!(f, "all"),
            FilterKind::Today => write!(f, "today"),
            FilterKind::Top => write!(f, "top"),
        }
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FilterKind::All),
            "today" => Ok(FilterKind::Today),
            "top" => Ok(FilterKind::Top),
            other => Err(format!("unknown filter '{}' (expected all, today or top)", other)),
        }
    }
}

/// Apply `kind` to `records`. `now` fixes both the evaluation instant and
/// the time zone whose calendar day "today" refers to.
pub fn apply<Tz: TimeZone>(
    records: &[ProfitRecord],
    kind: FilterKind,
    now: &DateTime<Tz>,
) -> Vec<ProfitRecord> {
    let mut view: Vec<ProfitRecord> = match kind {
        FilterKind::All | FilterKind::Top => records.to_vec(),
        FilterKind::Today => match local_day_bounds(now) {
            Some((start, end)) => records
                .iter()
                .filter(|r| r.date >= start && r.date < end)
                .cloned()
                .collect(),
            None => Vec::new(),
        },
    };

    match kind {
        FilterKind::All | FilterKind::Today => {
            view.sort_by(|a, b| b.date.cmp(&a.date));
        }
        FilterKind::Top => {
            view.sort_by(|a, b| b.amount.total_cmp(&a.amount));
            view.truncate(constants::TOP_LIMIT);
        }
    }
    view
}

/// Half-open `[local midnight, next local midnight)` around `now`, in UTC
fn local_day_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let tz = now.timezone();
    let today = now.date_naive();
    let tomorrow = today.checked_add_days(Days::new(1))?;

    let start = start_of_day(&tz, today)?;
    let end = start_of_day(&tz, tomorrow)?;

    Some((start, end))
}

/// First instant of `date` in `tz`. When midnight falls in a DST gap the day
/// starts at the first local time that exists.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;

    (0..=MAX_GAP_MINUTES).find_map(|minutes| {
        let local = midnight.checked_add_signed(TimeDelta::minutes(minutes))?;
        tz.from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}
