// Date-range filter - relative windows applied to records before aggregation
use super::error::UnknownToken;
use super::record::Record;
use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    #[default]
    All,
    Today,
    Last7,
    Last30,
    Last90,
}

impl DateRange {
    pub const ALL: [DateRange; 5] = [
        DateRange::All,
        DateRange::Today,
        DateRange::Last7,
        DateRange::Last30,
        DateRange::Last90,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::All => "all",
            DateRange::Today => "today",
            DateRange::Last7 => "last7",
            DateRange::Last30 => "last30",
            DateRange::Last90 => "last90",
        }
    }

    /// Lower bound of the window ending at `now`; `None` means unbounded.
    pub fn start(&self, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        match self {
            DateRange::All => None,
            DateRange::Today => {
                let midnight = now.date_naive().and_hms_opt(0, 0, 0)?;
                now.offset().from_local_datetime(&midnight).single()
            }
            DateRange::Last7 => Some(now - Duration::days(7)),
            DateRange::Last30 => Some(now - Duration::days(30)),
            DateRange::Last90 => Some(now - Duration::days(90)),
        }
    }

    pub fn contains(&self, t: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> bool {
        match self.start(now) {
            Some(start) => start <= t && t <= now,
            None => true,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateRange {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateRange::ALL
            .into_iter()
            .find(|range| range.as_str() == s)
            .ok_or_else(|| UnknownToken::new("date range", s))
    }
}

/// Returns the records whose `date_field` falls inside `range` as of `now`.
///
/// `All` keeps every record. For any other range a record with a missing or
/// unparseable date is excluded.
pub fn filter_records(
    records: &[Record],
    range: DateRange,
    date_field: &str,
    now: DateTime<FixedOffset>,
) -> Vec<Record> {
    if range == DateRange::All {
        return records.to_vec();
    }

    let filtered: Vec<Record> = records
        .iter()
        .filter(|record| {
            record
                .get_date(date_field)
                .is_some_and(|t| range.contains(t, now))
        })
        .cloned()
        .collect();

    tracing::debug!(
        "Date filter {} on {}: kept {} of {} records",
        range,
        date_field,
        filtered.len(),
        records.len()
    );

    filtered
}
