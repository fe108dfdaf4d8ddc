use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};

/// Number of days fetched before the end date when none is requested.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// An inclusive range of calendar days, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if start > end {
            Err(format!("Window start {} is after its end {}", start, end))
        } else {
            Ok(Self { start, end })
        }
    }

    /// The window `[end - days, end]`, which spans `days + 1` calendar days.
    pub fn ending_at(end: NaiveDate, days: u32) -> Result<Self, String> {
        let start = end
            .checked_sub_days(Days::new(days.into()))
            .ok_or_else(|| format!("Cannot go back {} days from {}", days, end))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, at least one.
    pub fn day_count(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Every day of the window, oldest first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// Calendar-date layouts, extended and basic.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];
/// Date-times carrying a numeric UTC offset (`+05:00` or `+0500`).
const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y%m%dT%H%M%S%z",
];
/// Local or `Z`-suffixed date-times; the offset never moves the date.
const NAIVE_FORMATS: [&str; 7] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%MZ",
    "%Y%m%dT%H%M%S",
    "%Y%m%dT%H%M%SZ",
];

/// Accepts a plain date or an ISO 8601 date-time, of which only the
/// calendar date as written is kept.
pub fn parse_end_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Ok(date);
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(s) {
        return Ok(date_time.date_naive());
    }
    if let Some(date_time) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    {
        return Ok(date_time.date_naive());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|date_time| date_time.date())
        .ok_or_else(|| format!("'{}' is not a YYYY-MM-DD date or ISO 8601 date-time", s))
}
