//! Calendar helpers for the archive pipeline.
//!
//! Every date is a `DateTime<FixedOffset>` in the site's configured offset,
//! so "start of month" means midnight on the 1st as seen by the site's readers.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};

/// Default display format for archive labels
pub const DEFAULT_SHOW_FORMAT: &str = "%Y年%m月";

/// First and last instant of one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl MonthRange {
    pub fn containing(date: DateTime<FixedOffset>) -> Self {
        Self {
            start: get_start_of_month(date),
            end: get_end_of_month(date),
        }
    }
}

/// The instant the pipeline runs, seen from the site's offset
pub fn get_current_date(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// Midnight of the configured blog start day
pub fn get_blog_start_date(start: NaiveDate, offset: FixedOffset) -> DateTime<FixedOffset> {
    at_local(offset, start.and_time(NaiveTime::MIN))
}

pub fn get_start_of_month(date: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    at_local(*date.offset(), first_of_month(date).and_time(NaiveTime::MIN))
}

/// Last millisecond of the month containing `date`
pub fn get_end_of_month(date: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let next_month = first_of_month(date) + Months::new(1);
    let end = next_month.and_time(NaiveTime::MIN) - TimeDelta::milliseconds(1);
    at_local(*date.offset(), end)
}

/// Shift `date` back by `months` calendar months.
///
/// Day-of-month overflow is clamped to the last valid day of the resulting
/// month, so Mar 31 minus one month is Feb 28 (or 29).
pub fn subtract_month_date(date: DateTime<FixedOffset>, months: u32) -> DateTime<FixedOffset> {
    date - Months::new(months)
}

/// Whole calendar months from `earlier` to `later`, ignoring the day.
///
/// Saturates at zero when `earlier` is actually later.
pub fn months_between(later: DateTime<FixedOffset>, earlier: DateTime<FixedOffset>) -> u32 {
    let later_index = later.year() * 12 + later.month0() as i32;
    let earlier_index = earlier.year() * 12 + earlier.month0() as i32;
    u32::try_from(later_index - earlier_index).unwrap_or(0)
}

/// Month ranges from the current month back to the start month, newest first.
///
/// Lazily yields `months_between(current, start) + 1` ranges.
pub fn archive_months(
    current: DateTime<FixedOffset>,
    start: DateTime<FixedOffset>,
) -> impl Iterator<Item = MonthRange> {
    let diff_month_count = months_between(current, start);

    (0..=diff_month_count).map(move |i| {
        let target = if i == 0 {
            current
        } else {
            subtract_month_date(current, i)
        };
        MonthRange::containing(target)
    })
}

/// Canonical date key, `YYYY-MM-DD`
pub fn change_year_month_date(date: DateTime<FixedOffset>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// URL path fragment, `YYYY-MM`
pub fn change_year_month(date: DateTime<FixedOffset>) -> String {
    date.format("%Y-%m").to_string()
}

/// Display label using a strftime format such as `%Y年%m月`
pub fn change_show_year_month(date: DateTime<FixedOffset>, format: &str) -> String {
    date.format(format).to_string()
}

/// Whether `format` is a strftime string chrono can render without panicking
pub fn is_valid_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

fn first_of_month(date: DateTime<FixedOffset>) -> NaiveDate {
    let day = date.date_naive();
    day.with_day(1).unwrap_or(day)
}

fn at_local(offset: FixedOffset, local: NaiveDateTime) -> DateTime<FixedOffset> {
    let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}
