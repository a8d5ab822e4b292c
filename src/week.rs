//! Reporting-week arithmetic and the weekly task filter.

use chrono::{Datelike, Days, Duration, NaiveDate};

use crate::dates::safe_parse_date;
use crate::task::Task;

/// Calendar date of an ISO date or datetime string, as written.
///
/// Time of day and any UTC offset are dropped, so two timestamps on the same
/// calendar day normalize to the same date.
pub fn date_only(s: &str) -> Option<NaiveDate> {
    safe_parse_date(Some(s)).map(|dt| dt.date())
}

/// Monday on or before `date`, clamped to the earliest representable date.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = Days::new(u64::from(date.weekday().num_days_from_monday()));
    date.checked_sub_days(back).unwrap_or(NaiveDate::MIN)
}

/// Monday to Sunday range of the week containing `date`.
pub fn week_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = week_start(date);
    (start, start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX))
}

/// `monday` moved by a signed number of weeks, or `None` past the calendar's range.
fn shift_weeks(monday: NaiveDate, weeks: i64) -> Option<NaiveDate> {
    monday.checked_add_signed(Duration::try_weeks(weeks)?)
}

/// Week to report on: the week of an explicit date if one was given, else this week.
pub fn reference_week(explicit: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    week_start(explicit.unwrap_or(today))
}

/// Parse human week input into the Monday of that week.
///
/// Supports:
/// - "this" / "current" / "esta"
/// - "last" / "previous" / "passada"
/// - "next" / "proxima"
/// - "in 2w" / "2w ago"
/// - any ISO date or datetime
pub fn parse_week_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let raw = s.trim();
    let s = raw.to_lowercase();
    let this = week_start(today);
    match s.as_str() {
        "this" | "current" | "esta" | "atual" => return Some(this),
        "last" | "previous" | "passada" | "anterior" => return shift_weeks(this, -1),
        "next" | "proxima" | "próxima" => return shift_weeks(this, 1),
        _ => {}
    }
    if let Some(n) = s.strip_prefix("in ").and_then(|r| r.strip_suffix('w')) {
        if let Ok(weeks) = n.trim().parse::<i64>() {
            return shift_weeks(this, weeks);
        }
    }
    if let Some(n) = s.strip_suffix("w ago") {
        if let Ok(weeks) = n.trim().parse::<i64>() {
            return shift_weeks(this, weeks.checked_neg()?);
        }
    }
    date_only(raw).map(week_start)
}

/// Tasks whose stored week-start date equals `reference`.
///
/// Tasks without a week-start date never match.
pub fn filter_tasks_by_week(tasks: &[Task], reference: NaiveDate) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.week_start_date == Some(reference))
        .cloned()
        .collect()
}

/// As [`filter_tasks_by_week`], with the reference given as a date or datetime string.
///
/// An unparseable reference matches nothing.
pub fn filter_tasks_by_week_str(tasks: &[Task], reference: &str) -> Vec<Task> {
    match date_only(reference) {
        Some(d) => filter_tasks_by_week(tasks, d),
        None => {
            tracing::debug!(reference, "unparseable week reference");
            Vec::new()
        }
    }
}
