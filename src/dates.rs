//! Date parsing and formatting that never fails loudly.
//!
//! Dates arrive as strings from remote rows and user input. Every function here
//! degrades to an absent value or a caller-supplied fallback instead of erroring.

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike,
};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

const MONTHS_PT: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho",
    "julho", "agosto", "setembro", "outubro", "novembro", "dezembro",
];

const WEEKDAYS_PT: [&str; 7] = [
    "segunda-feira", "terça-feira", "quarta-feira", "quinta-feira",
    "sexta-feira", "sábado", "domingo",
];

/// Parse an ISO-8601 date or datetime string.
///
/// Accepts `YYYY-MM-DD`, RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` and the
/// `YYYY-MM-DD HH:MM:SS[.f][+HH[:MM]]` shape databases tend to emit. Offsets are
/// dropped and the wall-clock time as written is kept. Returns `None` on any
/// parse failure, including impossible calendar dates.
pub fn safe_parse_date(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Some(dt) = parse_with_offset(s) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Datetime strings that carry an explicit UTC offset.
fn parse_with_offset(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok().or_else(|| {
        ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"]
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    })
}

/// The instant a date string names, seen from `tz`.
///
/// Strings with an offset keep it. Strings without one are read as wall-clock
/// time in `tz`.
fn parse_instant<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let s = s.trim();
    if let Some(dt) = parse_with_offset(s) {
        return Some(dt.with_timezone(tz));
    }
    let naive = safe_parse_date(Some(s))?;
    tz.from_local_datetime(&naive).earliest()
}

/// Format a date string with a date-fns style pattern, or return `fallback`.
///
/// Both a parse failure and an unsupported pattern token yield the fallback.
pub fn safe_format_date(s: Option<&str>, pattern: &str, fallback: &str) -> String {
    let Some(dt) = safe_parse_date(s) else {
        return fallback.to_string();
    };
    match format_pattern(&dt, pattern) {
        Ok(out) => out,
        Err(token) => {
            tracing::debug!(pattern, token = %token, "unsupported date pattern token");
            fallback.to_string()
        }
    }
}

/// True when the date falls on a calendar day before today.
///
/// An unparseable or missing date is never overdue.
pub fn is_date_overdue(s: Option<&str>) -> bool {
    is_date_overdue_at(s, Local::now().date_naive())
}

pub fn is_date_overdue_at(s: Option<&str>, today: NaiveDate) -> bool {
    match safe_parse_date(s) {
        Some(dt) => dt.date() < today,
        None => false,
    }
}

/// Signed whole days from now until the given date, rounded up.
pub fn get_days_from_today(s: Option<&str>) -> Option<i64> {
    days_between(s, Local::now())
}

/// Ceiling of `(date - now) / 1 day`, measured in milliseconds.
///
/// A string with an offset is compared as the instant it names. One without is
/// taken as wall-clock time in the time zone of `now`.
pub fn days_between<Tz: TimeZone>(s: Option<&str>, now: DateTime<Tz>) -> Option<i64> {
    let dt = parse_instant(s?, &now.timezone())?;
    let ms = dt.signed_duration_since(now).num_milliseconds();
    // Integer division truncates toward zero, which is already the ceiling for negatives.
    let q = ms / DAY_MS;
    Some(if ms % DAY_MS > 0 { q + 1 } else { q })
}

/// Render `dt` according to a date-fns style pattern.
///
/// Returns the offending token on an unsupported letter run.
fn format_pattern(dt: &NaiveDateTime, pattern: &str) -> Result<String, String> {
    let mut out = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            // Quoted literal; '' is an escaped quote.
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                out.push(chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }
        if !c.is_ascii_alphabetic() {
            out.push(c);
            i += 1;
            continue;
        }
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }
        let token: String = std::iter::repeat(c).take(run).collect();
        let rendered = match (c, run) {
            ('y', 1) | ('y', 4) => format!("{}", dt.year()),
            ('y', 2) => format!("{:02}", dt.year().rem_euclid(100)),
            ('M', 1) => format!("{}", dt.month()),
            ('M', 2) => format!("{:02}", dt.month()),
            ('M', 3) => MONTHS_PT[dt.month0() as usize].chars().take(3).collect(),
            ('M', 4) => MONTHS_PT[dt.month0() as usize].to_string(),
            ('d', 1) => format!("{}", dt.day()),
            ('d', 2) => format!("{:02}", dt.day()),
            ('E', 1..=3) => {
                let name = WEEKDAYS_PT[dt.weekday().num_days_from_monday() as usize];
                name.chars().take(3).collect()
            }
            ('E', 4) => WEEKDAYS_PT[dt.weekday().num_days_from_monday() as usize].to_string(),
            ('H', 1) => format!("{}", dt.hour()),
            ('H', 2) => format!("{:02}", dt.hour()),
            ('m', 1) => format!("{}", dt.minute()),
            ('m', 2) => format!("{:02}", dt.minute()),
            ('s', 1) => format!("{}", dt.second()),
            ('s', 2) => format!("{:02}", dt.second()),
            _ => return Err(token),
        };
        out.push_str(&rendered);
        i += run;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn parse_rejects_garbage_and_impossible_dates() {
        assert_eq!(safe_parse_date(Some("not-a-date")), None);
        assert_eq!(safe_parse_date(Some("2024-02-30")), None);
        assert_eq!(safe_parse_date(Some("")), None);
        assert_eq!(safe_parse_date(None), None);
    }

    #[test]
    fn parse_accepts_common_shapes() {
        assert_eq!(safe_parse_date(Some("2024-03-15")), Some(at(2024, 3, 15, 0)));
        assert_eq!(safe_parse_date(Some("2024-03-15T10:00:00Z")), Some(at(2024, 3, 15, 10)));
        assert_eq!(
            safe_parse_date(Some("2024-03-15T10:00:00.000-03:00")),
            Some(at(2024, 3, 15, 10))
        );
        assert_eq!(safe_parse_date(Some("2024-03-15T10:00:00")), Some(at(2024, 3, 15, 10)));
        assert_eq!(safe_parse_date(Some("2024-03-15 10:00:00")), Some(at(2024, 3, 15, 10)));
        assert_eq!(safe_parse_date(Some("2024-03-15 10:00:00+00")), Some(at(2024, 3, 15, 10)));
    }

    #[test]
    fn format_with_fallback() {
        assert_eq!(safe_format_date(Some("not-a-date"), "dd/MM", "-"), "-");
        assert_eq!(safe_format_date(Some("2024-03-15"), "dd/MM", "-"), "15/03");
        assert_eq!(safe_format_date(Some("2024-03-15"), "dd/MM/yyyy", "-"), "15/03/2024");
        assert_eq!(safe_format_date(None, "dd/MM", "sem data"), "sem data");
    }

    #[test]
    fn format_names_and_literals() {
        assert_eq!(
            safe_format_date(Some("2024-03-15"), "EEEE, d 'de' MMMM", "-"),
            "sexta-feira, 15 de março"
        );
        assert_eq!(safe_format_date(Some("2024-03-15T07:05:00"), "HH:mm", "-"), "07:05");
        assert_eq!(safe_format_date(Some("2024-03-15"), "MMM/yy", "-"), "mar/24");
    }

    #[test]
    fn escaped_quote_inside_literal() {
        assert_eq!(
            safe_format_date(Some("2024-03-15T07:00:00"), "H 'o''clock'", "-"),
            "7 o'clock"
        );
        assert_eq!(safe_format_date(Some("2024-03-15"), "d''M", "-"), "15'3");
    }

    #[test]
    fn unsupported_token_falls_back() {
        assert_eq!(safe_format_date(Some("2024-03-15"), "dd/QQ", "-"), "-");
        assert_eq!(safe_format_date(Some("2024-03-15"), "yyy", "?"), "?");
    }

    #[test]
    fn overdue_uses_calendar_days() {
        assert!(!is_date_overdue(None));
        assert!(!is_date_overdue(Some("garbage")));

        let today = Local::now().date_naive();
        let yesterday = (today - Duration::days(1)).to_string();
        let tomorrow = (today + Duration::days(1)).to_string();
        assert!(is_date_overdue(Some(&yesterday)));
        assert!(!is_date_overdue(Some(&tomorrow)));
        let march_15 = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert!(!is_date_overdue_at(Some("2024-03-15"), march_15));
    }

    #[test]
    fn day_delta_rounds_up() {
        let now = Utc.from_utc_datetime(&at(2024, 3, 15, 10));
        assert_eq!(days_between(Some("2024-03-18"), now), Some(3));
        assert_eq!(days_between(Some("2024-03-15T10:00:00"), now), Some(0));
        assert_eq!(days_between(Some("2024-03-14"), now), Some(-1));
        assert_eq!(days_between(Some("2024-03-13T10:00:00"), now), Some(-2));
        assert_eq!(days_between(Some("nope"), now), None);
        assert_eq!(get_days_from_today(Some("nope")), None);
    }

    #[test]
    fn day_delta_compares_instants_across_offsets() {
        let now = Utc.from_utc_datetime(&at(2024, 3, 15, 10));
        let utc = days_between(Some("2024-03-15T12:00:00Z"), now);
        assert_eq!(utc, Some(1));
        assert_eq!(days_between(Some("2024-03-15T00:00:00-12:00"), now), utc);
        assert_eq!(days_between(Some("2024-03-15 21:00:00+09"), now), utc);
    }
}
