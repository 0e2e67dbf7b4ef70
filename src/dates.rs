use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};

const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Parses an API timestamp into local wall-clock time.
///
/// Offset-bearing values (RFC 3339) are converted to the local timezone; naive
/// values are taken as already local. Date-only values resolve to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Local).naive_local());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Truncates a timestamp to its local calendar day.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|timestamp| timestamp.date())
}

pub fn day_label(date: NaiveDate) -> String {
    date.format("%b %d").to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
