use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Naive layouts seen in the wild that carry no offset; read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parses a feed date string.
///
/// Accepts RFC 2822 (RSS `pubDate`), RFC 3339 (Atom), and a few offset-less
/// ISO 8601 variants which are interpreted as UTC. Returns `None` for empty
/// or unrecognized input.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Milliseconds since the Unix epoch, with unparseable dates pinned to 0.
///
/// This is the ordering key for date sorts and merges: anything we cannot
/// read sorts as the oldest possible item.
pub fn timestamp(raw: &str) -> i64 {
    parse_date(raw).map_or(0, |dt| dt.timestamp_millis())
}

/// Re-renders a parseable date as RFC 3339; unparseable input is returned as-is.
pub fn to_rfc3339(raw: &str) -> String {
    parse_date(raw).map_or_else(|| raw.to_string(), |dt| dt.to_rfc3339())
}
