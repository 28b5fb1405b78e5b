use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc,
};

/// Which fields of a timestamp to render. All fields are on by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    pub year: bool,
    pub month: bool,
    pub date: bool,
    pub hours: bool,
    pub minutes: bool,
    pub seconds: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            year: true,
            month: true,
            date: true,
            hours: true,
            minutes: true,
            seconds: true,
        }
    }
}

impl FormatOptions {
    pub fn date_only() -> Self {
        Self {
            hours: false,
            minutes: false,
            seconds: false,
            ..Default::default()
        }
    }

    pub fn time_only() -> Self {
        Self {
            year: false,
            month: false,
            date: false,
            ..Default::default()
        }
    }
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parses an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC)
/// or a bare `YYYY-MM-DD` (UTC midnight).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// `+HH:MM` / `-HH:MM` (also `+HHMM`, `+HH`) into a fixed offset. Anything
/// unsigned, malformed or out of range is UTC.
pub fn parse_utc_offset(timezone: Option<&str>) -> FixedOffset {
    let utc = Utc.fix();
    let Some(timezone) = timezone.map(str::trim) else {
        return utc;
    };
    let (sign, rest) = if let Some(rest) = timezone.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = timezone.strip_prefix('-') {
        (-1, rest)
    } else {
        return utc;
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((hours, minutes)) => (hours, minutes),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let (Ok(hours), Ok(minutes)) = (hours.parse::<i32>(), minutes.parse::<i32>()) else {
        return utc;
    };
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return utc;
    }
    FixedOffset::east_opt(sign * (hours * 60 + minutes) * 60).unwrap_or(utc)
}

/// Renders `instant` shifted into `timezone`. Date fields are joined by `/`
/// without padding, time fields by `:` padded to two digits.
pub fn format_instant(
    instant: DateTime<Utc>,
    timezone: Option<&str>,
    options: FormatOptions,
) -> String {
    let local = instant.with_timezone(&parse_utc_offset(timezone));

    let mut date = vec![];
    if options.year {
        date.push(local.year().to_string());
    }
    if options.month {
        date.push(local.month().to_string());
    }
    if options.date {
        date.push(local.day().to_string());
    }

    let mut time = vec![];
    if options.hours {
        time.push(format!("{:02}", local.hour()));
    }
    if options.minutes {
        time.push(format!("{:02}", local.minute()));
    }
    if options.seconds {
        time.push(format!("{:02}", local.second()));
    }

    match (date.is_empty(), time.is_empty()) {
        (false, false) => format!("{} {}", date.join("/"), time.join(":")),
        (false, true) => date.join("/"),
        (true, false) => time.join(":"),
        (true, true) => String::new(),
    }
}

/// `None` when there is nothing to format or the input is not a date.
pub fn format_date(
    iso8601: Option<&str>,
    timezone: Option<&str>,
    options: FormatOptions,
) -> Option<String> {
    let instant = parse_instant(iso8601?)?;
    Some(format_instant(instant, timezone, options))
}

fn ymd(instant: &DateTime<Utc>) -> String {
    format!("{}/{}/{}", instant.year(), instant.month(), instant.day())
}

/// Collapses the parts the end shares with the start:
/// `2023/4/1`, `2023/4/1 - 3`, `2023/4/30 - 5/2`, `2023/12/31 - 2024/1/2`.
pub fn format_instant_range(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> String {
    let start_str = ymd(&start);
    let Some(end) = end else {
        return start_str;
    };
    if start.year() != end.year() {
        return format!("{start_str} - {}", ymd(&end));
    }
    if start.month() != end.month() {
        return format!("{start_str} - {}/{}", end.month(), end.day());
    }
    if start.day() != end.day() {
        return format!("{start_str} - {}", end.day());
    }
    start_str
}

/// Empty when `start_at` is not a date; an unparseable `end_at` is ignored.
pub fn format_date_range(start_at: &str, end_at: Option<&str>) -> String {
    let Some(start) = parse_instant(start_at) else {
        return String::new();
    };
    format_instant_range(start, end_at.and_then(parse_instant))
}
