use chrono::{DateTime, Duration, TimeZone, Timelike};

/// Parses a `"HH:MM"` time-of-day string into minutes since midnight.
pub fn parse_minutes_of_day(value: &str) -> Option<u32> {
    let (hours, minutes) = value.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Minutes since midnight for a moment, in the timezone of the moment.
pub fn minutes_of_day<Tz: TimeZone>(moment: &DateTime<Tz>) -> u32 {
    moment.hour() * 60 + moment.minute()
}

/// This is the standard way of presenting a duration to the user.
/// Sub-minute durations collapse to "0m", exact hours drop the minute part.
pub fn format_duration(value: Duration) -> String {
    let minutes = value.num_minutes().max(0);
    let hours = minutes / 60;
    let minutes = minutes % 60;
    match (hours, minutes) {
        (0, minutes) => format!("{minutes}m"),
        (hours, 0) => format!("{hours}h"),
        (hours, minutes) => format!("{hours}h {minutes}m"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::{format_duration, parse_minutes_of_day};

    #[test]
    fn parses_valid_times_of_day() {
        assert_eq!(parse_minutes_of_day("00:00"), Some(0));
        assert_eq!(parse_minutes_of_day("09:00"), Some(540));
        assert_eq!(parse_minutes_of_day("17:30"), Some(1050));
        assert_eq!(parse_minutes_of_day("23:59"), Some(1439));
    }

    #[test]
    fn rejects_malformed_times_of_day() {
        assert_eq!(parse_minutes_of_day("24:00"), None);
        assert_eq!(parse_minutes_of_day("12:60"), None);
        assert_eq!(parse_minutes_of_day("12"), None);
        assert_eq!(parse_minutes_of_day("noon"), None);
        assert_eq!(parse_minutes_of_day("12:xx"), None);
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::zero()), "0m");
        assert_eq!(format_duration(Duration::seconds(59)), "0m");
        assert_eq!(format_duration(Duration::minutes(45)), "45m");
        assert_eq!(format_duration(Duration::hours(2)), "2h");
        assert_eq!(format_duration(Duration::minutes(135)), "2h 15m");
    }

    #[test]
    fn negative_durations_collapse_to_zero() {
        assert_eq!(format_duration(Duration::minutes(-5)), "0m");
    }
}
