use chrono::{DateTime, Utc};

// Seconds per minute, minutes per hour, hours per day, days per week,
// weeks per month and months per year.
const STEPS: [f64; 6] = [60.0, 60.0, 24.0, 7.0, 365.0 / 7.0 / 12.0, 12.0];
const UNITS: [&str; 7] = ["second", "minute", "hour", "day", "week", "month", "year"];

/// English relative time such as "3 hours ago" or "in 2 days".
///
/// The value is floored in the largest unit that fits; anything under ten
/// seconds away is "just now" (or "right now" when in the future).
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mut diff = (now - then).num_milliseconds() as f64 / 1000.0;
    let future = diff < 0.0;
    diff = diff.abs();

    let mut idx = 0;
    while idx < STEPS.len() && diff >= STEPS[idx] {
        diff /= STEPS[idx];
        idx += 1;
    }
    let value = diff.floor() as i64;

    if idx == 0 && value <= 9 {
        return if future { "right now" } else { "just now" }.to_string();
    }

    let unit = UNITS[idx];
    let phrase = if idx == 0 || value > 1 {
        format!("{value} {unit}s")
    } else {
        format!("1 {unit}")
    };

    if future {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ago(seconds: i64) -> String {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        time_ago(now - Duration::seconds(seconds), now)
    }

    #[test]
    fn test_past_phrases() {
        assert_eq!(ago(0), "just now");
        assert_eq!(ago(9), "just now");
        assert_eq!(ago(10), "10 seconds ago");
        assert_eq!(ago(59), "59 seconds ago");
        assert_eq!(ago(60), "1 minute ago");
        assert_eq!(ago(119), "1 minute ago");
        assert_eq!(ago(120), "2 minutes ago");
        assert_eq!(ago(2 * 3600 + 1800), "2 hours ago");
        assert_eq!(ago(86_400), "1 day ago");
        assert_eq!(ago(6 * 86_400), "6 days ago");
        assert_eq!(ago(8 * 86_400), "1 week ago");
        assert_eq!(ago(40 * 86_400), "1 month ago");
        assert_eq!(ago(100 * 86_400), "3 months ago");
        assert_eq!(ago(400 * 86_400), "1 year ago");
        assert_eq!(ago(1000 * 86_400), "2 years ago");
    }

    #[test]
    fn test_future_phrases() {
        assert_eq!(ago(-3), "right now");
        assert_eq!(ago(-180), "in 3 minutes");
        assert_eq!(ago(-3600), "in 1 hour");
    }
}
