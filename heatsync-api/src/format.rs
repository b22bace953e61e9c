//! Display helpers shared by every dashboard view.

use time::OffsetDateTime;

use crate::models::TemperatureUnit;

pub fn format_temperature(value: f64, unit: TemperatureUnit) -> String {
    format!("{:.1}{}", value, unit.symbol())
}

pub fn format_battery_percentage(percentage: f64) -> String {
    format!("{}%", percentage.round() as i64)
}

/// Relative age of `then` seen from `now`, e.g. "5 minutes ago".
pub fn format_time_ago(then: OffsetDateTime, now: OffsetDateTime) -> String {
    let seconds = (now - then).whole_seconds();
    if seconds < 60 {
        return format!("{seconds} seconds ago");
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return plural(minutes, "minute");
    }

    let hours = minutes / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }

    plural(hours / 24, "day")
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;

    #[test]
    fn test_format_temperature() {
        assert_eq!(format_temperature(22.46, TemperatureUnit::Celsius), "22.5°C");
        assert_eq!(format_temperature(71.0, TemperatureUnit::Fahrenheit), "71.0°F");
    }

    #[test]
    fn test_format_battery_percentage() {
        assert_eq!(format_battery_percentage(74.6), "75%");
        assert_eq!(format_battery_percentage(0.0), "0%");
    }

    #[test]
    fn test_format_time_ago() {
        let now = OffsetDateTime::UNIX_EPOCH + Duration::days(10);

        assert_eq!(format_time_ago(now - Duration::seconds(42), now), "42 seconds ago");
        assert_eq!(format_time_ago(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(format_time_ago(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(format_time_ago(now - Duration::hours(1), now), "1 hour ago");
        assert_eq!(format_time_ago(now - Duration::hours(30), now), "1 day ago");
        assert_eq!(format_time_ago(now - Duration::days(3), now), "3 days ago");
    }
}
