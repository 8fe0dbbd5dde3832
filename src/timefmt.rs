//! Human-relative time rendering for the control surface.

use chrono::{DateTime, Local, Utc};

/// Format `when` relative to `now`: "just now" under a minute, minutes under
/// an hour, hours under a day, else a locale-formatted absolute timestamp.
pub fn format_relative(when: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(when).num_seconds().max(0);

    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3600 {
        let minutes = seconds / 60;
        format!("{} minute{} ago", minutes, plural(minutes))
    } else if seconds < 86_400 {
        let hours = seconds / 3600;
        format!("{} hour{} ago", hours, plural(hours))
    } else {
        when.with_timezone(&Local)
            .format("%c")
            .to_string()
    }
}

fn plural(n: i64) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-02T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_just_now_under_a_minute() {
        let when = now() - Duration::seconds(30);
        assert_eq!(format_relative(when, now()), "just now");
    }

    #[test]
    fn test_minutes() {
        let when = now() - Duration::seconds(120);
        assert_eq!(format_relative(when, now()), "2 minutes ago");

        let when = now() - Duration::seconds(60);
        assert_eq!(format_relative(when, now()), "1 minute ago");
    }

    #[test]
    fn test_hours() {
        let when = now() - Duration::seconds(7200);
        assert_eq!(format_relative(when, now()), "2 hours ago");

        let when = now() - Duration::seconds(3600);
        assert_eq!(format_relative(when, now()), "1 hour ago");
    }

    #[test]
    fn test_day_or_more_is_absolute() {
        let when = now() - Duration::seconds(90_000);
        let rendered = format_relative(when, now());
        assert!(!rendered.contains("ago"));
        assert_ne!(rendered, "just now");
    }

    #[test]
    fn test_future_timestamp_clamps_to_just_now() {
        let when = now() + Duration::seconds(300);
        assert_eq!(format_relative(when, now()), "just now");
    }
}
