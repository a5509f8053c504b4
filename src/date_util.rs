use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

/// The last `n` calendar days ending at `today`, oldest first. The window
/// is cut short at the earliest representable date.
pub fn last_n_days(today: NaiveDate, n: u32) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = (0..i64::from(n))
        .map_while(|offset| today.checked_sub_signed(Duration::days(offset)))
        .collect();
    days.reverse();
    days
}

/// Short day label used on chart axes, e.g. `Oct 16`.
pub fn day_label(d: NaiveDate) -> String {
    d.format("%b %-d").to_string()
}

/// Calendar day (UTC) of a timestamp.
pub fn day_of(ts: &DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Parse either `YYYY-MM-DD` or an RFC 3339 timestamp into a date.
pub fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

/// Serde helper for optional due dates that may arrive as a date or a timestamp.
/// Empty strings decode as `None`; anything else unparsable is an error.
pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_flexible_date(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_last_n_days_stops_at_min_date() {
        let days = last_n_days(NaiveDate::MIN, 1_000);
        assert_eq!(days, vec![NaiveDate::MIN]);

        let near_min = NaiveDate::MIN + Duration::days(2);
        let days = last_n_days(near_min, 150_000_000);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], NaiveDate::MIN);
        assert_eq!(days[2], near_min);
    }

    #[test]
    fn test_last_n_days_oldest_first() {
        let days = last_n_days(d(2025, 3, 2), 3);
        assert_eq!(days, vec![d(2025, 2, 28), d(2025, 3, 1), d(2025, 3, 2)]);
    }

    #[test]
    fn test_last_n_days_zero() {
        assert!(last_n_days(d(2025, 3, 2), 0).is_empty());
    }

    #[test]
    fn test_day_label() {
        assert_eq!(day_label(d(2025, 10, 6)), "Oct 6");
    }

    #[test]
    fn test_parse_flexible_date() {
        assert_eq!(parse_flexible_date("2025-01-10"), Some(d(2025, 1, 10)));
        assert_eq!(
            parse_flexible_date("2025-01-10T23:30:00Z"),
            Some(d(2025, 1, 10))
        );
        // Offset timestamps are converted to UTC before taking the day
        assert_eq!(
            parse_flexible_date("2025-01-10T23:30:00-05:00"),
            Some(d(2025, 1, 11))
        );
        assert_eq!(parse_flexible_date("next tuesday"), None);
    }

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_optional_date")]
        due: Option<NaiveDate>,
    }

    #[test]
    fn test_deserialize_optional_date() {
        let h: Holder = serde_json::from_str(r#"{"due": "2025-02-01"}"#).unwrap();
        assert_eq!(h.due, Some(d(2025, 2, 1)));

        let h: Holder = serde_json::from_str(r#"{"due": null}"#).unwrap();
        assert_eq!(h.due, None);

        let h: Holder = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(h.due, None);

        let h: Holder = serde_json::from_str(r#"{"due": ""}"#).unwrap();
        assert_eq!(h.due, None);

        assert!(serde_json::from_str::<Holder>(r#"{"due": "soon"}"#).is_err());
    }
}
