//! Date normalisation and parsing.
//!
//! Internally every date field is a canonical `DateTime<Utc>`. Values arrive
//! from outside either as timestamps or as serialized strings; that union is
//! modelled once here as [`DateInput`] and collapsed by [`ensure_date`]. No
//! other module accepts the union form: the serde helpers below sit on the
//! persistence boundary, and the CLI funnels user input through
//! [`parse_due_input`].

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serializer};

/// A date value as it may arrive at a boundary: already canonical, or a
/// serialized string form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl From<DateTime<Utc>> for DateInput {
    fn from(dt: DateTime<Utc>) -> Self {
        DateInput::Timestamp(dt)
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

/// Coerce a possibly-stringly date into the canonical representation.
///
/// `None` stays `None`; an already-canonical timestamp passes through
/// unchanged (so the function is idempotent); a string is parsed
/// permissively. An unparseable string yields `None` rather than an error —
/// the uniform policy for invalid date input throughout the crate.
pub fn ensure_date(value: Option<DateInput>) -> Option<DateTime<Utc>> {
    match value? {
        DateInput::Timestamp(dt) => Some(dt),
        DateInput::Text(s) => parse_date(&s),
    }
}

/// Parse a serialized date string.
///
/// Accepts RFC 3339 (the persisted form), a naive `YYYY-MM-DDTHH:MM:SS`
/// timestamp (with or without fractional seconds), and a bare `YYYY-MM-DD`
/// date, which lands at midnight UTC.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
}

/// Parse human-readable due date input from the CLI.
///
/// Supports:
/// - "today", "tomorrow"
/// - "in 3d", "in 2w"
/// - bare weekday names ("friday" is this week's Friday, or today)
/// - anything [`parse_date`] accepts
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<DateTime<Utc>> {
    let s = s.trim().to_lowercase();

    let day = |d: NaiveDate| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();

    match s.as_str() {
        "today" => return Some(day(today)),
        "tomorrow" => return Some(day(today + Duration::days(1))),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(day(today + Duration::days(days)));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(day(today + Duration::weeks(weeks)));
            }
        }
    }

    if let Ok(target) = s.parse::<Weekday>() {
        let current = today.weekday().num_days_from_monday() as i64;
        let wanted = target.num_days_from_monday() as i64;
        let ahead = (wanted - current).rem_euclid(7);
        return Some(day(today + Duration::days(ahead)));
    }

    parse_date(&s)
}

/// Start and end of the current ISO week (Monday to Sunday), as inclusive
/// instants covering the whole days.
pub fn start_end_of_this_week(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    let end = start + Duration::days(7); // exclusive of next Monday's midnight
    (
        start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
        end.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc() - Duration::seconds(1),
    )
}

/// Serde adapter for required date fields persisted as ISO-8601 strings.
///
/// Deserialisation is permissive: an unparseable value falls back to "now"
/// rather than rejecting the whole blob, matching the rehydration contract
/// for `created_at`/`updated_at`.
pub mod iso_datetime {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = Option::<DateInput>::deserialize(d)?;
        Ok(ensure_date(raw).unwrap_or_else(Utc::now))
    }

    /// Variant for optional date fields (`due_date`): absent or unparseable
    /// input becomes `None`.
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => s.serialize_some(&dt.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<DateInput>::deserialize(d)?;
            Ok(ensure_date(raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ensure_date_passes_none_through() {
        assert_eq!(ensure_date(None), None);
    }

    #[test]
    fn ensure_date_is_idempotent() {
        let parsed = ensure_date(Some("2024-12-01T09:00:00".into()));
        assert!(parsed.is_some());
        let again = ensure_date(parsed.map(DateInput::from));
        assert_eq!(parsed, again);
    }

    #[test]
    fn parse_date_accepts_rfc3339_and_naive_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap();
        assert_eq!(parse_date("2024-12-01T09:00:00+00:00"), Some(expected));
        assert_eq!(parse_date("2024-12-01T09:00:00"), Some(expected));
        assert_eq!(
            parse_date("2024-12-01"),
            Some(Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn unparseable_input_yields_none() {
        assert_eq!(ensure_date(Some("not a date".into())), None);
        assert_eq!(parse_date("12/01/2024"), None);
    }

    #[test]
    fn week_bounds_cover_monday_through_sunday() {
        let wednesday = NaiveDate::from_ymd_opt(2024, 12, 4).unwrap();
        let (start, end) = start_end_of_this_week(wednesday);
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2024, 12, 2).unwrap());
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 12, 8).unwrap());
        assert!(end > start);
    }

    #[test]
    fn due_input_relative_forms() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 2).unwrap(); // a Monday
        let got = parse_due_input("tomorrow", today).unwrap();
        assert_eq!(got.date_naive(), NaiveDate::from_ymd_opt(2024, 12, 3).unwrap());

        let got = parse_due_input("in 2w", today).unwrap();
        assert_eq!(got.date_naive(), today + Duration::weeks(2));

        // This week's Friday.
        let got = parse_due_input("friday", today).unwrap();
        assert_eq!(got.date_naive(), NaiveDate::from_ymd_opt(2024, 12, 6).unwrap());

        // Same weekday as today resolves to today.
        let got = parse_due_input("monday", today).unwrap();
        assert_eq!(got.date_naive(), today);
    }
}
