//! Usage: Date-range normalization shared by the aggregation routes.

use crate::upstream::models::parse_timestamp;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

pub(crate) const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Bare `YYYY-MM-DD` becomes the first millisecond of that day.
pub(crate) fn normalize_start(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains('T') {
        raw.to_string()
    } else {
        format!("{raw}T00:00:00.000Z")
    }
}

/// Bare `YYYY-MM-DD` becomes the last millisecond of that day.
pub(crate) fn normalize_end(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains('T') {
        raw.to_string()
    } else {
        format!("{raw}T23:59:59.999Z")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DateRange {
    pub(crate) start_date: Option<String>,
    pub(crate) end_date: Option<String>,
}

impl DateRange {
    /// Normalized copy of whatever the caller supplied; blank values are dropped.
    pub(crate) fn from_query(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start_date: non_blank(start).map(normalize_start),
            end_date: non_blank(end).map(normalize_end),
        }
    }

    /// Like `from_query`, with missing bounds defaulting to the last `days` days.
    pub(crate) fn with_default_window(
        start: Option<&str>,
        end: Option<&str>,
        days: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let start = non_blank(start)
            .map(str::to_string)
            .unwrap_or_else(|| day_string(now - Duration::days(days)));
        let end = non_blank(end)
            .map(str::to_string)
            .unwrap_or_else(|| day_string(now));
        Self {
            start_date: Some(normalize_start(&start)),
            end_date: Some(normalize_end(&end)),
        }
    }

    /// `startDate`/`endDate` query pairs for upstream calls.
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = &self.start_date {
            pairs.push(("startDate", start.clone()));
        }
        if let Some(end) = &self.end_date {
            pairs.push(("endDate", end.clone()));
        }
        pairs
    }

    /// Inclusive on both ends; an unparseable bound does not restrict.
    pub(crate) fn contains(&self, ts: DateTime<Utc>) -> bool {
        let after_start = self
            .start_date
            .as_deref()
            .and_then(parse_timestamp)
            .map_or(true, |start| ts >= start);
        let before_end = self
            .end_date
            .as_deref()
            .and_then(parse_timestamp)
            .map_or(true, |end| ts <= end);
        after_start && before_end
    }
}

pub(crate) fn day_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Calendar parts used by the Power BI earnings rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DateParts {
    pub(crate) year: i32,
    pub(crate) month: u32,
    pub(crate) day: u32,
    // 0 = Sunday.
    pub(crate) day_of_week: u32,
    pub(crate) iso_week: u32,
    pub(crate) quarter: u32,
}

impl DateParts {
    pub(crate) fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            day_of_week: date.weekday().num_days_from_sunday(),
            iso_week: date.iso_week().week(),
            quarter: (date.month0() / 3) + 1,
        }
    }
}

/// Accepts a full timestamp or a bare `YYYY-MM-DD`.
pub(crate) fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Some(ts) = parse_timestamp(raw) {
        return Some(ts.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bare_dates_expand_to_day_bounds() {
        assert_eq!(normalize_start("2025-01-01"), "2025-01-01T00:00:00.000Z");
        assert_eq!(normalize_end("2025-01-31"), "2025-01-31T23:59:59.999Z");
        assert_eq!(
            normalize_start("2025-01-01T05:00:00Z"),
            "2025-01-01T05:00:00Z"
        );
    }

    #[test]
    fn default_window_covers_last_thirty_days() {
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap();
        let range = DateRange::with_default_window(None, None, DEFAULT_WINDOW_DAYS, now);
        assert_eq!(range.start_date.as_deref(), Some("2025-03-01T00:00:00.000Z"));
        assert_eq!(range.end_date.as_deref(), Some("2025-03-31T23:59:59.999Z"));
    }

    #[test]
    fn contains_is_inclusive_and_open_when_unbounded() {
        let range = DateRange::from_query(Some("2025-01-01"), Some("2025-01-31"));
        let inside = Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 59).unwrap();
        let outside = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        assert!(range.contains(inside));
        assert!(!range.contains(outside));
        assert!(DateRange::default().contains(outside));
        assert_eq!(DateRange::from_query(Some(" "), None), DateRange::default());
    }

    #[test]
    fn date_parts_use_iso_week_and_sunday_zero() {
        // 2025-01-05 is a Sunday in ISO week 1.
        let parts = DateParts::of(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert_eq!(parts.day_of_week, 0);
        assert_eq!(parts.iso_week, 1);
        assert_eq!(parts.quarter, 1);

        // 2024-12-30 belongs to ISO week 1 of 2025.
        let parts = DateParts::of(NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
        assert_eq!(parts.iso_week, 1);
        assert_eq!(parts.year, 2024);

        let parts = DateParts::of(NaiveDate::from_ymd_opt(2025, 10, 15).unwrap());
        assert_eq!(parts.quarter, 4);
    }

    #[test]
    fn calendar_dates_parse_from_both_shapes() {
        assert_eq!(
            parse_calendar_date("2025-02-03"),
            NaiveDate::from_ymd_opt(2025, 2, 3)
        );
        assert_eq!(
            parse_calendar_date("2025-02-03T22:00:00.000Z"),
            NaiveDate::from_ymd_opt(2025, 2, 3)
        );
        assert!(parse_calendar_date("yesterday").is_none());
    }
}
