//! Usage: Clock helpers shared by OAuth expiry math, health probes and report metadata.

use chrono::{SecondsFormat, Utc};

pub(crate) fn now_unix_seconds() -> i64 {
    Utc::now().timestamp()
}

/// `2025-01-31T12:00:00.000Z`, the format every report timestamp uses.
pub(crate) fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_timestamp_uses_millis_and_z_suffix() {
        let ts = now_iso8601();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2025-01-31T12:00:00.000Z".len());
    }

    #[test]
    fn unix_seconds_is_after_2024() {
        assert!(now_unix_seconds() > 1_704_067_200);
    }
}
