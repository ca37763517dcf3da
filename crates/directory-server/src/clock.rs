//! Кодирование временных меток для хранения в БД.

use chrono::{DateTime, SecondsFormat, Utc};

/// Строка RFC 3339 фиксированной ширины: `2026-10-16T12:00:00.000000Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let fractional = whole + Duration::microseconds(1500);

        assert_eq!(format_timestamp(whole), "2026-10-16T12:00:00.000000Z");
        assert_eq!(format_timestamp(fractional), "2026-10-16T12:00:00.001500Z");
    }

    #[test]
    fn test_string_order_matches_time_order() {
        let base = Utc.with_ymd_and_hms(2026, 10, 16, 9, 59, 59).unwrap();
        let stamps: Vec<String> = [0, 1, 999_999, 1_000_000, 3_600_000_000]
            .into_iter()
            .map(|us| format_timestamp(base + Duration::microseconds(us)))
            .collect();

        let mut sorted = stamps.clone();
        sorted.sort();
        assert_eq!(stamps, sorted);
    }

    #[test]
    fn test_parse_roundtrip_and_garbage() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(at)), Some(at));
        assert_eq!(parse_timestamp("вчера"), None);
    }
}
