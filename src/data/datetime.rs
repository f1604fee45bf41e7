use chrono::NaiveDateTime;

/// Sentinel returned by `detect_date_format` for RFC 3339 / ISO 8601
/// timestamps carrying a zone (e.g. `2025-03-10T08:26:28.987Z`).
pub const RFC3339_FORMAT: &str = "__rfc3339__";

/// Sentinel returned by `detect_date_format` for numeric epoch values.
/// Values above `EPOCH_MILLIS_THRESHOLD` are read as milliseconds.
pub const EPOCH_FORMAT: &str = "__epoch__";

/// Epoch values at or above this are milliseconds (year 2001 in ms,
/// year 33658 in seconds).
const EPOCH_MILLIS_THRESHOLD: f64 = 1.0e12;

pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S%.f",
    "%Y-%m-%d",
    "%Y/%m/%d",
];

/// Detect the most likely timestamp format from a sample of column values.
pub fn detect_date_format(values: &[String]) -> Option<&'static str> {
    let sample: Vec<&str> = values
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(100)
        .collect();

    if sample.is_empty() {
        return None;
    }

    let score = |ok: usize| ok as f64 / sample.len() as f64;

    let epoch_ok = sample.iter().filter(|s| s.parse::<f64>().is_ok()).count();
    if score(epoch_ok) > 0.9 {
        return Some(EPOCH_FORMAT);
    }

    let rfc_ok = sample
        .iter()
        .filter(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok())
        .count();

    let mut best: Option<&'static str> = (rfc_ok > 0).then_some(RFC3339_FORMAT);
    let mut best_score = score(rfc_ok);

    for &fmt in DATE_FORMATS {
        let ok = sample
            .iter()
            .filter(|s| {
                NaiveDateTime::parse_from_str(s, fmt).is_ok()
                    || chrono::NaiveDate::parse_from_str(s, fmt).is_ok()
            })
            .count();
        if score(ok) > best_score {
            best_score = score(ok);
            best = Some(fmt);
        }
    }

    best
}

/// Parse a value to Unix seconds (subsecond precision kept) using `format`.
pub fn parse_to_timestamp(value: &str, format: &str) -> Option<f64> {
    let value = value.trim();
    match format {
        EPOCH_FORMAT => value.parse::<f64>().ok().filter(|v| v.is_finite()).map(epoch_to_seconds),
        RFC3339_FORMAT => chrono::DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.timestamp_millis() as f64 / 1000.0),
        _ => {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
                Some(dt.and_utc().timestamp_millis() as f64 / 1000.0)
            } else {
                let d = chrono::NaiveDate::parse_from_str(value, format).ok()?;
                Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp() as f64)
            }
        }
    }
}

/// Normalize an epoch reading that may be seconds or milliseconds.
pub fn epoch_to_seconds(raw: f64) -> f64 {
    if raw.abs() >= EPOCH_MILLIS_THRESHOLD {
        raw / 1000.0
    } else {
        raw
    }
}

/// Format Unix seconds as `YYYY-mm-dd HH:MM:SS`, with milliseconds when the
/// value has a fractional part.
pub fn format_timestamp(ts: f64) -> String {
    use chrono::{DateTime, Utc};
    let secs = ts.floor() as i64;
    let nanos = ((ts - ts.floor()) * 1_000_000_000.0).round() as u32;
    match DateTime::<Utc>::from_timestamp(secs, nanos.min(999_999_999)) {
        Some(dt) if nanos == 0 => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        None => format!("{ts:.3}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn detects_epoch_millis() {
        let col = strings(&["1700000000000", "1700000000500"]);
        assert_eq!(detect_date_format(&col), Some(EPOCH_FORMAT));
        assert_eq!(parse_to_timestamp("1700000000500", EPOCH_FORMAT), Some(1_700_000_000.5));
        assert_eq!(parse_to_timestamp("1700000000", EPOCH_FORMAT), Some(1_700_000_000.0));
    }

    #[test]
    fn detects_space_separated_datetime() {
        let col = strings(&["2024-05-01 10:00:00", "2024-05-01 10:00:01.250"]);
        let fmt = detect_date_format(&col).unwrap();
        assert_eq!(parse_to_timestamp("2024-05-01 00:00:00", fmt), Some(1_714_521_600.0));
    }

    #[test]
    fn parses_rfc3339() {
        let col = strings(&["2024-05-01T00:00:00Z"]);
        assert_eq!(detect_date_format(&col), Some(RFC3339_FORMAT));
        assert_eq!(
            parse_to_timestamp("2024-05-01T00:00:00.500Z", RFC3339_FORMAT),
            Some(1_714_521_600.5)
        );
    }

    #[test]
    fn formats_round_trip() {
        assert_eq!(format_timestamp(1_714_521_600.0), "2024-05-01 00:00:00");
        assert_eq!(format_timestamp(1_714_521_600.25), "2024-05-01 00:00:00.250");
    }

    #[test]
    fn empty_column_has_no_format() {
        assert_eq!(detect_date_format(&strings(&["", "  "])), None);
    }
}
