use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Canonical name of the 4G signal strength field (dBm).
pub const SIGNAL_4G: &str = "signal_4g";
/// Canonical name of the SDR link quality field (0-100).
pub const SIGNAL_SDR: &str = "signal_sdr";

/// One geotagged signal sample.
///
/// Points are read-only once loaded; the engine only borrows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Unix timestamp in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    /// Named numeric readings, e.g. `signal_4g` and `signal_sdr`.
    #[serde(default)]
    pub fields: BTreeMap<String, f64>,
}

impl SignalPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            timestamp: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: f64) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// A field reading, treating NaN/infinite values as absent.
    pub fn reading(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied().filter(|v| v.is_finite())
    }

    /// Check that the coordinates are usable for cell assignment.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(GridError::MalformedPoint {
                reason: format!(
                    "non-finite coordinate ({}, {})",
                    self.latitude, self.longitude
                ),
            });
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GridError::MalformedPoint {
                reason: format!("latitude {} out of range", self.latitude),
            });
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GridError::MalformedPoint {
                reason: format!("longitude {} out of range", self.longitude),
            });
        }
        Ok(())
    }
}

/// Map a raw column or JSON key onto the canonical field name.
pub fn canonical_field_name(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        "4g_signal" | "signal_4g" | "4g" | "rsrp" => SIGNAL_4G.to_string(),
        "sdr_signal" | "signal_sdr" | "sdr" | "sdr_quality" => SIGNAL_SDR.to_string(),
        _ => lower,
    }
}

/// Sorted union of all field names present on the points.
pub fn collect_field_names(points: &[SignalPoint]) -> Vec<String> {
    let mut names: Vec<String> = points
        .iter()
        .flat_map(|p| p.fields.keys().cloned())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Mean latitude/longitude of the points that pass validation.
pub fn mean_position(points: &[SignalPoint]) -> Option<(f64, f64)> {
    let (mut lat, mut lon, mut n) = (0.0, 0.0, 0usize);
    for p in points.iter().filter(|p| p.validate().is_ok()) {
        lat += p.latitude;
        lon += p.longitude;
        n += 1;
    }
    if n == 0 {
        None
    } else {
        Some((lat / n as f64, lon / n as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_latitude() {
        let err = SignalPoint::new(999.0, 116.0).validate().unwrap_err();
        assert!(matches!(err, GridError::MalformedPoint { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn rejects_nan_longitude() {
        assert!(SignalPoint::new(39.9, f64::NAN).validate().is_err());
        assert!(SignalPoint::new(39.9, 181.0).validate().is_err());
        assert!(SignalPoint::new(-90.0, 180.0).validate().is_ok());
    }

    #[test]
    fn nan_reading_is_absent() {
        let p = SignalPoint::new(0.0, 0.0)
            .with_field(SIGNAL_4G, f64::NAN)
            .with_field(SIGNAL_SDR, 55.0);
        assert_eq!(p.reading(SIGNAL_4G), None);
        assert_eq!(p.reading(SIGNAL_SDR), Some(55.0));
        assert_eq!(p.reading("missing"), None);
    }

    #[test]
    fn canonical_names() {
        assert_eq!(canonical_field_name("4g_signal"), SIGNAL_4G);
        assert_eq!(canonical_field_name(" SDR_Signal "), SIGNAL_SDR);
        assert_eq!(canonical_field_name("Snr"), "snr");
    }

    #[test]
    fn mean_position_skips_invalid() {
        let points = vec![
            SignalPoint::new(10.0, 20.0),
            SignalPoint::new(12.0, 22.0),
            SignalPoint::new(999.0, 0.0),
        ];
        assert_eq!(mean_position(&points), Some((11.0, 21.0)));
        assert_eq!(mean_position(&[]), None);
    }
}
