//! Flattening of drone flight-record JSON into signal points.
//!
//! A flight record is an object with a `frameState` array. Each frame may
//! carry the dock position, the aircraft's flight-controller location and
//! its wireless link status. Only aircraft positions become points; the SDR
//! quality is sticky and applies to every later frame until it changes.

use serde::Deserialize;

use crate::data::datetime::epoch_to_seconds;
use crate::data::point::{SignalPoint, SIGNAL_SDR};

#[derive(Debug, Deserialize)]
pub struct FlightRecord {
    #[serde(rename = "frameState", default)]
    pub frame_state: Vec<FrameState>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FrameState {
    /// Epoch milliseconds.
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub dock: Vec<Dock>,
    #[serde(default)]
    pub uav: Vec<Uav>,
}

#[derive(Debug, Deserialize)]
pub struct Dock {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Uav {
    #[serde(default)]
    pub fc: Vec<FlightController>,
    #[serde(default)]
    pub wireless_link: Vec<WirelessLink>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FlightController {
    pub location: Option<Location>,
}

#[derive(Debug, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WirelessLink {
    pub sdr_quality: Option<f64>,
}

impl FlightRecord {
    /// First dock position found in the record, if any.
    pub fn dock_position(&self) -> Option<(f64, f64)> {
        self.frame_state
            .iter()
            .filter_map(|f| f.dock.first())
            .find_map(|d| Some((d.latitude?, d.longitude?)))
    }

    /// Flatten aircraft positions into points, carrying the last seen SDR
    /// quality forward.
    pub fn to_points(&self) -> Vec<SignalPoint> {
        if let Some((lat, lon)) = self.dock_position() {
            tracing::info!("Dock position: ({lat}, {lon})");
        }

        let mut points = Vec::new();
        let mut sdr_quality: Option<f64> = None;

        for frame in &self.frame_state {
            let Some(uav) = frame.uav.first() else { continue };

            if let Some(q) = uav.wireless_link.first().and_then(|w| w.sdr_quality) {
                sdr_quality = Some(q);
            }

            let Some(loc) = uav.fc.first().and_then(|fc| fc.location.as_ref()) else {
                continue;
            };

            let mut point = SignalPoint::new(loc.latitude, loc.longitude);
            point.altitude = loc.altitude;
            point.timestamp = frame.time.map(epoch_to_seconds);
            if let Some(q) = sdr_quality {
                point.fields.insert(SIGNAL_SDR.to_string(), q);
            }
            points.push(point);
        }

        tracing::info!("Flight record flattened into {} points", points.len());
        points
    }
}
