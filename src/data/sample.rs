use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::data::point::{SignalPoint, SIGNAL_4G, SIGNAL_SDR};
use crate::grid::projection::LocalProjection;

/// Parameters for synthesizing a flight's worth of signal samples.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub count: usize,
    pub radius_km: f64,
    /// Share of points placed in the inner third of the radius.
    pub concentration: f64,
    pub seed: u64,
    /// Unix seconds of the first sample; samples are one second apart.
    pub start_time: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            center_lat: 39.9042,
            center_lon: 116.4074,
            count: 1000,
            radius_km: 2.0,
            concentration: 0.8,
            seed: 42,
            start_time: 1_714_521_600.0,
        }
    }
}

/// Generate points around the center whose signal degrades with distance.
///
/// `signal_4g` runs from about -60 dBm at the center to -110 dBm at the rim;
/// `signal_sdr` from about 95 to 35. Both carry Gaussian noise and are
/// clamped to plausible ranges. Identical configs produce identical output.
pub fn generate_sample_points(config: &SampleConfig) -> Vec<SignalPoint> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);
    let projection = LocalProjection::new(config.center_lat, config.center_lon);
    let radius = config.radius_km.max(f64::EPSILON);
    let concentration = config.concentration.clamp(0.0, 1.0);

    (0..config.count)
        .map(|i| {
            let reach = if rng.gen_bool(concentration) { radius / 3.0 } else { radius };
            // sqrt keeps the density uniform over the disc.
            let r = reach * rng.gen::<f64>().sqrt();
            let theta = rng.gen_range(0.0..std::f64::consts::TAU);
            let (lat, lon) = projection.unproject(r * theta.cos(), r * theta.sin());

            let falloff = r / radius;
            let noise_4g: f64 = rng.sample(StandardNormal);
            let noise_sdr: f64 = rng.sample(StandardNormal);
            let signal_4g = (-60.0 - 50.0 * falloff + 4.0 * noise_4g).clamp(-130.0, -40.0);
            let signal_sdr = (95.0 - 60.0 * falloff + 5.0 * noise_sdr).clamp(0.0, 100.0);
            let altitude = 100.0 + 20.0 * rng.gen::<f64>();

            SignalPoint::new(lat, lon)
                .with_altitude(altitude)
                .with_timestamp(config.start_time + i as f64)
                .with_field(SIGNAL_4G, signal_4g)
                .with_field(SIGNAL_SDR, signal_sdr)
        })
        .collect()
}
