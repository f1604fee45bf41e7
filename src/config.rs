//! Run configuration: JSON file values overridden by command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::point::{
    canonical_field_name, collect_field_names, mean_position, SignalPoint, SIGNAL_4G,
};
use crate::error::{GridError, Result};
use crate::grid::{GridShape, GridSpec};

fn default_cell_size() -> f64 {
    1.0
}

fn default_extent() -> f64 {
    10.0
}

fn default_device() -> String {
    "default".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output_maps")
}

fn default_shards() -> usize {
    1
}

/// Settings for one `aggregate` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub shape: GridShape,
    /// Grid center. Falls back to the mean position of the valid points.
    pub center_lat: Option<f64>,
    pub center_lon: Option<f64>,
    #[serde(default = "default_cell_size")]
    pub cell_size_km: f64,
    #[serde(default = "default_extent")]
    pub extent_km: f64,
    /// Tracked fields. Empty means every numeric field found in the input.
    pub fields: Vec<String>,
    /// Field written to the aggregate rows. Defaults to `signal_4g` when
    /// tracked, otherwise the first tracked field.
    pub signal_field: Option<String>,
    #[serde(default = "default_device")]
    pub device_id: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Number of shards aggregated in parallel; 1 runs single-threaded.
    #[serde(default = "default_shards")]
    pub shards: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            shape: GridShape::Hexagon,
            center_lat: None,
            center_lon: None,
            cell_size_km: default_cell_size(),
            extent_km: default_extent(),
            fields: Vec::new(),
            signal_field: None,
            device_id: default_device(),
            output_dir: default_output_dir(),
            shards: default_shards(),
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| GridError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: RunConfig = serde_json::from_str(&text)
            .map_err(|e| GridError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply command-line overrides on top of the file values.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(shape) = overrides.shape {
            self.shape = shape;
        }
        if overrides.center_lat.is_some() {
            self.center_lat = overrides.center_lat;
        }
        if overrides.center_lon.is_some() {
            self.center_lon = overrides.center_lon;
        }
        if let Some(v) = overrides.cell_size_km {
            self.cell_size_km = v;
        }
        if let Some(v) = overrides.extent_km {
            self.extent_km = v;
        }
        if !overrides.fields.is_empty() {
            self.fields = overrides.fields.clone();
        }
        if overrides.signal_field.is_some() {
            self.signal_field = overrides.signal_field.clone();
        }
        if let Some(device) = &overrides.device_id {
            self.device_id = device.clone();
        }
        if let Some(dir) = &overrides.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(shards) = overrides.shards {
            self.shards = shards;
        }
    }

    /// Build the grid spec, taking any missing center coordinate from the
    /// mean position of `points`.
    pub fn grid_spec(&self, points: &[SignalPoint]) -> Result<GridSpec> {
        let (center_lat, center_lon) = match (self.center_lat, self.center_lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            (lat, lon) => {
                let (mean_lat, mean_lon) = mean_position(points).ok_or_else(|| {
                    GridError::Config(
                        "no grid center given and no valid points to derive one from".into(),
                    )
                })?;
                tracing::info!("Grid center from point mean: ({mean_lat:.6}, {mean_lon:.6})");
                (lat.unwrap_or(mean_lat), lon.unwrap_or(mean_lon))
            }
        };
        GridSpec::new(
            self.shape,
            center_lat,
            center_lon,
            self.cell_size_km,
            self.extent_km,
        )
    }

    /// Tracked fields, canonicalized, or every numeric field in `points`.
    pub fn tracked_fields(&self, points: &[SignalPoint]) -> Vec<String> {
        if self.fields.is_empty() {
            collect_field_names(points)
        } else {
            let mut fields: Vec<String> = Vec::with_capacity(self.fields.len());
            for name in self.fields.iter().map(|f| canonical_field_name(f)) {
                if !fields.contains(&name) {
                    fields.push(name);
                }
            }
            fields
        }
    }

    pub fn aggregate_field(&self, tracked: &[String]) -> Option<String> {
        if let Some(field) = &self.signal_field {
            return Some(canonical_field_name(field));
        }
        tracked
            .iter()
            .find(|f| f.as_str() == SIGNAL_4G)
            .or_else(|| tracked.first())
            .cloned()
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigOverrides {
    /// Cell shape: hexagon or square
    #[arg(long)]
    pub shape: Option<GridShape>,

    #[arg(long, allow_hyphen_values = true)]
    pub center_lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub center_lon: Option<f64>,

    #[arg(long)]
    pub cell_size_km: Option<f64>,

    #[arg(long)]
    pub extent_km: Option<f64>,

    /// Field to aggregate; repeat for several
    #[arg(long = "field")]
    pub fields: Vec<String>,

    /// Field written to the aggregate rows
    #[arg(long)]
    pub signal_field: Option<String>,

    #[arg(long = "device")]
    pub device_id: Option<String>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Parallel shards
    #[arg(long)]
    pub shards: Option<usize>,
}
