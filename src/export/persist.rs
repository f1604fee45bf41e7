//! Flat per-cell aggregate rows for downstream storage.
//!
//! Each row summarizes one signal field of one cell for one device. Rows are
//! unique on `(device_id, resolution, cell_index)`; storing a row for an
//! existing key replaces it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::GridSpec;
use crate::processing::GridAggregation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub device_id: String,
    /// Grid shape and cell size, e.g. `hexagon_0.05km`.
    pub resolution: String,
    pub cell_index: String,
    pub signal_field: String,
    pub point_count: u64,
    pub avg_signal: f64,
    pub max_signal: f64,
    pub min_signal: f64,
}

/// Resolution label shared by every record of a grid.
pub fn resolution_label(spec: &GridSpec) -> String {
    format!("{}_{}km", spec.shape, spec.cell_size_km)
}

/// Records for cells where `field` has at least one reading.
pub fn records_for(result: &GridAggregation, device_id: &str, field: &str) -> Vec<AggregateRecord> {
    let resolution = resolution_label(&result.spec);
    result
        .stats
        .iter()
        .filter_map(|s| {
            let f = s.field(field)?;
            Some(AggregateRecord {
                device_id: device_id.to_string(),
                resolution: resolution.clone(),
                cell_index: s.cell_id.clone(),
                signal_field: field.to_string(),
                point_count: f.count,
                avg_signal: f.mean,
                max_signal: f.max,
                min_signal: f.min,
            })
        })
        .collect()
}

type RecordKey = (String, String, String);

/// In-memory aggregate table keyed by `(device_id, resolution, cell_index)`.
#[derive(Debug, Default, Clone)]
pub struct AggregateStore {
    rows: BTreeMap<RecordKey, AggregateRecord>,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the replaced record, if any.
    pub fn upsert(&mut self, record: AggregateRecord) -> Option<AggregateRecord> {
        let key = (
            record.device_id.clone(),
            record.resolution.clone(),
            record.cell_index.clone(),
        );
        self.rows.insert(key, record)
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = AggregateRecord>) -> usize {
        records
            .into_iter()
            .filter_map(|r| self.upsert(r))
            .count()
    }

    pub fn get(&self, device_id: &str, resolution: &str, cell_index: &str) -> Option<&AggregateRecord> {
        self.rows.get(&(
            device_id.to_string(),
            resolution.to_string(),
            cell_index.to_string(),
        ))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &AggregateRecord> {
        self.rows.values()
    }

    /// Dump all rows, in key order, as CSV.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in self.records() {
            writer.serialize(record)?;
        }
        writer.flush()?;
        tracing::info!("Wrote {} aggregate rows to {:?}", self.len(), path);
        Ok(())
    }

    /// Load rows written by [`AggregateStore::write_csv`].
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut store = Self::new();
        for record in reader.deserialize() {
            store.upsert(record?);
        }
        Ok(store)
    }

    /// The store persisted at `path`, or an empty one if the file does not
    /// exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        if path.exists() {
            let store = Self::read_csv(path)?;
            tracing::debug!("Loaded {} aggregate rows from {:?}", store.len(), path);
            Ok(store)
        } else {
            Ok(Self::new())
        }
    }

    /// Upsert `records` into the store at `path` and write it back.
    /// Returns how many existing rows were replaced.
    pub fn persist(path: &Path, records: Vec<AggregateRecord>) -> Result<usize> {
        let mut store = Self::open(path)?;
        let replaced = store.extend(records);
        store.write_csv(path)?;
        if replaced > 0 {
            tracing::info!("Replaced {replaced} existing aggregate rows");
        }
        Ok(replaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::point::{SignalPoint, SIGNAL_4G, SIGNAL_SDR};
    use crate::grid::GridShape;
    use crate::processing::aggregate;

    fn result() -> GridAggregation {
        let spec = GridSpec::new(GridShape::Square, 39.9042, 116.4074, 0.05, 0.1).unwrap();
        let points = vec![
            SignalPoint::new(39.9042, 116.4074).with_field(SIGNAL_4G, -70.0),
            SignalPoint::new(39.9042, 116.4074).with_field(SIGNAL_4G, -90.0),
            SignalPoint::new(39.9042, 116.4080).with_field(SIGNAL_SDR, 70.0),
        ];
        aggregate(&points, &spec, &[SIGNAL_4G.to_string(), SIGNAL_SDR.to_string()]).unwrap()
    }

    #[test]
    fn only_cells_with_readings_become_records() {
        let result = result();
        let records = records_for(&result, "drone-7", SIGNAL_4G);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.resolution, "square_0.05km");
        assert_eq!(r.cell_index, "sq_0_0");
        assert_eq!(r.point_count, 2);
        assert_eq!((r.avg_signal, r.max_signal, r.min_signal), (-80.0, -70.0, -90.0));
    }

    #[test]
    fn upsert_keeps_keys_unique() {
        let result = result();
        let mut store = AggregateStore::new();
        assert_eq!(store.extend(records_for(&result, "drone-7", SIGNAL_4G)), 0);
        assert_eq!(store.len(), 1);

        // Same cell, same device, same resolution: replaced, not duplicated.
        let replaced = store.extend(records_for(&result, "drone-7", SIGNAL_4G));
        assert_eq!(replaced, 1);
        assert_eq!(store.len(), 1);

        store.extend(records_for(&result, "drone-8", SIGNAL_4G));
        assert_eq!(store.len(), 2);
        assert!(store.get("drone-8", "square_0.05km", "sq_0_0").is_some());
    }

    #[test]
    fn runs_accumulate_across_devices_in_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square_aggregates.csv");
        let result = result();

        assert_eq!(AggregateStore::persist(&path, records_for(&result, "drone-a", SIGNAL_4G)).unwrap(), 0);
        assert_eq!(AggregateStore::persist(&path, records_for(&result, "drone-b", SIGNAL_4G)).unwrap(), 0);
        let store = AggregateStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("drone-a", "square_0.05km", "sq_0_0").is_some());
        assert!(store.get("drone-b", "square_0.05km", "sq_0_0").is_some());

        // A rerun for drone-a with new readings replaces only its own row.
        let spec = result.spec;
        let rerun = aggregate(
            &[SignalPoint::new(39.9042, 116.4074).with_field(SIGNAL_4G, -60.0)],
            &spec,
            &[SIGNAL_4G.to_string()],
        )
        .unwrap();
        assert_eq!(AggregateStore::persist(&path, records_for(&rerun, "drone-a", SIGNAL_4G)).unwrap(), 1);
        let store = AggregateStore::open(&path).unwrap();
        assert_eq!(store.len(), 2);
        let a = store.get("drone-a", "square_0.05km", "sq_0_0").unwrap();
        assert_eq!((a.point_count, a.avg_signal), (1, -60.0));
        let b = store.get("drone-b", "square_0.05km", "sq_0_0").unwrap();
        assert_eq!((b.point_count, b.avg_signal), (2, -80.0));
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AggregateStore::open(&dir.path().join("none.csv")).unwrap().is_empty());
    }

    #[test]
    fn csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aggregates.csv");
        let mut store = AggregateStore::new();
        store.extend(records_for(&result(), "drone-7", SIGNAL_SDR));
        store.write_csv(&path).unwrap();

        let loaded = AggregateStore::read_csv(&path).unwrap();
        assert_eq!(loaded.len(), store.len());
        assert_eq!(loaded.records().collect::<Vec<_>>(), store.records().collect::<Vec<_>>());
    }
}
