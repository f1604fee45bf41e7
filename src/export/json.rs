use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::grid::{CellKey, GridSpec};
use crate::processing::{CellStats, GridAggregation, RunSummary};

#[derive(Serialize)]
struct CellRecord<'a> {
    id: String,
    key: CellKey,
    center_lat: f64,
    center_lon: f64,
    size_km: f64,
    /// `[lon, lat]` pairs, GeoJSON order, ring closed.
    boundary: Vec<[f64; 2]>,
    stats: &'a CellStats,
}

#[derive(Serialize)]
struct Document<'a> {
    spec: &'a GridSpec,
    fields: &'a [String],
    summary: &'a RunSummary,
    cells: Vec<CellRecord<'a>>,
}

/// Render the aggregation (spec, summary, cells with boundaries and
/// statistics) as pretty-printed JSON.
pub fn to_json(result: &GridAggregation) -> Result<String> {
    let cells = result
        .pairs()
        .map(|(cell, stats)| {
            let mut boundary: Vec<[f64; 2]> =
                cell.boundary.iter().map(|&(lat, lon)| [lon, lat]).collect();
            if let Some(&first) = boundary.first() {
                boundary.push(first);
            }
            CellRecord {
                id: cell.id(),
                key: cell.key,
                center_lat: cell.center_lat,
                center_lon: cell.center_lon,
                size_km: cell.size_km,
                boundary,
                stats,
            }
        })
        .collect();

    let doc = Document {
        spec: &result.spec,
        fields: &result.fields,
        summary: &result.summary,
        cells,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn export_json(path: &Path, result: &GridAggregation) -> Result<()> {
    let json = to_json(result)?;
    std::fs::write(path, json)?;
    tracing::info!("Exported grid JSON to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::point::{SignalPoint, SIGNAL_4G};
    use crate::grid::GridShape;
    use crate::processing::aggregate;

    #[test]
    fn cells_serialize_with_closed_boundaries() {
        let spec = GridSpec::new(GridShape::Hexagon, 39.9, 116.4, 0.5, 0.7).unwrap();
        let points = vec![SignalPoint::new(39.9, 116.4).with_field(SIGNAL_4G, -72.0)];
        let result = aggregate(&points, &spec, &[SIGNAL_4G.to_string()]).unwrap();

        let value: serde_json::Value = serde_json::from_str(&to_json(&result).unwrap()).unwrap();
        let cells = value["cells"].as_array().unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0]["id"], "hex_0_0");
        assert_eq!(cells[0]["key"]["kind"], "hexagon");
        assert_eq!(cells[0]["boundary"].as_array().unwrap().len(), 7);
        assert_eq!(cells[0]["stats"]["data_count"], 1);
        assert_eq!(cells[0]["stats"]["fields"]["signal_4g"]["mean"], -72.0);
        assert_eq!(value["spec"]["shape"], "hexagon");
        assert_eq!(value["summary"]["assigned_points"], 1);
    }

    #[test]
    fn null_field_is_json_null() {
        let spec = GridSpec::new(GridShape::Square, 0.0, 0.0, 1.0, 0.5).unwrap();
        let result = aggregate(&[], &spec, &[SIGNAL_4G.to_string()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&to_json(&result).unwrap()).unwrap();
        assert!(value["cells"][0]["stats"]["fields"]["signal_4g"].is_null());
    }
}
