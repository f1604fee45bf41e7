use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::processing::GridAggregation;

/// Header of the cell table for the given tracked fields.
pub fn header(fields: &[String]) -> Vec<String> {
    let mut header: Vec<String> = [
        "id",
        "shape",
        "center_lat",
        "center_lon",
        "size_km",
        "layer",
        "grid_i",
        "grid_j",
        "data_count",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for f in fields {
        header.push(format!("{f}_mean"));
        header.push(format!("{f}_max"));
        header.push(format!("{f}_min"));
    }
    header
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// One row per cell. Null statistics and geometry columns that do not apply
/// to the cell's shape are empty strings.
pub fn rows(result: &GridAggregation) -> Vec<Vec<String>> {
    result
        .pairs()
        .map(|(cell, stats)| {
            let (grid_i, grid_j) = cell.grid_ij().unzip();
            let mut row = vec![
                cell.id(),
                cell.shape().to_string(),
                format!("{:.8}", cell.center_lat),
                format!("{:.8}", cell.center_lon),
                cell.size_km.to_string(),
                opt(cell.layer()),
                opt(grid_i),
                opt(grid_j),
                stats.data_count.to_string(),
            ];
            for f in &result.fields {
                let s = stats.field(f);
                row.push(opt(s.map(|s| s.mean)));
                row.push(opt(s.map(|s| s.max)));
                row.push(opt(s.map(|s| s.min)));
            }
            row
        })
        .collect()
}

/// Write the cell table as CSV to any writer.
pub fn write_cell_table<W: Write>(writer: W, result: &GridAggregation) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(header(&result.fields))?;
    for row in rows(result) {
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the cell table to `path`. The file is only created once the whole
/// table has been rendered.
pub fn export_cell_table(path: &Path, result: &GridAggregation) -> Result<()> {
    let mut buf = Vec::new();
    write_cell_table(&mut buf, result)?;
    std::fs::write(path, buf)?;
    tracing::info!("Exported {} cells to {:?}", result.cells.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::point::{SignalPoint, SIGNAL_4G, SIGNAL_SDR};
    use crate::grid::{GridShape, GridSpec};
    use crate::processing::aggregate;

    fn run(shape: GridShape) -> GridAggregation {
        let spec = GridSpec::new(shape, 39.9042, 116.4074, 0.05, 0.1).unwrap();
        let points = vec![
            SignalPoint::new(39.9042, 116.4074).with_field(SIGNAL_4G, -70.0),
            SignalPoint::new(39.9042, 116.4074).with_field(SIGNAL_4G, -90.0),
        ];
        let fields = vec![SIGNAL_4G.to_string(), SIGNAL_SDR.to_string()];
        aggregate(&points, &spec, &fields).unwrap()
    }

    #[test]
    fn square_rows_carry_grid_indices_and_blank_nulls() {
        let result = run(GridShape::Square);
        let header = header(&result.fields);
        assert_eq!(header.len(), 9 + 6);
        assert_eq!(header[9], "signal_4g_mean");

        let rows = rows(&result);
        let center = rows.iter().find(|r| r[0] == "sq_0_0").unwrap();
        assert_eq!(center[1], "square");
        assert_eq!(center[5], "");
        assert_eq!((center[6].as_str(), center[7].as_str()), ("0", "0"));
        assert_eq!(center[8], "2");
        assert_eq!(center[9], "-80");
        assert_eq!(center[10], "-70");
        assert_eq!(center[11], "-90");
        assert_eq!(center[12], "");

        let empty = rows.iter().find(|r| r[0] == "sq_1_0").unwrap();
        assert_eq!(empty[8], "0");
        assert!(empty[9..].iter().all(String::is_empty));
    }

    #[test]
    fn hexagon_rows_carry_layer() {
        let result = run(GridShape::Hexagon);
        let rows = rows(&result);
        assert_eq!(rows[0][0], "hex_0_0");
        assert_eq!(rows[0][5], "0");
        assert_eq!(rows[0][6], "");
    }

    #[test]
    fn exports_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.csv");
        let result = run(GridShape::Square);
        export_cell_table(&path, &result).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("id,shape,center_lat,center_lon,size_km,layer,grid_i,grid_j,data_count"));
        assert_eq!(text.lines().count(), 1 + result.cells.len());
    }
}
