use std::path::Path;

use crate::data::datetime::{detect_date_format, format_timestamp, parse_to_timestamp};
use crate::data::flight_record::FlightRecord;
use crate::data::parser::{self, ColumnRoles};
use crate::data::point::{canonical_field_name, collect_field_names, SignalPoint};
use crate::error::{GridError, Result};

/// Load signal points from a CSV or JSON file.
///
/// Rows with unparseable coordinates are kept with NaN coordinates so the
/// engine can count them as rejected.
pub fn load_points(path: &Path) -> Result<Vec<SignalPoint>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let points = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        _ => return Err(GridError::Load(format!("unsupported file format: .{ext}"))),
    };
    tracing::info!("Loaded {} points from {:?}", points.len(), path);
    Ok(points)
}

fn read_text(path: &Path) -> Result<String> {
    let content = std::fs::read(path)?;
    // Latin-1 fallback: every byte maps to the same code point.
    Ok(String::from_utf8(content)
        .unwrap_or_else(|e| e.into_bytes().iter().map(|&b| b as char).collect()))
}

fn load_csv(path: &Path) -> Result<Vec<SignalPoint>> {
    parse_csv(&read_text(path)?)
}

/// Parse CSV text into points. See [`load_points`].
pub fn parse_csv(text: &str) -> Result<Vec<SignalPoint>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        match record {
            Ok(r) => rows.push(r.iter().map(|s| s.to_string()).collect()),
            Err(e) => tracing::warn!("Skipping unreadable CSV record: {e}"),
        }
    }

    let header_row = parser::detect_header_row(&rows);
    if rows.len() <= header_row {
        return Err(GridError::Load("no data found after header detection".into()));
    }

    let columns: Vec<String> = rows[header_row].iter().map(|s| s.trim().to_string()).collect();
    let data_rows = &rows[header_row + 1..];

    let roles = ColumnRoles::resolve(&columns);
    let (Some(lat_col), Some(lon_col)) = (roles.latitude, roles.longitude) else {
        return Err(GridError::Load(format!(
            "latitude/longitude columns not found in header {columns:?}"
        )));
    };

    // Column-major view: column_data[col][row].
    let column_data: Vec<Vec<String>> = (0..columns.len())
        .map(|c| {
            data_rows
                .iter()
                .map(|row| row.get(c).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    let (lats, _) = parser::column_to_f64(&column_data[lat_col]);
    let (lons, _) = parser::column_to_f64(&column_data[lon_col]);
    let alts = roles.altitude.map(|c| parser::column_to_f64(&column_data[c]).0);
    let timestamps = roles.timestamp.and_then(|c| {
        let fmt = detect_date_format(&column_data[c])?;
        Some(
            column_data[c]
                .iter()
                .map(|s| parse_to_timestamp(s, fmt))
                .collect::<Vec<_>>(),
        )
    });

    let field_columns: Vec<(String, Vec<f64>)> = columns
        .iter()
        .enumerate()
        .filter(|(idx, _)| !roles.is_reserved(*idx))
        .filter_map(|(idx, name)| {
            let data = &column_data[idx];
            let non_empty = data.iter().filter(|s| !s.trim().is_empty()).count();
            let (values, _) = parser::column_to_f64(data);
            let numeric = values.iter().filter(|v| v.is_finite()).count();
            if numeric > 0 && numeric * 2 >= non_empty {
                Some((canonical_field_name(name), values))
            } else {
                tracing::debug!("Ignoring non-numeric column {name:?}");
                None
            }
        })
        .collect();

    let points = (0..data_rows.len())
        .map(|i| {
            let mut p = SignalPoint::new(lats[i], lons[i]);
            p.altitude = alts.as_ref().map(|a| a[i]).filter(|v| v.is_finite());
            p.timestamp = timestamps.as_ref().and_then(|t| t[i]);
            for (name, values) in &field_columns {
                if values[i].is_finite() {
                    p.fields.insert(name.clone(), values[i]);
                }
            }
            p
        })
        .collect();

    Ok(points)
}

fn load_json(path: &Path) -> Result<Vec<SignalPoint>> {
    parse_json(&read_text(path)?)
}

/// Parse JSON text: either an array of point objects or a flight record.
pub fn parse_json(text: &str) -> Result<Vec<SignalPoint>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.get("frameState").is_some() {
        let record: FlightRecord = serde_json::from_value(value)?;
        return Ok(record.to_points());
    }
    if value.is_array() {
        let mut points: Vec<SignalPoint> = serde_json::from_value(value)?;
        for p in &mut points {
            p.fields = std::mem::take(&mut p.fields)
                .into_iter()
                .map(|(k, v)| (canonical_field_name(&k), v))
                .collect();
        }
        return Ok(points);
    }
    Err(GridError::Load(
        "expected a JSON array of points or a flight record with frameState".into(),
    ))
}

/// Write points as CSV: timestamp, latitude, longitude, altitude, then one
/// column per field (sorted by name).
pub fn write_points_csv(path: &Path, points: &[SignalPoint]) -> Result<()> {
    let fields = collect_field_names(points);
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![
        "timestamp".to_string(),
        "latitude".to_string(),
        "longitude".to_string(),
        "altitude".to_string(),
    ];
    header.extend(fields.iter().cloned());
    writer.write_record(&header)?;

    for p in points {
        let mut row = vec![
            p.timestamp.map(format_timestamp).unwrap_or_default(),
            p.latitude.to_string(),
            p.longitude.to_string(),
            p.altitude.map(|a| a.to_string()).unwrap_or_default(),
        ];
        row.extend(
            fields
                .iter()
                .map(|f| p.reading(f).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }
    writer.flush()?;
    tracing::info!("Wrote {} points to {:?}", points.len(), path);
    Ok(())
}
