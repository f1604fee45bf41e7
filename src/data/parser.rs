use std::collections::HashMap;

/// Column roles recognised in a point table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRoles {
    pub latitude: Option<usize>,
    pub longitude: Option<usize>,
    pub altitude: Option<usize>,
    pub timestamp: Option<usize>,
}

const LATITUDE_ALIASES: &[&str] = &["latitude", "lat"];
const LONGITUDE_ALIASES: &[&str] = &["longitude", "lon", "lng", "long"];
const ALTITUDE_ALIASES: &[&str] = &["altitude", "alt", "height", "elevation"];
const TIMESTAMP_ALIASES: &[&str] = &["timestamp", "time", "datetime", "date"];

impl ColumnRoles {
    /// Resolve column roles from header names (case-insensitive).
    pub fn resolve(columns: &[String]) -> Self {
        let find = |aliases: &[&str]| {
            columns
                .iter()
                .position(|c| aliases.contains(&c.trim().to_lowercase().as_str()))
        };
        Self {
            latitude: find(LATITUDE_ALIASES),
            longitude: find(LONGITUDE_ALIASES),
            altitude: find(ALTITUDE_ALIASES),
            timestamp: find(TIMESTAMP_ALIASES),
        }
    }

    /// Whether column `idx` carries one of the fixed roles.
    pub fn is_reserved(&self, idx: usize) -> bool {
        [self.latitude, self.longitude, self.altitude, self.timestamp].contains(&Some(idx))
    }
}

/// Detect the header row among already-split rows.
///
/// Scans bottom-up for the last row with the most common column count whose
/// cells are all non-empty, non-numeric text. Falls back to row 0.
pub fn detect_header_row(rows: &[Vec<String>]) -> usize {
    if rows.is_empty() {
        return 0;
    }

    let mut counts: HashMap<usize, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.len()).or_insert(0) += 1;
    }
    // Ties resolve to the wider row so the result does not depend on hash order.
    let most_common = counts
        .into_iter()
        .max_by_key(|&(len, c)| (c, len))
        .map(|(len, _)| len)
        .unwrap_or(0);

    for (i, row) in rows.iter().enumerate().rev() {
        if row.len() != most_common {
            continue;
        }
        let all_text = row.iter().all(|cell| {
            let t = cell.trim();
            !t.is_empty() && t.parse::<f64>().is_err() && !is_date_like(t)
        });
        if all_text {
            return i;
        }
    }

    0
}

fn is_date_like(s: &str) -> bool {
    let has_separators = s.contains('/') || s.contains(':') || s.matches('-').count() >= 2;
    if !has_separators {
        return false;
    }
    let sample = [s.to_string()];
    crate::data::datetime::detect_date_format(&sample).is_some()
}

/// Parse a string column as f64; invalid entries become NaN.
/// Returns the values and the fraction of finite entries.
pub fn column_to_f64(data: &[String]) -> (Vec<f64>, f64) {
    let mut values = Vec::with_capacity(data.len());
    let mut valid = 0usize;
    for s in data {
        let v = s.trim().parse::<f64>().unwrap_or(f64::NAN);
        if v.is_finite() {
            valid += 1;
        }
        values.push(v);
    }
    let frac = if data.is_empty() {
        0.0
    } else {
        valid as f64 / data.len() as f64
    };
    (values, frac)
}
