//! Cell polygons in the local plane.
//!
//! Generated cells share bit-identical corners with their neighbours, so the
//! exact predicates in `geo` put a point on a shared edge in both cells and
//! never in a gap between them.

use geo::{Area, Coord, Intersects, LineString, Polygon};

/// Build the polygon of a cell boundary, checking that it can be indexed:
/// at least three finite vertices wound counter-clockwise with non-zero area.
pub fn cell_polygon(boundary: &[[f64; 2]]) -> Result<Polygon<f64>, String> {
    if boundary.len() < 3 {
        return Err(format!(
            "boundary has {} vertices, need at least 3",
            boundary.len()
        ));
    }
    if boundary.iter().any(|v| !v[0].is_finite() || !v[1].is_finite()) {
        return Err("boundary has a non-finite vertex".to_string());
    }
    let ring: LineString<f64> = boundary.iter().map(|&[x, y]| Coord { x, y }).collect();
    let polygon = Polygon::new(ring, vec![]);
    let area = polygon.signed_area();
    if area <= 0.0 {
        return Err(format!(
            "boundary area {area} is not positive (degenerate or clockwise)"
        ));
    }
    Ok(polygon)
}

/// Boundary-inclusive point-in-polygon test.
pub fn contains(polygon: &Polygon<f64>, p: [f64; 2]) -> bool {
    polygon.intersects(&Coord { x: p[0], y: p[1] })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: [[f64; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    fn square() -> Polygon<f64> {
        cell_polygon(&SQUARE).unwrap()
    }

    #[test]
    fn interior_and_exterior() {
        assert!(contains(&square(), [0.5, 0.5]));
        assert!(!contains(&square(), [1.5, 0.5]));
        assert!(!contains(&square(), [-0.01, 0.5]));
    }

    #[test]
    fn boundary_is_inclusive() {
        assert!(contains(&square(), [1.0, 0.5]));
        assert!(contains(&square(), [0.0, 0.0]));
        assert!(contains(&square(), [0.5, 1.0]));
        assert!(!contains(&square(), [0.5, 1.0 + 1e-12]));
    }

    #[test]
    fn hexagon_containment() {
        let hex: Vec<[f64; 2]> = (0..6)
            .map(|i| {
                let a = (60.0 * i as f64 - 30.0_f64).to_radians();
                [a.cos(), a.sin()]
            })
            .collect();
        let hex = cell_polygon(&hex).unwrap();
        assert!(contains(&hex, [0.0, 0.99]));
        assert!(!contains(&hex, [0.9, 0.9]));
        // Apothem is sqrt(3)/2.
        assert!(contains(&hex, [0.866, 0.0]));
        assert!(!contains(&hex, [0.867, 0.0]));
    }

    #[test]
    fn rejects_degenerate_boundaries() {
        assert!(cell_polygon(&SQUARE).is_ok());
        assert!(cell_polygon(&SQUARE[..2]).is_err());

        let mut clockwise = SQUARE;
        clockwise.reverse();
        assert!(cell_polygon(&clockwise).is_err());

        let flat = [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        assert!(cell_polygon(&flat).is_err());

        let nan = [[0.0, 0.0], [f64::NAN, 0.0], [1.0, 1.0]];
        assert!(cell_polygon(&nan).is_err());
    }
}
