//! Ring-by-ring enumeration of a pointy-top hexagon tiling.
//!
//! Hexes use axial coordinates `(q, r)`. Layer 0 is the center hex, layer
//! `k` the 6k hexes at hex distance `k`. Within a layer, index 0 is the hex
//! at `k * (-1, +1)` and indices walk the ring along `DIRECTIONS`.

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Axial neighbour offsets, walked in order around a ring.
pub const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// A hex position produced by [`HexRings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexCoord {
    pub layer: u32,
    pub index: u32,
    pub q: i32,
    pub r: i32,
}

/// Vertex offsets from a hex center, counter-clockwise from -30 degrees, in
/// units of half a hex width (x) and half an edge (y).
const VERTEX_STEPS: [(i64, i64); 6] = [(1, -1), (1, 1), (0, 2), (-1, 1), (-1, -1), (0, -2)];

impl HexCoord {
    /// Lattice position in half-width / half-edge units.
    fn lattice(&self) -> (i64, i64) {
        let (q, r) = (self.q as i64, self.r as i64);
        (2 * q + r, 3 * r)
    }

    /// Center in the plane for a tiling of edge length `size`.
    pub fn center(&self, size: f64) -> [f64; 2] {
        let (x, y) = self.lattice();
        [x as f64 * size * SQRT_3 / 2.0, y as f64 * size / 2.0]
    }

    /// Boundary in the plane, counter-clockwise. Vertices come from integer
    /// lattice positions, so neighbouring hexes share bit-identical corners.
    pub fn vertices(&self, size: f64) -> Vec<[f64; 2]> {
        let (x, y) = self.lattice();
        VERTEX_STEPS
            .iter()
            .map(|&(dx, dy)| {
                [
                    (x + dx) as f64 * size * SQRT_3 / 2.0,
                    (y + dy) as f64 * size / 2.0,
                ]
            })
            .collect()
    }
}

/// Hex distance between the origin and `(q, r)`.
pub fn hex_distance(q: i32, r: i32) -> u32 {
    (q.unsigned_abs() + r.unsigned_abs() + (q + r).unsigned_abs()) / 2
}

/// Axial coordinates of position `index` in ring `layer`.
pub fn ring_position(layer: u32, index: u32) -> (i32, i32) {
    if layer == 0 {
        return (0, 0);
    }
    let k = layer as i32;
    let side = (index / layer) as usize % 6;
    let offset = (index % layer) as i32;

    let (mut q, mut r) = (DIRECTIONS[4].0 * k, DIRECTIONS[4].1 * k);
    for &(dq, dr) in &DIRECTIONS[..side] {
        q += dq * k;
        r += dr * k;
    }
    let (dq, dr) = DIRECTIONS[side];
    (q + dq * offset, r + dr * offset)
}

/// Distance from the origin to the nearest centers of ring `layer`.
///
/// Even rings have a center on each side's midpoint, `1.5 * k * size` away.
/// Odd rings straddle the midpoint with two centers half a step either side,
/// which puts them at `size * sqrt(3) * sqrt((3k^2 + 1) / 4)`.
pub fn ring_min_distance(layer: u32, size: f64) -> f64 {
    let k = layer as f64;
    if layer % 2 == 0 {
        1.5 * k * size
    } else {
        size * SQRT_3 * ((3.0 * k * k + 1.0) / 4.0).sqrt()
    }
}

/// Upper bound on [`layers_for_extent`], cheap and overflow-free. Callers
/// bound this before converting to a ring count.
pub fn max_layers_for_extent(extent: f64, size: f64) -> f64 {
    ((extent + RING_TOLERANCE_KM) / (1.5 * size)).floor().max(0.0)
}

/// Slack on the ring cut-off so a ring exactly at the extent is kept.
const RING_TOLERANCE_KM: f64 = 1e-9;

/// Outermost ring whose nearest center lies within `extent`. Rings past it
/// are all farther out.
///
/// `extent / (1.5 * size)` must fit in a `u32`; see [`max_layers_for_extent`].
pub fn layers_for_extent(extent: f64, size: f64) -> u32 {
    let mut layer = max_layers_for_extent(extent, size) as u32;
    while layer > 0 && ring_min_distance(layer, size) > extent + RING_TOLERANCE_KM {
        layer -= 1;
    }
    layer
}

/// Finite, restartable sequence of hex positions, layer by layer.
#[derive(Debug, Clone)]
pub struct HexRings {
    max_layer: u32,
    layer: u32,
    index: u32,
}

impl HexRings {
    /// Enumerate layers `0..=max_layer`.
    pub fn new(max_layer: u32) -> Self {
        Self {
            max_layer,
            layer: 0,
            index: 0,
        }
    }

    /// Total number of hexes in layers `0..=max_layer`.
    pub fn total(max_layer: u32) -> usize {
        let k = max_layer as usize;
        1 + 3 * k * (k + 1)
    }
}

impl Iterator for HexRings {
    type Item = HexCoord;

    fn next(&mut self) -> Option<HexCoord> {
        if self.layer > self.max_layer {
            return None;
        }
        let (q, r) = ring_position(self.layer, self.index);
        let item = HexCoord {
            layer: self.layer,
            index: self.index,
            q,
            r,
        };

        let ring_len = if self.layer == 0 { 1 } else { 6 * self.layer };
        self.index += 1;
        if self.index >= ring_len {
            self.layer += 1;
            self.index = 0;
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ring_sizes() {
        let coords: Vec<HexCoord> = HexRings::new(3).collect();
        assert_eq!(coords.len(), HexRings::total(3));
        assert_eq!(coords.len(), 37);
        for layer in 1..=3 {
            let n = coords.iter().filter(|c| c.layer == layer).count();
            assert_eq!(n, 6 * layer as usize);
        }
    }

    #[test]
    fn positions_match_layer_distance_and_are_unique() {
        let mut seen = HashSet::new();
        for c in HexRings::new(5) {
            assert_eq!(hex_distance(c.q, c.r), c.layer, "{c:?}");
            assert!(seen.insert((c.q, c.r)), "duplicate {c:?}");
        }
    }

    #[test]
    fn consecutive_ring_positions_are_neighbours() {
        let ring: Vec<HexCoord> = HexRings::new(2).filter(|c| c.layer == 2).collect();
        for pair in ring.windows(2) {
            let (dq, dr) = (pair[1].q - pair[0].q, pair[1].r - pair[0].r);
            assert!(DIRECTIONS.contains(&(dq, dr)));
        }
    }

    #[test]
    fn restartable() {
        let rings = HexRings::new(2);
        let a: Vec<_> = rings.clone().collect();
        let b: Vec<_> = rings.collect();
        assert_eq!(a, b);
    }

    #[test]
    fn layer_count_from_extent() {
        assert_eq!(layers_for_extent(0.5, 1.0), 0);
        // Ring 1 starts at sqrt(3), not 1.5.
        assert_eq!(layers_for_extent(1.5, 1.0), 0);
        assert_eq!(layers_for_extent(1.6, 1.0), 0);
        assert_eq!(layers_for_extent(SQRT_3, 1.0), 1);
        assert_eq!(layers_for_extent(2.9, 1.0), 1);
        assert_eq!(layers_for_extent(3.0, 1.0), 2);
        // Ring 3 starts at sqrt(3) * sqrt(7) ~ 4.58.
        assert_eq!(layers_for_extent(4.5, 1.0), 2);
        assert_eq!(layers_for_extent(4.6, 1.0), 3);
    }

    #[test]
    fn ring_min_distance_matches_enumeration() {
        let size = 0.7;
        for layer in 0..=8 {
            let nearest = HexRings::new(layer)
                .filter(|c| c.layer == layer)
                .map(|c| {
                    let [x, y] = c.center(size);
                    x.hypot(y)
                })
                .fold(f64::INFINITY, f64::min);
            assert!(
                (nearest - ring_min_distance(layer, size)).abs() < 1e-9,
                "layer {layer}: {nearest} vs {}",
                ring_min_distance(layer, size)
            );
        }
    }

    #[test]
    fn neighbours_share_exact_corners() {
        let center = HexCoord { layer: 0, index: 0, q: 0, r: 0 }.vertices(0.37);
        for (q, r) in DIRECTIONS {
            let neighbour = HexCoord { layer: 1, index: 0, q, r }.vertices(0.37);
            let shared = neighbour.iter().filter(|v| center.contains(v)).count();
            assert_eq!(shared, 2, "({q}, {r})");
        }
    }

    #[test]
    fn neighbour_centers_are_sqrt3_apart() {
        let origin = HexCoord { layer: 0, index: 0, q: 0, r: 0 }.center(1.0);
        for (q, r) in DIRECTIONS {
            let c = HexCoord { layer: 1, index: 0, q, r }.center(1.0);
            let d = (c[0] - origin[0]).hypot(c[1] - origin[1]);
            assert!((d - SQRT_3).abs() < 1e-12);
        }
    }
}
