//! Maps a coordinate to the S2 cells a map-objects query must cover.
//!
//! The centre cell is the level-15 S2 cell containing the coordinate. Its
//! neighbourhood is the run of cells immediately before and after it along the
//! Hilbert curve at the same level.

use crate::error::{Result, ScanError};
use spiralscan_core::{CellId, Coordinate};

/// Subdivision level of the cells sent with each query.
pub const QUERY_CELL_LEVEL: u8 = 15;

/// Cells queried on each side of the centre cell.
pub const DEFAULT_CELL_RADIUS: u32 = 10;

const MAX_LEVEL: u8 = 30;
const POS_BITS: u32 = 2 * MAX_LEVEL as u32 + 1;
const MAX_SIZE: u32 = 1 << MAX_LEVEL;

const SWAP_MASK: u8 = 0x01;
const INVERT_MASK: u8 = 0x02;

/// Hilbert position of each (i, j) quadrant, indexed by orientation.
const IJ_TO_POS: [[u8; 4]; 4] = [
    [0, 1, 3, 2], // canonical
    [0, 3, 1, 2], // swapped
    [2, 3, 1, 0], // inverted
    [2, 1, 3, 0], // swapped and inverted
];

/// Orientation change after descending into the child at each position.
const POS_TO_ORIENTATION: [u8; 4] = [SWAP_MASK, 0, 0, INVERT_MASK | SWAP_MASK];

/// The ascending set of `2 * radius + 1` level-15 cell ids around `coord`.
///
/// # Errors
/// Returns [`ScanError::InvalidCoordinate`] for NaN, infinite or
/// out-of-range latitude or longitude.
pub fn cells_for(coord: Coordinate, radius: u32) -> Result<Vec<CellId>> {
    if !coord.is_valid() {
        return Err(ScanError::InvalidCoordinate {
            lat: coord.lat,
            lng: coord.lng,
        });
    }

    let origin = parent(leaf_cell(coord), QUERY_CELL_LEVEL);
    let mut walk = Vec::with_capacity(2 * radius as usize + 1);
    walk.push(origin);

    let mut right = next(origin);
    let mut left = prev(origin);
    for _ in 0..radius {
        walk.push(right);
        walk.push(left);
        right = next(right);
        left = prev(left);
    }

    walk.sort_unstable();
    Ok(walk)
}

/// The level-30 cell containing `coord`.
fn leaf_cell(coord: Coordinate) -> CellId {
    let (lat, lng) = (coord.lat.to_radians(), coord.lng.to_radians());
    let point = [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()];

    let (face, u, v) = xyz_to_face_uv(point);
    let i = st_to_ij(uv_to_st(u));
    let j = st_to_ij(uv_to_st(v));
    from_face_ij(face, i, j)
}

fn xyz_to_face_uv([x, y, z]: [f64; 3]) -> (u8, f64, f64) {
    let (ax, ay, az) = (x.abs(), y.abs(), z.abs());
    let mut face = if ax > ay {
        if ax > az {
            0
        } else {
            2
        }
    } else if ay > az {
        1
    } else {
        2
    };
    if [x, y, z][face as usize] < 0.0 {
        face += 3;
    }

    let (u, v) = match face {
        0 => (y / x, z / x),
        1 => (-x / y, z / y),
        2 => (-x / z, -y / z),
        3 => (z / x, y / x),
        4 => (z / y, -x / y),
        _ => (-y / z, -x / z),
    };
    (face, u, v)
}

/// Quadratic projection from cube-face coordinates to cell-space coordinates.
fn uv_to_st(u: f64) -> f64 {
    if u >= 0.0 {
        0.5 * (1.0 + 3.0 * u).sqrt()
    } else {
        1.0 - 0.5 * (1.0 - 3.0 * u).sqrt()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn st_to_ij(s: f64) -> u32 {
    let scaled = (f64::from(MAX_SIZE) * s).floor();
    scaled.clamp(0.0, f64::from(MAX_SIZE - 1)) as u32
}

fn from_face_ij(face: u8, i: u32, j: u32) -> CellId {
    let mut orientation = face & SWAP_MASK;
    let mut pos: u64 = 0;

    for k in (0..u32::from(MAX_LEVEL)).rev() {
        let quadrant = (((i >> k) & 1) << 1 | ((j >> k) & 1)) as usize;
        let bits = IJ_TO_POS[orientation as usize][quadrant];
        pos = (pos << 2) | u64::from(bits);
        orientation ^= POS_TO_ORIENTATION[bits as usize];
    }

    CellId((u64::from(face) << POS_BITS) | (pos << 1) | 1)
}

fn lsb_for_level(level: u8) -> u64 {
    1 << (2 * u32::from(MAX_LEVEL - level))
}

fn lsb(id: CellId) -> u64 {
    id.0 & id.0.wrapping_neg()
}

fn parent(id: CellId, level: u8) -> CellId {
    let new_lsb = lsb_for_level(level);
    CellId((id.0 & new_lsb.wrapping_neg()) | new_lsb)
}

/// Next cell along the Hilbert curve at the same level.
fn next(id: CellId) -> CellId {
    CellId(id.0.wrapping_add(lsb(id) << 1))
}

/// Previous cell along the Hilbert curve at the same level.
fn prev(id: CellId) -> CellId {
    CellId(id.0.wrapping_sub(lsb(id) << 1))
}

/// Level encoded by the position of the marker bit.
#[cfg(test)]
fn level(id: CellId) -> u8 {
    #[allow(clippy::cast_possible_truncation)]
    let trailing = id.0.trailing_zeros() as u8;
    MAX_LEVEL - trailing / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_cell_at_null_island() {
        assert_eq!(
            leaf_cell(Coordinate::new(0.0, 0.0)),
            CellId(0x1000_0000_0000_0001)
        );
    }

    #[test]
    fn test_single_cell_for_zero_radius() {
        let cells = cells_for(Coordinate::new(0.0, 0.0), 0).expect("valid coordinate");
        assert_eq!(cells, vec![CellId(0x1000_0000_4000_0000)]);
        assert_eq!(level(cells[0]), QUERY_CELL_LEVEL);
    }

    #[test]
    fn test_face_selection() {
        let faces = [
            ((0.0, 0.0), 0),
            ((0.0, 90.0), 1),
            ((89.0, 0.0), 2),
            ((0.0, 180.0), 3),
            ((0.0, -90.0), 4),
            ((-89.0, 0.0), 5),
        ];
        for ((lat, lng), face) in faces {
            let id = leaf_cell(Coordinate::new(lat, lng));
            assert_eq!(id.0 >> POS_BITS, face, "face for ({lat}, {lng})");
        }
    }

    #[test]
    fn test_neighbourhood_is_sorted_distinct_and_sized() {
        for (lat, lng) in [(10.0, 20.0), (40.758, -73.9855), (-33.86, 151.21), (64.1, -21.9)] {
            for radius in [0, 1, 5, DEFAULT_CELL_RADIUS] {
                let cells = cells_for(Coordinate::new(lat, lng), radius).expect("valid coordinate");
                assert_eq!(cells.len(), 2 * radius as usize + 1);
                assert!(cells.windows(2).all(|pair| pair[0] < pair[1]));
                assert!(cells.iter().all(|&id| level(id) == QUERY_CELL_LEVEL));
            }
        }
    }

    #[test]
    fn test_neighbourhood_is_contiguous_run() {
        let cells = cells_for(Coordinate::new(10.0, 20.0), 3).expect("valid coordinate");
        let step = lsb_for_level(QUERY_CELL_LEVEL) << 1;
        assert!(cells.windows(2).all(|pair| pair[1].0 - pair[0].0 == step));

        let centre = parent(leaf_cell(Coordinate::new(10.0, 20.0)), QUERY_CELL_LEVEL);
        assert_eq!(cells[3], centre);
    }

    #[test]
    fn test_nearby_points_share_centre_cell() {
        // Level-15 cells are roughly 300 m across.
        let a = cells_for(Coordinate::new(10.0, 20.0), 0).expect("valid coordinate");
        let b = cells_for(Coordinate::new(10.000_001, 20.000_001), 0).expect("valid coordinate");
        assert_eq!(a, b);
    }

    #[test]
    fn test_parent_next_prev() {
        let leaf = leaf_cell(Coordinate::new(51.5, -0.12));
        assert_eq!(level(leaf), MAX_LEVEL);
        let cell = parent(leaf, QUERY_CELL_LEVEL);
        assert_eq!(level(cell), QUERY_CELL_LEVEL);
        assert_eq!(prev(next(cell)), cell);
        assert_eq!(parent(cell, 10), parent(leaf, 10));
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        for (lat, lng) in [(f64::NAN, 0.0), (0.0, f64::NAN), (91.0, 0.0), (0.0, 181.0)] {
            assert!(matches!(
                cells_for(Coordinate::new(lat, lng), 10),
                Err(ScanError::InvalidCoordinate { .. })
            ));
        }
    }
}
