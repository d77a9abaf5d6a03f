//! Geometry kernel: quarter-turn rotation, axis reflection, half-tile
//! snapping and tile footprints.
//!
//! Every spatial operation in gridforge goes through this module so that an
//! entity's position and its orientation are always transformed by the same
//! rule.
//!
//! # Conventions
//!
//! The grid is y-down. One clockwise quarter turn maps `(x, y)` to
//! `(-y, x)`, which takes North to East, East to South, and so on. Positions
//! are tile-space centers quantized to multiples of 0.5.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from geometry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("orientation {0} is outside 0..=3")]
    InvalidOrientation(i64),
    #[error("rotation {0} is outside 0..=3")]
    InvalidRotation(i64),
}

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// The four-valued facing of a directional entity.
///
/// Encoded on the wire as `0 = -y`, `1 = +x`, `2 = +y`, `3 = -x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum Orientation {
    North,
    East,
    South,
    West,
}

impl Orientation {
    /// All four orientations in index order.
    pub fn all() -> [Orientation; 4] {
        [
            Orientation::North,
            Orientation::East,
            Orientation::South,
            Orientation::West,
        ]
    }

    /// Validate a raw orientation value. Values outside `0..=3` are rejected.
    pub fn from_index(value: i64) -> Result<Self, GeometryError> {
        match value {
            0 => Ok(Orientation::North),
            1 => Ok(Orientation::East),
            2 => Ok(Orientation::South),
            3 => Ok(Orientation::West),
            other => Err(GeometryError::InvalidOrientation(other)),
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Orientation::North => 0,
            Orientation::East => 1,
            Orientation::South => 2,
            Orientation::West => 3,
        }
    }

    /// Unit grid offset this orientation faces.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Orientation::North => (0, -1),
            Orientation::East => (1, 0),
            Orientation::South => (0, 1),
            Orientation::West => (-1, 0),
        }
    }

    /// Map a grid offset back to an orientation. Only exact unit vectors
    /// along one axis have an orientation.
    pub fn from_offset(offset: (i32, i32)) -> Option<Self> {
        match offset {
            (0, -1) => Some(Orientation::North),
            (1, 0) => Some(Orientation::East),
            (0, 1) => Some(Orientation::South),
            (-1, 0) => Some(Orientation::West),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        rotate_orientation(self, 2)
    }

    /// East and West swap a footprint's width and height.
    pub fn is_quarter_turned(self) -> bool {
        self.index() % 2 == 1
    }
}

impl TryFrom<i64> for Orientation {
    type Error = GeometryError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Orientation::from_index(value)
    }
}

impl From<Orientation> for u8 {
    fn from(o: Orientation) -> u8 {
        o.index()
    }
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A continuous tile-space center.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// This position with both coordinates snapped to the half-tile lattice.
    pub fn snapped(self) -> Self {
        Self {
            x: snap_half(self.x),
            y: snap_half(self.y),
        }
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The integer tile containing this center.
    pub fn tile(self) -> GridPosition {
        GridPosition::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Coordinates rounded to one decimal, as an exact integer key.
    pub fn decimal_key(self) -> (i64, i64) {
        ((self.x * 10.0).round() as i64, (self.y * 10.0).round() as i64)
    }
}

/// Snap a coordinate to the nearest multiple of 0.5.
///
/// This is the only place transformed coordinates are rounded. Negative zero
/// is folded to zero so snapped values compare and hash consistently.
pub fn snap_half(v: f64) -> f64 {
    let snapped = (v * 2.0).round() / 2.0;
    if snapped == 0.0 { 0.0 } else { snapped }
}

/// A position on the integer tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighboring tile one step in `orientation`.
    pub fn step(self, orientation: Orientation) -> Self {
        let (dx, dy) = orientation.offset();
        Self::new(self.x + dx, self.y + dy)
    }
}

// ---------------------------------------------------------------------------
// Point and orientation transforms
// ---------------------------------------------------------------------------

/// Rotate a point clockwise about the origin by `steps` quarter turns.
pub fn rotate(p: Position, steps: i32) -> Position {
    let mut out = p;
    for _ in 0..steps.rem_euclid(4) {
        out = Position::new(-out.y, out.x);
    }
    out
}

/// Negate the selected axes of a point.
pub fn reflect(p: Position, flip_x: bool, flip_y: bool) -> Position {
    Position::new(
        if flip_x { -p.x } else { p.x },
        if flip_y { -p.y } else { p.y },
    )
}

fn rotate_offset(offset: (i32, i32), steps: i32) -> (i32, i32) {
    let mut out = offset;
    for _ in 0..steps.rem_euclid(4) {
        out = (-out.1, out.0);
    }
    out
}

/// Rotate an orientation by `steps` quarter turns via its unit vector.
pub fn rotate_orientation(o: Orientation, steps: i32) -> Orientation {
    let rotated = rotate_offset(o.offset(), steps);
    // Quarter turns of an axis unit vector are axis unit vectors.
    Orientation::from_offset(rotated).unwrap_or(o)
}

/// Reflect an orientation via its unit vector.
pub fn reflect_orientation(o: Orientation, flip_x: bool, flip_y: bool) -> Orientation {
    let (dx, dy) = o.offset();
    let reflected = (if flip_x { -dx } else { dx }, if flip_y { -dy } else { dy });
    Orientation::from_offset(reflected).unwrap_or(o)
}

/// A reflection followed by a clockwise rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Transform {
    rotate: u8,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Transform {
    /// Build a transform from a caller-supplied rotation. Rotations outside
    /// `0..=3` are rejected rather than wrapped.
    pub fn new(rotate: i64, flip_x: bool, flip_y: bool) -> Result<Self, GeometryError> {
        if !(0..=3).contains(&rotate) {
            return Err(GeometryError::InvalidRotation(rotate));
        }
        Ok(Self {
            rotate: rotate as u8,
            flip_x,
            flip_y,
        })
    }

    pub fn rotation(&self) -> u8 {
        self.rotate
    }

    /// Add `steps` further quarter turns, wrapping modulo four.
    pub fn rotated_by(self, steps: i32) -> Self {
        Self {
            rotate: (i32::from(self.rotate) + steps).rem_euclid(4) as u8,
            ..self
        }
    }

    pub fn toggled_flip_y(self) -> Self {
        Self {
            flip_y: !self.flip_y,
            ..self
        }
    }

    /// Reflect, then rotate, then snap to the half-tile lattice.
    pub fn apply_position(&self, p: Position) -> Position {
        rotate(reflect(p, self.flip_x, self.flip_y), i32::from(self.rotate)).snapped()
    }

    pub fn apply_orientation(&self, o: Orientation) -> Orientation {
        rotate_orientation(
            reflect_orientation(o, self.flip_x, self.flip_y),
            i32::from(self.rotate),
        )
    }
}

// ---------------------------------------------------------------------------
// Footprints
// ---------------------------------------------------------------------------

/// An inclusive rectangle of tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRect {
    pub min: GridPosition,
    pub max: GridPosition,
}

impl TileRect {
    pub fn width(&self) -> u32 {
        (self.max.x - self.min.x + 1) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max.y - self.min.y + 1) as u32
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &TileRect) -> TileRect {
        TileRect {
            min: GridPosition::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: GridPosition::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Iterate over all tiles, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = GridPosition> {
        let (x0, x1, y0, y1) = (self.min.x, self.max.x, self.min.y, self.max.y);
        (y0..=y1).flat_map(move |y| (x0..=x1).map(move |x| GridPosition::new(x, y)))
    }
}

/// Compute the tiles covered by an entity of nominal size `(width, height)`
/// centered at `center`.
///
/// Quarter-turned orientations swap width and height. Each axis covers
/// `floor(c - w/2) ..= ceil(c + w/2) - 1`, so a multi-tile entity and a 1x1
/// entity placed edge to edge share no tile and leave no gap.
pub fn footprint(center: Position, size: (u32, u32), orientation: Option<Orientation>) -> TileRect {
    let (mut w, mut h) = (f64::from(size.0), f64::from(size.1));
    if orientation.is_some_and(Orientation::is_quarter_turned) {
        std::mem::swap(&mut w, &mut h);
    }
    TileRect {
        min: GridPosition::new(
            (center.x - w / 2.0).floor() as i32,
            (center.y - h / 2.0).floor() as i32,
        ),
        max: GridPosition::new(
            (center.x + w / 2.0).ceil() as i32 - 1,
            (center.y + h / 2.0).ceil() as i32 - 1,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_step_sends_north_to_east() {
        assert_eq!(rotate(Position::new(0.0, -1.0), 1), Position::new(1.0, 0.0));
        assert_eq!(rotate_orientation(Orientation::North, 1), Orientation::East);
        assert_eq!(rotate_orientation(Orientation::West, 1), Orientation::North);
    }

    #[test]
    fn rotate_then_inverse_is_identity() {
        let p = Position::new(2.5, -1.0);
        assert_eq!(rotate(rotate(p, 1), 3), p);
        assert_eq!(rotate(p, 4), p);
        assert_eq!(rotate(p, -1), rotate(p, 3));
    }

    #[test]
    fn orientation_follows_position_under_rotation() {
        // An entity one tile east of the origin facing away from it keeps
        // facing away after any rotation.
        for steps in 0..4 {
            let p = rotate(Position::new(1.0, 0.0), steps);
            let o = rotate_orientation(Orientation::East, steps);
            let (dx, dy) = o.offset();
            assert_eq!((p.x, p.y), (f64::from(dx), f64::from(dy)));
        }
    }

    #[test]
    fn reflection_swaps_opposite_orientations() {
        assert_eq!(
            reflect_orientation(Orientation::East, true, false),
            Orientation::West
        );
        assert_eq!(
            reflect_orientation(Orientation::North, true, false),
            Orientation::North
        );
        assert_eq!(
            reflect_orientation(Orientation::North, false, true),
            Orientation::South
        );
    }

    #[test]
    fn reflect_is_an_involution() {
        let p = Position::new(3.5, 4.0);
        assert_eq!(reflect(reflect(p, true, false), true, false), p);
        assert_eq!(reflect(reflect(p, true, true), true, true), p);
    }

    #[test]
    fn out_of_range_orientation_is_rejected() {
        assert_eq!(
            Orientation::from_index(4),
            Err(GeometryError::InvalidOrientation(4))
        );
        assert!(Orientation::from_index(-1).is_err());
        assert!(serde_json::from_str::<Orientation>("7").is_err());
        assert_eq!(
            serde_json::from_str::<Orientation>("3").unwrap(),
            Orientation::West
        );
    }

    #[test]
    fn transform_rejects_out_of_range_rotation() {
        assert_eq!(
            Transform::new(4, false, false),
            Err(GeometryError::InvalidRotation(4))
        );
        assert_eq!(Transform::new(3, false, false).unwrap().rotated_by(2).rotation(), 1);
    }

    #[test]
    fn transform_reflects_before_rotating() {
        let t = Transform::new(1, true, false).unwrap();
        // (1, 0) -> reflect -> (-1, 0) -> rotate -> (0, -1)
        assert_eq!(t.apply_position(Position::new(1.0, 0.0)), Position::new(0.0, -1.0));
        assert_eq!(t.apply_orientation(Orientation::East), Orientation::North);
    }

    #[test]
    fn snap_absorbs_drift_and_negative_zero() {
        assert_eq!(snap_half(2.4999999), 2.5);
        assert_eq!(snap_half(1.0000001), 1.0);
        assert!(snap_half(-0.0).is_sign_positive());
        assert!(snap_half(-0.1).is_sign_positive());
    }

    #[test]
    fn footprint_of_formula_example() {
        let big = footprint(Position::new(1.0, 1.0), (3, 2), None);
        assert_eq!((big.min.x, big.max.x), (-1, 2));
        assert_eq!((big.min.y, big.max.y), (0, 1));
        let small = footprint(Position::new(2.5, 1.0), (1, 1), None);
        assert_eq!((small.min.x, small.max.x), (2, 2));
    }

    #[test]
    fn footprint_multi_tile_and_single_tile_are_flush() {
        let big = footprint(Position::new(1.5, 1.0), (3, 2), None);
        let small = footprint(Position::new(3.5, 1.5), (1, 1), None);
        assert_eq!((big.min.x, big.max.x), (0, 2));
        assert_eq!((big.min.y, big.max.y), (0, 1));
        assert_eq!((small.min.x, small.max.x), (3, 3));
        // No gap and no shared column.
        assert_eq!(small.min.x, big.max.x + 1);
        assert!(big.tiles().all(|t| !small.contains(t)));
    }

    #[test]
    fn footprint_swaps_for_quarter_turns() {
        let fp = footprint(Position::new(1.0, 1.5), (3, 2), Some(Orientation::East));
        assert_eq!((fp.width(), fp.height()), (2, 3));
        let fp = footprint(Position::new(1.5, 1.0), (3, 2), Some(Orientation::South));
        assert_eq!((fp.width(), fp.height()), (3, 2));
    }

    #[test]
    fn rect_union_and_tiles() {
        let a = footprint(Position::new(0.5, 0.5), (1, 1), None);
        let b = footprint(Position::new(2.5, 1.5), (1, 1), None);
        let u = a.union(&b);
        assert_eq!((u.width(), u.height()), (3, 2));
        assert_eq!(u.tiles().count(), 6);
        assert_eq!(u.min, GridPosition::new(0, 0));
        assert_eq!(u.max, GridPosition::new(2, 1));
    }

    #[test]
    fn grid_step_follows_orientation() {
        let a = GridPosition::new(0, 0);
        assert_eq!(a.step(Orientation::West), GridPosition::new(-1, 0));
        assert_eq!(a.step(Orientation::South), GridPosition::new(0, 1));
    }
}
