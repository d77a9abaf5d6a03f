//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::{EntityCatalog, Role};
use crate::entity::Entity;
use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::geometry::Orientation;

// ===========================================================================
// Type names
// ===========================================================================

pub const FURNACE: &str = "stone-furnace";
pub const ASSEMBLER: &str = "assembling-machine-1";
pub const INSERTER: &str = "inserter";
pub const BELT: &str = "transport-belt";
pub const FAST_BELT: &str = "fast-transport-belt";
pub const EXPRESS_BELT: &str = "express-transport-belt";
pub const POLE: &str = "medium-electric-pole";

pub fn fixed(v: f64) -> Fixed64 {
    f64_to_fixed64(v)
}

// ===========================================================================
// Catalog
// ===========================================================================

/// Furnace (2x2 producer), assembler (3x3 producer), inserter (transfer),
/// three belt tiers at 15/30/45 items per second, and a pole.
pub fn standard_catalog() -> EntityCatalog {
    EntityCatalog::builder()
        .with_role(FURNACE, (2, 2), Role::Producer, 10)
        .with_role(ASSEMBLER, (3, 3), Role::Producer, 10)
        .with_role(INSERTER, (1, 1), Role::Transfer, 5)
        .with_role(POLE, (1, 1), Role::DistributionNode, 3)
        .transport(BELT, fixed(15.0), 1)
        .transport(FAST_BELT, fixed(30.0), 1)
        .transport(EXPRESS_BELT, fixed(45.0), 1)
        .build()
}

// ===========================================================================
// Entity constructors
// ===========================================================================

pub fn furnace(x: f64, y: f64) -> Entity {
    Entity::new(FURNACE, x, y)
}

pub fn inserter(x: f64, y: f64, orientation: Option<Orientation>) -> Entity {
    let e = Entity::new(INSERTER, x, y);
    match orientation {
        Some(o) => e.with_orientation(o),
        None => e,
    }
}

pub fn belt(x: f64, y: f64, orientation: Orientation) -> Entity {
    Entity::new(BELT, x, y).with_orientation(orientation)
}

pub fn belt_of(kind: &str, x: f64, y: f64, orientation: Orientation) -> Entity {
    Entity::new(kind, x, y).with_orientation(orientation)
}

pub fn pole(x: f64, y: f64) -> Entity {
    Entity::new(POLE, x, y)
}

/// A straight horizontal run of `len` belts starting at tile `(x0, y)`.
pub fn belt_row(x0: i32, y: i32, len: i32, orientation: Orientation) -> Vec<Entity> {
    (0..len)
        .map(|i| belt(f64::from(x0 + i) + 0.5, f64::from(y) + 0.5, orientation))
        .collect()
}

/// One furnace cell: a belt lane on row 0, inserters on row 1 feeding a
/// furnace on rows 2-3, and a pole.
///
/// ```text
///   B B B      row 0: belts facing east
///   I . P      row 1: inserter (orientation unset), pole
///   F F .      rows 2-3: furnace
///   F F .
/// ```
pub fn furnace_cell() -> Vec<Entity> {
    let mut unit = belt_row(0, 0, 3, Orientation::East);
    unit.push(inserter(0.5, 1.5, None));
    unit.push(pole(2.5, 1.5));
    unit.push(furnace(1.0, 3.0));
    unit
}

/// Collect the `(type, x, y, orientation)` tuples of a collection, sorted.
pub fn tuple_set(entities: &[Entity]) -> Vec<(String, i64, i64, Option<u8>)> {
    let mut tuples: Vec<_> = entities
        .iter()
        .map(|e| {
            let key = e.dedup_key();
            (key.kind, key.x, key.y, key.orientation)
        })
        .collect();
    tuples.sort();
    tuples
}
