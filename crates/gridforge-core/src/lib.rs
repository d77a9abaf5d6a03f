//! Gridforge Core -- entity model and geometry kernel for tile layouts.
//!
//! A layout is a flat, unordered collection of typed, oriented tile
//! entities. This crate provides everything the layout crates share:
//!
//! - [`entity::Entity`] -- the `(type, position, orientation)` record plus
//!   passthrough metadata.
//! - [`geometry`] -- quarter-turn rotation and reflection applied jointly to
//!   positions and orientations, half-tile snapping, and tile footprints.
//! - [`catalog::EntityCatalog`] -- immutable size/speed/priority/role tables,
//!   passed explicitly into every operation.
//! - [`grid::TileOccupancy`] -- tile to entity index for adjacency queries.
//! - [`record`] -- reading raw JSON records at the codec boundary.
//! - [`diagnostic`] -- non-fatal findings returned with results.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point for order-independent rates.

pub mod catalog;
pub mod diagnostic;
pub mod entity;
pub mod fixed;
pub mod geometry;
pub mod grid;
pub mod record;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use catalog::{EntityCatalog, EntityKind, Role};
pub use diagnostic::{Diagnostic, Diagnostics};
pub use entity::Entity;
pub use geometry::{GeometryError, GridPosition, Orientation, Position, TileRect, Transform};
