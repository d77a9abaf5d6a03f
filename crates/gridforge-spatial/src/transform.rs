//! Whole-layout rotation and reflection.

use gridforge_core::{Entity, EntityCatalog, Transform};

use crate::compose::normalize;

/// Reflect then rotate every entity about the origin, then shift the result
/// so its footprint starts at `(0, 0)`.
///
/// Entity numbers and passthrough metadata are kept; only positions and
/// orientations change.
pub fn transform_layout(
    entities: &[Entity],
    transform: Transform,
    catalog: &EntityCatalog,
) -> Vec<Entity> {
    let moved: Vec<Entity> = entities
        .iter()
        .map(|e| {
            let mut out = e.transformed(&transform, 0.0, 0.0);
            out.number = e.number;
            out
        })
        .collect();
    normalize(&moved, catalog)
}
