//! Tile occupancy index over an entity collection.
//!
//! Maps every footprint tile to the indices of the entities covering it.
//! Built fresh from a slice; indices refer back into that slice.

use std::collections::BTreeMap;

use crate::catalog::EntityCatalog;
use crate::entity::Entity;
use crate::geometry::{GridPosition, Orientation};

/// Tile -> covering entity indices. Index lists are ascending.
#[derive(Debug, Clone, Default)]
pub struct TileOccupancy {
    tiles: BTreeMap<GridPosition, Vec<usize>>,
}

impl TileOccupancy {
    /// Index every entity in `entities`.
    pub fn build(entities: &[Entity], catalog: &EntityCatalog) -> Self {
        Self::build_filtered(entities, catalog, |_| true)
    }

    /// Index only the entities accepted by `keep`.
    pub fn build_filtered<F>(entities: &[Entity], catalog: &EntityCatalog, keep: F) -> Self
    where
        F: Fn(&Entity) -> bool,
    {
        let mut tiles: BTreeMap<GridPosition, Vec<usize>> = BTreeMap::new();
        for (i, entity) in entities.iter().enumerate() {
            if !keep(entity) {
                continue;
            }
            for tile in catalog.footprint(entity).tiles() {
                tiles.entry(tile).or_default().push(i);
            }
        }
        Self { tiles }
    }

    // -- Point queries --

    /// Entities covering `tile`, ascending by index.
    pub fn at(&self, tile: GridPosition) -> &[usize] {
        self.tiles.get(&tile).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_occupied(&self, tile: GridPosition) -> bool {
        self.tiles.contains_key(&tile)
    }

    // -- Adjacency --

    /// Entities on the four tiles orthogonally adjacent to `tile`, tagged
    /// with the direction from `tile` toward them.
    pub fn neighbors_4(&self, tile: GridPosition) -> Vec<(Orientation, usize)> {
        let mut result = Vec::new();
        for dir in Orientation::all() {
            for &index in self.at(tile.step(dir)) {
                result.push((dir, index));
            }
        }
        result
    }

    /// Tiles covered by more than one entity.
    pub fn shared_tiles(&self) -> impl Iterator<Item = (GridPosition, &[usize])> {
        self.tiles
            .iter()
            .filter(|(_, indices)| indices.len() > 1)
            .map(|(&tile, indices)| (tile, indices.as_slice()))
    }
}
