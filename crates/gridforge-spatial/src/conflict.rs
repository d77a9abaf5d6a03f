//! Tile conflict report for composed layouts.

use std::cmp::Reverse;

use gridforge_core::diagnostic::{Diagnostic, Diagnostics};
use gridforge_core::grid::TileOccupancy;
use gridforge_core::{Entity, EntityCatalog};

/// Report every tile covered by more than one entity.
///
/// The owner of a contested tile is the entity with the highest catalog
/// priority; among equals, the lowest index. Unknown types have the lowest
/// priority and so never own a tile they share with a known type.
pub fn tile_conflicts(entities: &[Entity], catalog: &EntityCatalog) -> Diagnostics {
    let occupancy = TileOccupancy::build(entities, catalog);
    let mut diagnostics = Diagnostics::new();
    for (tile, indices) in occupancy.shared_tiles() {
        let owner = indices
            .iter()
            .copied()
            .max_by_key(|&i| (catalog.priority(&entities[i].kind), Reverse(i)))
            .unwrap_or(indices[0]);
        diagnostics.push(Diagnostic::TileConflict {
            tile,
            owner,
            entities: indices.to_vec(),
        });
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridforge_core::test_utils::*;
    use gridforge_core::{GridPosition, Orientation};

    #[test]
    fn flush_layout_has_no_conflicts() {
        let catalog = standard_catalog();
        let entities = furnace_cell();
        assert!(tile_conflicts(&entities, &catalog).is_empty());
    }

    #[test]
    fn higher_priority_owns_the_tile() {
        let catalog = standard_catalog();
        let entities = vec![belt(1.5, 1.5, Orientation::East), furnace(1.0, 1.0)];
        let conflicts = tile_conflicts(&entities, &catalog);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts.iter().next(),
            Some(&Diagnostic::TileConflict {
                tile: GridPosition::new(1, 1),
                owner: 1,
                entities: vec![0, 1],
            })
        );
    }

    #[test]
    fn equal_priority_goes_to_earlier_entity() {
        let catalog = standard_catalog();
        let entities = vec![
            belt(0.5, 0.5, Orientation::East),
            belt(0.5, 0.5, Orientation::North),
        ];
        match tile_conflicts(&entities, &catalog).iter().next() {
            Some(Diagnostic::TileConflict { owner, .. }) => assert_eq!(*owner, 0),
            other => panic!("expected a conflict, got {other:?}"),
        }
    }
}
