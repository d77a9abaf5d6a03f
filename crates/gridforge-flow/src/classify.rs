//! Supply and drain classification of transport components.
//!
//! A transfer entity carries items from the tile behind it to the tile in
//! front of it. When the tile behind is a component member and the tile in
//! front is a producer, that component supplies the producer; the reverse
//! makes it a drain. When no transfer entity links any component to any
//! producer, a positional fallback picks the components nearest the middle
//! and the two horizontal extremes. The fallback is a best-effort guess for
//! regular layouts and carries no correctness guarantee.

use std::collections::BTreeMap;

use gridforge_core::grid::TileOccupancy;
use gridforge_core::{Entity, EntityCatalog, GridPosition};
use serde::{Deserialize, Serialize};

use crate::component::Component;

/// How the supply and drain sets were decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// No components to classify.
    #[default]
    None,
    /// From transfer entities between components and producers.
    Adjacency,
    /// From component centroids.
    Fallback,
}

/// Supply and drain component indices, each ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roles {
    pub supplies: Vec<usize>,
    pub drains: Vec<usize>,
    pub method: Classification,
}

/// Classify `components`, whose members index into `entities`.
pub fn classify(entities: &[Entity], catalog: &EntityCatalog, components: &[Component]) -> Roles {
    if components.is_empty() {
        return Roles::default();
    }

    let roles = classify_by_adjacency(entities, catalog, components);
    if !roles.supplies.is_empty() || !roles.drains.is_empty() {
        return roles;
    }
    classify_by_position(components)
}

fn classify_by_adjacency(
    entities: &[Entity],
    catalog: &EntityCatalog,
    components: &[Component],
) -> Roles {
    let owner: BTreeMap<GridPosition, usize> = components
        .iter()
        .enumerate()
        .flat_map(|(c, comp)| comp.keys.iter().map(move |&k| (k, c)))
        .collect();
    let producers =
        TileOccupancy::build_filtered(entities, catalog, |e| catalog.is_producer(&e.kind));

    let mut supply = vec![false; components.len()];
    let mut drain = vec![false; components.len()];
    for entity in entities {
        let Some(dir) = entity.orientation else {
            continue;
        };
        if !catalog.is_transfer(&entity.kind) {
            continue;
        }
        let tile = entity.tile();
        let pickup = tile.step(dir.opposite());
        let drop = tile.step(dir);

        if let Some(&c) = owner.get(&pickup)
            && producers.is_occupied(drop)
        {
            supply[c] = true;
        }
        if let Some(&c) = owner.get(&drop)
            && producers.is_occupied(pickup)
        {
            drain[c] = true;
        }
    }

    let marked = |flags: &[bool]| -> Vec<usize> {
        flags
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect()
    };
    Roles {
        supplies: marked(&supply),
        drains: marked(&drain),
        method: Classification::Adjacency,
    }
}

fn classify_by_position(components: &[Component]) -> Roles {
    let xs = components
        .iter()
        .flat_map(|c| c.keys.iter().map(|k| k.x));
    let (Some(min_x), Some(max_x)) = (xs.clone().min(), xs.max()) else {
        return Roles::default();
    };
    // Tile centers, so a one-tile-wide network has its midpoint on the tile.
    let min_x = f64::from(min_x) + 0.5;
    let max_x = f64::from(max_x) + 0.5;
    let mid_x = (min_x + max_x) / 2.0;

    let closest_to = |target: f64, exclude: Option<usize>| -> Option<usize> {
        components
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != exclude)
            .min_by(|(i, a), (j, b)| {
                let da = (a.centroid.x - target).abs();
                let db = (b.centroid.x - target).abs();
                da.total_cmp(&db).then(i.cmp(j))
            })
            .map(|(i, _)| i)
    };

    let drain = closest_to(mid_x, None);
    let mut supplies: Vec<usize> = [closest_to(min_x, drain), closest_to(max_x, drain)]
        .into_iter()
        .flatten()
        .collect();
    supplies.sort_unstable();
    supplies.dedup();

    tracing::debug!(
        ?drain,
        ?supplies,
        "no transfer adjacency; classified components by position"
    );
    Roles {
        supplies,
        drains: drain.into_iter().collect(),
        method: Classification::Fallback,
    }
}
