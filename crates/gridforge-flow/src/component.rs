//! Transport components: discovery, dominant axis, and lanes.

use std::collections::BTreeMap;

use gridforge_core::fixed::{Fixed64, saturating_sum};
use gridforge_core::{Entity, EntityCatalog, GridPosition, Orientation, Position};
use serde::{Deserialize, Serialize};

use crate::dsu::DisjointSet;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The direction items predominantly travel along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Members of a component sharing one coordinate on the non-dominant axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    /// Tile y for a horizontal component, tile x for a vertical one.
    pub coordinate: i32,
    /// Slowest member speed.
    pub capacity: Fixed64,
    pub size: usize,
}

/// A maximal set of transport entities joined by 4-neighbor adjacency.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Grid keys, ascending.
    pub keys: Vec<GridPosition>,
    /// Indices into the analyzed entity slice.
    pub members: Vec<usize>,
    pub axis: Axis,
    /// Lanes ascending by coordinate.
    pub lanes: Vec<Lane>,
    /// Sum of lane capacities.
    pub capacity: Fixed64,
    pub centroid: Position,
}

impl Component {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Transport entities grouped by grid key.
pub(crate) fn transport_keys(
    entities: &[Entity],
    catalog: &EntityCatalog,
) -> BTreeMap<GridPosition, Vec<usize>> {
    let mut keys: BTreeMap<GridPosition, Vec<usize>> = BTreeMap::new();
    for (i, entity) in entities.iter().enumerate() {
        if catalog.is_transport(&entity.kind) {
            keys.entry(entity.tile()).or_default().push(i);
        }
    }
    keys
}

/// Union 4-adjacent keys. Returns groups of key positions, each ascending,
/// ordered by their smallest key.
pub(crate) fn group_keys(keys: &BTreeMap<GridPosition, Vec<usize>>) -> Vec<Vec<GridPosition>> {
    let sorted: Vec<GridPosition> = keys.keys().copied().collect();
    let mut dsu = DisjointSet::new(sorted.len());
    for (i, key) in sorted.iter().enumerate() {
        // East and south neighbours cover every adjacent pair once.
        for dir in [Orientation::East, Orientation::South] {
            if let Ok(j) = sorted.binary_search(&key.step(dir)) {
                dsu.union(i, j);
            }
        }
    }
    dsu.groups()
        .into_iter()
        .map(|group| group.into_iter().map(|i| sorted[i]).collect())
        .collect()
}

/// Measure one group of keys: axis, lanes, capacity, centroid.
pub(crate) fn measure(
    keys: Vec<GridPosition>,
    index: &BTreeMap<GridPosition, Vec<usize>>,
    entities: &[Entity],
    catalog: &EntityCatalog,
) -> Component {
    let members: Vec<usize> = keys
        .iter()
        .flat_map(|k| index.get(k).into_iter().flatten().copied())
        .collect();

    let axis = dominant_axis(&keys, &members, entities);

    let mut lanes: BTreeMap<i32, (Fixed64, usize)> = BTreeMap::new();
    for &m in &members {
        let entity = &entities[m];
        let tile = entity.tile();
        let coordinate = match axis {
            Axis::Horizontal => tile.y,
            Axis::Vertical => tile.x,
        };
        let speed = catalog.speed(&entity.kind).unwrap_or(Fixed64::ZERO);
        lanes
            .entry(coordinate)
            .and_modify(|(cap, size)| {
                *cap = (*cap).min(speed);
                *size += 1;
            })
            .or_insert((speed, 1));
    }
    let lanes: Vec<Lane> = lanes
        .into_iter()
        .map(|(coordinate, (capacity, size))| Lane {
            coordinate,
            capacity,
            size,
        })
        .collect();
    let capacity = saturating_sum(lanes.iter().map(|l| l.capacity));

    Component {
        centroid: centroid(&members, entities),
        keys,
        members,
        axis,
        lanes,
        capacity,
    }
}

/// Summed orientation vectors decide; without any orientation the bounding
/// box span does. Ties are horizontal.
fn dominant_axis(keys: &[GridPosition], members: &[usize], entities: &[Entity]) -> Axis {
    let mut oriented = false;
    let (mut sx, mut sy) = (0i64, 0i64);
    for &m in members {
        if let Some(o) = entities[m].orientation {
            let (dx, dy) = o.offset();
            sx += i64::from(dx);
            sy += i64::from(dy);
            oriented = true;
        }
    }
    if oriented {
        return if sy.abs() > sx.abs() {
            Axis::Vertical
        } else {
            Axis::Horizontal
        };
    }

    let span = |f: fn(&GridPosition) -> i32| {
        let lo = keys.iter().map(f).min().unwrap_or(0);
        let hi = keys.iter().map(f).max().unwrap_or(0);
        hi - lo
    };
    if span(|k| k.y) > span(|k| k.x) {
        Axis::Vertical
    } else {
        Axis::Horizontal
    }
}

/// Mean member position, summed in position order.
fn centroid(members: &[usize], entities: &[Entity]) -> Position {
    if members.is_empty() {
        return Position::default();
    }
    let mut positions: Vec<Position> = members.iter().map(|&m| entities[m].position).collect();
    positions.sort_by_key(|p| p.decimal_key());
    let n = positions.len() as f64;
    let (sx, sy) = positions
        .iter()
        .fold((0.0, 0.0), |(ax, ay), p| (ax + p.x, ay + p.y));
    Position::new(sx / n, sy / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridforge_core::test_utils::*;

    fn components(entities: &[Entity]) -> Vec<Component> {
        let catalog = standard_catalog();
        let index = transport_keys(entities, &catalog);
        group_keys(&index)
            .into_iter()
            .map(|keys| measure(keys, &index, entities, &catalog))
            .collect()
    }

    #[test]
    fn adjacent_tiles_join_diagonals_do_not() {
        let entities = vec![
            belt(0.5, 0.5, Orientation::East),
            belt(1.5, 0.5, Orientation::East),
            belt(2.5, 1.5, Orientation::East),
        ];
        let comps = components(&entities);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].size(), 2);
        assert_eq!(comps[1].keys, vec![GridPosition::new(2, 1)]);
    }

    #[test]
    fn slowest_tile_bounds_the_lane() {
        let entities = vec![
            belt_of(BELT, 0.5, 0.5, Orientation::East),
            belt_of(FAST_BELT, 1.5, 0.5, Orientation::East),
            belt_of(BELT, 2.5, 0.5, Orientation::East),
        ];
        let comps = components(&entities);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].axis, Axis::Horizontal);
        assert_eq!(comps[0].lanes.len(), 1);
        assert_eq!(comps[0].lanes[0].capacity, fixed(15.0));
        assert_eq!(comps[0].capacity, fixed(15.0));
    }

    #[test]
    fn parallel_lanes_sum() {
        let mut entities = belt_row(0, 0, 4, Orientation::East);
        entities.extend(belt_row(0, 1, 4, Orientation::East).into_iter().map(|mut e| {
            e.kind = FAST_BELT.to_string();
            e
        }));
        let comps = components(&entities);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].lanes.len(), 2);
        assert_eq!(comps[0].capacity, fixed(45.0));
    }

    #[test]
    fn orientation_votes_decide_the_axis() {
        let entities = vec![
            belt(0.5, 0.5, Orientation::South),
            belt(0.5, 1.5, Orientation::South),
            belt(1.5, 1.5, Orientation::East),
        ];
        let comps = components(&entities);
        assert_eq!(comps[0].axis, Axis::Vertical);
        assert_eq!(comps[0].lanes.len(), 2);
    }

    #[test]
    fn unoriented_uses_bounding_box_and_ties_go_horizontal() {
        let mut column = belt_row(0, 0, 1, Orientation::East);
        column.push(belt(0.5, 1.5, Orientation::East));
        for e in &mut column {
            e.orientation = None;
        }
        assert_eq!(components(&column)[0].axis, Axis::Vertical);

        let mut single = belt_row(0, 0, 1, Orientation::East);
        single[0].orientation = None;
        assert_eq!(components(&single)[0].axis, Axis::Horizontal);
    }

    #[test]
    fn centroid_is_the_mean_position() {
        let entities = belt_row(0, 0, 3, Orientation::East);
        let comps = components(&entities);
        assert_eq!(comps[0].centroid, Position::new(1.5, 0.5));
    }
}
