//! Connector synthesis: direction repair for transfer entities and the
//! wiring graph between distribution nodes.

use std::collections::{BTreeMap, BTreeSet};

use gridforge_core::diagnostic::{Diagnostic, Diagnostics};
use gridforge_core::grid::TileOccupancy;
use gridforge_core::{Entity, EntityCatalog};
use serde::{Deserialize, Serialize};

/// Connection slot written into every wire tuple. Passed through unchanged
/// to the codec.
pub const DEFAULT_WIRE_PORT: u32 = 5;

/// Maximum distance in tiles between two wired nodes.
pub const DEFAULT_WIRE_REACH: f64 = 7.0;

// ---------------------------------------------------------------------------
// Direction repair
// ---------------------------------------------------------------------------

/// Give every unoriented transfer entity the orientation pointing at an
/// adjacent producer, and report the ones left without.
///
/// Candidates are producers whose footprint covers one of the four tiles
/// orthogonally next to the transfer entity's tile. When several qualify,
/// the producer with the smallest `(x, y)` position wins, then the smaller
/// type name. A transfer entity with no candidate keeps no orientation and
/// is reported as [`Diagnostic::UnresolvedTransfer`].
pub fn repair_directions(entities: &mut [Entity], catalog: &EntityCatalog) -> Diagnostics {
    infer_directions(entities, catalog);
    unresolved_transfers(entities, catalog)
}

/// Orient every unoriented transfer entity that has an adjacent producer.
/// Returns how many were oriented.
pub fn infer_directions(entities: &mut [Entity], catalog: &EntityCatalog) -> usize {
    let producers =
        TileOccupancy::build_filtered(entities, catalog, |e| catalog.is_producer(&e.kind));
    let mut repaired = 0usize;

    for index in 0..entities.len() {
        let entity = &entities[index];
        if entity.orientation.is_some() || !catalog.is_transfer(&entity.kind) {
            continue;
        }

        let choice = producers
            .neighbors_4(entity.tile())
            .into_iter()
            .min_by(|(_, a), (_, b)| {
                let (ea, eb) = (&entities[*a], &entities[*b]);
                ea.position
                    .decimal_key()
                    .cmp(&eb.position.decimal_key())
                    .then_with(|| ea.kind.cmp(&eb.kind))
                    .then_with(|| a.cmp(b))
            })
            .map(|(dir, _)| dir);

        if let Some(dir) = choice {
            entities[index].orientation = Some(dir);
            repaired += 1;
        }
    }

    tracing::debug!(repaired, "inferred transfer directions");
    repaired
}

/// One [`Diagnostic::UnresolvedTransfer`] per transfer entity that still has
/// no orientation.
pub fn unresolved_transfers(entities: &[Entity], catalog: &EntityCatalog) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for (index, entity) in entities.iter().enumerate() {
        if entity.orientation.is_none() && catalog.is_transfer(&entity.kind) {
            diagnostics.push(Diagnostic::UnresolvedTransfer {
                index,
                kind: entity.kind.clone(),
                position: entity.position,
            });
        }
    }
    diagnostics
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Wiring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiringConfig {
    pub reach: f64,
    pub port: u32,
}

impl Default for WiringConfig {
    fn default() -> Self {
        Self {
            reach: DEFAULT_WIRE_REACH,
            port: DEFAULT_WIRE_PORT,
        }
    }
}

/// One undirected wire between two distribution nodes, identified by entity
/// number. `a < b` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireConnection {
    pub a: u32,
    pub port_a: u32,
    pub b: u32,
    pub port_b: u32,
}

impl WireConnection {
    /// `[nodeA, portA, nodeB, portB]`.
    pub fn as_tuple(&self) -> [u32; 4] {
        [self.a, self.port_a, self.b, self.port_b]
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    id: u32,
    key: (i64, i64),
    x: f64,
    y: f64,
}

/// Connect each distribution node to its nearest neighbor to the right on
/// the same row and its nearest neighbor below on the same column, when
/// that neighbor is within `config.reach` tiles.
///
/// Nodes are identified by `entity.number` when every node carries a
/// distinct one. Otherwise all nodes fall back to their 1-based collection
/// index, so ids never collide. Each pair appears once regardless of which
/// endpoint discovered it. The result is sorted by `(a, b)`.
pub fn synthesize_wires(
    entities: &[Entity],
    catalog: &EntityCatalog,
    config: &WiringConfig,
) -> Vec<WireConnection> {
    let candidates: Vec<(usize, &Entity)> = entities
        .iter()
        .enumerate()
        .filter(|(_, e)| catalog.is_distribution_node(&e.kind))
        .collect();

    let mut seen = BTreeSet::new();
    let use_numbers = candidates
        .iter()
        .all(|(_, e)| e.number.is_some_and(|n| seen.insert(n)));
    if !use_numbers {
        tracing::debug!("distribution nodes not uniquely numbered, using collection indices");
    }

    let nodes: Vec<Node> = candidates
        .into_iter()
        .map(|(i, e)| Node {
            id: match e.number {
                Some(n) if use_numbers => n,
                _ => i as u32 + 1,
            },
            key: e.position.decimal_key(),
            x: e.position.x,
            y: e.position.y,
        })
        .collect();

    // Rows keyed by y, each sorted by (x, id); columns likewise.
    let mut rows: BTreeMap<i64, Vec<Node>> = BTreeMap::new();
    let mut cols: BTreeMap<i64, Vec<Node>> = BTreeMap::new();
    for node in &nodes {
        rows.entry(node.key.1).or_default().push(*node);
        cols.entry(node.key.0).or_default().push(*node);
    }

    let mut pairs: BTreeSet<(u32, u32)> = BTreeSet::new();
    for line in rows.values_mut() {
        line.sort_by_key(|n| (n.key.0, n.id));
        link_nearest(line, |n| n.key.0, |p, q| q.x - p.x, config.reach, &mut pairs);
    }
    for line in cols.values_mut() {
        line.sort_by_key(|n| (n.key.1, n.id));
        link_nearest(line, |n| n.key.1, |p, q| q.y - p.y, config.reach, &mut pairs);
    }

    tracing::debug!(nodes = nodes.len(), wires = pairs.len(), "synthesized wires");

    pairs
        .into_iter()
        .map(|(a, b)| WireConnection {
            a,
            port_a: config.port,
            b,
            port_b: config.port,
        })
        .collect()
}

/// For each node in a sorted line, link it to the first node strictly
/// further along the line if within reach.
fn link_nearest(
    line: &[Node],
    coord: impl Fn(&Node) -> i64,
    distance: impl Fn(&Node, &Node) -> f64,
    reach: f64,
    pairs: &mut BTreeSet<(u32, u32)>,
) {
    for (i, p) in line.iter().enumerate() {
        let next = line[i + 1..].iter().find(|q| coord(*q) > coord(p));
        if let Some(q) = next
            && distance(p, q) <= reach
        {
            pairs.insert((p.id.min(q.id), p.id.max(q.id)));
        }
    }
}
