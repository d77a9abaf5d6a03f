//! Tile compositor: replicate a unit across a grid of cells.
//!
//! # Pipeline
//!
//! 1. Optionally shift the unit so its footprint origin is `(0, 0)`.
//! 2. Measure the unit under the base transform; this fixes the cell size.
//! 3. Derive step sizes from cell size, spacing and edge sharing.
//! 4. For each cell, resolve the row's effective transform, align its
//!    footprint origin with the base footprint origin, and emit transformed
//!    copies of every unit entity.
//! 5. Drop repeated `(type, position, orientation)` tuples, keeping the
//!    first occurrence.
//! 6. Repair transfer directions, drop any tuples the repair made
//!    coincide, renumber densely, rebuild wires, and report tile conflicts
//!    and unknown types.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use gridforge_core::diagnostic::{Diagnostic, Diagnostics};
use gridforge_core::entity::renumber;
use gridforge_core::{Entity, EntityCatalog, GeometryError, TileRect, Transform};
use serde::{Deserialize, Serialize};

use crate::Layout;
use crate::conflict::tile_conflicts;
use crate::connector::{WiringConfig, infer_directions, synthesize_wires, unresolved_transfers};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Errors from composition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComposeError {
    #[error("unit has no entities")]
    EmptyUnit,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Grid replication parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeParams {
    pub rows: i32,
    pub cols: i32,
    pub spacing_x: f64,
    pub spacing_y: f64,
    /// Base quarter turns, `0..=3`.
    pub rotate: i64,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Overlap adjacent cells by one tile horizontally.
    pub share_x: bool,
    /// Overlap adjacent cells by one tile vertically.
    pub share_y: bool,
    /// Rows whose vertical reflection is toggled relative to the base.
    pub per_row_flip: BTreeSet<i32>,
    /// Extra quarter turns per row, added to the base rotation mod 4.
    pub per_row_rotate: BTreeMap<i32, i32>,
    /// Shift the unit so its footprint starts at `(0, 0)` before tiling.
    pub normalize: bool,
}

impl Default for ComposeParams {
    fn default() -> Self {
        Self {
            rows: 1,
            cols: 1,
            spacing_x: 1.0,
            spacing_y: 1.0,
            rotate: 0,
            flip_x: false,
            flip_y: false,
            share_x: false,
            share_y: false,
            per_row_flip: BTreeSet::new(),
            per_row_rotate: BTreeMap::new(),
            normalize: true,
        }
    }
}

impl ComposeParams {
    /// A `rows x cols` grid with every other parameter at its default.
    pub fn grid(rows: i32, cols: i32) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    pub fn base_transform(&self) -> Result<Transform, GeometryError> {
        Transform::new(self.rotate, self.flip_x, self.flip_y)
    }

    /// The base transform with any override for `row` applied.
    pub fn row_transform(&self, base: Transform, row: i32) -> Transform {
        let mut t = base;
        if self.per_row_flip.contains(&row) {
            t = t.toggled_flip_y();
        }
        if let Some(&steps) = self.per_row_rotate.get(&row) {
            t = t.rotated_by(steps);
        }
        t
    }
}

// ---------------------------------------------------------------------------
// Compositor
// ---------------------------------------------------------------------------

/// Replicates a unit across a grid using one catalog and wiring config.
#[derive(Debug, Clone)]
pub struct Compositor<'a> {
    catalog: &'a EntityCatalog,
    wiring: WiringConfig,
}

impl<'a> Compositor<'a> {
    pub fn new(catalog: &'a EntityCatalog) -> Self {
        Self {
            catalog,
            wiring: WiringConfig::default(),
        }
    }

    pub fn with_wiring(mut self, wiring: WiringConfig) -> Self {
        self.wiring = wiring;
        self
    }

    /// Compose `unit` into a full layout.
    ///
    /// The unit's own entity numbers and any wiring it carried are
    /// discarded; the output is numbered `1..=n` and wired afresh.
    pub fn compose(&self, unit: &[Entity], params: &ComposeParams) -> Result<Layout, ComposeError> {
        if unit.is_empty() {
            return Err(ComposeError::EmptyUnit);
        }
        let base = params.base_transform()?;
        if params.rows <= 0 || params.cols <= 0 {
            tracing::debug!(rows = params.rows, cols = params.cols, "empty composition grid");
            return Ok(Layout::default());
        }

        let unit = if params.normalize {
            normalize(unit, self.catalog)
        } else {
            unit.to_vec()
        };

        let base_rect = self.transformed_bounds(&unit, base)?;
        let step_x = step_size(base_rect.width(), params.spacing_x, params.share_x);
        let step_y = step_size(base_rect.height(), params.spacing_y, params.share_y);

        let mut placed = Vec::new();
        for row in 0..params.rows {
            let t = params.row_transform(base, row);
            let rect = self.transformed_bounds(&unit, t)?;
            let align_x = f64::from(base_rect.min.x) - f64::from(rect.min.x);
            let align_y = f64::from(base_rect.min.y) - f64::from(rect.min.y);
            let dy = cell_offset(row, step_y) + align_y;
            for col in 0..params.cols {
                let dx = cell_offset(col, step_x) + align_x;
                placed.extend(unit.iter().map(|e| e.transformed(&t, dx, dy)));
            }
        }

        let generated = placed.len();
        let mut entities = dedup_first(placed);
        tracing::debug!(
            rows = params.rows,
            cols = params.cols,
            step_x,
            step_y,
            generated,
            kept = entities.len(),
            "composed grid"
        );

        let mut diagnostics = Diagnostics::new();
        for kind in self.catalog.unknown_kinds(&entities) {
            diagnostics.push(Diagnostic::UnknownType { kind });
        }
        infer_directions(&mut entities, self.catalog);
        // A repaired transfer entity can now coincide with an oriented one.
        let mut entities = dedup_first(entities);
        renumber(&mut entities);
        diagnostics.extend(unresolved_transfers(&entities, self.catalog));
        let wires = synthesize_wires(&entities, self.catalog, &self.wiring);
        diagnostics.extend(tile_conflicts(&entities, self.catalog));

        Ok(Layout {
            entities,
            wires,
            diagnostics,
        })
    }

    /// Bounding rectangle of `unit` after `transform`.
    fn transformed_bounds(
        &self,
        unit: &[Entity],
        transform: Transform,
    ) -> Result<TileRect, ComposeError> {
        let moved: Vec<Entity> = unit
            .iter()
            .map(|e| e.transformed(&transform, 0.0, 0.0))
            .collect();
        self.catalog.bounds(&moved).ok_or(ComposeError::EmptyUnit)
    }
}

/// Compose with the default wiring config.
pub fn compose(
    unit: &[Entity],
    params: &ComposeParams,
    catalog: &EntityCatalog,
) -> Result<Layout, ComposeError> {
    Compositor::new(catalog).compose(unit, params)
}

/// `max(1, ceil(extent + spacing - share))`.
fn step_size(extent: u32, spacing: f64, share: bool) -> i32 {
    let shared = if share { 1.0 } else { 0.0 };
    let step = (f64::from(extent) + spacing - shared).ceil();
    (step as i32).max(1)
}

/// Offset of the cell at `index` along one axis. Computed in `f64` so large
/// grids cannot overflow.
fn cell_offset(index: i32, step: i32) -> f64 {
    f64::from(index) * f64::from(step)
}

/// Shift `unit` so its footprint origin lands on `(0, 0)`.
pub fn normalize(unit: &[Entity], catalog: &EntityCatalog) -> Vec<Entity> {
    let Some(bounds) = catalog.bounds(unit) else {
        return Vec::new();
    };
    let (dx, dy) = (-f64::from(bounds.min.x), -f64::from(bounds.min.y));
    unit.iter()
        .map(|e| {
            let mut out = e.clone();
            out.position = e.position.translated(dx, dy).snapped();
            out
        })
        .collect()
}

/// Keep the first entity for each dedup key, preserving order.
///
/// This is the one place where source order decides the result: when two
/// entities share a key but differ in passthrough metadata, the earlier one
/// survives.
pub fn dedup_first(entities: Vec<Entity>) -> Vec<Entity> {
    let mut seen = HashSet::with_capacity(entities.len());
    entities
        .into_iter()
        .filter(|e| seen.insert(e.dedup_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::repair_directions;
    use gridforge_core::Orientation;
    use gridforge_core::test_utils::*;
    use serde_json::json;

    #[test]
    fn empty_unit_is_an_error() {
        let catalog = standard_catalog();
        assert_eq!(
            compose(&[], &ComposeParams::grid(2, 2), &catalog).unwrap_err(),
            ComposeError::EmptyUnit
        );
    }

    #[test]
    fn zero_sized_grid_is_empty_not_an_error() {
        let catalog = standard_catalog();
        let unit = furnace_cell();
        for (rows, cols) in [(0, 3), (3, 0), (-1, 2)] {
            let layout = compose(&unit, &ComposeParams::grid(rows, cols), &catalog).unwrap();
            assert!(layout.entities.is_empty());
            assert!(layout.wires.is_empty());
        }
    }

    #[test]
    fn rotation_outside_range_is_rejected() {
        let catalog = standard_catalog();
        let params = ComposeParams {
            rotate: 5,
            ..ComposeParams::grid(1, 1)
        };
        assert_eq!(
            compose(&furnace_cell(), &params, &catalog).unwrap_err(),
            ComposeError::Geometry(GeometryError::InvalidRotation(5))
        );
    }

    #[test]
    fn single_cell_reproduces_normalized_unit() {
        let catalog = standard_catalog();
        // Same cell, shifted away from the origin.
        let unit: Vec<Entity> = furnace_cell()
            .into_iter()
            .map(|mut e| {
                e.position = e.position.translated(7.0, -3.0);
                e
            })
            .collect();
        let layout = compose(&unit, &ComposeParams::grid(1, 1), &catalog).unwrap();
        assert_eq!(layout.entities.len(), unit.len());

        let mut expected = furnace_cell();
        repair_directions(&mut expected, &catalog);
        assert_eq!(tuple_set(&layout.entities), tuple_set(&expected));
    }

    #[test]
    fn shared_edge_collapses_coincident_tiles() {
        let catalog = standard_catalog();
        let unit = belt_row(0, 0, 3, Orientation::East);
        let params = ComposeParams {
            spacing_x: 0.0,
            share_x: true,
            ..ComposeParams::grid(1, 2)
        };
        let layout = compose(&unit, &params, &catalog).unwrap();
        // 2 * 3 - 1 shared belt.
        assert_eq!(layout.entities.len(), 5);
        let xs: Vec<f64> = layout.entities.iter().map(|e| e.position.x).collect();
        assert_eq!(xs, vec![0.5, 1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn spacing_separates_cells() {
        let catalog = standard_catalog();
        let unit = belt_row(0, 0, 3, Orientation::East);
        let layout = compose(&unit, &ComposeParams::grid(1, 2), &catalog).unwrap();
        // Default spacing of one tile: step = 3 + 1.
        let xs: Vec<f64> = layout.entities.iter().map(|e| e.position.x).collect();
        assert_eq!(xs, vec![0.5, 1.5, 2.5, 4.5, 5.5, 6.5]);
    }

    #[test]
    fn step_never_drops_below_one_tile() {
        assert_eq!(step_size(1, 0.0, true), 1);
        assert_eq!(step_size(1, -5.0, false), 1);
        assert_eq!(step_size(3, 0.5, false), 4);
        assert_eq!(step_size(3, 0.0, true), 2);
    }

    #[test]
    fn cell_offsets_do_not_overflow() {
        assert_eq!(cell_offset(3, 4), 12.0);
        assert_eq!(cell_offset(i32::MAX, 4), 4.0 * f64::from(i32::MAX));
    }

    #[test]
    fn unnormalized_unit_keeps_its_offset() {
        let catalog = standard_catalog();
        let unit = belt_row(5, 2, 3, Orientation::East);
        let params = ComposeParams {
            spacing_x: 0.0,
            normalize: false,
            ..ComposeParams::grid(1, 2)
        };
        let layout = compose(&unit, &params, &catalog).unwrap();
        let xs: Vec<f64> = layout.entities.iter().map(|e| e.position.x).collect();
        assert_eq!(xs, vec![5.5, 6.5, 7.5, 8.5, 9.5, 10.5]);
        assert!(layout.entities.iter().all(|e| e.position.y == 2.5));

        let normalized = compose(&unit, &ComposeParams { normalize: true, ..params }, &catalog)
            .unwrap();
        assert_eq!(normalized.entities[0].position, gridforge_core::Position::new(0.5, 0.5));
    }

    #[test]
    fn shared_vertical_edge_collapses_coincident_tiles() {
        let catalog = standard_catalog();
        let unit: Vec<Entity> = (0..4)
            .map(|y| belt(0.5, f64::from(y) + 0.5, Orientation::South))
            .collect();
        let params = ComposeParams {
            spacing_y: 0.0,
            share_y: true,
            ..ComposeParams::grid(2, 1)
        };
        let layout = compose(&unit, &params, &catalog).unwrap();
        // 2 * 4 - 1 shared belt.
        assert_eq!(layout.entities.len(), 7);
        let ys: Vec<f64> = layout.entities.iter().map(|e| e.position.y).collect();
        assert_eq!(ys, vec![0.5, 1.5, 2.5, 3.5, 4.5, 5.5, 6.5]);
    }

    #[test]
    fn output_is_renumbered_densely() {
        let catalog = standard_catalog();
        let layout = compose(&furnace_cell(), &ComposeParams::grid(2, 3), &catalog).unwrap();
        let numbers: Vec<u32> = layout.entities.iter().filter_map(|e| e.number).collect();
        let expected: Vec<u32> = (1..=layout.entities.len() as u32).collect();
        assert_eq!(numbers, expected);
    }

    #[test]
    fn rotated_grid_stays_on_base_origin_and_turns_orientations() {
        let catalog = standard_catalog();
        let unit = belt_row(0, 0, 3, Orientation::East);
        let params = ComposeParams {
            rotate: 1,
            spacing_x: 0.0,
            ..ComposeParams::grid(1, 2)
        };
        let layout = compose(&unit, &params, &catalog).unwrap();
        assert_eq!(layout.entities.len(), 6);
        assert!(
            layout
                .entities
                .iter()
                .all(|e| e.orientation == Some(Orientation::South))
        );
        // Rotated unit is one tile wide, so cells step by one tile in x.
        let mut xs: Vec<f64> = layout.entities.iter().map(|e| e.position.x).collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        assert_eq!(xs, vec![-0.5, 0.5]);
    }

    #[test]
    fn per_row_flip_mirrors_alternate_rows_into_the_same_cell_box() {
        let catalog = standard_catalog();
        let unit = furnace_cell();
        let params = ComposeParams {
            per_row_flip: BTreeSet::from([1]),
            spacing_y: 0.0,
            ..ComposeParams::grid(2, 1)
        };
        let layout = compose(&unit, &params, &catalog).unwrap();
        assert_eq!(layout.entities.len(), 2 * unit.len());

        // Row 1 starts at y = 4 and has its belt row at the bottom (y = 7).
        let belts_row1: Vec<f64> = layout
            .entities
            .iter()
            .filter(|e| e.kind == BELT && e.position.y > 4.0)
            .map(|e| e.position.y)
            .collect();
        assert_eq!(belts_row1, vec![7.5, 7.5, 7.5]);
        let furnace_row1 = layout
            .entities
            .iter()
            .find(|e| e.kind == FURNACE && e.position.y > 4.0)
            .unwrap();
        assert_eq!(furnace_row1.position.y, 5.0);
        // The mirrored inserter now points north into its furnace.
        let ins_row1 = layout
            .entities
            .iter()
            .find(|e| e.kind == INSERTER && e.position.y > 4.0)
            .unwrap();
        assert_eq!(ins_row1.orientation, Some(Orientation::North));
    }

    #[test]
    fn per_row_rotate_adds_to_base() {
        let params = ComposeParams {
            rotate: 3,
            per_row_rotate: BTreeMap::from([(1, 2)]),
            ..ComposeParams::grid(2, 1)
        };
        let base = params.base_transform().unwrap();
        assert_eq!(params.row_transform(base, 0).rotation(), 3);
        assert_eq!(params.row_transform(base, 1).rotation(), 1);
    }

    #[test]
    fn per_row_rotate_keeps_the_row_in_its_cell_box() {
        let catalog = standard_catalog();
        let unit = furnace_cell();
        let params = ComposeParams {
            per_row_rotate: BTreeMap::from([(1, 2)]),
            spacing_y: 0.0,
            ..ComposeParams::grid(2, 1)
        };
        let layout = compose(&unit, &params, &catalog).unwrap();
        assert_eq!(layout.entities.len(), 2 * unit.len());

        let row1 = &layout.entities[unit.len()..];
        let bounds = catalog.bounds(row1).unwrap();
        assert_eq!(bounds.min, gridforge_core::GridPosition::new(0, 4));
        assert_eq!(bounds.max, gridforge_core::GridPosition::new(2, 7));

        // Half turn: belts run west along the bottom, the inserter feeds
        // the furnace above it.
        let belts: Vec<_> = row1.iter().filter(|e| e.kind == BELT).collect();
        assert!(belts.iter().all(|e| e.orientation == Some(Orientation::West)));
        assert!(belts.iter().all(|e| e.position.y == 7.5));
        let ins = row1.iter().find(|e| e.kind == INSERTER).unwrap();
        assert_eq!(ins.position, gridforge_core::Position::new(2.5, 6.5));
        assert_eq!(ins.orientation, Some(Orientation::North));
    }

    #[test]
    fn duplicates_keep_first_metadata() {
        let first = belt(0.5, 0.5, Orientation::East).with_extra("tag", json!("first"));
        let second = belt(0.5, 0.5, Orientation::East).with_extra("tag", json!("second"));
        let other = belt(0.5, 0.5, Orientation::West);
        let out = dedup_first(vec![first, second, other]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].extra.get("tag"), Some(&json!("first")));
    }

    #[test]
    fn repaired_transfer_matching_an_oriented_one_is_dropped() {
        let catalog = standard_catalog();
        let unit = vec![
            furnace(1.0, 3.0),
            inserter(0.5, 1.5, Some(Orientation::South)),
            inserter(0.5, 1.5, None),
        ];
        let layout = compose(&unit, &ComposeParams::grid(1, 1), &catalog).unwrap();
        assert_eq!(layout.entities.len(), 2);
        let numbers: Vec<_> = layout.entities.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![Some(1), Some(2)]);
        assert!(layout.is_fully_directed());
    }

    #[test]
    fn unknown_types_are_reported_once() {
        let catalog = standard_catalog();
        let unit = vec![Entity::new("mystery-box", 0.5, 0.5)];
        let layout = compose(&unit, &ComposeParams::grid(2, 2), &catalog).unwrap();
        assert_eq!(layout.entities.len(), 4);
        let unknown: Vec<_> = layout
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnknownType { .. }))
            .collect();
        assert_eq!(unknown.len(), 1);
    }

    #[test]
    fn grid_of_cells_is_wired() {
        let catalog = standard_catalog();
        let params = ComposeParams {
            spacing_x: 0.0,
            ..ComposeParams::grid(1, 3)
        };
        let layout = compose(&furnace_cell(), &params, &catalog).unwrap();
        // Poles at x = 2.5, 5.5, 8.5 on one row: two wires.
        assert_eq!(layout.wires.len(), 2);
        assert!(layout.diagnostics.unresolved_transfers().next().is_none());
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: ComposeParams =
            serde_json::from_value(json!({"rows": 2, "cols": 4, "share_x": true})).unwrap();
        assert_eq!(params.rows, 2);
        assert_eq!(params.spacing_x, 1.0);
        assert!(params.share_x);
        assert!(params.normalize);
    }
}
