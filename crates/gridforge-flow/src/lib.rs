//! Flow analysis for transport networks.
//!
//! Segments the transport entities of a layout into connected components,
//! measures each component's lane capacity, classifies components as
//! supplies or drains of the producers they touch, and flags whether a
//! required throughput saturates the drain.
//!
//! # Design
//!
//! - Transport entities are those with a speed in the catalog. They are keyed
//!   by the tile containing their center.
//! - Components come from a disjoint-set union over 4-adjacent keys and are
//!   ordered by their smallest key.
//! - Rates are [`Fixed64`], so sums and minimums do not depend on the order
//!   entities arrive in. Shuffling the input never changes the report.
//! - With the `parallel` feature, components are measured on the rayon pool.
//!   The result is identical to the sequential path.

use gridforge_core::diagnostic::{Diagnostic, Diagnostics};
use gridforge_core::fixed::{Fixed64, saturating_sum};
use gridforge_core::{Entity, EntityCatalog, GridPosition, Position};
use serde::Serialize;

pub mod classify;
pub mod component;
pub mod dsu;

pub use classify::Classification;
pub use component::{Axis, Component, Lane};
pub use dsu::DisjointSet;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Per-component summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentReport {
    pub capacity: Fixed64,
    pub centroid: Position,
    pub size: usize,
    pub axis: Axis,
    pub lanes: Vec<Lane>,
}

impl From<&Component> for ComponentReport {
    fn from(c: &Component) -> Self {
        Self {
            capacity: c.capacity,
            centroid: c.centroid,
            size: c.size(),
            axis: c.axis,
            lanes: c.lanes.clone(),
        }
    }
}

/// Result of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowReport {
    pub components: Vec<ComponentReport>,
    /// Indices into `components`, ascending.
    pub supply_components: Vec<usize>,
    /// The first drain in component order.
    pub drain_component: Option<usize>,
    /// Every drain, ascending.
    pub drain_components: Vec<usize>,
    pub supplied_capacity_per_second: Fixed64,
    pub drain_capacity_per_second: Fixed64,
    pub required_throughput_per_second: Fixed64,
    /// `true` when a drain exists and the required throughput meets or
    /// exceeds its capacity.
    pub bottleneck: bool,
    pub classification: Classification,
    pub diagnostics: Diagnostics,
}

impl FlowReport {
    fn empty(required: Fixed64, diagnostics: Diagnostics) -> Self {
        Self {
            components: Vec::new(),
            supply_components: Vec::new(),
            drain_component: None,
            drain_components: Vec::new(),
            supplied_capacity_per_second: Fixed64::ZERO,
            drain_capacity_per_second: Fixed64::ZERO,
            required_throughput_per_second: required,
            bottleneck: false,
            classification: Classification::None,
            diagnostics,
        }
    }

    /// Headroom left on the drain; negative when oversubscribed.
    pub fn drain_headroom(&self) -> Fixed64 {
        self.drain_capacity_per_second
            .saturating_sub(self.required_throughput_per_second)
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Analyzes layouts against one catalog.
#[derive(Debug, Clone, Copy)]
pub struct FlowAnalyzer<'a> {
    catalog: &'a EntityCatalog,
}

impl<'a> FlowAnalyzer<'a> {
    pub fn new(catalog: &'a EntityCatalog) -> Self {
        Self { catalog }
    }

    /// Segment, measure and classify the transport network in `entities`.
    pub fn analyze(&self, entities: &[Entity], required: Fixed64) -> FlowReport {
        let mut diagnostics = Diagnostics::new();
        for kind in self.catalog.unknown_kinds(entities) {
            diagnostics.push(Diagnostic::UnknownType { kind });
        }

        let components = self.components(entities);
        if components.is_empty() {
            tracing::debug!("no transport entities");
            return FlowReport::empty(required, diagnostics);
        }

        let roles = classify::classify(entities, self.catalog, &components);
        let supplied = saturating_sum(roles.supplies.iter().map(|&i| components[i].capacity));
        let drain = roles.drains.first().copied();
        let drain_capacity = drain.map_or(Fixed64::ZERO, |i| components[i].capacity);
        let bottleneck = drain.is_some() && required >= drain_capacity;

        tracing::debug!(
            components = components.len(),
            supplies = roles.supplies.len(),
            drains = roles.drains.len(),
            method = ?roles.method,
            %drain_capacity,
            %required,
            bottleneck,
            "analyzed flow"
        );

        FlowReport {
            components: components.iter().map(ComponentReport::from).collect(),
            supply_components: roles.supplies,
            drain_component: drain,
            drain_components: roles.drains,
            supplied_capacity_per_second: supplied,
            drain_capacity_per_second: drain_capacity,
            required_throughput_per_second: required,
            bottleneck,
            classification: roles.method,
            diagnostics,
        }
    }

    /// The transport components of `entities`, ordered by smallest key.
    pub fn components(&self, entities: &[Entity]) -> Vec<Component> {
        let index = component::transport_keys(entities, self.catalog);
        let groups = component::group_keys(&index);
        let measure =
            |keys: Vec<GridPosition>| component::measure(keys, &index, entities, self.catalog);

        #[cfg(feature = "parallel")]
        let components: Vec<Component> = {
            use rayon::prelude::*;
            groups.into_par_iter().map(measure).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let components: Vec<Component> = groups.into_iter().map(measure).collect();

        components
    }
}

/// Analyze `entities` against `catalog`.
pub fn analyze_flow(entities: &[Entity], catalog: &EntityCatalog, required: Fixed64) -> FlowReport {
    FlowAnalyzer::new(catalog).analyze(entities, required)
}
