//! Spatial composition for tile layouts.
//!
//! Replicates a unit layout across a grid under rotation and reflection,
//! removes coincident tiles, repairs transfer-entity directions, and wires
//! distribution nodes into a sparse axis-aligned graph.
//!
//! # Data flow
//!
//! ```text
//! unit entities -> compose -> dedup -> repair_directions -> renumber
//!               -> synthesize_wires -> Layout
//! ```

use gridforge_core::{Diagnostics, Entity};
use serde::Serialize;

pub mod compose;
pub mod conflict;
pub mod connector;
pub mod transform;

pub use compose::{ComposeError, ComposeParams, Compositor, compose};
pub use connector::{
    WireConnection, WiringConfig, infer_directions, repair_directions, synthesize_wires,
    unresolved_transfers,
};
pub use transform::transform_layout;

/// A composed layout ready for the codec.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Layout {
    /// Deduplicated entities numbered `1..=n` in order.
    pub entities: Vec<Entity>,
    /// Wires between distribution nodes, sorted by endpoint numbers.
    pub wires: Vec<WireConnection>,
    pub diagnostics: Diagnostics,
}

impl Layout {
    /// Wires as `[nodeA, portA, nodeB, portB]` tuples.
    pub fn wire_tuples(&self) -> Vec<[u32; 4]> {
        self.wires.iter().map(WireConnection::as_tuple).collect()
    }

    /// `true` when every transfer entity received an orientation.
    pub fn is_fully_directed(&self) -> bool {
        self.diagnostics.unresolved_transfers().next().is_none()
    }
}
