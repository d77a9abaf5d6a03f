//! Non-fatal findings reported alongside a result.
//!
//! A diagnostic never aborts the call that produced it. Each one is logged
//! through `tracing` when recorded, and returned to the caller so that an
//! incomplete layout can be detected programmatically.

use serde::Serialize;

use crate::geometry::{GridPosition, Position};

/// A non-fatal finding.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "diagnostic", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A raw record was skipped because it could not be read as an entity.
    #[error("skipped malformed entity ({reason}): {raw}")]
    MalformedEntity { raw: String, reason: String },

    /// A type name absent from the catalog. Treated as a 1x1 footprint with
    /// the lowest priority and no speed.
    #[error("unknown entity type '{kind}'")]
    UnknownType { kind: String },

    /// A transfer entity without orientation had no adjacent producer.
    #[error("transfer entity '{kind}' at ({}, {}) has no adjacent producer", .position.x, .position.y)]
    UnresolvedTransfer {
        index: usize,
        kind: String,
        position: Position,
    },

    /// Two or more distinct entities cover the same tile.
    #[error("tile ({}, {}) is covered by {} entities", .tile.x, .tile.y, .entities.len())]
    TileConflict {
        tile: GridPosition,
        /// The entity that owns the tile by catalog priority.
        owner: usize,
        entities: Vec<usize>,
    },
}

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and emit it as a warning.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(%diagnostic, "layout diagnostic");
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn unresolved_transfers(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnresolvedTransfer { .. }))
    }
}
