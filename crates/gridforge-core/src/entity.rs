//! The entity record shared by every gridforge component.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{GridPosition, Orientation, Position, Transform};

/// One physical tile object.
///
/// Only `kind`, `position` and `orientation` carry meaning for layout
/// operations. `number` is the dense index assigned by the compositor, and
/// `extra` holds passthrough metadata (labels, icons, recipe names) that is
/// preserved untouched through every transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type", alias = "name")]
    pub kind: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "direction")]
    pub orientation: Option<Orientation>,
    #[serde(default, rename = "entity_number", skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Entity {
    pub fn new(kind: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            kind: kind.into(),
            position: Position::new(x, y).snapped(),
            orientation: None,
            number: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// The integer tile holding this entity's center.
    pub fn tile(&self) -> GridPosition {
        self.position.tile()
    }

    /// Canonical identity used for deduplication.
    pub fn dedup_key(&self) -> DedupKey {
        let (x, y) = self.position.decimal_key();
        DedupKey {
            kind: self.kind.clone(),
            x,
            y,
            orientation: self.orientation.map(Orientation::index),
        }
    }

    /// A copy of this entity with `transform` applied to both its position
    /// and its orientation, then shifted by `(dx, dy)` and snapped.
    pub fn transformed(&self, transform: &Transform, dx: f64, dy: f64) -> Entity {
        Entity {
            kind: self.kind.clone(),
            position: transform
                .apply_position(self.position)
                .translated(dx, dy)
                .snapped(),
            orientation: self.orientation.map(|o| transform.apply_orientation(o)),
            number: None,
            extra: self.extra.clone(),
        }
    }
}

/// `(type, position to one decimal, orientation or none)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    pub kind: String,
    pub x: i64,
    pub y: i64,
    pub orientation: Option<u8>,
}

/// Assign dense 1-based numbers in collection order.
pub fn renumber(entities: &mut [Entity]) {
    for (i, entity) in entities.iter_mut().enumerate() {
        entity.number = Some(i as u32 + 1);
    }
}
