//! Immutable per-type tables: footprint size, belt speed, priority and role.
//!
//! An [`EntityCatalog`] is built once and passed by reference into every
//! operation that needs type information. Types missing from the catalog
//! resolve to [`EntityKind::UNKNOWN`]: a 1x1 footprint, lowest priority, no
//! speed and no role.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::fixed::Fixed64;
use crate::geometry::{TileRect, footprint};

/// What part an entity type plays in layout operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Moves items between the tiles behind and in front of it.
    Transfer,
    /// A stationary machine a transfer entity picks up from or drops into.
    Producer,
    /// A node of the wiring graph.
    DistributionNode,
}

/// Static properties of one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityKind {
    pub width: u32,
    pub height: u32,
    /// Items per second per lane. Present only for transport types.
    pub speed: Option<Fixed64>,
    pub priority: i32,
    pub role: Option<Role>,
}

impl EntityKind {
    pub const UNKNOWN: EntityKind = EntityKind {
        width: 1,
        height: 1,
        speed: None,
        priority: i32::MIN,
        role: None,
    };

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Type tables keyed by entity type name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityCatalog {
    kinds: BTreeMap<String, EntityKind>,
}

impl EntityCatalog {
    pub fn builder() -> EntityCatalogBuilder {
        EntityCatalogBuilder::default()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Properties for `kind`, falling back to [`EntityKind::UNKNOWN`].
    pub fn kind(&self, kind: &str) -> EntityKind {
        self.kinds.get(kind).copied().unwrap_or(EntityKind::UNKNOWN)
    }

    pub fn speed(&self, kind: &str) -> Option<Fixed64> {
        self.kinds.get(kind).and_then(|k| k.speed)
    }

    pub fn priority(&self, kind: &str) -> i32 {
        self.kind(kind).priority
    }

    pub fn role(&self, kind: &str) -> Option<Role> {
        self.kinds.get(kind).and_then(|k| k.role)
    }

    pub fn is_transport(&self, kind: &str) -> bool {
        self.speed(kind).is_some()
    }

    pub fn is_transfer(&self, kind: &str) -> bool {
        self.role(kind) == Some(Role::Transfer)
    }

    pub fn is_producer(&self, kind: &str) -> bool {
        self.role(kind) == Some(Role::Producer)
    }

    pub fn is_distribution_node(&self, kind: &str) -> bool {
        self.role(kind) == Some(Role::DistributionNode)
    }

    /// Tiles covered by `entity`.
    pub fn footprint(&self, entity: &Entity) -> TileRect {
        footprint(entity.position, self.kind(&entity.kind).size(), entity.orientation)
    }

    /// Bounding rectangle of every footprint in `entities`, or `None` when
    /// the collection is empty.
    pub fn bounds<'a, I>(&self, entities: I) -> Option<TileRect>
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        entities
            .into_iter()
            .map(|e| self.footprint(e))
            .reduce(|acc, fp| acc.union(&fp))
    }

    /// Type names in `entities` that the catalog does not know, sorted and
    /// deduplicated.
    pub fn unknown_kinds<'a, I>(&self, entities: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        let mut unknown: Vec<String> = entities
            .into_iter()
            .filter(|e| !self.contains(&e.kind))
            .map(|e| e.kind.clone())
            .collect();
        unknown.sort();
        unknown.dedup();
        unknown
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Builder for [`EntityCatalog`].
#[derive(Debug, Default)]
pub struct EntityCatalogBuilder {
    kinds: BTreeMap<String, EntityKind>,
}

impl EntityCatalogBuilder {
    /// Register a type. A later registration of the same name replaces the
    /// earlier one.
    pub fn kind(mut self, name: impl Into<String>, kind: EntityKind) -> Self {
        self.kinds.insert(name.into(), kind);
        self
    }

    pub fn transport(self, name: impl Into<String>, speed: Fixed64, priority: i32) -> Self {
        self.kind(
            name,
            EntityKind {
                width: 1,
                height: 1,
                speed: Some(speed),
                priority,
                role: None,
            },
        )
    }

    pub fn with_role(
        self,
        name: impl Into<String>,
        size: (u32, u32),
        role: Role,
        priority: i32,
    ) -> Self {
        self.kind(
            name,
            EntityKind {
                width: size.0,
                height: size.1,
                speed: None,
                priority,
                role: Some(role),
            },
        )
    }

    pub fn build(self) -> EntityCatalog {
        EntityCatalog { kinds: self.kinds }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64;
    use crate::geometry::{GridPosition, Orientation};

    fn catalog() -> EntityCatalog {
        EntityCatalog::builder()
            .transport("transport-belt", f64_to_fixed64(15.0), 1)
            .with_role("stone-furnace", (2, 2), Role::Producer, 10)
            .with_role("splitter", (2, 1), Role::Transfer, 4)
            .build()
    }

    #[test]
    fn unknown_type_is_single_tile_lowest_priority() {
        let c = catalog();
        let kind = c.kind("mystery-box");
        assert_eq!(kind.size(), (1, 1));
        assert_eq!(kind.priority, i32::MIN);
        assert!(!c.is_transport("mystery-box"));
        assert_eq!(c.role("mystery-box"), None);
    }

    #[test]
    fn role_queries() {
        let c = catalog();
        assert!(c.is_transport("transport-belt"));
        assert!(c.is_producer("stone-furnace"));
        assert!(c.is_transfer("splitter"));
        assert!(!c.is_distribution_node("stone-furnace"));
    }

    #[test]
    fn footprint_uses_catalog_size_and_orientation() {
        let c = catalog();
        let furnace = Entity::new("stone-furnace", 1.0, 1.0);
        let fp = c.footprint(&furnace);
        assert_eq!(fp.min, GridPosition::new(0, 0));
        assert_eq!(fp.max, GridPosition::new(1, 1));

        let splitter = Entity::new("splitter", 0.5, 1.0).with_orientation(Orientation::East);
        let fp = c.footprint(&splitter);
        assert_eq!((fp.width(), fp.height()), (1, 2));
    }

    #[test]
    fn bounds_covers_all_footprints() {
        let c = catalog();
        let entities = [
            Entity::new("stone-furnace", 1.0, 1.0),
            Entity::new("transport-belt", 2.5, 3.5),
        ];
        let b = c.bounds(&entities).unwrap();
        assert_eq!(b.min, GridPosition::new(0, 0));
        assert_eq!(b.max, GridPosition::new(2, 3));
        assert!(c.bounds(&Vec::<Entity>::new()).is_none());
    }

    #[test]
    fn unknown_kinds_are_sorted_and_unique() {
        let c = catalog();
        let entities = [
            Entity::new("zeta", 0.5, 0.5),
            Entity::new("alpha", 1.5, 0.5),
            Entity::new("zeta", 2.5, 0.5),
            Entity::new("transport-belt", 3.5, 0.5),
        ];
        assert_eq!(c.unknown_kinds(&entities), vec!["alpha", "zeta"]);
    }
}
