//! Serde data file structs for catalog definitions.
//!
//! These define the on-disk shape of entity type tables. They are read from
//! RON, JSON, or TOML and converted into an [`EntityCatalog`] by the loader.

use std::path::Path;

use gridforge_core::fixed::checked_f64_to_fixed64;
use gridforge_core::{EntityCatalog, EntityKind, Role};
use serde::Deserialize;

use crate::loader::DataLoadError;

/// One entity type in a catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct KindData {
    pub name: String,
    #[serde(default = "one")]
    pub width: u32,
    #[serde(default = "one")]
    pub height: u32,
    /// Items per second per lane; marks the type as transport.
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub role: Option<Role>,
}

fn one() -> u32 {
    1
}

impl KindData {
    /// Convert to catalog properties. `file` is only used for error context.
    pub fn to_kind(&self, file: &Path) -> Result<EntityKind, DataLoadError> {
        let speed = match self.speed {
            Some(v) => Some(checked_f64_to_fixed64(v).ok_or_else(|| DataLoadError::Parse {
                file: file.to_path_buf(),
                detail: format!("speed {v} of '{}' is not a representable number", self.name),
            })?),
            None => None,
        };
        Ok(EntityKind {
            width: self.width.max(1),
            height: self.height.max(1),
            speed,
            priority: self.priority,
            role: self.role,
        })
    }
}

/// Build a catalog from kind entries read from `file`.
pub fn catalog_from(kinds: &[KindData], file: &Path) -> Result<EntityCatalog, DataLoadError> {
    let mut builder = EntityCatalog::builder();
    for k in kinds {
        builder = builder.kind(k.name.clone(), k.to_kind(file)?);
    }
    Ok(builder.build())
}
