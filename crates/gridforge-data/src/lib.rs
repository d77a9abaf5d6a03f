//! Data-file loading for gridforge.
//!
//! A project directory holds:
//!
//! - `catalog.{ron,toml,json}` -- entity type table (required).
//! - `unit.json` -- the unit layout as raw entity records (required).
//! - `compose.{ron,toml,json}` -- grid parameters (optional, defaults).
//! - `wiring.{ron,toml,json}` -- wiring reach and port (optional, defaults).
//!
//! Each loader is also usable on its own with an explicit path.

pub mod loader;
pub mod schema;

use std::path::Path;

use gridforge_core::record::{ParsedRecords, parse_records_str};
use gridforge_core::{Diagnostics, Entity, EntityCatalog};
use gridforge_spatial::{ComposeParams, WiringConfig};

pub use loader::{DataLoadError, Format};
use loader::{check_unique, deserialize_file, deserialize_list, find_data_file, require_data_file};
use schema::{KindData, catalog_from};

/// Everything needed to compose and analyze one layout.
#[derive(Debug, Clone)]
pub struct Project {
    pub catalog: EntityCatalog,
    pub unit: Vec<Entity>,
    pub params: ComposeParams,
    pub wiring: WiringConfig,
    /// Records skipped while reading the unit.
    pub diagnostics: Diagnostics,
}

/// Load a project directory.
pub fn load_project(dir: &Path) -> Result<Project, DataLoadError> {
    let catalog = load_catalog(&require_data_file(dir, "catalog")?)?;

    let unit_path = dir.join("unit.json");
    if !unit_path.exists() {
        return Err(DataLoadError::MissingRequired {
            file: "unit.json".to_string(),
            dir: dir.to_path_buf(),
        });
    }
    let ParsedRecords {
        entities: unit,
        diagnostics,
    } = load_unit(&unit_path)?;

    let params = match find_data_file(dir, "compose")? {
        Some(path) => load_compose_params(&path)?,
        None => ComposeParams::default(),
    };
    let wiring = match find_data_file(dir, "wiring")? {
        Some(path) => deserialize_file(&path)?,
        None => WiringConfig::default(),
    };

    tracing::debug!(
        dir = %dir.display(),
        kinds = catalog.len(),
        unit = unit.len(),
        skipped = diagnostics.len(),
        "loaded project"
    );
    Ok(Project {
        catalog,
        unit,
        params,
        wiring,
        diagnostics,
    })
}

/// Load an entity catalog. TOML files list kinds under `kinds`.
pub fn load_catalog(path: &Path) -> Result<EntityCatalog, DataLoadError> {
    let kinds: Vec<KindData> = deserialize_list(path, "kinds")?;
    check_unique(kinds.iter().map(|k| k.name.as_str()), path)?;
    catalog_from(&kinds, path)
}

/// Load a unit layout from a JSON array of raw entity records.
///
/// Malformed records are skipped and reported; an orientation outside
/// `0..=3` fails the whole file.
pub fn load_unit(path: &Path) -> Result<ParsedRecords, DataLoadError> {
    if loader::detect_format(path)? != Format::Json {
        return Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_records_str(&content).map_err(|source| DataLoadError::Record {
        file: path.to_path_buf(),
        source,
    })
}

/// Load composition parameters. Missing fields take their defaults.
pub fn load_compose_params(path: &Path) -> Result<ComposeParams, DataLoadError> {
    let params: ComposeParams = deserialize_file(path)?;
    // Validate the rotation here so a bad file is reported against its path.
    params
        .base_transform()
        .map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    Ok(params)
}
