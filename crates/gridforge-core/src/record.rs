//! Conversion between raw JSON entity records and [`Entity`] values.
//!
//! A record collection arrives from an external codec as a JSON array of
//! objects. Records that cannot be read as entities are skipped with a
//! [`Diagnostic::MalformedEntity`]; the batch continues. An orientation
//! value outside `0..=3` is the one fatal record error, because no
//! orientation can stand in for it.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::entity::Entity;
use crate::geometry::{GeometryError, Orientation, Position};

/// Fatal errors while reading a record collection.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record collection must be a JSON array")]
    NotAnArray,
    #[error("record {index}: {source}")]
    InvalidOrientation {
        index: usize,
        #[source]
        source: GeometryError,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Entities read from a record collection, plus the records that were
/// skipped.
#[derive(Debug, Clone, Default)]
pub struct ParsedRecords {
    pub entities: Vec<Entity>,
    pub diagnostics: Diagnostics,
}

const TYPE_KEYS: [&str; 2] = ["type", "name"];
const ORIENTATION_KEYS: [&str; 2] = ["orientation", "direction"];
const NUMBER_KEY: &str = "entity_number";

/// Parse a JSON text holding an array of entity records.
pub fn parse_records_str(text: &str) -> Result<ParsedRecords, RecordError> {
    let value: Value = serde_json::from_str(text)?;
    parse_records(&value)
}

/// Parse an array of entity records.
pub fn parse_records(value: &Value) -> Result<ParsedRecords, RecordError> {
    let records = value.as_array().ok_or(RecordError::NotAnArray)?;
    let mut parsed = ParsedRecords::default();

    for (index, record) in records.iter().enumerate() {
        match parse_record(record) {
            Ok(entity) => parsed.entities.push(entity),
            Err(Skip::Malformed(reason)) => parsed.diagnostics.push(Diagnostic::MalformedEntity {
                raw: record.to_string(),
                reason,
            }),
            Err(Skip::Fatal(source)) => {
                return Err(RecordError::InvalidOrientation { index, source });
            }
        }
    }

    tracing::debug!(
        read = parsed.entities.len(),
        skipped = parsed.diagnostics.len(),
        "parsed entity records"
    );
    Ok(parsed)
}

enum Skip {
    Malformed(String),
    Fatal(GeometryError),
}

fn parse_record(record: &Value) -> Result<Entity, Skip> {
    let object = record
        .as_object()
        .ok_or_else(|| Skip::Malformed("record is not an object".into()))?;

    let kind = TYPE_KEYS
        .iter()
        .find_map(|k| object.get(*k).and_then(Value::as_str))
        .ok_or_else(|| Skip::Malformed("missing type".into()))?
        .to_string();

    let position = object
        .get("position")
        .ok_or_else(|| Skip::Malformed("missing position".into()))?;
    let x = coordinate(position, "x")?;
    let y = coordinate(position, "y")?;

    let orientation = match ORIENTATION_KEYS.iter().find_map(|k| object.get(*k)) {
        None | Some(Value::Null) => None,
        Some(raw) => {
            let value = raw
                .as_i64()
                .ok_or_else(|| Skip::Malformed(format!("non-integer orientation {raw}")))?;
            Some(Orientation::from_index(value).map_err(Skip::Fatal)?)
        }
    };

    let number = object
        .get(NUMBER_KEY)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok());

    let extra: BTreeMap<String, Value> = object
        .iter()
        .filter(|(k, _)| {
            k.as_str() != "position"
                && k.as_str() != NUMBER_KEY
                && !TYPE_KEYS.contains(&k.as_str())
                && !ORIENTATION_KEYS.contains(&k.as_str())
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(Entity {
        kind,
        position: Position::new(x, y).snapped(),
        orientation,
        number,
        extra,
    })
}

fn coordinate(position: &Value, axis: &str) -> Result<f64, Skip> {
    position
        .get(axis)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .ok_or_else(|| Skip::Malformed(format!("missing or non-numeric position.{axis}")))
}

/// Write entities back as raw records. Extension keys are emitted as they
/// were read.
pub fn to_records(entities: &[Entity]) -> Value {
    Value::Array(entities.iter().map(to_record).collect())
}

fn to_record(entity: &Entity) -> Value {
    let mut object = Map::new();
    if let Some(number) = entity.number {
        object.insert(NUMBER_KEY.into(), Value::from(number));
    }
    object.insert("type".into(), Value::from(entity.kind.clone()));
    let mut position = Map::new();
    position.insert("x".into(), Value::from(entity.position.x));
    position.insert("y".into(), Value::from(entity.position.y));
    object.insert("position".into(), Value::Object(position));
    if let Some(o) = entity.orientation {
        object.insert("orientation".into(), Value::from(o.index()));
    }
    for (k, v) in &entity.extra {
        object.insert(k.clone(), v.clone());
    }
    Value::Object(object)
}
