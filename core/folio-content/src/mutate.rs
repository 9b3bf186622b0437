//! Copy-on-write mutation of content documents.
//!
//! Every mutation clones the whole document, changes the clone and returns
//! it. The input is never touched, so holders of the previous snapshot keep
//! seeing the old value and can compare snapshots to detect a change.

use crate::error::ContentResult;
use crate::path::{ContentPath, PathError};
use folio_model::{check_touched, json_type_name};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One field update in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUpdate {
    pub path: String,
    pub value: Value,
}

impl ContentUpdate {
    pub fn new(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

/// Reads the value at `path`, if present.
pub fn get<'a>(doc: &'a Value, path: &ContentPath) -> Option<&'a Value> {
    path.segments()
        .into_iter()
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
}

/// Sets `path` to `value` inside `doc`, creating empty objects for missing
/// intermediate segments.
///
/// Fails without a usable result if an intermediate segment holds a sequence
/// or scalar, or if the write leaves a declared field with the wrong shape.
/// On failure `doc` may be partially modified; callers work on a clone.
pub fn set_in_place(doc: &mut Value, path: &ContentPath, value: Value) -> ContentResult<()> {
    let segments = path.segments();
    let (last, parents) = segments
        .split_last()
        .ok_or(PathError::Empty)?;

    let mut current = match &mut *doc {
        Value::Object(map) => map,
        other => {
            return Err(PathError::NotAnObject {
                at: "<root>".to_string(),
                found: json_type_name(other),
            }
            .into());
        }
    };

    for (depth, segment) in parents.iter().enumerate() {
        let child = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match child {
            Value::Object(map) => current = map,
            other => {
                return Err(PathError::NotAnObject {
                    at: segments[..=depth].join("."),
                    found: json_type_name(other),
                }
                .into());
            }
        }
    }
    current.insert(last.to_string(), value);

    check_touched(doc, &segments)?;
    Ok(())
}

/// Returns a new document with `path` set to `value`.
pub fn apply(doc: &Value, path: &ContentPath, value: Value) -> ContentResult<Value> {
    let mut next = doc.clone();
    set_in_place(&mut next, path, value)?;
    Ok(next)
}

/// Applies `updates` in order to one shared clone of `doc`.
///
/// Either every update applies and the new document is returned, or the
/// first failure is returned and nothing is produced.
pub fn apply_batch(doc: &Value, updates: &[ContentUpdate]) -> ContentResult<Value> {
    let mut next = doc.clone();
    for update in updates {
        let path = ContentPath::parse(&update.path)?;
        set_in_place(&mut next, &path, update.value.clone())?;
    }
    Ok(next)
}
