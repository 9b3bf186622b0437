//! Section record layout.
//!
//! Each section is stored as its own document: the section's fields plus
//! three metadata fields. Sequence sections have no fields of their own, so
//! their elements are stored under their stringified indices.

use crate::error::{SyncError, SyncResult};
use crate::normalize::normalize_section;
use crate::remote::Record;
use folio_model::{json_type_name, SCHEMA_VERSION};
use folio_types::{SectionName, Timestamp};
use serde_json::{Map, Value};

/// Last write time, RFC 3339.
pub const LAST_MODIFIED: &str = "lastModified";
/// Schema version of the writer.
pub const VERSION: &str = "version";
/// The section the record holds.
pub const SECTION_NAME: &str = "sectionName";

/// Metadata fields added on write and stripped on read.
pub const METADATA_FIELDS: [&str; 3] = [LAST_MODIFIED, VERSION, SECTION_NAME];

/// Builds the record stored for `section`.
pub fn encode_section(
    section: SectionName,
    payload: &Value,
    modified: Timestamp,
) -> SyncResult<Record> {
    let mut record = match payload {
        Value::Array(items) if section.is_sequence() => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect::<Map<_, _>>(),
        Value::Object(fields) => fields.clone(),
        other => {
            return Err(SyncError::InvalidRecord(format!(
                "section {section} cannot be stored from a {}",
                json_type_name(other)
            )));
        }
    };

    for key in METADATA_FIELDS {
        if record.contains_key(key) {
            return Err(SyncError::InvalidRecord(format!(
                "section {section} uses reserved field {key}"
            )));
        }
    }
    record.insert(
        LAST_MODIFIED.to_string(),
        Value::String(modified.to_iso8601()),
    );
    record.insert(VERSION.to_string(), Value::String(SCHEMA_VERSION.to_string()));
    record.insert(
        SECTION_NAME.to_string(),
        Value::String(section.as_str().to_string()),
    );
    Ok(record)
}

/// Recovers a section payload from its record: metadata stripped, declared
/// sequences normalized.
pub fn decode_section(section: SectionName, mut record: Record) -> Value {
    for key in METADATA_FIELDS {
        record.remove(key);
    }
    // An empty sequence leaves a record with no element fields.
    if section.is_sequence() && record.is_empty() {
        return Value::Array(Vec::new());
    }
    normalize_section(section, Value::Object(record))
}

/// Per-section metadata as stored.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionMetadata {
    pub section: SectionName,
    pub exists: bool,
    pub last_modified: Option<Timestamp>,
    pub version: Option<String>,
}

impl SectionMetadata {
    /// Reads metadata from a record, or marks the section absent.
    pub fn from_record(section: SectionName, record: Option<&Record>) -> Self {
        match record {
            Some(record) => Self {
                section,
                exists: true,
                last_modified: record
                    .get(LAST_MODIFIED)
                    .and_then(Value::as_str)
                    .and_then(|s| Timestamp::parse(s).ok()),
                version: record
                    .get(VERSION)
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            None => Self {
                section,
                exists: false,
                last_modified: None,
                version: None,
            },
        }
    }
}
