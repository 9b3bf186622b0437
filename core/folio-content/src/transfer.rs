//! JSON export/import file format.
//!
//! ```json
//! { "version": "1.0.0", "exported": "2024-05-01T12:00:00.000Z", "content": { ... } }
//! ```

use crate::error::{ContentError, ContentResult};
use folio_model::SCHEMA_VERSION;
use folio_types::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An exported content document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFile {
    pub version: String,
    /// Absent in hand-written import files; always set on export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported: Option<Timestamp>,
    pub content: Value,
}

impl ExportFile {
    /// Wraps `content` for export, stamped with the current time.
    pub fn new(content: Value) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            exported: Some(Timestamp::now()),
            content,
        }
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> ContentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates an import payload.
    ///
    /// The payload must be an object with `version` equal to the schema
    /// version and an object `content`.
    pub fn parse(json: &str) -> ContentResult<Self> {
        let raw: Value = serde_json::from_str(json)
            .map_err(|e| ContentError::Import(format!("not valid JSON: {e}")))?;

        let obj = raw
            .as_object()
            .ok_or_else(|| ContentError::Import("expected a JSON object".to_string()))?;

        match obj.get("version").and_then(Value::as_str) {
            Some(SCHEMA_VERSION) => {}
            Some(other) => {
                return Err(ContentError::Import(format!(
                    "unsupported version {other:?}, expected {SCHEMA_VERSION}"
                )));
            }
            None => return Err(ContentError::Import("missing version".to_string())),
        }

        if !obj.get("content").is_some_and(Value::is_object) {
            return Err(ContentError::Import(
                "content must be an object".to_string(),
            ));
        }

        serde_json::from_value(raw).map_err(|e| ContentError::Import(e.to_string()))
    }
}
