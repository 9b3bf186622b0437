//! Cloud Firestore storage implementation.
//!
//! Uses the Firestore REST API v1. Documents are read with `GET`, written
//! with `PATCH` (no update mask, so the whole document is replaced), and
//! watched by polling `updateTime`.

use super::storage::{DocumentStore, Record, RecordStream, StoreConfig};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Firestore specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    /// Google Cloud project id.
    pub project_id: String,
    /// Database id, usually `(default)`.
    pub database: String,
    /// Base store config.
    #[serde(flatten)]
    pub base: StoreConfig,
    /// Base URL for the Firestore API (e.g. `https://firestore.googleapis.com`).
    pub api_base_url: String,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            database: "(default)".to_string(),
            base: StoreConfig::default(),
            api_base_url: "https://firestore.googleapis.com".to_string(),
        }
    }
}

/// Firestore REST API response structures.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirestoreDocument {
    #[serde(default)]
    fields: Map<String, Value>,
    update_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// A fetched document with its server-side change marker.
struct Fetched {
    record: Record,
    update_time: Option<String>,
}

struct Inner {
    config: FirestoreConfig,
    client: Client,
    id_token: RwLock<Option<String>>,
}

/// Firestore storage implementation.
#[derive(Clone)]
pub struct FirestoreStore {
    inner: Arc<Inner>,
}

impl FirestoreStore {
    /// Creates a new Firestore store.
    pub fn new(config: FirestoreConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SyncError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                client,
                id_token: RwLock::new(None),
            }),
        })
    }

    /// Sets (or clears) the Firebase ID token sent as a bearer token.
    pub async fn set_id_token(&self, token: Option<String>) {
        *self.inner.id_token.write().await = token;
    }

    /// Returns whether an ID token is set.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.id_token.read().await.is_some()
    }

    /// The store configuration.
    pub fn config(&self) -> &FirestoreConfig {
        &self.inner.config
    }
}

impl Inner {
    /// `database` is sent verbatim: the default id `(default)` is literal.
    fn document_url(&self, id: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents/{}/{}",
            self.config.api_base_url,
            urlencoding::encode(&self.config.project_id),
            self.config.database,
            urlencoding::encode(&self.config.base.collection),
            urlencoding::encode(id)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch(&self, id: &str) -> SyncResult<Option<Fetched>> {
        let token = self.id_token.read().await.clone();
        let response = self
            .authorize(self.client.get(self.document_url(id)), token.as_deref())
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("get {id} failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, "get").await?;

        let doc: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| SyncError::Network(format!("parse get response failed: {e}")))?;

        Ok(Some(Fetched {
            record: decode_fields(doc.fields)?,
            update_time: doc.update_time,
        }))
    }

    async fn write(&self, id: &str, record: Record) -> SyncResult<()> {
        let token = self.id_token.read().await.clone();
        let body = json!({ "fields": encode_fields(record) });

        debug!("Writing Firestore document: {}", id);

        let response = self
            .authorize(self.client.patch(self.document_url(id)), token.as_deref())
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("set {id} failed: {e}")))?;

        check_status(response, "set").await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response, op: &str) -> SyncResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&text)
        .map(|e| e.error.message)
        .unwrap_or(text);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(SyncError::Auth(format!("{op} failed: {message}")))
        }
        _ => Err(SyncError::Store(format!("{op} failed ({status}): {message}"))),
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn provider_name(&self) -> &'static str {
        "Firestore"
    }

    async fn get(&self, id: &str) -> SyncResult<Option<Record>> {
        Ok(self.inner.fetch(id).await?.map(|f| f.record))
    }

    async fn set(&self, id: &str, record: Record) -> SyncResult<()> {
        self.inner.write(id, record).await
    }

    fn watch(&self, id: &str) -> RecordStream {
        struct Poll {
            inner: Arc<Inner>,
            id: String,
            first: bool,
            exists: bool,
            last_update: Option<String>,
        }

        let interval = Duration::from_secs(self.inner.config.base.poll_interval_secs.max(1));
        let state = Poll {
            inner: Arc::clone(&self.inner),
            id: id.to_string(),
            first: true,
            exists: false,
            last_update: None,
        };

        stream::unfold(state, move |mut state| async move {
            loop {
                let first = std::mem::replace(&mut state.first, false);
                if !first {
                    tokio::time::sleep(interval).await;
                }
                match state.inner.fetch(&state.id).await {
                    Ok(Some(fetched)) => {
                        let changed = !state.exists
                            || fetched.update_time.is_none()
                            || fetched.update_time != state.last_update;
                        if first || changed {
                            state.exists = true;
                            state.last_update = fetched.update_time;
                            return Some((Ok(Some(fetched.record)), state));
                        }
                    }
                    Ok(None) => {
                        if first || state.exists {
                            state.exists = false;
                            state.last_update = None;
                            return Some((Ok(None), state));
                        }
                    }
                    Err(e) => {
                        warn!("Polling {} failed: {}", state.id, e);
                        return Some((Err(e), state));
                    }
                }
            }
        })
        .boxed()
    }
}

// ── Typed value codec ────────────────────────────────────────────

/// Encodes a plain JSON value as a Firestore typed value.
pub fn encode_value(value: Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            if items.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                let values: Vec<Value> = items.into_iter().map(encode_value).collect();
                json!({ "arrayValue": { "values": values } })
            }
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encodes every field of a record.
pub fn encode_fields(record: Record) -> Map<String, Value> {
    record
        .into_iter()
        .map(|(k, v)| (k, encode_value(v)))
        .collect()
}

/// Decodes a Firestore typed value into plain JSON.
pub fn decode_value(value: Value) -> SyncResult<Value> {
    let Value::Object(mut typed) = value else {
        return Err(SyncError::InvalidRecord(
            "typed value must be an object".to_string(),
        ));
    };
    let Some((kind, inner)) = typed.iter_mut().next().map(|(k, v)| (k.clone(), v.take())) else {
        return Err(SyncError::InvalidRecord("empty typed value".to_string()));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => match inner {
            Value::Bool(_) => Ok(inner),
            other => Err(invalid(&kind, &other)),
        },
        "integerValue" => match inner {
            Value::String(ref s) => s
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid(&kind, &inner)),
            Value::Number(_) => Ok(inner),
            ref other => Err(invalid(&kind, other)),
        },
        "doubleValue" => match inner {
            Value::Number(_) => Ok(inner),
            // NaN and infinities arrive as strings and have no JSON form.
            Value::String(ref s) => Ok(s
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number)),
            ref other => Err(invalid(&kind, other)),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => match inner {
            Value::String(_) => Ok(inner),
            other => Err(invalid(&kind, &other)),
        },
        "geoPointValue" => Ok(inner),
        "arrayValue" => {
            let values = match inner {
                Value::Object(mut array) => match array.remove("values") {
                    Some(Value::Array(values)) => values,
                    None => Vec::new(),
                    Some(other) => return Err(invalid(&kind, &other)),
                },
                other => return Err(invalid(&kind, &other)),
            };
            values
                .into_iter()
                .map(decode_value)
                .collect::<SyncResult<Vec<_>>>()
                .map(Value::Array)
        }
        "mapValue" => {
            let fields = match inner {
                Value::Object(mut map) => match map.remove("fields") {
                    Some(Value::Object(fields)) => fields,
                    None => Map::new(),
                    Some(other) => return Err(invalid(&kind, &other)),
                },
                other => return Err(invalid(&kind, &other)),
            };
            decode_fields(fields).map(Value::Object)
        }
        other => Err(SyncError::InvalidRecord(format!(
            "unsupported value type {other}"
        ))),
    }
}

/// Decodes every field of a Firestore document.
pub fn decode_fields(fields: Map<String, Value>) -> SyncResult<Record> {
    fields
        .into_iter()
        .map(|(k, v)| decode_value(v).map(|v| (k, v)))
        .collect()
}

fn invalid(kind: &str, value: &Value) -> SyncError {
    SyncError::InvalidRecord(format!("malformed {kind}: {value}"))
}
