//! Remote document store abstraction trait.

use crate::error::SyncResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored document: a flat map of top-level fields.
pub type Record = Map<String, Value>;

/// Stream of a document's states. `Ok(None)` means the document does not
/// exist (yet, or any more).
pub type RecordStream = BoxStream<'static, SyncResult<Option<Record>>>;

/// Configuration shared by remote stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Collection holding one document per section.
    pub collection: String,
    /// How often polling stores check for changes (in seconds).
    pub poll_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection: "portfolio".to_string(),
            poll_interval_secs: 5,
        }
    }
}

/// Abstract keyed document store.
///
/// Documents live in one collection and are addressed by id. Writes replace
/// the whole document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the name of the store provider.
    fn provider_name(&self) -> &'static str;

    /// Reads a document. `None` if it does not exist.
    async fn get(&self, id: &str) -> SyncResult<Option<Record>>;

    /// Writes a document, replacing any previous content.
    async fn set(&self, id: &str, record: Record) -> SyncResult<()>;

    /// Watches a document.
    ///
    /// The stream yields the current state as soon as it is polled and then
    /// every change. Errors are delivered in-stream; the stream keeps going
    /// unless the store shuts down.
    fn watch(&self, id: &str) -> RecordStream;
}
