//! Section-sharded persistence.
//!
//! The content document is stored as one record per top-level section.
//! Saves fan out, loads fan in, and a subscription reassembles the document
//! from per-section watchers.

use crate::error::{SyncError, SyncResult};
use crate::record::{decode_section, encode_section, SectionMetadata};
use crate::remote::DocumentStore;
use folio_types::{SectionName, Timestamp};
use futures::future::join_all;
use futures::stream::{select_all, StreamExt};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Deliveries a [`Subscription`] buffers before the aggregator waits for
/// the consumer to catch up.
pub const SUBSCRIPTION_BUFFER: usize = 16;

/// A section write that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionFailure {
    pub section: SectionName,
    pub error: String,
}

/// Outcome of a full save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub saved: Vec<SectionName>,
    pub failed: Vec<SectionFailure>,
}

impl SaveReport {
    /// True if every section write succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for SaveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} sections failed",
            self.failed.len(),
            self.failed.len() + self.saved.len()
        )?;
        for (i, failure) in self.failed.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{sep}{} ({})", failure.section, failure.error)?;
        }
        Ok(())
    }
}

/// Reads and writes the content document one section record at a time.
#[derive(Clone)]
pub struct SectionedService {
    store: Arc<dyn DocumentStore>,
}

impl SectionedService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Name of the underlying store provider.
    pub fn provider_name(&self) -> &'static str {
        self.store.provider_name()
    }

    /// Writes one section.
    pub async fn save_section(&self, section: SectionName, payload: &Value) -> SyncResult<()> {
        let record = encode_section(section, payload, Timestamp::now())?;
        self.store.set(section.as_str(), record).await
    }

    /// Reads one section, metadata stripped and sequences normalized.
    pub async fn load_section(&self, section: SectionName) -> SyncResult<Option<Value>> {
        Ok(self
            .store
            .get(section.as_str())
            .await?
            .map(|record| decode_section(section, record)))
    }

    /// Writes every section present in `content`, concurrently.
    ///
    /// Succeeds only if every write succeeds. On partial failure the
    /// successful writes stay in place and the report comes back in
    /// [`SyncError::PartialSave`].
    pub async fn save_all(&self, content: &Value) -> SyncResult<SaveReport> {
        let doc = content.as_object().ok_or_else(|| {
            SyncError::InvalidRecord("content document must be an object".to_string())
        })?;
        for key in doc.keys() {
            if SectionName::from_key(key).is_none() {
                debug!("Skipping unknown top-level key {key}");
            }
        }

        let modified = Timestamp::now();
        let writes = SectionName::ALL
            .into_iter()
            .filter_map(|section| doc.get(section.as_str()).map(|payload| (section, payload)))
            .map(|(section, payload)| async move {
                let result = match encode_section(section, payload, modified) {
                    Ok(record) => self.store.set(section.as_str(), record).await,
                    Err(e) => Err(e),
                };
                (section, result)
            });

        let mut report = SaveReport::default();
        for (section, result) in join_all(writes).await {
            match result {
                Ok(()) => report.saved.push(section),
                Err(e) => {
                    warn!("Failed to save section {}: {}", section, e);
                    report.failed.push(SectionFailure {
                        section,
                        error: e.to_string(),
                    });
                }
            }
        }

        if report.is_complete() {
            info!(
                "Saved {} sections to {}",
                report.saved.len(),
                self.provider_name()
            );
            Ok(report)
        } else {
            Err(SyncError::PartialSave(report))
        }
    }

    /// Reads every section concurrently and reassembles the document.
    ///
    /// Sections without a record are omitted. Returns `None` when no section
    /// has a record at all.
    pub async fn load_all(&self) -> SyncResult<Option<Value>> {
        let reads = SectionName::ALL
            .into_iter()
            .map(|section| async move { (section, self.load_section(section).await) });

        let mut doc = Map::new();
        for (section, result) in join_all(reads).await {
            if let Some(payload) = result? {
                doc.insert(section.as_str().to_string(), payload);
            }
        }

        if doc.is_empty() {
            info!("No content found in {}", self.provider_name());
            return Ok(None);
        }
        debug!("Loaded {} sections", doc.len());
        Ok(Some(Value::Object(doc)))
    }

    /// Existence, last write time and version of every section.
    pub async fn sections_metadata(&self) -> SyncResult<Vec<SectionMetadata>> {
        let reads = SectionName::ALL.into_iter().map(|section| async move {
            let record = self.store.get(section.as_str()).await?;
            Ok::<_, SyncError>(SectionMetadata::from_record(section, record.as_ref()))
        });
        join_all(reads).await.into_iter().collect()
    }

    /// True if at least one section record exists.
    pub async fn content_exists(&self) -> SyncResult<bool> {
        Ok(self
            .sections_metadata()
            .await?
            .iter()
            .any(|m| m.exists))
    }

    /// Watches every section and delivers the reassembled document after
    /// each section change.
    ///
    /// Each delivery is the merge of the latest payload of every section
    /// seen so far, or `None` while no section has data. Deliveries from
    /// different sections are not coordinated, so a delivery may mix old and
    /// new sections. At most [`SUBSCRIPTION_BUFFER`] deliveries are queued;
    /// past that the watchers are not polled until the consumer reads. Must
    /// be called from within a Tokio runtime.
    pub fn subscribe_all(&self) -> Subscription {
        let streams = SectionName::ALL.into_iter().map(|section| {
            self.store
                .watch(section.as_str())
                .map(move |result| (section, result))
                .boxed()
        });
        let mut merged = select_all(streams);
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);

        let task = tokio::spawn(async move {
            let mut latest: BTreeMap<SectionName, Value> = BTreeMap::new();
            while let Some((section, result)) = merged.next().await {
                match result {
                    Ok(Some(record)) => {
                        latest.insert(section, decode_section(section, record));
                    }
                    Ok(None) => {
                        latest.remove(&section);
                    }
                    Err(SyncError::Cancelled) => continue,
                    Err(e) => {
                        warn!("Listener for {} failed: {}", section, e);
                        latest.remove(&section);
                    }
                }
                if tx.send(assemble(&latest)).await.is_err() {
                    break;
                }
            }
            debug!("Section subscription ended");
        });

        Subscription {
            rx,
            task: Some(task),
        }
    }
}

fn assemble(latest: &BTreeMap<SectionName, Value>) -> Option<Value> {
    if latest.is_empty() {
        return None;
    }
    Some(Value::Object(
        latest
            .iter()
            .map(|(section, payload)| (section.as_str().to_string(), payload.clone()))
            .collect(),
    ))
}

/// Handle to a running [`SectionedService::subscribe_all`].
///
/// Dropping the handle detaches every section listener.
pub struct Subscription {
    rx: mpsc::Receiver<Option<Value>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Waits for the next delivery. The outer `None` means the subscription
    /// has ended; the inner `None` means no section currently has data.
    pub async fn next(&mut self) -> Option<Option<Value>> {
        self.rx.recv().await
    }

    /// Number of deliveries waiting to be read.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Detaches every section listener. Calling it again does nothing.
    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.rx.close();
            debug!("Unsubscribed from all sections");
        }
    }

    /// True until [`unsubscribe`](Self::unsubscribe) is called.
    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
