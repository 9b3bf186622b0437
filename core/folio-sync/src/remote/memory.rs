//! In-process document store.
//!
//! Every document is a `tokio::sync::watch` channel, so watchers see the
//! latest state without polling. Used by tests and by the server when no
//! remote project is configured. Failure injection and a write gate let
//! tests exercise partial saves and in-flight saves.

use super::storage::{DocumentStore, Record, RecordStream};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::debug;

/// In-memory document store with change notification.
pub struct MemoryDocumentStore {
    docs: Mutex<HashMap<String, watch::Sender<Option<Record>>>>,
    failing_writes: Mutex<HashSet<String>>,
    failing_reads: Mutex<HashSet<String>>,
    /// `true` while writes are held back.
    write_gate: watch::Sender<bool>,
    writes: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            docs: Mutex::new(HashMap::new()),
            failing_writes: Mutex::new(HashSet::new()),
            failing_reads: Mutex::new(HashSet::new()),
            write_gate: watch::channel(false).0,
            writes: AtomicUsize::new(0),
        }
    }

    fn sender(&self, id: &str) -> watch::Sender<Option<Record>> {
        lock(&self.docs)
            .entry(id.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .clone()
    }

    /// Deletes a document, notifying watchers.
    pub fn remove(&self, id: &str) {
        self.sender(id).send_replace(None);
    }

    /// Ids of documents that currently exist, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.docs)
            .iter()
            .filter(|(_, tx)| tx.borrow().is_some())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every write to `id` fail until [`clear_failures`](Self::clear_failures).
    pub fn fail_writes(&self, id: &str) {
        lock(&self.failing_writes).insert(id.to_string());
    }

    /// Makes every read of `id` fail until [`clear_failures`](Self::clear_failures).
    pub fn fail_reads(&self, id: &str) {
        lock(&self.failing_reads).insert(id.to_string());
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        lock(&self.failing_writes).clear();
        lock(&self.failing_reads).clear();
    }

    /// Holds every write until [`resume_writes`](Self::resume_writes).
    pub fn pause_writes(&self) {
        self.write_gate.send_replace(true);
    }

    /// Releases held writes.
    pub fn resume_writes(&self) {
        self.write_gate.send_replace(false);
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn provider_name(&self) -> &'static str {
        "Memory"
    }

    async fn get(&self, id: &str) -> SyncResult<Option<Record>> {
        if lock(&self.failing_reads).contains(id) {
            return Err(SyncError::Store(format!("read of {id} failed")));
        }
        Ok(self.sender(id).borrow().clone())
    }

    async fn set(&self, id: &str, record: Record) -> SyncResult<()> {
        let mut gate = self.write_gate.subscribe();
        gate.wait_for(|paused| !*paused)
            .await
            .map(drop)
            .map_err(|_| SyncError::Store("store closed".to_string()))?;

        if lock(&self.failing_writes).contains(id) {
            return Err(SyncError::Store(format!("write of {id} failed")));
        }
        self.sender(id).send_replace(Some(record));
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!("Memory store wrote {id}");
        Ok(())
    }

    fn watch(&self, id: &str) -> RecordStream {
        let rx = self.sender(id).subscribe();
        stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let current = rx.borrow_and_update().clone();
            Some((Ok(current), (rx, false)))
        })
        .boxed()
    }
}
