//! The in-memory content store.
//!
//! Holds the single current snapshot plus its save state. Snapshots are
//! `Arc<Value>` and are swapped, never mutated, so a reader holding an old
//! snapshot is unaffected by later edits.
//!
//! # Revisions
//!
//! Every local edit bumps `revision`. `synced_revision` is the newest
//! revision known to match persisted content; the store is dirty while the
//! two differ. A save captures the revision it started from ([`SaveTicket`])
//! and on success advances `synced_revision` to it, so an edit made while
//! the save ran stays dirty.
//!
//! Deliveries from the remote store are discarded while a save is in flight
//! and while the store holds edits newer than `synced_revision`. Such a
//! delivery (typically the echo of our own save) predates those edits and
//! would clobber them.

use crate::error::{ContentError, ContentResult};
use crate::mutate::{self, ContentUpdate};
use crate::path::ContentPath;
use crate::reconcile::merge_with_defaults;
use crate::transfer::ExportFile;
use folio_model::validate_document;
use folio_types::{SectionName, Timestamp};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Snapshot of the store's save state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStatus {
    /// Unsaved local edits exist.
    pub is_dirty: bool,
    /// When content was last persisted or adopted from persistence.
    pub last_saved: Option<Timestamp>,
    pub loading: bool,
    pub saving: bool,
    /// Local edit counter.
    pub revision: u64,
}

/// Captured at the start of a save; hand it back to [`ContentStore::finish_save`].
#[derive(Debug, Clone)]
pub struct SaveTicket {
    revision: u64,
    content: Arc<Value>,
}

impl SaveTicket {
    /// The revision the save started from.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The content being saved.
    pub fn content(&self) -> &Arc<Value> {
        &self.content
    }
}

#[derive(Debug)]
struct StoreState {
    content: Arc<Value>,
    revision: u64,
    synced_revision: u64,
    last_saved: Option<Timestamp>,
    loading: bool,
    saves_in_flight: usize,
}

impl StoreState {
    fn is_dirty(&self) -> bool {
        self.revision != self.synced_revision
    }
}

/// Owns the current site content.
#[derive(Debug)]
pub struct ContentStore {
    defaults: Arc<Value>,
    state: RwLock<StoreState>,
}

impl ContentStore {
    /// Creates a store holding the bundled defaults.
    pub fn new() -> Self {
        Self::with_defaults(folio_model::default_document())
    }

    /// Creates a store whose defaults (and initial content) are `defaults`.
    pub fn with_defaults(defaults: Value) -> Self {
        let defaults = Arc::new(defaults);
        Self {
            state: RwLock::new(StoreState {
                content: Arc::clone(&defaults),
                revision: 0,
                synced_revision: 0,
                last_saved: None,
                loading: false,
                saves_in_flight: 0,
            }),
            defaults,
        }
    }

    /// The document used for reconciliation and reset.
    pub fn defaults(&self) -> &Arc<Value> {
        &self.defaults
    }

    /// The current snapshot.
    pub async fn content(&self) -> Arc<Value> {
        Arc::clone(&self.state.read().await.content)
    }

    /// One section of the current snapshot.
    pub async fn section(&self, section: SectionName) -> Option<Value> {
        self.state.read().await.content.get(section.as_str()).cloned()
    }

    /// Reads the value at a dot path.
    pub async fn get(&self, path: &str) -> ContentResult<Option<Value>> {
        let path = ContentPath::parse(path)?;
        let state = self.state.read().await;
        Ok(mutate::get(&state.content, &path).cloned())
    }

    /// Current save state.
    pub async fn status(&self) -> ContentStatus {
        let state = self.state.read().await;
        ContentStatus {
            is_dirty: state.is_dirty(),
            last_saved: state.last_saved,
            loading: state.loading,
            saving: state.saves_in_flight > 0,
            revision: state.revision,
        }
    }

    // ── Local edits ──────────────────────────────────────────────

    /// Sets one field. On error the current snapshot is unchanged.
    pub async fn update_content(&self, path: &str, value: Value) -> ContentResult<()> {
        let path = ContentPath::parse(path)?;
        let mut state = self.state.write().await;
        let next = mutate::apply(&state.content, &path, value)?;
        state.content = Arc::new(next);
        state.revision += 1;
        debug!("Updated {} (revision {})", path, state.revision);
        Ok(())
    }

    /// Applies several updates as one new snapshot.
    ///
    /// An empty list still produces a fresh (equal) snapshot but does not
    /// touch the dirty flag or the revision.
    pub async fn update_multiple(&self, updates: Vec<ContentUpdate>) -> ContentResult<()> {
        let mut state = self.state.write().await;
        let next = mutate::apply_batch(&state.content, &updates)?;
        state.content = Arc::new(next);
        if !updates.is_empty() {
            state.revision += 1;
            debug!(
                "Applied {} updates (revision {})",
                updates.len(),
                state.revision
            );
        }
        Ok(())
    }

    /// Replaces the content with the defaults and marks it dirty.
    pub async fn reset_to_defaults(&self) {
        let mut state = self.state.write().await;
        state.content = Arc::clone(&self.defaults);
        state.revision += 1;
        info!("Content reset to defaults");
    }

    /// Clears the dirty flag without a persistence event and sets `last_saved`.
    pub async fn mark_clean(&self, last_saved: Option<Timestamp>) {
        let mut state = self.state.write().await;
        state.synced_revision = state.revision;
        state.last_saved = last_saved;
    }

    // ── Persistence hooks ────────────────────────────────────────

    /// Marks a save as in flight and captures what is being saved.
    pub async fn begin_save(&self) -> SaveTicket {
        let mut state = self.state.write().await;
        state.saves_in_flight += 1;
        SaveTicket {
            revision: state.revision,
            content: Arc::clone(&state.content),
        }
    }

    /// Completes a save started with [`begin_save`](Self::begin_save).
    ///
    /// On success `last_saved` is stamped and edits up to the ticket's
    /// revision count as synced; the dirty flag clears only if no edit
    /// happened since the ticket was taken. Returns whether the store is
    /// now clean.
    pub async fn finish_save(&self, ticket: SaveTicket, succeeded: bool) -> bool {
        let mut state = self.state.write().await;
        state.saves_in_flight = state.saves_in_flight.saturating_sub(1);
        if succeeded {
            state.last_saved = Some(Timestamp::now());
            state.synced_revision = state.synced_revision.max(ticket.revision);
            if state.is_dirty() {
                debug!(
                    "Save of revision {} finished after edits (now {}), staying dirty",
                    ticket.revision, state.revision
                );
            }
        }
        !state.is_dirty()
    }

    /// Sets the loading flag.
    pub async fn set_loading(&self, loading: bool) {
        self.state.write().await.loading = loading;
    }

    /// Adopts content read from persistence as-is.
    pub async fn adopt_loaded(&self, content: Value, saved_at: Option<Timestamp>) {
        let mut state = self.state.write().await;
        state.content = Arc::new(content);
        state.revision += 1;
        state.synced_revision = state.revision;
        state.last_saved = saved_at;
    }

    /// Reconciles a remote document with the defaults and adopts it.
    pub async fn adopt_remote(&self, candidate: &Value) {
        let merged = merge_with_defaults(candidate, &self.defaults);
        self.adopt_loaded(merged, Some(Timestamp::now())).await;
    }

    /// Applies a real-time delivery from the remote store.
    ///
    /// Returns false (and leaves the store untouched) while a save is in
    /// flight or while unsaved local edits exist.
    pub async fn apply_remote(&self, candidate: &Value) -> bool {
        let merged = merge_with_defaults(candidate, &self.defaults);
        let mut state = self.state.write().await;
        if state.saves_in_flight > 0 {
            debug!("Save in flight, ignoring remote delivery");
            return false;
        }
        if state.is_dirty() {
            debug!(
                "Unsaved edits up to revision {} (synced {}), ignoring remote delivery",
                state.revision, state.synced_revision
            );
            return false;
        }
        state.content = Arc::new(merged);
        state.revision += 1;
        state.synced_revision = state.revision;
        state.last_saved = Some(Timestamp::now());
        true
    }

    // ── Export / import ──────────────────────────────────────────

    /// Serializes the current content as an export file.
    pub async fn export_data(&self) -> ContentResult<String> {
        let content = self.content().await;
        ExportFile::new((*content).clone()).to_json_pretty()
    }

    /// Replaces the content with an imported file, reconciled with the
    /// defaults. Invalid payloads, including ones whose declared fields have
    /// the wrong shape, leave the store untouched.
    pub async fn import_data(&self, json: &str) -> ContentResult<()> {
        let file = ExportFile::parse(json).inspect_err(|e| warn!("Import rejected: {e}"))?;
        let merged = merge_with_defaults(&file.content, &self.defaults);
        let violations = validate_document(&merged);
        if !violations.is_empty() {
            let reasons: Vec<String> = violations.iter().map(ToString::to_string).collect();
            let reason = reasons.join("; ");
            warn!("Import rejected: {reason}");
            return Err(ContentError::Import(reason));
        }
        let mut state = self.state.write().await;
        state.content = Arc::new(merged);
        state.revision += 1;
        info!("Imported content (revision {})", state.revision);
        Ok(())
    }
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new()
    }
}
