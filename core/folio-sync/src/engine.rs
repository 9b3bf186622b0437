//! Content engine: the content store wired to its persistence.
//!
//! The engine is what hosts talk to. It owns no content itself; it moves
//! snapshots between the [`ContentStore`], the section-sharded remote store
//! and the local cache. Persistence failures stop here: they are logged and
//! reported as `false`, never raised to the caller.

use crate::sectioned::SectionedService;
use folio_content::{merge_with_defaults, ContentResult, ContentStore};
use folio_storage::{LocalSnapshot, LocalStore, CONTENT_KEY};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Configuration for the content engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Key of the content snapshot in the local cache.
    pub local_storage_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            local_storage_key: CONTENT_KEY.to_string(),
        }
    }
}

/// The signed-in user, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub is_admin: bool,
}

impl Identity {
    pub fn admin(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            is_admin: true,
        }
    }

    pub fn viewer(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            is_admin: false,
        }
    }
}

/// Coordinates the content store with remote and local persistence.
pub struct ContentEngine {
    config: EngineConfig,
    store: Arc<ContentStore>,
    remote: SectionedService,
    local: Option<LocalStore>,
    identity: RwLock<Option<Identity>>,
    live: Mutex<Option<JoinHandle<()>>>,
}

impl ContentEngine {
    /// Creates an engine. Without a local store the local cache operations
    /// report failure.
    pub fn new(
        store: Arc<ContentStore>,
        remote: SectionedService,
        local: Option<LocalStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            config,
            store,
            remote,
            local,
            identity: RwLock::new(None),
            live: Mutex::new(None),
        }
    }

    /// The content store.
    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    /// The remote section service.
    pub fn remote(&self) -> &SectionedService {
        &self.remote
    }

    pub async fn set_identity(&self, identity: Option<Identity>) {
        *self.identity.write().await = identity;
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.identity.read().await.clone()
    }

    /// True if the current identity may write to the remote store.
    pub async fn is_admin(&self) -> bool {
        self.identity
            .read()
            .await
            .as_ref()
            .is_some_and(|i| i.is_admin)
    }

    // ── Startup ──────────────────────────────────────────────────

    /// Loads the initial content.
    ///
    /// With an admin identity the remote store is authoritative; if it holds
    /// no content yet it is seeded from the local cache, or from the defaults
    /// when nothing is cached. Without one the local cache is used. Returns
    /// whether content was loaded or seeded.
    pub async fn initialize(&self) -> bool {
        self.store.set_loading(true).await;
        let loaded = if self.is_admin().await {
            match self.remote.load_all().await {
                Ok(Some(doc)) => {
                    self.store.adopt_remote(&doc).await;
                    info!("Loaded content from {}", self.remote.provider_name());
                    true
                }
                Ok(None) => {
                    if self.load_from_local().await {
                        info!("Remote store is empty, seeding it from the local cache");
                    } else {
                        info!("Remote store is empty, seeding defaults");
                        self.store.reset_to_defaults().await;
                    }
                    self.save_to_remote().await
                }
                Err(e) => {
                    error!("Failed to load content: {}", e);
                    self.load_from_local().await
                }
            }
        } else {
            self.load_from_local().await
        };
        self.store.set_loading(false).await;
        loaded
    }

    // ── Remote ───────────────────────────────────────────────────

    /// Persists the current content to the remote store.
    ///
    /// The dirty flag clears only if nothing was edited while the save ran.
    pub async fn save_to_remote(&self) -> bool {
        if !self.is_admin().await {
            warn!("Refusing to save content: no admin identity");
            return false;
        }

        let ticket = self.store.begin_save().await;
        let result = self.remote.save_all(ticket.content()).await;
        let succeeded = match &result {
            Ok(report) => {
                debug!("Saved sections {:?}", report.saved);
                true
            }
            Err(e) => {
                error!("Failed to save content: {}", e);
                false
            }
        };
        self.store.finish_save(ticket, succeeded).await;
        succeeded
    }

    /// Replaces local content with the remote document, reconciled with the
    /// defaults. Returns false if there is no remote content or the load
    /// failed.
    pub async fn load_from_remote(&self) -> bool {
        if !self.is_admin().await {
            warn!("Refusing to load remote content: no admin identity");
            return false;
        }

        self.store.set_loading(true).await;
        let loaded = match self.remote.load_all().await {
            Ok(Some(doc)) => {
                self.store.adopt_remote(&doc).await;
                true
            }
            Ok(None) => false,
            Err(e) => {
                error!("Failed to load content: {}", e);
                false
            }
        };
        self.store.set_loading(false).await;
        loaded
    }

    /// Replaces the content with the defaults.
    ///
    /// With an admin identity the defaults are also written to the remote
    /// store and the result reflects that write. Otherwise the reset is
    /// local only and the store is marked clean.
    pub async fn reset_content(&self) -> bool {
        self.store.reset_to_defaults().await;
        if self.is_admin().await {
            self.save_to_remote().await
        } else {
            self.store.mark_clean(None).await;
            true
        }
    }

    // ── Live sync ────────────────────────────────────────────────

    /// Starts applying remote changes as they arrive. Deliveries that land
    /// while a save is in flight are dropped. Calling it while already
    /// running does nothing.
    pub fn start_live_sync(&self) {
        let mut live = self.live_handle();
        if live.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let mut subscription = self.remote.subscribe_all();
        let store = Arc::clone(&self.store);
        *live = Some(tokio::spawn(async move {
            while let Some(delivery) = subscription.next().await {
                match delivery {
                    Some(doc) => {
                        if store.apply_remote(&doc).await {
                            debug!("Applied remote update");
                        }
                    }
                    None => debug!("Remote store has no content"),
                }
            }
        }));
        info!("Live sync started");
    }

    /// Stops live sync. Returns whether it was running.
    pub fn stop_live_sync(&self) -> bool {
        match self.live_handle().take() {
            Some(task) => {
                task.abort();
                info!("Live sync stopped");
                true
            }
            None => false,
        }
    }

    /// True while live sync is running.
    pub fn is_live(&self) -> bool {
        self.live_handle()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn live_handle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Local cache ──────────────────────────────────────────────

    /// Writes the current content to the local cache.
    pub async fn save_to_local(&self) -> bool {
        let Some(local) = &self.local else {
            warn!("No local store configured");
            return false;
        };

        let ticket = self.store.begin_save().await;
        let snapshot = LocalSnapshot::now(ticket.content().as_ref().clone());
        let result = local.save_snapshot(&self.config.local_storage_key, &snapshot);
        if let Err(e) = &result {
            error!("Failed to save content locally: {}", e);
        }
        let succeeded = result.is_ok();
        self.store.finish_save(ticket, succeeded).await;
        succeeded
    }

    /// Replaces local content with the cached snapshot, reconciled with the
    /// defaults. Returns false if nothing is cached or the cache is
    /// unreadable.
    pub async fn load_from_local(&self) -> bool {
        let Some(local) = &self.local else {
            return false;
        };

        match local.load_snapshot(&self.config.local_storage_key) {
            Ok(Some(snapshot)) => {
                let merged = merge_with_defaults(&snapshot.content, self.store.defaults());
                self.store
                    .adopt_loaded(merged, Some(snapshot.timestamp))
                    .await;
                info!("Loaded content from local cache");
                true
            }
            Ok(None) => {
                debug!("No cached content");
                false
            }
            Err(e) => {
                error!("Failed to load cached content: {}", e);
                false
            }
        }
    }

    // ── Export / import ──────────────────────────────────────────

    /// Serializes the current content as an export file.
    pub async fn export_data(&self) -> ContentResult<String> {
        self.store.export_data().await
    }

    /// Imports an export file. The store becomes dirty; nothing is persisted.
    pub async fn import_data(&self, json: &str) -> ContentResult<()> {
        self.store.import_data(json).await
    }
}

impl Drop for ContentEngine {
    fn drop(&mut self) {
        if let Some(task) = self.live_handle().take() {
            task.abort();
        }
    }
}
