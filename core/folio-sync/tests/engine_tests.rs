use folio_content::ContentStore;
use folio_model::default_document;
use folio_storage::{LocalSnapshot, LocalStore, CONTENT_KEY};
use folio_sync::{
    ContentEngine, DocumentStore, EngineConfig, Identity, MemoryDocumentStore, SectionedService,
};
use folio_types::{SectionName, Timestamp};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    remote: Arc<MemoryDocumentStore>,
    engine: Arc<ContentEngine>,
}

async fn fixture(identity: Option<Identity>, local: Option<LocalStore>) -> Fixture {
    let remote = Arc::new(MemoryDocumentStore::new());
    let engine = ContentEngine::new(
        Arc::new(ContentStore::new()),
        SectionedService::new(remote.clone()),
        local,
        EngineConfig::default(),
    );
    engine.set_identity(identity).await;
    Fixture {
        remote,
        engine: Arc::new(engine),
    }
}

async fn admin() -> Fixture {
    fixture(Some(Identity::admin("owner")), None).await
}

/// Polls `check` until it passes.
async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached");
}

// ── Config ───────────────────────────────────────────────────────

#[test]
fn engine_config_default() {
    assert_eq!(EngineConfig::default().local_storage_key, "portfolio_content_data");
}

#[test]
fn identity_constructors() {
    assert!(Identity::admin("a").is_admin);
    assert!(!Identity::viewer("v").is_admin);
}

// ── Initialize ───────────────────────────────────────────────────

#[tokio::test]
async fn initialize_seeds_empty_remote_with_defaults() {
    let f = admin().await;

    assert!(f.engine.initialize().await);

    assert_eq!(f.remote.ids().len(), 10);
    let status = f.engine.store().status().await;
    assert!(!status.is_dirty);
    assert!(!status.loading);
    assert!(status.last_saved.is_some());
}

#[tokio::test]
async fn initialize_adopts_existing_remote_content() {
    let f = admin().await;
    let svc = f.engine.remote().clone();
    svc.save_section(SectionName::Hero, &json!({ "description": "remote" }))
        .await
        .unwrap();

    assert!(f.engine.initialize().await);

    let content = f.engine.store().content().await;
    assert_eq!(content["hero"]["description"], json!("remote"));
    assert_eq!(content["contact"], default_document()["contact"]);
    assert_eq!(f.remote.write_count(), 1);
}

#[tokio::test]
async fn initialize_seeds_empty_remote_from_local_cache() {
    let local = LocalStore::open_in_memory().unwrap();
    let mut cached = default_document();
    cached["about"]["title"] = json!("Cached");
    local
        .save_snapshot(CONTENT_KEY, &LocalSnapshot::now(cached))
        .unwrap();

    let f = fixture(Some(Identity::admin("owner")), Some(local)).await;
    assert!(f.engine.initialize().await);

    assert_eq!(
        f.engine.store().content().await["about"]["title"],
        json!("Cached")
    );
    let remote_about = f.remote.get("about").await.unwrap().unwrap();
    assert_eq!(remote_about["title"], json!("Cached"));
    assert_eq!(f.remote.ids().len(), 10);
    assert!(!f.engine.store().status().await.is_dirty);
}

#[tokio::test]
async fn initialize_prefers_remote_over_local_cache() {
    let local = LocalStore::open_in_memory().unwrap();
    let mut cached = default_document();
    cached["about"]["title"] = json!("Cached");
    local
        .save_snapshot(CONTENT_KEY, &LocalSnapshot::now(cached))
        .unwrap();

    let f = fixture(Some(Identity::admin("owner")), Some(local)).await;
    f.engine.remote().save_all(&default_document()).await.unwrap();
    assert!(f.engine.initialize().await);

    assert_eq!(
        f.engine.store().content().await["about"]["title"],
        default_document()["about"]["title"]
    );
}

#[tokio::test]
async fn initialize_without_admin_uses_local_cache() {
    let local = LocalStore::open_in_memory().unwrap();
    let mut cached = default_document();
    cached["about"]["title"] = json!("Cached");
    local
        .save_snapshot(CONTENT_KEY, &LocalSnapshot::now(cached))
        .unwrap();

    let f = fixture(None, Some(local)).await;
    assert!(f.engine.initialize().await);

    assert_eq!(
        f.engine.store().content().await["about"]["title"],
        json!("Cached")
    );
    assert_eq!(f.remote.write_count(), 0);
}

// ── Remote ───────────────────────────────────────────────────────

#[tokio::test]
async fn edit_then_save_cleans_the_store() {
    let f = admin().await;
    let store = f.engine.store();

    store
        .update_content("hero.title.first", json!("Alex"))
        .await
        .unwrap();
    assert!(store.status().await.is_dirty);

    let before = Timestamp::now();
    assert!(f.engine.save_to_remote().await);

    let status = store.status().await;
    assert!(!status.is_dirty);
    assert!(status.last_saved.unwrap() >= before);

    let remote_hero = f.remote.get("hero").await.unwrap().unwrap();
    assert_eq!(remote_hero["title"]["first"], json!("Alex"));
}

#[tokio::test]
async fn viewer_cannot_touch_remote() {
    let f = fixture(Some(Identity::viewer("guest")), None).await;
    f.engine
        .store()
        .update_content("hero.description", json!("x"))
        .await
        .unwrap();

    assert!(!f.engine.save_to_remote().await);
    assert!(!f.engine.load_from_remote().await);
    assert_eq!(f.remote.write_count(), 0);
    assert!(f.engine.store().status().await.is_dirty);
}

#[tokio::test]
async fn failed_save_stays_dirty() {
    let f = admin().await;
    f.remote.fail_writes("about");
    f.engine
        .store()
        .update_content("about.title", json!("x"))
        .await
        .unwrap();

    assert!(!f.engine.save_to_remote().await);
    assert!(f.engine.store().status().await.is_dirty);
    // Writes that went through are kept.
    assert!(f.remote.get("hero").await.unwrap().is_some());
}

#[tokio::test]
async fn edit_during_save_stays_dirty() {
    let f = admin().await;
    let store = Arc::clone(f.engine.store());
    store.update_content("hero.description", json!("one")).await.unwrap();

    f.remote.pause_writes();
    let engine = Arc::clone(&f.engine);
    let save = tokio::spawn(async move { engine.save_to_remote().await });

    let s = Arc::clone(&store);
    eventually(|| {
        let s = Arc::clone(&s);
        async move { s.status().await.saving }
    })
    .await;
    store.update_content("hero.description", json!("two")).await.unwrap();

    f.remote.resume_writes();
    assert!(save.await.unwrap());

    let status = store.status().await;
    assert!(status.is_dirty);
    assert!(status.last_saved.is_some());
    let remote_hero = f.remote.get("hero").await.unwrap().unwrap();
    assert_eq!(remote_hero["description"], json!("one"));
}

#[tokio::test]
async fn load_from_remote_reports_missing_content() {
    let f = admin().await;
    assert!(!f.engine.load_from_remote().await);

    f.engine.remote().save_all(&default_document()).await.unwrap();
    assert!(f.engine.load_from_remote().await);
    assert!(!f.engine.store().status().await.loading);
}

#[tokio::test]
async fn reset_as_admin_persists_defaults() {
    let f = admin().await;
    f.engine
        .store()
        .update_content("hero.description", json!("x"))
        .await
        .unwrap();

    assert!(f.engine.reset_content().await);

    assert_eq!(*f.engine.store().content().await, default_document());
    assert!(!f.engine.store().status().await.is_dirty);
    assert_eq!(f.remote.ids().len(), 10);
}

#[tokio::test]
async fn reset_without_admin_is_local() {
    let f = fixture(None, None).await;
    f.engine
        .store()
        .update_content("hero.description", json!("x"))
        .await
        .unwrap();

    assert!(f.engine.reset_content().await);

    let status = f.engine.store().status().await;
    assert!(!status.is_dirty);
    assert!(status.last_saved.is_none());
    assert_eq!(f.remote.write_count(), 0);
}

// ── Live sync ────────────────────────────────────────────────────

#[tokio::test]
async fn live_sync_applies_remote_changes() {
    let f = admin().await;
    f.engine.start_live_sync();
    assert!(f.engine.is_live());

    let writer = SectionedService::new(f.remote.clone());
    writer
        .save_section(SectionName::Hero, &json!({ "description": "from elsewhere" }))
        .await
        .unwrap();

    let store = Arc::clone(f.engine.store());
    eventually(|| {
        let store = Arc::clone(&store);
        async move { store.content().await["hero"]["description"] == json!("from elsewhere") }
    })
    .await;

    // Remote deliveries are reconciled: other sections keep their defaults.
    assert_eq!(
        f.engine.store().content().await["navigation"],
        default_document()["navigation"]
    );

    assert!(f.engine.stop_live_sync());
    assert!(!f.engine.stop_live_sync());
    assert!(!f.engine.is_live());
}

#[tokio::test]
async fn viewer_live_sync_follows_remote() {
    let f = fixture(Some(Identity::viewer("guest")), None).await;
    f.engine.start_live_sync();

    let writer = SectionedService::new(f.remote.clone());
    writer
        .save_section(SectionName::About, &json!({ "title": "Published" }))
        .await
        .unwrap();

    let store = Arc::clone(f.engine.store());
    eventually(|| {
        let store = Arc::clone(&store);
        async move { store.content().await["about"]["title"] == json!("Published") }
    })
    .await;
    assert!(!store.status().await.is_dirty);
    f.engine.stop_live_sync();
}

#[tokio::test]
async fn live_sync_keeps_edit_made_during_save() {
    let f = admin().await;
    f.engine.start_live_sync();
    let store = Arc::clone(f.engine.store());
    store.update_content("hero.description", json!("one")).await.unwrap();

    f.remote.pause_writes();
    let engine = Arc::clone(&f.engine);
    let save = tokio::spawn(async move { engine.save_to_remote().await });
    let s = Arc::clone(&store);
    eventually(|| {
        let s = Arc::clone(&s);
        async move { s.status().await.saving }
    })
    .await;
    store.update_content("hero.description", json!("two")).await.unwrap();

    f.remote.resume_writes();
    assert!(save.await.unwrap());

    // Give the echo of the save time to arrive.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.content().await["hero"]["description"], json!("two"));
    assert!(store.status().await.is_dirty);

    // Saving the newer edit settles the store on it.
    assert!(f.engine.save_to_remote().await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.content().await["hero"]["description"], json!("two"));
    assert!(!store.status().await.is_dirty);
    f.engine.stop_live_sync();
}

#[tokio::test]
async fn live_sync_keeps_edit_made_after_save() {
    let f = admin().await;
    f.engine.start_live_sync();
    let store = Arc::clone(f.engine.store());
    store.update_content("hero.description", json!("one")).await.unwrap();

    assert!(f.engine.save_to_remote().await);
    store.update_content("hero.description", json!("two")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.content().await["hero"]["description"], json!("two"));
    assert!(store.status().await.is_dirty);
    f.engine.stop_live_sync();
}

#[tokio::test]
async fn live_delivery_is_ignored_while_saving() {
    let f = admin().await;
    f.engine.remote().save_all(&default_document()).await.unwrap();
    f.engine.start_live_sync();

    let store = Arc::clone(f.engine.store());
    let s = Arc::clone(&store);
    eventually(|| {
        let s = Arc::clone(&s);
        async move { s.status().await.last_saved.is_some() }
    })
    .await;
    // Let the initial deliveries settle.
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.update_content("about.title", json!("mine")).await.unwrap();

    f.remote.pause_writes();
    let engine = Arc::clone(&f.engine);
    let save = tokio::spawn(async move { engine.save_to_remote().await });
    let s = Arc::clone(&store);
    eventually(|| {
        let s = Arc::clone(&s);
        async move { s.status().await.saving }
    })
    .await;

    // Another client deletes a section while our save is held.
    f.remote.remove("about");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.content().await["about"]["title"], json!("mine"));

    f.remote.resume_writes();
    assert!(save.await.unwrap());
    f.engine.stop_live_sync();
}

// ── Local cache ──────────────────────────────────────────────────

#[tokio::test]
async fn local_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let local = LocalStore::new(dir.path().join("cache.db")).unwrap();
    let f = fixture(None, Some(local.clone())).await;

    f.engine
        .store()
        .update_content("about.title", json!("Local"))
        .await
        .unwrap();
    assert!(f.engine.save_to_local().await);
    assert!(!f.engine.store().status().await.is_dirty);

    let cached = local.load_snapshot(CONTENT_KEY).unwrap().unwrap();
    assert_eq!(cached.content["about"]["title"], json!("Local"));

    let g = fixture(None, Some(local)).await;
    assert!(g.engine.load_from_local().await);
    assert_eq!(
        g.engine.store().content().await["about"]["title"],
        json!("Local")
    );
    assert_eq!(
        g.engine.store().status().await.last_saved,
        Some(cached.timestamp)
    );
}

#[tokio::test]
async fn local_operations_without_store_fail() {
    let f = fixture(None, None).await;
    assert!(!f.engine.save_to_local().await);
    assert!(!f.engine.load_from_local().await);
}

#[tokio::test]
async fn unreadable_cache_is_not_loaded() {
    let local = LocalStore::open_in_memory().unwrap();
    local.set_item(CONTENT_KEY, "garbage").unwrap();
    let f = fixture(None, Some(local)).await;

    assert!(!f.engine.load_from_local().await);
    assert_eq!(*f.engine.store().content().await, default_document());
}

// ── Export / import ──────────────────────────────────────────────

#[tokio::test]
async fn import_empty_content_gives_defaults() {
    let f = admin().await;
    f.engine
        .import_data(r#"{"version":"1.0.0","content":{}}"#)
        .await
        .unwrap();

    let content = f.engine.store().content().await;
    assert_eq!(content["hero"], default_document()["hero"]);
    assert!(f.engine.store().status().await.is_dirty);

    let exported = f.engine.export_data().await.unwrap();
    assert!(exported.contains("\"version\": \"1.0.0\""));
}
