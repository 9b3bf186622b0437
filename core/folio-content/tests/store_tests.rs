use folio_content::{ContentError, ContentStore, ContentUpdate};
use folio_model::default_document;
use folio_types::SectionName;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

// ── Edits ────────────────────────────────────────────────────────

#[tokio::test]
async fn new_store_holds_defaults_and_is_clean() {
    let store = ContentStore::new();
    assert_eq!(*store.content().await, default_document());

    let status = store.status().await;
    assert!(!status.is_dirty);
    assert!(!status.saving);
    assert!(!status.loading);
    assert!(status.last_saved.is_none());
    assert_eq!(status.revision, 0);
}

#[tokio::test]
async fn update_produces_new_snapshot_and_marks_dirty() {
    let store = ContentStore::new();
    let before = store.content().await;

    store
        .update_content("hero.title.first", json!("Alex"))
        .await
        .unwrap();

    let after = store.content().await;
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before["hero"]["title"]["first"], json!("Jordan"));
    assert_eq!(after["hero"]["title"]["first"], json!("Alex"));
    assert_eq!(
        store.get("hero.title.first").await.unwrap(),
        Some(json!("Alex"))
    );

    let status = store.status().await;
    assert!(status.is_dirty);
    assert_eq!(status.revision, 1);
}

#[tokio::test]
async fn failed_update_leaves_store_unchanged() {
    let store = ContentStore::new();
    let before = store.content().await;

    let err = store
        .update_content("about.kpiCards.0.value", json!("9"))
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Path(_)));
    assert!(store.update_content("", json!(1)).await.is_err());

    assert!(Arc::ptr_eq(&before, &store.content().await));
    assert!(!store.status().await.is_dirty);
}

#[tokio::test]
async fn batch_update_applies_all() {
    let store = ContentStore::new();
    store
        .update_multiple(vec![
            ContentUpdate::new("hero.title.first", "Alex"),
            ContentUpdate::new("hero.title.last", "Kim"),
        ])
        .await
        .unwrap();

    assert_eq!(
        store.section(SectionName::Hero).await.unwrap()["title"],
        json!({ "first": "Alex", "last": "Kim" })
    );
    assert_eq!(store.status().await.revision, 1);
}

#[tokio::test]
async fn failed_batch_changes_nothing() {
    let store = ContentStore::new();
    let result = store
        .update_multiple(vec![
            ContentUpdate::new("hero.title.first", "Alex"),
            ContentUpdate::new("about.kpiCards", "oops"),
        ])
        .await;
    assert!(matches!(result, Err(ContentError::Shape(_))));
    assert_eq!(store.content().await["hero"]["title"]["first"], json!("Jordan"));
    assert!(!store.status().await.is_dirty);
}

#[tokio::test]
async fn empty_batch_swaps_snapshot_but_stays_clean() {
    let store = ContentStore::new();
    let before = store.content().await;

    store.update_multiple(Vec::new()).await.unwrap();

    let after = store.content().await;
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before, after);
    let status = store.status().await;
    assert!(!status.is_dirty);
    assert_eq!(status.revision, 0);
}

#[tokio::test]
async fn reset_restores_defaults_and_marks_dirty() {
    let store = ContentStore::new();
    store.update_content("hero.description", json!("x")).await.unwrap();
    store.mark_clean(None).await;

    store.reset_to_defaults().await;

    assert_eq!(*store.content().await, default_document());
    assert!(store.status().await.is_dirty);
}

// ── Saves ────────────────────────────────────────────────────────

#[tokio::test]
async fn successful_save_clears_dirty() {
    let store = ContentStore::new();
    store.update_content("hero.description", json!("x")).await.unwrap();

    let ticket = store.begin_save().await;
    assert!(store.status().await.saving);
    assert_eq!(ticket.content()["hero"]["description"], json!("x"));

    assert!(store.finish_save(ticket, true).await);
    let status = store.status().await;
    assert!(!status.is_dirty);
    assert!(!status.saving);
    assert!(status.last_saved.is_some());
}

#[tokio::test]
async fn failed_save_stays_dirty() {
    let store = ContentStore::new();
    store.update_content("hero.description", json!("x")).await.unwrap();

    let ticket = store.begin_save().await;
    assert!(!store.finish_save(ticket, false).await);

    let status = store.status().await;
    assert!(status.is_dirty);
    assert!(status.last_saved.is_none());
}

#[tokio::test]
async fn edit_during_save_keeps_dirty() {
    let store = ContentStore::new();
    store.update_content("hero.description", json!("one")).await.unwrap();

    let ticket = store.begin_save().await;
    store.update_content("hero.description", json!("two")).await.unwrap();

    assert!(!store.finish_save(ticket, true).await);
    let status = store.status().await;
    assert!(status.is_dirty);
    assert!(status.last_saved.is_some());
}

// ── Remote deliveries ────────────────────────────────────────────

#[tokio::test]
async fn remote_delivery_is_reconciled_and_adopted() {
    let store = ContentStore::new();
    let revision = store.status().await.revision;

    let applied = store
        .apply_remote(&json!({ "hero": { "description": "remote" }, "navigation": {} }))
        .await;

    assert!(applied);
    let content = store.content().await;
    assert_eq!(content["hero"]["description"], json!("remote"));
    assert_eq!(content["navigation"], default_document()["navigation"]);
    let status = store.status().await;
    assert!(!status.is_dirty);
    assert!(status.revision > revision);
    assert!(status.last_saved.is_some());
}

#[tokio::test]
async fn remote_delivery_does_not_replace_unsaved_edits() {
    let store = ContentStore::new();
    store.update_content("hero.description", json!("local")).await.unwrap();

    let applied = store
        .apply_remote(&json!({ "hero": { "description": "remote" } }))
        .await;

    assert!(!applied);
    assert_eq!(store.content().await["hero"]["description"], json!("local"));
    assert!(store.status().await.is_dirty);
}

#[tokio::test]
async fn echo_of_a_save_does_not_replace_later_edits() {
    let store = ContentStore::new();
    store.update_content("hero.description", json!("one")).await.unwrap();
    let ticket = store.begin_save().await;
    let saved = ticket.content().as_ref().clone();
    store.update_content("hero.description", json!("two")).await.unwrap();
    assert!(!store.finish_save(ticket, true).await);

    // The remote store reports back what was saved.
    assert!(!store.apply_remote(&saved).await);

    assert_eq!(store.content().await["hero"]["description"], json!("two"));
    assert!(store.status().await.is_dirty);

    // Once the newer edit is saved, deliveries apply again.
    let ticket = store.begin_save().await;
    assert!(store.finish_save(ticket, true).await);
    assert!(store.apply_remote(&saved).await);
    assert_eq!(store.content().await["hero"]["description"], json!("one"));
}

#[tokio::test]
async fn mark_clean_accepts_deliveries_again() {
    let store = ContentStore::new();
    store.reset_to_defaults().await;
    assert!(!store.apply_remote(&json!({})).await);

    store.mark_clean(None).await;
    assert!(store.apply_remote(&json!({})).await);
}

#[tokio::test]
async fn remote_delivery_is_ignored_while_saving() {
    let store = ContentStore::new();
    store.update_content("hero.description", json!("local")).await.unwrap();
    let ticket = store.begin_save().await;

    let applied = store
        .apply_remote(&json!({ "hero": { "description": "remote" } }))
        .await;

    assert!(!applied);
    assert_eq!(store.content().await["hero"]["description"], json!("local"));

    store.finish_save(ticket, true).await;
    assert!(
        store
            .apply_remote(&json!({ "hero": { "description": "remote" } }))
            .await
    );
}

#[tokio::test]
async fn adopt_remote_fills_missing_sections() {
    let store = ContentStore::new();
    store
        .adopt_remote(&json!({ "hero": { "title": { "first": "Alex", "last": "Kim" } } }))
        .await;

    let content = store.content().await;
    assert_eq!(content["contact"], default_document()["contact"]);
    assert_eq!(content["hero"]["title"]["first"], json!("Alex"));
    let status = store.status().await;
    assert!(!status.is_dirty);
    assert!(status.last_saved.is_some());
}

// ── Export / import ──────────────────────────────────────────────

#[tokio::test]
async fn export_then_import_restores_content() {
    let source = ContentStore::new();
    source
        .update_content("about.title", json!("Who I am"))
        .await
        .unwrap();
    let exported = source.export_data().await.unwrap();

    let target = ContentStore::new();
    target.import_data(&exported).await.unwrap();

    assert_eq!(target.content().await, source.content().await);
    assert!(target.status().await.is_dirty);
}

#[tokio::test]
async fn import_with_empty_content_yields_defaults() {
    let store = ContentStore::new();
    store.update_content("hero.description", json!("x")).await.unwrap();

    store
        .import_data(r#"{"version":"1.0.0","content":{}}"#)
        .await
        .unwrap();

    assert_eq!(store.content().await["hero"], default_document()["hero"]);
}

#[tokio::test]
async fn import_with_misshaped_fields_is_rejected() {
    let store = ContentStore::new();
    let before = store.content().await;

    let err = store
        .import_data(r#"{"version":"1.0.0","content":{"about":{"kpiCards":"many"}}}"#)
        .await
        .unwrap_err();

    match err {
        ContentError::Import(reason) => assert!(reason.contains("about.kpiCards"), "{reason}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(Arc::ptr_eq(&before, &store.content().await));
    assert!(!store.status().await.is_dirty);
}

#[tokio::test]
async fn rejected_import_leaves_store_unchanged() {
    let store = ContentStore::new();
    let before = store.content().await;

    let err = store
        .import_data(r#"{"version":"0.9","content":{}}"#)
        .await
        .unwrap_err();

    assert!(matches!(err, ContentError::Import(_)));
    assert!(Arc::ptr_eq(&before, &store.content().await));
    assert!(!store.status().await.is_dirty);
}

#[tokio::test]
async fn custom_defaults_are_used_for_reset() {
    let mut defaults = default_document();
    defaults["hero"]["description"] = json!("custom");
    let store = ContentStore::with_defaults(defaults);

    store.update_content("hero.description", json!("x")).await.unwrap();
    store.reset_to_defaults().await;

    assert_eq!(store.content().await["hero"]["description"], json!("custom"));
}
