//! Section-sharded content sync for Folio.
//!
//! Persists the site content document to a remote document store one
//! section at a time and keeps local content in step with it.
//!
//! # Architecture
//!
//! - **Remote**: the [`DocumentStore`] seam and its implementations
//!   (in-memory, Firestore REST)
//! - **Record**: how a section is laid out as a stored document
//! - **Normalize**: restores keyed-map sequences to arrays on every read
//! - **Sectioned**: save fan-out, load fan-in, aggregated subscriptions
//! - **Engine**: ties a [`ContentStore`](folio_content::ContentStore) to the
//!   remote store and the local cache
//!
//! # Example
//!
//! ```
//! use folio_content::ContentStore;
//! use folio_sync::{ContentEngine, EngineConfig, Identity, MemoryDocumentStore, SectionedService};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let remote = SectionedService::new(Arc::new(MemoryDocumentStore::new()));
//! let engine = ContentEngine::new(
//!     Arc::new(ContentStore::new()),
//!     remote,
//!     None,
//!     EngineConfig::default(),
//! );
//! engine.set_identity(Some(Identity::admin("owner"))).await;
//!
//! assert!(engine.initialize().await);
//! assert!(!engine.store().status().await.is_dirty);
//! # }
//! ```

mod engine;
mod error;
pub mod normalize;
pub mod record;
pub mod remote;
mod sectioned;

pub use engine::{ContentEngine, EngineConfig, Identity};
pub use error::{SyncError, SyncResult};
pub use record::SectionMetadata;
pub use remote::{
    DocumentStore, FirestoreConfig, FirestoreStore, MemoryDocumentStore, Record, RecordStream,
    StoreConfig,
};
pub use sectioned::{
    SaveReport, SectionFailure, SectionedService, Subscription, SUBSCRIPTION_BUFFER,
};
