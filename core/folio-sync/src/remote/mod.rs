//! Remote document store integration.
//!
//! Provides a common interface over keyed document stores:
//! - [`MemoryDocumentStore`]: in-process store with change notification
//! - [`FirestoreStore`]: Cloud Firestore over its REST API

pub mod firestore;
pub mod memory;
pub mod storage;

pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::MemoryDocumentStore;
pub use storage::{DocumentStore, Record, RecordStream, StoreConfig};
