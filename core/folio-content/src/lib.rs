//! Path-addressed content store for Folio.
//!
//! The site content is one nested JSON document. Editors change it one field
//! at a time by dot path (`hero.title.first`), always through a deep clone so
//! earlier snapshots stay valid. The store tracks whether there are unsaved
//! edits and cooperates with the persistence layer through save tickets and
//! remote deliveries.
//!
//! # Example
//!
//! ```
//! use folio_content::ContentStore;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = ContentStore::new();
//! let before = store.content().await;
//! store.update_content("hero.title.first", json!("Alex")).await.unwrap();
//!
//! assert!(store.status().await.is_dirty);
//! assert_ne!(before["hero"]["title"]["first"], json!("Alex"));
//! # }
//! ```

mod error;
pub mod mutate;
pub mod path;
pub mod reconcile;
mod store;
pub mod transfer;

pub use error::{ContentError, ContentResult};
pub use mutate::{apply, apply_batch, ContentUpdate};
pub use path::{ContentPath, PathError};
pub use reconcile::merge_with_defaults;
pub use store::{ContentStatus, ContentStore, SaveTicket};
pub use transfer::ExportFile;
