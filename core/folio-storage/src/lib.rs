//! Local durable cache for Folio.
//!
//! When no admin identity is available the site content is kept in a small
//! SQLite key/value table instead of the remote document store. The same
//! table backs the server's offline mode.

mod error;
mod local_store;

pub use error::{StorageError, StorageResult};
pub use local_store::{LocalSnapshot, LocalStore};

/// Key under which the content snapshot is cached.
pub const CONTENT_KEY: &str = "portfolio_content_data";
