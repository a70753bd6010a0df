//! Storage abstractions for registry persistence.
//!
//! A registry is the per-process record of which PDFs were already notified.
//! It is read at the start of every scan and rewritten whenever a new or
//! updated PDF is found.
//!
//! ## Directory Structure
//!
//! ```text
//! registry/
//! ├── a1-libre.json       # one file per selective process
//! └── a1-interna.json
//! ```

pub mod local;
pub mod readonly;
pub mod registry;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
pub use readonly::ReadOnlyStorage;
pub use registry::{Registry, RegistryEntry};

/// Result of reading a registry.
#[derive(Debug)]
pub struct LoadedRegistry {
    pub registry: Registry,

    /// Set when the file could not be read and an empty registry was
    /// returned instead. Callers surface it as a warning.
    pub read_error: Option<std::io::Error>,
}

/// Trait for registry storage backends.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Load a registry. An unreadable file yields an empty registry plus
    /// `read_error`; content that is not a valid registry is an error.
    async fn load(&self, path: &Path) -> Result<LoadedRegistry>;

    /// Replace the stored registry with `registry`.
    async fn save(&self, path: &Path, registry: &Registry) -> Result<()>;
}

/// One-line state of a registry, for listings. Never fails: a malformed
/// registry is described rather than returned as an error.
pub async fn describe(store: &dyn RegistryStore, path: &Path) -> String {
    match store.load(path).await {
        Ok(LoadedRegistry {
            read_error: Some(_),
            ..
        }) => "not found".to_string(),
        Ok(loaded) => format!("{} PDFs", loaded.registry.len()),
        Err(e) => format!("malformed: {e}"),
    }
}
