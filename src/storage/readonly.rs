//! Read-only registry storage for dry runs.
//!
//! Loads go to the wrapped store; saves are logged and dropped, so a dry run
//! never marks a PDF as notified.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::storage::{LoadedRegistry, Registry, RegistryStore};

/// Wraps a store and discards every save.
#[derive(Debug, Clone, Default)]
pub struct ReadOnlyStorage<S> {
    inner: S,
}

impl<S: RegistryStore> ReadOnlyStorage<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: RegistryStore> RegistryStore for ReadOnlyStorage<S> {
    async fn load(&self, path: &Path) -> Result<LoadedRegistry> {
        self.inner.load(path).await
    }

    async fn save(&self, path: &Path, registry: &Registry) -> Result<()> {
        log::info!(
            "[dry-run] not writing registry {} ({} entries)",
            path.display(),
            registry.len()
        );
        Ok(())
    }
}
