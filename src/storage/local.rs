//! Local filesystem registry storage.
//!
//! Each process keeps its registry in its own JSON file. Writes replace the
//! whole file: the registry is serialized, written to a sibling temp file
//! unique to that write and renamed over the previous version.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{LoadedRegistry, Registry, RegistryStore};

/// Local filesystem storage backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = temp_path(path);
        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&tmp, path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Sibling temp file unique to this write, e.g. `a1.json.4242.7.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);

    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    path.with_file_name(name)
}

#[async_trait]
impl RegistryStore for LocalStorage {
    async fn load(&self, path: &Path) -> Result<LoadedRegistry> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Registry {} not readable: {}", path.display(), e);
                return Ok(LoadedRegistry {
                    registry: Registry::new(),
                    read_error: Some(e),
                });
            }
        };

        let registry: Registry = serde_json::from_slice(&bytes).map_err(AppError::from)?;
        Ok(LoadedRegistry {
            registry,
            read_error: None,
        })
    }

    async fn save(&self, path: &Path, registry: &Registry) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(registry)?;
        self.write_bytes(path, &bytes).await
    }
}
