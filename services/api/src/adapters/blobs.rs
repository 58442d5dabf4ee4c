//! services/api/src/adapters/blobs.rs
//!
//! A `BlobStore` that writes uploads below a root directory. The returned URL is
//! the configured public prefix joined with the relative path; the web layer
//! serves the root directory under that prefix.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use go_tany_core::ports::{BlobStore, PortError, PortResult};
use tokio::fs;
use tracing::{debug, info};

/// Joins `relative` onto `base`, rejecting anything that could leave `base`.
fn resolve_within(base: &Path, relative: &str) -> PortResult<PathBuf> {
    let mut resolved = base.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PortError::Unexpected(format!(
                    "Rejected blob path '{}'",
                    relative
                )));
            }
        }
    }
    if resolved == base {
        return Err(PortError::Unexpected("Empty blob path".to_string()));
    }
    Ok(resolved)
}

#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_url: String,
}

impl FsBlobStore {
    pub async fn new(root: PathBuf, public_url: impl Into<String>) -> PortResult<Self> {
        fs::create_dir_all(&root).await.map_err(|e| {
            PortError::Unexpected(format!(
                "Failed to create blob directory '{}': {}",
                root.display(),
                e
            ))
        })?;
        info!(path = %root.display(), "Blob store initialized");
        Ok(Self {
            root,
            public_url: public_url.into(),
        })
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> PortResult<String> {
        let target = resolve_within(&self.root, path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                PortError::Unexpected(format!("Failed to create '{}': {}", parent.display(), e))
            })?;
        }
        fs::write(&target, &bytes).await.map_err(|e| {
            PortError::Unexpected(format!("Failed to write blob '{}': {}", path, e))
        })?;

        debug!(path, size = bytes.len(), content_type, "Stored blob");
        Ok(format!("{}/{}", self.public_url.trim_end_matches('/'), path))
    }
}
