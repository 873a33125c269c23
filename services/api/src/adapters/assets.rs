//! services/api/src/adapters/assets.rs
//!
//! Filesystem implementation of the `AssetStore` port. Blobs land under the
//! configured asset root and are served back from the public asset base URL
//! by the static-file layer in the router.

use std::path::PathBuf;

use async_trait::async_trait;
use edusync_core::ports::{AssetStore, PortError, PortResult};
use tracing::debug;

/// Stores school assets on the local filesystem.
#[derive(Clone)]
pub struct FsAssetStore {
    root: PathBuf,
    base_url: String,
}

impl FsAssetStore {
    pub fn new(root: PathBuf, base_url: String) -> Self {
        Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn store(&self, path: &str, bytes: &[u8], content_type: &str) -> PortResult<()> {
        // Paths come from the committer, not from user input, but reject
        // anything that would escape the asset root.
        if path.contains("..") || path.starts_with('/') {
            return Err(PortError::Unexpected(format!(
                "Refusing suspicious asset path '{}'",
                path
            )));
        }
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        tokio::fs::write(&full_path, bytes)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        debug!(path, content_type, size = bytes.len(), "Stored asset");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}
