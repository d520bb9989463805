use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use crate::domain::invoice::errors::InvoiceError;
use crate::domain::invoice::ports::ArtifactStore;

/// Filesystem-backed artifact store.
///
/// Keys map directly to paths under the root directory; download URLs are
/// served by whatever fronts that directory (nginx, the app itself), so
/// "presigning" here is a plain URL with an advisory TTL query parameter.
pub struct FsArtifactStore {
  root: PathBuf,
  base_url: String,
}

impl FsArtifactStore {
  pub fn new(root: PathBuf, base_url: String) -> Self {
    std::fs::create_dir_all(&root).ok();
    Self {
      root,
      base_url: base_url.trim_end_matches('/').to_string(),
    }
  }

  fn resolve(&self, key: &str) -> Result<PathBuf, InvoiceError> {
    let relative = Path::new(key);
    let traversal = relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_)));
    if key.is_empty() || traversal {
      return Err(InvoiceError::Validation(format!(
        "Invalid artifact key: '{}'",
        key
      )));
    }
    Ok(self.root.join(relative))
  }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
  async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), InvoiceError> {
    let path = self.resolve(key)?;
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| InvoiceError::Internal(format!("Creating artifact directory failed: {}", e)))?;
    }
    tokio::fs::write(&path, &bytes)
      .await
      .map_err(|e| InvoiceError::Internal(format!("Writing artifact '{}' failed: {}", key, e)))?;
    tracing::debug!(key = %key, bytes = bytes.len(), content_type = %content_type, "Artifact stored");
    Ok(())
  }

  async fn presigned_url(&self, key: &str, ttl_seconds: u64) -> Result<String, InvoiceError> {
    let path = self.resolve(key)?;
    match tokio::fs::try_exists(&path).await {
      Ok(true) => Ok(format!("{}/{}?ttl={}", self.base_url, key, ttl_seconds)),
      Ok(false) => Err(InvoiceError::Validation(format!(
        "No artifact stored under '{}'",
        key
      ))),
      Err(e) => Err(InvoiceError::Internal(format!(
        "Checking artifact '{}' failed: {}",
        key, e
      ))),
    }
  }
}
