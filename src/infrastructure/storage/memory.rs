use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::invoice::errors::InvoiceError;
use crate::domain::invoice::ports::ArtifactStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
  pub bytes: Vec<u8>,
  pub content_type: String,
}

/// In-memory artifact store for tests and local development.
#[derive(Default)]
pub struct InMemoryArtifactStore {
  artifacts: Mutex<HashMap<String, StoredArtifact>>,
}

impl InMemoryArtifactStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn get(&self, key: &str) -> Option<StoredArtifact> {
    self.artifacts.lock().await.get(key).cloned()
  }

  pub async fn keys(&self) -> Vec<String> {
    let mut keys: Vec<String> = self.artifacts.lock().await.keys().cloned().collect();
    keys.sort();
    keys
  }

  pub async fn len(&self) -> usize {
    self.artifacts.lock().await.len()
  }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
  async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), InvoiceError> {
    self.artifacts.lock().await.insert(
      key.to_string(),
      StoredArtifact {
        bytes,
        content_type: content_type.to_string(),
      },
    );
    Ok(())
  }

  async fn presigned_url(&self, key: &str, ttl_seconds: u64) -> Result<String, InvoiceError> {
    if !self.artifacts.lock().await.contains_key(key) {
      return Err(InvoiceError::Validation(format!(
        "No artifact stored under '{}'",
        key
      )));
    }
    Ok(format!("memory://{}?ttl={}", key, ttl_seconds))
  }
}
