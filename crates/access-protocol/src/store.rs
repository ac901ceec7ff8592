//! # Policy Persistence
//!
//! The owning application caches policy documents between sessions. The
//! interface is a whole-list load and store; backends decide where the list
//! lives.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use access_policy::Policy;

use crate::error::ProtocolError;

/// Load and store a list of policies.
pub trait PolicyStore: Send + Sync {
    /// All stored policies, in stored order. An empty store yields an empty list.
    fn load(&self) -> Result<Vec<Policy>, ProtocolError>;

    /// Replace the stored list.
    fn store(&self, policies: &[Policy]) -> Result<(), ProtocolError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    policies: Mutex<Vec<Policy>>,
}

impl InMemoryPolicyStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn load(&self) -> Result<Vec<Policy>, ProtocolError> {
        let guard = self
            .policies
            .lock()
            .map_err(|_| ProtocolError::Store("policy store lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn store(&self, policies: &[Policy]) -> Result<(), ProtocolError> {
        let mut guard = self
            .policies
            .lock()
            .map_err(|_| ProtocolError::Store("policy store lock poisoned".into()))?;
        *guard = policies.to_vec();
        tracing::debug!(count = policies.len(), "stored policies in memory");
        Ok(())
    }
}

/// Store backed by a pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFilePolicyStore {
    path: PathBuf,
}

impl JsonFilePolicyStore {
    /// Store at `path`. The file is created on first store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PolicyStore for JsonFilePolicyStore {
    fn load(&self) -> Result<Vec<Policy>, ProtocolError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text)
            .map_err(|e| ProtocolError::Store(format!("{}: {e}", self.path.display())))
    }

    fn store(&self, policies: &[Policy]) -> Result<(), ProtocolError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(policies)?;
        std::fs::write(&self.path, text)?;
        tracing::debug!(count = policies.len(), path = %self.path.display(), "stored policies");
        Ok(())
    }
}
