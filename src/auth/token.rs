//! Token persistence seam
//!
//! The session token outlives the process on real devices (keychain,
//! keystore). The client only depends on this capability trait; the
//! platform wires in its own implementation, and tests inject fakes.

use async_trait::async_trait;
use std::sync::Mutex;
use thiserror::Error;

/// A token persistence operation failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("token store error: {0}")]
pub struct TokenStoreError(pub String);

/// Capability for persisting the session token across launches
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist the token, replacing any previous one
    async fn save(&self, token: &str) -> Result<(), TokenStoreError>;

    /// Load the persisted token, if any
    async fn load(&self) -> Result<Option<String>, TokenStoreError>;

    /// Remove the persisted token
    async fn remove(&self) -> Result<(), TokenStoreError>;
}

/// In-memory token store, the default when no platform store is wired in
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| TokenStoreError("poisoned".to_string()))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    async fn load(&self) -> Result<Option<String>, TokenStoreError> {
        let slot = self
            .token
            .lock()
            .map_err(|_| TokenStoreError("poisoned".to_string()))?;
        Ok(slot.clone())
    }

    async fn remove(&self) -> Result<(), TokenStoreError> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| TokenStoreError("poisoned".to_string()))?;
        *slot = None;
        Ok(())
    }
}
