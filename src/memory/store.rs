//! Fragment store abstraction and in-memory implementation
//!
//! Persistent backends live behind the `FragmentStore` trait; the engine
//! only assumes each call commits atomically per fragment. The bundled
//! `InMemoryStore` backs tests and single-process deployments.

use super::models::MemoryFragment;
use crate::error::{MemoryError, Result};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

/// Storage boundary for memory fragments
#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Insert a fragment, returning its id
    async fn add(&self, fragment: MemoryFragment) -> Result<String>;

    /// Fetch all live fragments, optionally filtered by conversation
    async fn get_all(&self, conversation_id: Option<&str>) -> Result<Vec<MemoryFragment>>;

    /// Fetch one fragment by id
    async fn get(&self, id: &str) -> Result<Option<MemoryFragment>>;

    /// Bump access count and refresh the recency marker
    async fn touch(&self, id: &str) -> Result<()>;

    /// Remove a fragment. Deleting an unknown id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Number of live fragments
    async fn count(&self) -> Result<usize>;
}

/// Concurrent in-memory fragment store
#[derive(Default)]
pub struct InMemoryStore {
    fragments: DashMap<String, MemoryFragment>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FragmentStore for InMemoryStore {
    async fn add(&self, fragment: MemoryFragment) -> Result<String> {
        let id = fragment.id.clone();
        if self.fragments.contains_key(&id) {
            return Err(MemoryError::Storage(format!(
                "duplicate fragment id: {}",
                id
            )));
        }
        self.fragments.insert(id.clone(), fragment);
        Ok(id)
    }

    async fn get_all(&self, conversation_id: Option<&str>) -> Result<Vec<MemoryFragment>> {
        let fragments = self
            .fragments
            .iter()
            .filter(|entry| match conversation_id {
                Some(conv) => entry.value().conversation_id.as_deref() == Some(conv),
                None => true,
            })
            .map(|entry| entry.value().clone())
            .collect();
        Ok(fragments)
    }

    async fn get(&self, id: &str) -> Result<Option<MemoryFragment>> {
        Ok(self.fragments.get(id).map(|entry| entry.value().clone()))
    }

    async fn touch(&self, id: &str) -> Result<()> {
        if let Some(mut entry) = self.fragments.get_mut(id) {
            let fragment = entry.value_mut();
            fragment.access_count += 1;
            fragment.accessed_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.fragments.remove(id);
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.fragments.len())
    }
}
