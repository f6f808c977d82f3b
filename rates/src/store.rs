//! Key-value storage for the latest rates.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::RateResult;

/// String-keyed store holding one value per key.
///
/// The cache treats implementations as opaque get/set primitives; values are
/// decimal strings.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under a key.
    async fn get(&self, key: &str) -> RateResult<Option<String>>;

    /// Overwrite the value stored under a key.
    async fn set(&self, key: &str, value: String) -> RateResult<()>;

    /// Remove every key.
    async fn flush(&self) -> RateResult<()>;

    /// Check that the store is reachable.
    async fn ping(&self) -> RateResult<()>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> RateResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: String) -> RateResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn flush(&self) -> RateResult<()> {
        self.entries.clear();
        Ok(())
    }

    async fn ping(&self) -> RateResult<()> {
        Ok(())
    }
}
