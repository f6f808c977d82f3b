//! Identifier types for catalog records.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::GameRateError;

/// Externally assigned catalog identifier (the storefront's app id).
///
/// This is the id clients use; it is never generated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(i64);

impl CatalogId {
    /// Create a catalog ID from a raw value.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Parse a catalog ID from request input.
    ///
    /// Malformed and negative ids are rejected as invalid input, which keeps
    /// them distinct from ids that are well formed but absent.
    pub fn parse(s: &str) -> Result<Self, GameRateError> {
        let trimmed = s.trim();
        let id: i64 = trimmed
            .parse()
            .map_err(|_| GameRateError::InvalidInput(format!("malformed catalog id: {:?}", s)))?;
        if id < 0 {
            return Err(GameRateError::InvalidInput(format!(
                "catalog id cannot be negative: {}",
                id
            )));
        }
        Ok(Self(id))
    }

    /// Get the raw value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CatalogId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Storage-assigned record identifier.
/// Uses UUID v7 for time-ordered identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageId(Uuid);

impl StorageId {
    /// Create a new storage ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for StorageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
