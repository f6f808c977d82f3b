//! GameRate Catalog Store
//!
//! Persistence for catalog records, keyed by the externally assigned
//! catalog id, with field-level price updates.

pub mod store;
pub mod memory;
pub mod postgres;
pub mod error;

pub use store::{CatalogStore, SharedCatalogStore};
pub use memory::MemoryCatalogStore;
pub use postgres::{PgCatalogStore, PgStoreConfig};
pub use error::{CatalogError, CatalogResult};
