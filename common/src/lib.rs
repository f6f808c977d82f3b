//! GameRate Common Types
//!
//! Shared types used across the GameRate services: catalog identifiers,
//! the closed currency and rate-symbol enumerations, monetary rounding,
//! catalog records and the error taxonomy of the price-conversion pipeline.

pub mod identifiers;
pub mod monetary;
pub mod catalog;
pub mod error;

pub use identifiers::*;
pub use monetary::*;
pub use catalog::*;
pub use error::*;
