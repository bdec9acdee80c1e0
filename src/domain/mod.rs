//! Domain Layer
//!
//! Core value objects and port traits for the top-destinations read path.
//!
//! # Architecture
//!
//! The domain layer is organized into:
//!
//! - **Ports** (`ports.rs`) - Value objects plus trait abstractions for the
//!   ranking source (relational store) and the cache store (key-value store)
//!
//! Infrastructure adapters in [`crate::adapters`] implement these traits; the
//! cache-aside core in [`crate::cache`] consumes them through `Arc<dyn ...>`.

pub mod ports;

// Re-export commonly used types
pub use ports::{CacheStore, Destination, RankingSnapshot, RankingSource};
