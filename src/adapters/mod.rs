//! Infrastructure Adapters
//!
//! This module contains adapter implementations for the domain ports,
//! following the Port/Adapter (Hexagonal) architecture pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   Domain Layer                        │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │               Ports (Traits)                    │  │
//! │  │       RankingSource    │    CacheStore          │  │
//! │  └────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               Adapters (This Module)                  │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │  PostgresRankingSource │ RedisCacheStore        │  │
//! │  │  InMemoryCacheStore │ StaticRankingSource       │  │
//! │  └────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The in-memory pair are instrumented test doubles: deterministic TTL via a
//! logical clock, call counters, and switchable failure modes.

mod memory;
mod postgres;
mod redis;

pub use memory::{InMemoryCacheStore, StaticRankingSource};
pub use postgres::{PostgresRankingSource, DEFAULT_RANKING_LIMIT};
pub use redis::RedisCacheStore;
