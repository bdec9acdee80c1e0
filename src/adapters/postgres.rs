//! Postgres Ranking Source
//!
//! Executes the popularity ranking query against a shared connection pool.
//! The pool is created once at startup and passed in by reference; this
//! adapter never opens connections of its own.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use tracing::{debug, instrument};

use crate::domain::{Destination, RankingSnapshot, RankingSource};
use crate::error::{Error, Result};

/// Default number of destinations returned by the ranking query
pub const DEFAULT_RANKING_LIMIT: i64 = 10;

/// Ranking query: destinations ordered by popularity, best first. Postgres
/// sort is stable for equal keys scanned in row order, which gives ties
/// their database row order.
const RANKING_QUERY: &str = "\
    SELECT country, description, best_time_to_visit, popularity_score \
    FROM destinations \
    ORDER BY popularity_score DESC \
    LIMIT $1";

#[derive(Debug, sqlx::FromRow)]
struct DestinationRow {
    country: String,
    description: String,
    best_time_to_visit: String,
    popularity_score: i64,
}

impl From<DestinationRow> for Destination {
    fn from(row: DestinationRow) -> Self {
        Self {
            country: row.country,
            description: row.description,
            best_time_to_visit: row.best_time_to_visit,
            popularity_score: row.popularity_score,
        }
    }
}

/// [`RankingSource`] backed by the relational store.
pub struct PostgresRankingSource {
    pool: PgPool,
    limit: i64,
}

impl PostgresRankingSource {
    /// Create a new ranking source over a shared pool.
    pub fn new(pool: PgPool, limit: i64) -> Self {
        Self { pool, limit }
    }

    /// Check that the database is reachable.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::SourceUnavailable(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl RankingSource for PostgresRankingSource {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<RankingSnapshot> {
        // Row decode failures propagate with the query error; a destination
        // that fails to scan must never be silently skipped.
        let rows: Vec<DestinationRow> = sqlx::query_as(RANKING_QUERY)
            .bind(self.limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::SourceUnavailable(format!("Ranking query failed: {}", e)))?;

        debug!(rows = rows.len(), "Fetched destination ranking");
        Ok(RankingSnapshot::new(
            rows.into_iter().map(Destination::from).collect(),
        ))
    }
}
