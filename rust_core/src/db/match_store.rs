//! Match record persistence.
//!
//! Records are keyed by (schedule game id, source type, source game id);
//! every write is an upsert so repeated syncs against the same feed are
//! idempotent.

use super::retry::{execute_with_retry, RetryPolicy};
use crate::matching::{MatchRecord, MatchRecordKey, MatchStatistics, HIGH_CONFIDENCE};
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::PgPool;
use std::collections::HashMap;

/// Write access to the match audit store
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Insert or overwrite the record sharing `record.key()`
    async fn upsert(&self, record: &MatchRecord) -> Result<()>;

    /// Aggregate over everything stored so far
    async fn statistics(&self) -> Result<MatchStatistics>;
}

/// Match store backed by the `game_matches` table
#[derive(Debug, Clone)]
pub struct PgMatchStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SourceStatsRow {
    source_type: String,
    records: i64,
    mean_confidence: Option<f64>,
    high_confidence: i64,
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn upsert(&self, record: &MatchRecord) -> Result<()> {
        let pool = &self.pool;
        execute_with_retry(self.retry, "game match upsert", move || async move {
            sqlx::query(
                r#"
                INSERT INTO game_matches (
                    schedule_game_id, source_type, source_game_id,
                    home_team_source, away_team_source, confidence_score,
                    match_type, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
                ON CONFLICT (schedule_game_id, source_type, source_game_id) DO UPDATE SET
                    home_team_source = EXCLUDED.home_team_source,
                    away_team_source = EXCLUDED.away_team_source,
                    confidence_score = EXCLUDED.confidence_score,
                    match_type = EXCLUDED.match_type,
                    updated_at = NOW()
                "#,
            )
            .bind(record.schedule_game_id)
            .bind(&record.source_type)
            .bind(&record.source_game_id)
            .bind(&record.home_team_source)
            .bind(&record.away_team_source)
            .bind(record.confidence_score as i16)
            .bind(record.match_type.as_str())
            .execute(pool)
            .await
            .with_context(|| {
                format!(
                    "Failed to upsert match {}:{} -> game {}",
                    record.source_type, record.source_game_id, record.schedule_game_id
                )
            })?;
            Ok(())
        })
        .await
    }

    async fn statistics(&self) -> Result<MatchStatistics> {
        let rows = sqlx::query_as::<_, SourceStatsRow>(
            r#"
            SELECT source_type,
                   COUNT(*) AS records,
                   AVG(confidence_score)::FLOAT8 AS mean_confidence,
                   COUNT(*) FILTER (WHERE confidence_score >= $1) AS high_confidence
            FROM game_matches
            GROUP BY source_type
            "#,
        )
        .bind(HIGH_CONFIDENCE as i16)
        .fetch_all(&self.pool)
        .await
        .context("Failed to read match statistics")?;

        Ok(MatchStatistics::from_source_totals(rows.into_iter().map(|r| {
            (
                r.source_type,
                r.records.max(0) as u64,
                r.mean_confidence.unwrap_or(0.0),
                r.high_confidence.max(0) as u64,
            )
        })))
    }
}

/// In-process match store with the same upsert-by-key semantics.
///
/// Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    records: Mutex<HashMap<MatchRecordKey, MatchRecord>>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn get(&self, key: &MatchRecordKey) -> Option<MatchRecord> {
        self.records.lock().get(key).cloned()
    }

    /// All records, ordered by key
    pub fn records(&self) -> Vec<MatchRecord> {
        let mut records: Vec<MatchRecord> = self.records.lock().values().cloned().collect();
        records.sort_by_key(|r| r.key());
        records
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn upsert(&self, record: &MatchRecord) -> Result<()> {
        self.records.lock().insert(record.key(), record.clone());
        Ok(())
    }

    async fn statistics(&self) -> Result<MatchStatistics> {
        let records = self.records.lock();
        Ok(MatchStatistics::from_records(records.values()))
    }
}
