// crates/sponsormatch-store/src/analytics_store.rs
// ============================================================================
// Module: SQLite Analytics Store
// Description: AnalyticsStore implementation over a single campaign_events table.
// Purpose: Persist delivery events durably and answer the windowed aggregate
//   queries the pacing engine and campaign reporting depend on.
// Dependencies: sponsormatch-core, rusqlite, serde_json, time
// ============================================================================

//! ## Overview
//! One table, two indexes: `campaign_events(ts)` and
//! `campaign_events(campaign_id)`. Timestamps are stored as RFC 3339 text in
//! UTC, which sorts lexicographically the same as chronologically, so window
//! bounds are plain string comparisons.
//!
//! Invariants:
//! - `record_match` is append-only; no row is ever updated or deleted.
//! - All timestamp comparisons are against UTC RFC 3339 text.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::params;
use thiserror::Error;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use sponsormatch_core::error::MatchError;
use sponsormatch_core::identifiers::CampaignId;
use sponsormatch_core::identifiers::CreativeId;
use sponsormatch_core::interfaces::AnalyticsStore;
use sponsormatch_core::interfaces::CampaignReport;
use sponsormatch_core::model::AnalyticsEvent;
use sponsormatch_core::model::CampaignStats;

/// Default busy timeout applied to the underlying connection.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Errors specific to the SQLite-backed store, before translation to [`MatchError`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying SQLite driver returned an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Event metadata could not be serialized or a stored row could not be parsed back.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A stored timestamp was not valid RFC 3339.
    #[error("invalid stored timestamp: {0}")]
    InvalidTimestamp(String),
}

impl From<StoreError> for MatchError {
    fn from(error: StoreError) -> Self {
        Self::UnavailableDependency(error.to_string())
    }
}

/// Durable [`AnalyticsStore`] backed by a single SQLite connection in WAL mode.
pub struct SqliteAnalyticsStore {
    connection: Mutex<Connection>,
}

impl SqliteAnalyticsStore {
    /// Opens (creating if absent) the store at `path`, applying WAL mode and
    /// the busy timeout, and ensuring the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] if the database cannot be
    /// opened or the schema cannot be created.
    pub fn open(path: &Path) -> Result<Self, MatchError> {
        let connection = Connection::open(path).map_err(StoreError::from)?;
        Self::configure(&connection)?;
        tracing::info!(path = %path.display(), "opened sqlite analytics store");
        Ok(Self { connection: Mutex::new(connection) })
    }

    /// Opens an in-memory store, useful for tests and ephemeral deployments.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, MatchError> {
        let connection = Connection::open_in_memory().map_err(StoreError::from)?;
        Self::configure(&connection)?;
        Ok(Self { connection: Mutex::new(connection) })
    }

    fn configure(connection: &Connection) -> Result<(), MatchError> {
        connection.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;").map_err(StoreError::from)?;
        connection
            .busy_timeout(std::time::Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
            .map_err(StoreError::from)?;
        connection
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS campaign_events (
                    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    ts TEXT NOT NULL,
                    request_id TEXT NOT NULL,
                    placement TEXT NOT NULL,
                    campaign_id TEXT NOT NULL,
                    creative_id TEXT NOT NULL,
                    score REAL NOT NULL,
                    pacing_weight REAL NOT NULL,
                    cost REAL NOT NULL,
                    metadata TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_campaign_events_ts ON campaign_events(ts);
                CREATE INDEX IF NOT EXISTS idx_campaign_events_campaign_id ON campaign_events(campaign_id);",
            )
            .map_err(StoreError::from)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.connection.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn format_rfc3339(ts: OffsetDateTime) -> Result<String, StoreError> {
    ts.format(&Rfc3339).map_err(|err| StoreError::InvalidTimestamp(err.to_string()))
}

fn stats_query(
    connection: &Connection,
    campaign_id: &CampaignId,
    since: Option<OffsetDateTime>,
    until: Option<OffsetDateTime>,
) -> Result<CampaignStats, StoreError> {
    let mut sql = String::from(
        "SELECT COUNT(*), COALESCE(SUM(cost), 0.0), COALESCE(AVG(score), 0.0), COALESCE(AVG(pacing_weight), 0.0) \
         FROM campaign_events WHERE campaign_id = ?1",
    );
    let since_text = since.map(format_rfc3339).transpose()?;
    let until_text = until.map(format_rfc3339).transpose()?;
    if since_text.is_some() {
        sql.push_str(" AND ts >= ?2");
    }
    if until_text.is_some() {
        sql.push_str(if since_text.is_some() { " AND ts <= ?3" } else { " AND ts <= ?2" });
    }

    let mut statement = connection.prepare(&sql)?;
    let (impressions_raw, spend, avg_score, avg_pacing_weight): (i64, f64, f64, f64) = match (&since_text, &until_text)
    {
        (Some(since), Some(until)) => {
            statement.query_row(params![campaign_id.as_str(), since, until], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
        }
        (Some(since), None) => {
            statement.query_row(params![campaign_id.as_str(), since], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
        }
        (None, Some(until)) => {
            statement.query_row(params![campaign_id.as_str(), until], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
        }
        (None, None) => {
            statement.query_row(params![campaign_id.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
        }
    };
    let impressions = u64::try_from(impressions_raw).unwrap_or(0);

    Ok(CampaignStats { impressions, spend, avg_score, avg_pacing_weight, window_start: since, window_end: until })
}

impl AnalyticsStore for SqliteAnalyticsStore {
    fn record_match(&self, event: &AnalyticsEvent) -> Result<(), MatchError> {
        let connection = self.lock();
        let ts = format_rfc3339(event.ts).map_err(MatchError::from)?;
        let metadata = serde_json::to_string(&event.metadata).map_err(StoreError::from).map_err(MatchError::from)?;
        connection
            .execute(
                "INSERT INTO campaign_events
                    (ts, request_id, placement, campaign_id, creative_id, score, pacing_weight, cost, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    ts,
                    event.request_id.to_string(),
                    event.placement,
                    event.campaign_id.as_str(),
                    event.creative_id.as_str(),
                    event.score,
                    event.pacing_weight,
                    event.cost,
                    metadata,
                ],
            )
            .map_err(StoreError::from)?;
        tracing::debug!(campaign_id = %event.campaign_id, creative_id = %event.creative_id, "recorded match event");
        Ok(())
    }

    fn stats(
        &self,
        campaign_id: &CampaignId,
        since: Option<OffsetDateTime>,
        until: Option<OffsetDateTime>,
    ) -> Result<CampaignStats, MatchError> {
        let connection = self.lock();
        stats_query(&connection, campaign_id, since, until).map_err(MatchError::from)
    }

    fn recent_stats(&self, campaign_id: &CampaignId, window: Duration) -> Result<CampaignStats, MatchError> {
        let since = OffsetDateTime::now_utc() - window;
        self.stats(campaign_id, Some(since), None)
    }

    fn summary(&self, since: Option<OffsetDateTime>) -> Result<Vec<(CampaignId, CampaignStats)>, MatchError> {
        let connection = self.lock();
        let since_text = since.map(format_rfc3339).transpose().map_err(MatchError::from)?;
        let mut sql = String::from(
            "SELECT campaign_id, COUNT(*), COALESCE(SUM(cost), 0.0), COALESCE(AVG(score), 0.0), \
             COALESCE(AVG(pacing_weight), 0.0) FROM campaign_events",
        );
        if since_text.is_some() {
            sql.push_str(" WHERE ts >= ?1");
        }
        sql.push_str(" GROUP BY campaign_id ORDER BY SUM(cost) DESC");

        let mut statement = connection.prepare(&sql).map_err(StoreError::from)?;
        let rows = if let Some(since) = &since_text {
            statement
                .query_map(params![since], row_to_campaign_summary)
                .map_err(StoreError::from)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from)?
        } else {
            statement
                .query_map([], row_to_campaign_summary)
                .map_err(StoreError::from)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from)?
        };

        Ok(rows
            .into_iter()
            .map(|(campaign_id, impressions, spend, avg_score, avg_pacing_weight)| {
                (
                    CampaignId::new(campaign_id),
                    CampaignStats {
                        impressions: u64::try_from(impressions).unwrap_or(0),
                        spend,
                        avg_score,
                        avg_pacing_weight,
                        window_start: since,
                        window_end: None,
                    },
                )
            })
            .collect())
    }

    fn campaign_report(
        &self,
        campaign_id: &CampaignId,
        since: Option<OffsetDateTime>,
        until: Option<OffsetDateTime>,
    ) -> Result<CampaignReport, MatchError> {
        let connection = self.lock();
        let stats = stats_query(&connection, campaign_id, since, until).map_err(MatchError::from)?;

        let mut sql = String::from(
            "SELECT creative_id, COUNT(*) AS impressions FROM campaign_events WHERE campaign_id = ?1",
        );
        let since_text = since.map(format_rfc3339).transpose().map_err(MatchError::from)?;
        let until_text = until.map(format_rfc3339).transpose().map_err(MatchError::from)?;
        if since_text.is_some() {
            sql.push_str(" AND ts >= ?2");
        }
        if until_text.is_some() {
            sql.push_str(if since_text.is_some() { " AND ts <= ?3" } else { " AND ts <= ?2" });
        }
        sql.push_str(" GROUP BY creative_id ORDER BY impressions DESC LIMIT 5");

        let mut statement = connection.prepare(&sql).map_err(StoreError::from)?;
        let top_creatives: Vec<(String, i64)> = match (&since_text, &until_text) {
            (Some(since), Some(until)) => statement
                .query_map(params![campaign_id.as_str(), since, until], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(StoreError::from)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from)?,
            (Some(since), None) => statement
                .query_map(params![campaign_id.as_str(), since], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(StoreError::from)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from)?,
            (None, Some(until)) => statement
                .query_map(params![campaign_id.as_str(), until], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(StoreError::from)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from)?,
            (None, None) => statement
                .query_map(params![campaign_id.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(StoreError::from)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from)?,
        };

        Ok(CampaignReport {
            stats,
            top_creatives: top_creatives
                .into_iter()
                .map(|(id, count)| (CreativeId::new(id), u64::try_from(count).unwrap_or(0)))
                .collect(),
        })
    }
}

fn row_to_campaign_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, i64, f64, f64, f64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "Test-only setup uses expect for clarity.")]

    use super::*;
    use sponsormatch_core::identifiers::RequestId;

    fn event(campaign_id: &str, creative_id: &str, cost: f64, ts: OffsetDateTime) -> AnalyticsEvent {
        AnalyticsEvent {
            ts,
            request_id: RequestId::generate(),
            placement: "inline".to_string(),
            campaign_id: CampaignId::new(campaign_id),
            creative_id: CreativeId::new(creative_id),
            score: 0.8,
            pacing_weight: 1.0,
            cost,
            metadata: serde_json::json!({"pacing_reason": "within_budget"}),
        }
    }

    #[test]
    fn record_and_read_back_stats() {
        let store = SqliteAnalyticsStore::open_in_memory().expect("open");
        let now = OffsetDateTime::now_utc();
        store.record_match(&event("camp1", "c1", 1.0, now)).expect("record");
        store.record_match(&event("camp1", "c2", 2.0, now)).expect("record");

        let stats = store.stats(&CampaignId::new("camp1"), None, None).expect("stats");
        assert_eq!(stats.impressions, 2);
        assert!((stats.spend - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_respects_since_window() {
        let store = SqliteAnalyticsStore::open_in_memory().expect("open");
        let past = OffsetDateTime::now_utc() - Duration::hours(2);
        let now = OffsetDateTime::now_utc();
        store.record_match(&event("camp1", "c1", 1.0, past)).expect("record");
        store.record_match(&event("camp1", "c2", 1.0, now)).expect("record");

        let stats = store.stats(&CampaignId::new("camp1"), Some(now - Duration::hours(1)), None).expect("stats");
        assert_eq!(stats.impressions, 1);
    }

    #[test]
    fn campaign_report_ranks_top_creatives_by_impressions() {
        let store = SqliteAnalyticsStore::open_in_memory().expect("open");
        let now = OffsetDateTime::now_utc();
        for _ in 0..3 {
            store.record_match(&event("camp1", "c1", 1.0, now)).expect("record");
        }
        store.record_match(&event("camp1", "c2", 1.0, now)).expect("record");

        let report = store.campaign_report(&CampaignId::new("camp1"), None, None).expect("report");
        assert_eq!(report.stats.impressions, 4);
        assert_eq!(report.top_creatives[0].0, CreativeId::new("c1"));
        assert_eq!(report.top_creatives[0].1, 3);
    }

    #[test]
    fn summary_orders_campaigns_by_spend_descending() {
        let store = SqliteAnalyticsStore::open_in_memory().expect("open");
        let now = OffsetDateTime::now_utc();
        store.record_match(&event("camp_low", "c1", 1.0, now)).expect("record");
        store.record_match(&event("camp_high", "c2", 10.0, now)).expect("record");

        let summary = store.summary(None).expect("summary");
        assert_eq!(summary[0].0, CampaignId::new("camp_high"));
    }
}
