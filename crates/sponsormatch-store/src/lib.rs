// crates/sponsormatch-store/src/lib.rs
// ============================================================================
// Module: SponsorMatch SQLite Store
// Description: Durable AnalyticsStore backed by SQLite in WAL mode.
// Purpose: Give a deployment a real append-log for delivery events without
//   coupling the core to any particular database.
// Dependencies: sponsormatch-core, rusqlite, serde_json, time
// ============================================================================

//! ## Overview
//! A single `campaign_events` table, append-only from the core's point of
//! view, with the windowed aggregate queries the pacing engine and campaign
//! reporting need. No writer-queue thread and no hash-chain integrity layer:
//! a single connection behind a mutex is sufficient for this component's
//! write volume, and durability is delegated entirely to SQLite's WAL mode.

pub mod analytics_store;

pub use analytics_store::SqliteAnalyticsStore;
pub use analytics_store::StoreError;
