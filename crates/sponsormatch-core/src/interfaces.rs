// crates/sponsormatch-core/src/interfaces.rs
// ============================================================================
// Module: Capability Interfaces
// Description: The core's contracts with its external collaborators.
// Purpose: Let the match service depend only on explicit capability traits;
//   concrete adapters are constructed in one composition root.
// Dependencies: sponsormatch-core::model, sponsormatch-core::error
// ============================================================================

//! ## Overview
//! Three ports: [`EmbeddingProvider`], [`VectorIndex`], [`AnalyticsStore`].
//! Each method set corresponds to one runtime protocol type in the original
//! source; here they are explicit traits so the service's dependency is
//! statically checked and its adapters are swappable at the composition root.
//!
//! Invariants:
//! - Every fallible method returns [`MatchError`]; adapters translate their
//!   own failures (transport, serialization, driver errors) at the boundary.
//! - [`VectorIndex::query`] implementations MUST further constrain the query
//!   to `enabled != false`.

use time::Duration;
use time::OffsetDateTime;

use crate::error::MatchError;
use crate::filters::VectorFilter;
use crate::identifiers::CampaignId;
use crate::identifiers::CreativeId;
use crate::model::AnalyticsEvent;
use crate::model::CampaignStats;
use crate::model::CreativeRecord;
use crate::model::VectorHit;

/// Text-to-vector embedding capability. Deterministic given the same text and
/// model id; no required batch interface (batched ingestion is out of scope).
pub trait EmbeddingProvider {
    /// Embeds `text` into the provider's vector space.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn embed(&self, text: &str) -> Result<Vec<f32>, MatchError>;
}

/// Outcome of [`VectorIndex::ensure_collection`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionHandle {
    /// The collection's name.
    pub name: String,
    /// Whether this call created the collection (false if it already existed).
    pub created: bool,
    /// Vector dimensionality.
    pub dimension: usize,
    /// Embedding model identifier the collection is keyed to.
    pub model_id: String,
    /// Schema/payload version the collection was created with.
    pub schema_version: u32,
}

/// Snapshot of a collection's state, per [`VectorIndex::collection_info`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    /// The collection's name.
    pub name: String,
    /// Vector dimensionality.
    pub dimension: usize,
    /// Embedding model identifier the collection is keyed to.
    pub model_id: String,
    /// Schema/payload version.
    pub schema_version: u32,
    /// Total stored points.
    pub points_count: u64,
    /// Points with a fully built vector index (may lag `points_count`).
    pub indexed_vectors_count: u64,
    /// Adapter-reported health/status tag.
    pub status: String,
}

/// A flat attribute match used by [`VectorIndex::bulk_disable`]: each key maps
/// to either a single value or a list of acceptable values.
#[derive(Debug, Clone, Default)]
pub struct AttributeFilter {
    /// Field name to scalar-or-list acceptable values.
    pub fields: std::collections::BTreeMap<String, Vec<String>>,
}

/// Vector catalog capability: upsert, delete, filtered k-NN query, and the
/// administrative operations that are the only path creatives enter or leave
/// the catalog by.
pub trait VectorIndex {
    /// Idempotently ensures the backing collection exists with the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn ensure_collection(
        &self,
        dimension: usize,
        model_id: &str,
        schema_version: u32,
    ) -> Result<CollectionHandle, MatchError>;

    /// Returns the collection's current state.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn collection_info(&self) -> Result<CollectionInfo, MatchError>;

    /// Deletes the entire collection.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn delete_collection(&self) -> Result<(), MatchError>;

    /// Inserts or overwrites creatives, keyed by a stable content-derived id.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn upsert(&self, items: &[(Vec<f32>, CreativeRecord)]) -> Result<(), MatchError>;

    /// Removes a single creative.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn delete(&self, creative_id: &CreativeId) -> Result<(), MatchError>;

    /// Fetches a single creative's payload, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn get(&self, creative_id: &CreativeId) -> Result<Option<CreativeRecord>, MatchError>;

    /// Runs a filtered k-NN query. Implementations MUST further constrain the
    /// query to `enabled != false`, regardless of what `filter` expresses.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure, or
    /// [`MatchError::InvalidInput`] when `filter` uses an operator this
    /// adapter cannot express faithfully (see `all_of`).
    fn query(&self, vector: &[f32], filter: &VectorFilter, top_k: u32) -> Result<Vec<VectorHit>, MatchError>;

    /// Sets `enabled = false` on every creative matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn bulk_disable(&self, filter: &AttributeFilter) -> Result<u64, MatchError>;
}

/// Durable append-log capability with windowed aggregate queries.
pub trait AnalyticsStore {
    /// Appends one delivery event.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn record_match(&self, event: &AnalyticsEvent) -> Result<(), MatchError>;

    /// Returns aggregate stats for `campaign_id`, optionally windowed.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn stats(
        &self,
        campaign_id: &CampaignId,
        since: Option<OffsetDateTime>,
        until: Option<OffsetDateTime>,
    ) -> Result<CampaignStats, MatchError>;

    /// Returns stats for the trailing `window` ending now.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn recent_stats(&self, campaign_id: &CampaignId, window: Duration) -> Result<CampaignStats, MatchError>;

    /// Returns per-campaign aggregates since `since`, ordered by spend descending.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn summary(&self, since: Option<OffsetDateTime>) -> Result<Vec<(CampaignId, CampaignStats)>, MatchError>;

    /// Returns `stats` plus the top five creatives by impression count.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnavailableDependency`] on transport failure.
    fn campaign_report(
        &self,
        campaign_id: &CampaignId,
        since: Option<OffsetDateTime>,
        until: Option<OffsetDateTime>,
    ) -> Result<CampaignReport, MatchError>;
}

/// The aggregate stats plus top creatives returned by [`AnalyticsStore::campaign_report`].
#[derive(Debug, Clone)]
pub struct CampaignReport {
    /// The campaign's aggregate stats for the queried window.
    pub stats: CampaignStats,
    /// Up to five creatives, ordered by impression count descending.
    pub top_creatives: Vec<(CreativeId, u64)>,
}
