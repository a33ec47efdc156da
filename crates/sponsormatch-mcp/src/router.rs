// crates/sponsormatch-mcp/src/router.rs
// ============================================================================
// Module: Tool Router
// Description: Dispatches a named tool call, with its declared scope, to the
//   match pipeline or to one of the administrative catalog operations.
// Purpose: The single place a deployment's transport (stdio, HTTP, whatever
//   an MCP host speaks) hands off to; everything past this point is plain
//   Rust, no protocol framing.
// Dependencies: sponsormatch-core, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`ToolRouter`] owns one [`MatchService`] plus the raw `Arc`-shared
//! adapters that service wraps. The match pipeline never sees the raw
//! adapters directly (it only holds private, boxed trait objects); the
//! administrative tools below bypass the pipeline and call the vector index
//! directly, because catalog mutation is not part of matching.
//!
//! `ArcEmbeddingProvider`, `ArcVectorIndex`, and `ArcAnalyticsStore` exist
//! only to let one `Arc<dyn Trait>` back both the boxed adapter a
//! `MatchService` owns and the `Arc` this router keeps for itself, without
//! adding any accessor to `sponsormatch-core` for adapters that crate
//! intentionally keeps private.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use serde_json::Value;
use time::Duration;
use time::OffsetDateTime;

use sponsormatch_core::error::MatchError;
use sponsormatch_core::filters::VectorFilter;
use sponsormatch_core::identifiers::CampaignId;
use sponsormatch_core::identifiers::CreativeId;
use sponsormatch_core::identifiers::MatchId;
use sponsormatch_core::interfaces::AnalyticsStore;
use sponsormatch_core::interfaces::AttributeFilter;
use sponsormatch_core::interfaces::CampaignReport;
use sponsormatch_core::interfaces::CollectionHandle;
use sponsormatch_core::interfaces::CollectionInfo;
use sponsormatch_core::interfaces::EmbeddingProvider;
use sponsormatch_core::interfaces::VectorIndex;
use sponsormatch_core::match_service::MatchService;
use sponsormatch_core::model::AnalyticsEvent;
use sponsormatch_core::model::CampaignStats;
use sponsormatch_core::model::CreativeRecord;
use sponsormatch_core::model::VectorHit;
use sponsormatch_core::model::KNOWN_PLACEMENTS;

use crate::envelope;
use crate::scope;
use crate::scope::ToolScope;

struct ArcEmbeddingProvider(Arc<dyn EmbeddingProvider + Send + Sync>);

impl EmbeddingProvider for ArcEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, MatchError> {
        self.0.embed(text)
    }
}

struct ArcVectorIndex(Arc<dyn VectorIndex + Send + Sync>);

impl VectorIndex for ArcVectorIndex {
    fn ensure_collection(
        &self,
        dimension: usize,
        model_id: &str,
        schema_version: u32,
    ) -> Result<CollectionHandle, MatchError> {
        self.0.ensure_collection(dimension, model_id, schema_version)
    }

    fn collection_info(&self) -> Result<CollectionInfo, MatchError> {
        self.0.collection_info()
    }

    fn delete_collection(&self) -> Result<(), MatchError> {
        self.0.delete_collection()
    }

    fn upsert(&self, items: &[(Vec<f32>, CreativeRecord)]) -> Result<(), MatchError> {
        self.0.upsert(items)
    }

    fn delete(&self, creative_id: &CreativeId) -> Result<(), MatchError> {
        self.0.delete(creative_id)
    }

    fn get(&self, creative_id: &CreativeId) -> Result<Option<CreativeRecord>, MatchError> {
        self.0.get(creative_id)
    }

    fn query(&self, vector: &[f32], filter: &VectorFilter, top_k: u32) -> Result<Vec<VectorHit>, MatchError> {
        self.0.query(vector, filter, top_k)
    }

    fn bulk_disable(&self, filter: &AttributeFilter) -> Result<u64, MatchError> {
        self.0.bulk_disable(filter)
    }
}

struct ArcAnalyticsStore(Arc<dyn AnalyticsStore + Send + Sync>);

impl AnalyticsStore for ArcAnalyticsStore {
    fn record_match(&self, event: &AnalyticsEvent) -> Result<(), MatchError> {
        self.0.record_match(event)
    }

    fn stats(
        &self,
        campaign_id: &CampaignId,
        since: Option<OffsetDateTime>,
        until: Option<OffsetDateTime>,
    ) -> Result<CampaignStats, MatchError> {
        self.0.stats(campaign_id, since, until)
    }

    fn recent_stats(&self, campaign_id: &CampaignId, window: Duration) -> Result<CampaignStats, MatchError> {
        self.0.recent_stats(campaign_id, window)
    }

    fn summary(&self, since: Option<OffsetDateTime>) -> Result<Vec<(CampaignId, CampaignStats)>, MatchError> {
        self.0.summary(since)
    }

    fn campaign_report(
        &self,
        campaign_id: &CampaignId,
        since: Option<OffsetDateTime>,
        until: Option<OffsetDateTime>,
    ) -> Result<CampaignReport, MatchError> {
        self.0.campaign_report(campaign_id, since, until)
    }
}

/// One creative to upsert: its embedding vector plus its catalog payload.
#[derive(Debug, Deserialize)]
struct UpsertItem {
    vector: Vec<f32>,
    creative: CreativeRecord,
}

/// Routes tool calls to the match pipeline or to the administrative catalog
/// operations, after checking the caller's declared scope against the tool's
/// required scope.
pub struct ToolRouter {
    service: MatchService,
    embedding: Arc<dyn EmbeddingProvider + Send + Sync>,
    index: Arc<dyn VectorIndex + Send + Sync>,
    max_top_k: u32,
}

impl ToolRouter {
    /// Builds a router over shared adapters. The same `embedding` and
    /// `index` instances back both the internal [`MatchService`] and this
    /// router's direct administrative calls.
    #[must_use]
    pub fn new(
        embedding: Arc<dyn EmbeddingProvider + Send + Sync>,
        index: Arc<dyn VectorIndex + Send + Sync>,
        analytics: Option<Arc<dyn AnalyticsStore + Send + Sync>>,
        max_top_k: u32,
        enable_result_cache: bool,
    ) -> Self {
        let service_analytics: Option<Box<dyn AnalyticsStore + Send + Sync>> =
            analytics.map(|store| Box::new(ArcAnalyticsStore(store)) as Box<dyn AnalyticsStore + Send + Sync>);
        let mut service = MatchService::new(
            Box::new(ArcEmbeddingProvider(Arc::clone(&embedding))),
            Box::new(ArcVectorIndex(Arc::clone(&index))),
            service_analytics,
            max_top_k,
        );
        if enable_result_cache {
            service = service.with_result_cache();
        }
        Self { service, embedding, index, max_top_k }
    }

    /// Dispatches one tool call. Returns [`MatchError::NotFound`] for an
    /// unrecognized tool name and [`MatchError::PermissionDenied`] when
    /// `held_scope` does not satisfy the tool's required scope.
    ///
    /// # Errors
    ///
    /// Propagates whatever the invoked handler returns.
    pub fn dispatch(&self, tool: &str, held_scope: ToolScope, params: Value) -> Result<Value, MatchError> {
        let required = scope::required_scope(tool)
            .ok_or_else(|| MatchError::NotFound(format!("unknown tool `{tool}`")))?;
        if !scope::satisfies(held_scope, required) {
            return Err(MatchError::PermissionDenied(format!(
                "tool `{tool}` requires administrative scope"
            )));
        }

        let outcome = match tool {
            "ads_match" => self.ads_match(params),
            "ads_explain" => self.ads_explain(&params),
            "ads_health" => self.ads_health(),
            "ads_capabilities" => self.ads_capabilities(),
            "ensure_collection" => self.ensure_collection(&params),
            "collection_info" => self.collection_info(),
            "upsert_batch" => self.upsert_batch(params),
            "delete_creative" => self.delete_creative(&params),
            "bulk_disable" => self.bulk_disable(&params),
            "get_creative" => self.get_creative(&params),
            _ => Err(MatchError::Internal(format!(
                "tool `{tool}` passed scope validation but has no dispatch handler"
            ))),
        };

        match &outcome {
            Ok(_) => tracing::info!(tool, outcome = "ok", "tool call completed"),
            Err(error) => tracing::warn!(tool, outcome = %error.kind(), "tool call failed"),
        }
        outcome
    }

    fn ads_match(&self, params: Value) -> Result<Value, MatchError> {
        let request = serde_json::from_value(params)
            .map_err(|error| MatchError::InvalidInput(format!("malformed match request: {error}")))?;
        let (response, _trace) = self.service.match_cached(request)?;
        tracing::info!(request_id = %response.request_id, outcome = "ok", "ads_match completed");
        Ok(envelope::shape_match_response(&response))
    }

    fn ads_explain(&self, params: &Value) -> Result<Value, MatchError> {
        let match_id_value = field(params, "match_id")?.clone();
        let match_id: MatchId = serde_json::from_value(match_id_value)
            .map_err(|error| MatchError::InvalidInput(format!("invalid match_id: {error}")))?;
        match self.service.explain(match_id) {
            Some(trace) => Ok(envelope::shape_audit_trace(&trace)),
            None => Err(MatchError::NotFound(format!("no trace for match_id {match_id}"))),
        }
    }

    fn ads_health(&self) -> Result<Value, MatchError> {
        let embedding_ok = self.embedding.embed("sponsormatch health probe").is_ok();
        let index_ok = self.index.collection_info().is_ok();
        Ok(json!({
            "status": if embedding_ok && index_ok { "ok" } else { "degraded" },
            "embedding_provider": embedding_ok,
            "vector_index": index_ok,
        }))
    }

    fn ads_capabilities(&self) -> Result<Value, MatchError> {
        let info = self.index.collection_info()?;
        Ok(json!({
            "placements": KNOWN_PLACEMENTS,
            "constraint_keys": [
                "topics",
                "verticals",
                "audience_segments",
                "keywords",
                "locale",
                "exclude_advertiser_ids",
                "exclude_campaign_ids",
                "exclude_creative_ids",
                "age_restricted_ok",
                "sensitive_ok",
            ],
            "embedding_model_id": info.model_id,
            "schema_version": info.schema_version,
            "max_top_k": self.max_top_k,
        }))
    }

    fn ensure_collection(&self, params: &Value) -> Result<Value, MatchError> {
        let dimension = usize::try_from(field_u64(params, "dimension")?)
            .map_err(|_| MatchError::InvalidInput("dimension out of range".to_string()))?;
        let model_id = field_str(params, "model_id")?;
        let schema_version = u32::try_from(field_u64(params, "schema_version")?)
            .map_err(|_| MatchError::InvalidInput("schema_version out of range".to_string()))?;
        let handle = self.index.ensure_collection(dimension, model_id, schema_version)?;
        Ok(envelope::shape_collection_handle(&handle))
    }

    fn collection_info(&self) -> Result<Value, MatchError> {
        let info = self.index.collection_info()?;
        Ok(envelope::shape_collection_info(&info))
    }

    fn upsert_batch(&self, params: Value) -> Result<Value, MatchError> {
        let items: Vec<UpsertItem> = serde_json::from_value(params)
            .map_err(|error| MatchError::InvalidInput(format!("malformed upsert batch: {error}")))?;
        let count = items.len();
        let items: Vec<(Vec<f32>, CreativeRecord)> =
            items.into_iter().map(|item| (item.vector, item.creative)).collect();
        self.index.upsert(&items)?;
        Ok(json!({ "upserted": count }))
    }

    fn delete_creative(&self, params: &Value) -> Result<Value, MatchError> {
        let creative_id = field_str(params, "creative_id")?;
        self.index.delete(&CreativeId::from(creative_id))?;
        Ok(json!({ "deleted": creative_id }))
    }

    fn bulk_disable(&self, params: &Value) -> Result<Value, MatchError> {
        let fields_value = field(params, "filter")?.clone();
        let fields: BTreeMap<String, Vec<String>> = serde_json::from_value(fields_value)
            .map_err(|error| MatchError::InvalidInput(format!("malformed filter: {error}")))?;
        let disabled = self.index.bulk_disable(&AttributeFilter { fields })?;
        Ok(json!({ "disabled": disabled }))
    }

    fn get_creative(&self, params: &Value) -> Result<Value, MatchError> {
        let creative_id = field_str(params, "creative_id")?;
        match self.index.get(&CreativeId::from(creative_id))? {
            Some(record) => Ok(envelope::shape_creative(Some(&record))),
            None => Err(MatchError::NotFound(format!("no creative `{creative_id}`"))),
        }
    }
}

fn field<'a>(params: &'a Value, name: &str) -> Result<&'a Value, MatchError> {
    params.get(name).ok_or_else(|| MatchError::InvalidInput(format!("missing `{name}`")))
}

fn field_str<'a>(params: &'a Value, name: &str) -> Result<&'a str, MatchError> {
    field(params, name)?.as_str().ok_or_else(|| MatchError::InvalidInput(format!("`{name}` must be a string")))
}

fn field_u64(params: &Value, name: &str) -> Result<u64, MatchError> {
    field(params, name)?
        .as_u64()
        .ok_or_else(|| MatchError::InvalidInput(format!("`{name}` must be a non-negative integer")))
}
