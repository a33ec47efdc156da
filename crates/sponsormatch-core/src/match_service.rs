// crates/sponsormatch-core/src/match_service.rs
// ============================================================================
// Module: Match Service
// Description: The orchestrator tying every component into one ordered
//   pipeline.
// Purpose: Turn a match request into a ranked, policy-safe, budget-paced
//   candidate list plus an auditable decision trace, and nothing else calls
//   the embedding provider, vector index, or analytics store directly.
// Dependencies: sponsormatch-core (filters, targeting, policy, pacing, boost,
//   audit, cache, interfaces, model, identifiers, error)
// ============================================================================

//! ## Overview
//! The only component that calls every other component. Stages run strictly
//! sequentially within one request; the service places no internal fan-out
//! across creatives. See the module-level invariants on each collaborator
//! for the contracts this orchestrator relies on.
//!
//! Invariants:
//! - `0.0 <= candidate.score <= 1.0` for every candidate in every response.
//! - `candidate.match_id == MatchId::derive(request_id, candidate.creative_id)`.
//! - The response order is the index's return order with pacing-denied hits
//!   removed; candidates are never re-sorted by final score.
//! - A policy-denied hit never reaches the pacing engine and never produces
//!   an analytics event.

use std::collections::BTreeMap;

use serde_json::json;
use time::OffsetDateTime;

use crate::audit::AuditTraceStore;
use crate::boost::compute_boost;
use crate::cache::new_embedding_cache;
use crate::cache::new_result_cache;
use crate::cache::sha256_hex;
use crate::cache::EmbeddingCache;
use crate::cache::ResultCache;
use crate::error::MatchError;
use crate::identifiers::MatchId;
use crate::identifiers::RequestId;
use crate::interfaces::AnalyticsStore;
use crate::interfaces::EmbeddingProvider;
use crate::interfaces::VectorIndex;
use crate::model::AnalyticsEvent;
use crate::model::AuditTrace;
use crate::model::Candidate;
use crate::model::DecisionRecord;
use crate::model::MatchConstraints;
use crate::model::MatchRequest;
use crate::model::MatchResponse;
use crate::model::PlacementContext;
use crate::pacing::PacingEngine;
use crate::policy::PolicyEngine;
use crate::targeting::TargetingEngine;

/// Maximum accepted `MatchRequest::context_text` length, in characters.
pub const MAX_CONTEXT_TEXT_LEN: usize = 10_000;
/// Minimum accepted `MatchRequest::top_k`.
pub const MIN_TOP_K: u32 = 1;
/// Maximum accepted `MatchRequest::top_k`.
pub const MAX_TOP_K: u32 = 100;
/// Normalized context length below which a warning is appended.
const SHORT_CONTEXT_WARNING_THRESHOLD: usize = 20;

/// Orchestrates one match request end to end.
///
/// # Invariants
/// - Depends only on the [`EmbeddingProvider`], [`VectorIndex`], and
///   [`AnalyticsStore`] capability traits; adapters are supplied at
///   construction.
pub struct MatchService {
    embedding: Box<dyn EmbeddingProvider + Send + Sync>,
    index: Box<dyn VectorIndex + Send + Sync>,
    analytics: Option<Box<dyn AnalyticsStore + Send + Sync>>,
    embedding_cache: EmbeddingCache,
    result_cache: Option<ResultCache>,
    audit_store: AuditTraceStore,
    max_top_k: u32,
}

impl MatchService {
    /// Builds a service with the given adapters and a configured `max_top_k`
    /// retrieval ceiling. The result cache is disabled by default; enable it
    /// with [`MatchService::with_result_cache`].
    #[must_use]
    pub fn new(
        embedding: Box<dyn EmbeddingProvider + Send + Sync>,
        index: Box<dyn VectorIndex + Send + Sync>,
        analytics: Option<Box<dyn AnalyticsStore + Send + Sync>>,
        max_top_k: u32,
    ) -> Self {
        Self {
            embedding,
            index,
            analytics,
            embedding_cache: new_embedding_cache(),
            result_cache: None,
            audit_store: AuditTraceStore::new(),
            max_top_k,
        }
    }

    /// Enables the advisory match-result cache.
    #[must_use]
    pub fn with_result_cache(mut self) -> Self {
        self.result_cache = Some(new_result_cache());
        self
    }

    /// Resolves a previously returned match identifier to its decision
    /// trace. Returns `None`, never an error, when the identifier is unknown
    /// or has been evicted.
    #[must_use]
    pub fn explain(&self, match_id: MatchId) -> Option<AuditTrace> {
        self.audit_store.get(match_id)
    }

    /// Runs the full match pipeline, consulting and populating the result
    /// cache if one is configured.
    ///
    /// # Errors
    ///
    /// See [`MatchService::match_request`].
    pub fn match_cached(&self, request: MatchRequest) -> Result<(MatchResponse, AuditTrace), MatchError> {
        let Some(result_cache) = &self.result_cache else {
            return self.match_request(request);
        };

        let normalized = normalize_context(&request.context_text);
        let fingerprint = result_fingerprint(&normalized, &request);
        if let Some((response, mut trace)) = result_cache.peek(&fingerprint) {
            trace.source = Some("cache".to_string());
            return Ok((response, trace));
        }

        let (response, trace) = self.match_request(request)?;
        result_cache.insert(fingerprint, (response.clone(), trace.clone()));
        Ok((response, trace))
    }

    /// Runs the full match pipeline: identify, normalize, embed, build the
    /// filter, retrieve, policy-filter, pace and rank, record analytics,
    /// assemble the response, and persist the trace.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidInput`] on a malformed request,
    /// [`MatchError::UnavailableDependency`] if the embedding provider,
    /// index, or analytics store fails.
    pub fn match_request(&self, request: MatchRequest) -> Result<(MatchResponse, AuditTrace), MatchError> {
        // 1. Identify.
        let request_id = RequestId::generate();

        validate_top_k(request.top_k)?;
        if request.context_text.chars().count() > MAX_CONTEXT_TEXT_LEN {
            return Err(MatchError::InvalidInput(format!(
                "context_text exceeds {MAX_CONTEXT_TEXT_LEN} characters"
            )));
        }

        // 2. Normalize.
        let normalized = normalize_context(&request.context_text);
        if normalized.is_empty() {
            return Err(MatchError::InvalidInput("context_text is empty after normalization".to_string()));
        }

        // 3. Embed (through cache).
        let vector = self.embed(&normalized)?;

        // 4. Filter build.
        let filter = TargetingEngine::build_filter(&request.constraints);

        // 5. Retrieve.
        let effective_top_k = request.top_k.min(self.max_top_k);
        let hits = self.index.query(&vector, &filter, effective_top_k)?;

        // 6. Policy filter.
        let now = OffsetDateTime::now_utc();
        let mut decisions: Vec<DecisionRecord> = Vec::with_capacity(hits.len());
        let mut eligible = Vec::with_capacity(hits.len());
        let mut constraint_impact: BTreeMap<String, u32> = BTreeMap::new();

        for hit in hits {
            let decision =
                PolicyEngine::evaluate(&hit.payload, &request.constraints, &request.context_text, now);
            if decision.allowed {
                eligible.push(hit);
            } else {
                let rule = decision.reason.trim_start_matches("denied: ").to_string();
                *constraint_impact.entry(rule).or_insert(0) += 1;
                decisions.push(DecisionRecord {
                    creative_id: hit.payload.creative_id,
                    campaign_id: hit.payload.campaign_id,
                    advertiser_id: hit.payload.advertiser_id,
                    raw_score: hit.score,
                    reason: decision.reason,
                    match_id: None,
                    pacing_weight: None,
                    boost_applied: None,
                });
            }
        }

        // 7. Rank and pace; 8. Record.
        let mut candidates = Vec::with_capacity(eligible.len());
        for hit in eligible.iter() {
            let pacing = PacingEngine::evaluate(&hit.payload, self.analytics.as_deref(), now)?;
            if !pacing.admitted {
                *constraint_impact.entry("pacing".to_string()).or_insert(0) += 1;
                decisions.push(DecisionRecord {
                    creative_id: hit.payload.creative_id.clone(),
                    campaign_id: hit.payload.campaign_id.clone(),
                    advertiser_id: hit.payload.advertiser_id.clone(),
                    raw_score: hit.score,
                    reason: format!("pacing:{}", pacing.reason.as_str()),
                    match_id: None,
                    pacing_weight: None,
                    boost_applied: None,
                });
                continue;
            }

            let boost = compute_boost(&hit.payload, &request.boost);
            let score = (hit.score * pacing.weight * boost).clamp(0.0, 1.0);
            let match_id = MatchId::derive(request_id, &hit.payload.creative_id);

            if let Some(analytics) = &self.analytics {
                let event = AnalyticsEvent {
                    ts: now,
                    request_id,
                    placement: request.placement.placement.clone(),
                    campaign_id: hit.payload.campaign_id.clone(),
                    creative_id: hit.payload.creative_id.clone(),
                    score,
                    pacing_weight: pacing.weight,
                    cost: hit.payload.cpm / 1000.0,
                    metadata: json!({
                        "pacing_reason": pacing.reason.as_str(),
                        "boost_applied": boost,
                    }),
                };
                analytics.record_match(&event)?;
            }

            decisions.push(DecisionRecord {
                creative_id: hit.payload.creative_id.clone(),
                campaign_id: hit.payload.campaign_id.clone(),
                advertiser_id: hit.payload.advertiser_id.clone(),
                raw_score: hit.score,
                reason: "allowed".to_string(),
                match_id: Some(match_id),
                pacing_weight: Some(pacing.weight),
                boost_applied: Some(boost),
            });

            candidates.push(Candidate {
                creative_id: hit.payload.creative_id.clone(),
                campaign_id: hit.payload.campaign_id.clone(),
                advertiser_id: hit.payload.advertiser_id.clone(),
                campaign_name: hit.payload.campaign_name.clone(),
                title: hit.payload.title.clone(),
                body: hit.payload.body.clone(),
                cta_text: hit.payload.cta_text.clone(),
                landing_url: hit.payload.landing_url.clone(),
                score,
                match_id,
                pacing_weight: pacing.weight,
                pacing_reason: pacing.reason.as_str().to_string(),
                boost_applied: boost,
            });
        }

        // 9. Warnings.
        let mut warnings = Vec::new();
        if normalized.chars().count() < SHORT_CONTEXT_WARNING_THRESHOLD {
            warnings.push("context_text too short".to_string());
        }
        if !eligible.is_empty() && candidates.is_empty() {
            warnings.push("all paced".to_string());
        }

        // 10. Assemble and persist.
        let response = MatchResponse {
            candidates: candidates.clone(),
            request_id,
            placement: request.placement.clone(),
            warnings,
            constraint_impact,
        };
        let trace = AuditTrace {
            request_id,
            placement: request.placement,
            context_prefix: crate::model::context_prefix(&normalized),
            constraints: request.constraints,
            boost: request.boost,
            decisions,
            source: None,
        };
        for candidate in &candidates {
            self.audit_store.insert(candidate.match_id, trace.clone());
        }

        // 11. Return.
        Ok((response, trace))
    }

    fn embed(&self, normalized: &str) -> Result<Vec<f32>, MatchError> {
        let key = sha256_hex(normalized);
        if let Some(vector) = self.embedding_cache.peek(&key) {
            return Ok(vector);
        }
        let vector = self.embedding.embed(normalized)?;
        self.embedding_cache.insert(key, vector.clone());
        Ok(vector)
    }
}

fn validate_top_k(top_k: u32) -> Result<(), MatchError> {
    if !(MIN_TOP_K..=MAX_TOP_K).contains(&top_k) {
        return Err(MatchError::InvalidInput(format!(
            "top_k must be in [{MIN_TOP_K}, {MAX_TOP_K}], got {top_k}"
        )));
    }
    Ok(())
}

/// Strips surrounding whitespace and collapses internal whitespace runs to a
/// single space.
#[must_use]
pub fn normalize_context(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical fingerprint over the fields the result cache keys on:
/// normalized context, top_k, placement, surface, constraints, boost map.
fn result_fingerprint(normalized: &str, request: &MatchRequest) -> String {
    #[derive(serde::Serialize)]
    struct Fingerprint<'a> {
        context: &'a str,
        top_k: u32,
        placement: &'a PlacementContext,
        constraints: &'a MatchConstraints,
        boost: &'a BTreeMap<String, f64>,
    }
    let encoded = serde_json::to_string(&Fingerprint {
        context: normalized,
        top_k: request.top_k,
        placement: &request.placement,
        constraints: &request.constraints,
        boost: &request.boost,
    })
    .unwrap_or_default();
    sha256_hex(&encoded)
}
