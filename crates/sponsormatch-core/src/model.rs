// crates/sponsormatch-core/src/model.rs
// ============================================================================
// Module: SponsorMatch Data Model
// Description: The core entities exchanged between the match pipeline and
//   its collaborators.
// Purpose: Typed, serializable request/response and catalog shapes shared by
//   every component.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Every entity named in the system overview: the creative record stored in
//! the vector index, the per-request constraints and placement context, the
//! filter-shaped query result, the response-shaped candidate, the request
//! and response envelopes, the audit trace and its decision records, and the
//! analytics event and campaign stats shapes.
//!
//! Invariants:
//! - `CreativeRecord::enabled` defaults `true` when absent from a payload.
//! - List fields on [`CreativeRecord`] are unordered sets in all but name.
//! - `AuditTrace::context_prefix` never exceeds 500 characters.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::identifiers::AdvertiserId;
use crate::identifiers::CampaignId;
use crate::identifiers::CreativeId;
use crate::identifiers::MatchId;
use crate::identifiers::RequestId;

/// Delivery pacing strategy for a campaign's budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// Spend evenly against the daily budget over the day.
    Even,
    /// Allow over-spend against the expected elapsed-fraction budget.
    Accelerated,
    /// Like even, but additionally throttled by recent engagement.
    Adaptive,
}

impl Default for PacingMode {
    fn default() -> Self {
        Self::Even
    }
}

/// The unit stored in the vector index: one creative within a campaign.
///
/// # Invariants
/// - `creative_id`, `campaign_id`, `advertiser_id` are never empty.
/// - `enabled` defaults to `true` when the payload omits it.
/// - `start_at` / `end_at`, when present, are normalized to UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeRecord {
    /// Identifier of this creative.
    pub creative_id: CreativeId,
    /// Identifier of the owning campaign.
    pub campaign_id: CampaignId,
    /// Identifier of the owning advertiser.
    pub advertiser_id: AdvertiserId,

    /// Renderable headline.
    pub title: String,
    /// Renderable body copy.
    pub body: String,
    /// Renderable call-to-action label.
    pub cta_text: String,
    /// Destination URL.
    pub landing_url: String,
    /// Human-readable campaign name, surfaced alongside the creative.
    pub campaign_name: String,
    /// Optional long-form body, not required for matching.
    #[serde(default)]
    pub description: Option<String>,
    /// Last modification timestamp, not required for matching.
    #[serde(default)]
    pub updated_at: Option<OffsetDateTime>,

    /// Topic tags this creative targets.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Locales this creative is eligible in; empty string means "global".
    #[serde(default)]
    pub locales: Vec<String>,
    /// Vertical/category tags.
    #[serde(default)]
    pub verticals: Vec<String>,
    /// Audience segment tags.
    #[serde(default)]
    pub audience_segments: Vec<String>,
    /// Context keywords this creative is relevant to (informational).
    #[serde(default)]
    pub context_keywords: Vec<String>,
    /// Keywords whose presence in the request context disqualifies this creative.
    #[serde(default)]
    pub blocked_keywords: Vec<String>,

    /// Whether this creative requires age-restricted placements.
    #[serde(default)]
    pub sensitive: bool,
    /// Whether this creative is age-restricted.
    #[serde(default)]
    pub age_restricted: bool,
    /// Brand-safety tier, informational.
    #[serde(default)]
    pub brand_safety_tier: Option<String>,

    /// Schedule start; unset means unbounded in the past.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_at: Option<OffsetDateTime>,
    /// Schedule end; unset means unbounded in the future.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_at: Option<OffsetDateTime>,

    /// Total campaign budget, in the campaign's currency; `None` means unbounded.
    #[serde(default)]
    pub total_budget: Option<f64>,
    /// Daily campaign budget; `None` means unbounded.
    #[serde(default)]
    pub daily_budget: Option<f64>,
    /// Currency code for the budget fields.
    #[serde(default)]
    pub currency: Option<String>,
    /// Pacing strategy.
    #[serde(default)]
    pub pacing_mode: PacingMode,
    /// Cost per thousand impressions.
    pub cpm: f64,
    /// Optional target engagement rate used by adaptive pacing.
    #[serde(default)]
    pub target_engagement_rate: Option<f64>,

    /// Whether this creative is eligible to be retrieved at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Declarative, per-request targeting constraints.
///
/// # Invariants
/// - Carries no `enabled` toggle; constraints are purely declarative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchConstraints {
    /// Restrict to creatives tagged with any of these topics.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Restrict to creatives tagged with any of these verticals.
    #[serde(default)]
    pub verticals: Vec<String>,
    /// Restrict to creatives tagged with any of these audience segments.
    #[serde(default)]
    pub audience_segments: Vec<String>,
    /// Restrict to creatives tagged with any of these keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Restrict to creatives eligible in this locale (or globally eligible).
    #[serde(default)]
    pub locale: Option<String>,
    /// Exclude creatives belonging to these advertisers.
    #[serde(default)]
    pub exclude_advertiser_ids: Vec<String>,
    /// Exclude creatives belonging to these campaigns.
    #[serde(default)]
    pub exclude_campaign_ids: Vec<String>,
    /// Exclude these creatives specifically.
    #[serde(default)]
    pub exclude_creative_ids: Vec<String>,
    /// Whether age-restricted creatives are acceptable for this request.
    #[serde(default)]
    pub age_restricted_ok: bool,
    /// Whether sensitive creatives are acceptable for this request.
    #[serde(default)]
    pub sensitive_ok: bool,
}

/// Where the creative would be rendered. Annotate-only; never filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementContext {
    /// Placement slot, e.g. `inline`, `sidebar`, `banner`.
    pub placement: String,
    /// Surface the placement renders within.
    pub surface: String,
}

/// The advertised placement slot values; unknown values are accepted but flagged.
pub const KNOWN_PLACEMENTS: [&str; 3] = ["inline", "sidebar", "banner"];

impl PlacementContext {
    /// Returns true if `placement` is one of the advertised slot values.
    #[must_use]
    pub fn is_known_placement(&self) -> bool {
        KNOWN_PLACEMENTS.contains(&self.placement.as_str())
    }
}

/// A raw query result from the vector index.
#[derive(Debug, Clone)]
pub struct VectorHit {
    /// The matched creative's payload.
    pub payload: CreativeRecord,
    /// Raw similarity score, typically but not guaranteed in `[0, 1]`.
    pub score: f64,
}

/// The response-shaped hit returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Identifier of the matched creative.
    pub creative_id: CreativeId,
    /// Identifier of the owning campaign.
    pub campaign_id: CampaignId,
    /// Identifier of the owning advertiser.
    pub advertiser_id: AdvertiserId,
    /// Human-readable campaign name.
    pub campaign_name: String,
    /// Renderable headline.
    pub title: String,
    /// Renderable body copy.
    pub body: String,
    /// Renderable call-to-action label.
    pub cta_text: String,
    /// Destination URL.
    pub landing_url: String,
    /// Final score, clamped to `[0, 1]`.
    pub score: f64,
    /// Opaque identifier resolving back to the audit trace.
    pub match_id: MatchId,
    /// Multiplicative pacing weight applied to this candidate.
    pub pacing_weight: f64,
    /// Pacing outcome tag (`within_budget`, `paced`, `no_analytics`).
    pub pacing_reason: String,
    /// Keyword boost factor applied, in `[1.0, 2.0]`.
    pub boost_applied: f64,
}

/// The input to a `match` call.
///
/// # Invariants
/// - `context_text` is non-empty after normalization and at most 10,000 characters.
/// - `top_k` is in `[1, 100]`.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    /// Free-form context: a chat snippet, article, or search query.
    pub context_text: String,
    /// Number of candidates requested.
    pub top_k: u32,
    /// Where the creative would be rendered.
    #[serde(default)]
    pub placement: PlacementContext,
    /// Declarative targeting constraints.
    #[serde(default)]
    pub constraints: MatchConstraints,
    /// Caller-supplied keyword boost factors.
    #[serde(default)]
    pub boost: BTreeMap<String, f64>,
}

/// The output of a `match` call.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
    /// Ordered candidate list; index order, pacing-denied items removed.
    pub candidates: Vec<Candidate>,
    /// The request identifier minted for this call.
    pub request_id: RequestId,
    /// Echo of the request's placement context.
    pub placement: PlacementContext,
    /// Non-fatal advisories about this request.
    pub warnings: Vec<String>,
    /// Count of rejections attributed to each constraint/reason tag.
    pub constraint_impact: BTreeMap<String, u32>,
}

/// One entry in an audit trace's ordered decision list.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    /// Identifier of the creative this decision concerns.
    pub creative_id: CreativeId,
    /// Identifier of the owning campaign.
    pub campaign_id: CampaignId,
    /// Identifier of the owning advertiser.
    pub advertiser_id: AdvertiserId,
    /// The hit's raw similarity score.
    pub raw_score: f64,
    /// Reason tag: `allowed`, `denied: <rule>`, or `pacing:<reason>`.
    pub reason: String,
    /// Present only for admitted candidates.
    pub match_id: Option<MatchId>,
    /// Present only for admitted candidates.
    pub pacing_weight: Option<f64>,
    /// Present only for admitted candidates.
    pub boost_applied: Option<f64>,
}

/// The full decision record for one request, explaining every retrieved hit.
#[derive(Debug, Clone, Serialize)]
pub struct AuditTrace {
    /// The request identifier this trace belongs to.
    pub request_id: RequestId,
    /// Echo of the request's placement context.
    pub placement: PlacementContext,
    /// First 500 characters of the (normalized) context text.
    pub context_prefix: String,
    /// The constraints as captured at request time.
    pub constraints: MatchConstraints,
    /// The caller-supplied boost map as captured at request time.
    pub boost: BTreeMap<String, f64>,
    /// Ordered decisions: policy-denied hits, then eligible hits.
    pub decisions: Vec<DecisionRecord>,
    /// `cache` when this trace was served from the result cache, else absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Maximum length of [`AuditTrace::context_prefix`], in characters.
pub const CONTEXT_PREFIX_LIMIT: usize = 500;

/// Truncates `text` to at most [`CONTEXT_PREFIX_LIMIT`] characters, respecting
/// UTF-8 character boundaries.
#[must_use]
pub fn context_prefix(text: &str) -> String {
    text.chars().take(CONTEXT_PREFIX_LIMIT).collect()
}

/// A single recorded delivery event for an admitted candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// Wall-clock time the match was recorded, UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    /// The request this event was produced by.
    pub request_id: RequestId,
    /// Echo of the request's placement slot.
    pub placement: String,
    /// Identifier of the owning campaign.
    pub campaign_id: CampaignId,
    /// Identifier of the matched creative.
    pub creative_id: CreativeId,
    /// The candidate's final score.
    pub score: f64,
    /// The candidate's pacing weight.
    pub pacing_weight: f64,
    /// Imputed cost, `cpm / 1000`.
    pub cost: f64,
    /// Arbitrary metadata bag, e.g. pacing reason and boost applied.
    pub metadata: serde_json::Value,
}

/// Derived delivery aggregates for a campaign, optionally windowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignStats {
    /// Number of recorded impressions in the window.
    pub impressions: u64,
    /// Summed imputed cost in the window.
    pub spend: f64,
    /// Average final score in the window.
    pub avg_score: f64,
    /// Average pacing weight in the window.
    pub avg_pacing_weight: f64,
    /// Start of the query window, if bounded.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub window_start: Option<OffsetDateTime>,
    /// End of the query window, if bounded.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub window_end: Option<OffsetDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_prefix_truncates_at_limit() {
        let text = "a".repeat(600);
        assert_eq!(context_prefix(&text).chars().count(), CONTEXT_PREFIX_LIMIT);
    }

    #[test]
    fn context_prefix_leaves_short_text_untouched() {
        assert_eq!(context_prefix("short"), "short");
    }

    #[test]
    fn placement_known_values_are_recognized() {
        let placement = PlacementContext { placement: "sidebar".into(), surface: "feed".into() };
        assert!(placement.is_known_placement());
        let unknown = PlacementContext { placement: "popup".into(), surface: "feed".into() };
        assert!(!unknown.is_known_placement());
    }
}
