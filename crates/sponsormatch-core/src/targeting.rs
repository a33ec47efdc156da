// crates/sponsormatch-core/src/targeting.rs
// ============================================================================
// Module: Targeting Engine
// Description: Pure translator from declarative constraints to a filter
//   expression.
// Purpose: Keep the must/must_not construction rules in one auditable place.
// Dependencies: sponsormatch-core::filters, sponsormatch-core::model
// ============================================================================

//! ## Overview
//! `build_filter` is a pure function: no I/O, no shared state. It never
//! expresses `age_restricted_ok` / `sensitive_ok` as predicates — those are
//! enforced post-retrieval by the policy engine so their violations remain
//! auditable. Placement never produces a predicate.

use crate::filters::FieldFilter;
use crate::filters::VectorFilter;
use crate::model::MatchConstraints;

/// Translates request constraints into a filter expression consumable by a
/// vector index adapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct TargetingEngine;

impl TargetingEngine {
    /// Builds the `must`/`must_not` expression for `constraints`.
    ///
    /// Empty or unset fields produce no predicate; the resulting expression
    /// may be empty, which the index adapter interprets as "no filter"
    /// (beyond its own mandatory `enabled != false` clause).
    #[must_use]
    pub fn build_filter(constraints: &MatchConstraints) -> VectorFilter {
        let mut must = Vec::new();
        let mut must_not = Vec::new();

        if !constraints.topics.is_empty() {
            must.push(FieldFilter::any_of("topics", constraints.topics.clone()));
        }
        if !constraints.verticals.is_empty() {
            must.push(FieldFilter::any_of("verticals", constraints.verticals.clone()));
        }
        if !constraints.audience_segments.is_empty() {
            must.push(FieldFilter::any_of("audience_segments", constraints.audience_segments.clone()));
        }
        if !constraints.keywords.is_empty() {
            must.push(FieldFilter::any_of("keywords", constraints.keywords.clone()));
        }
        if let Some(locale) = &constraints.locale {
            if !locale.is_empty() {
                must.push(FieldFilter::any_of("locale", vec![locale.clone(), String::new()]));
            }
        }

        if !constraints.exclude_advertiser_ids.is_empty() {
            must_not.push(FieldFilter::not_in("advertiser_id", constraints.exclude_advertiser_ids.clone()));
        }
        if !constraints.exclude_campaign_ids.is_empty() {
            must_not.push(FieldFilter::not_in("campaign_id", constraints.exclude_campaign_ids.clone()));
        }
        if !constraints.exclude_creative_ids.is_empty() {
            must_not.push(FieldFilter::not_in("creative_id", constraints.exclude_creative_ids.clone()));
        }

        VectorFilter { must, must_not }
    }
}
