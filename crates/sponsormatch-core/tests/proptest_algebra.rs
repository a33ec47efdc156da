// crates/sponsormatch-core/tests/proptest_algebra.rs
// ============================================================================
// Module: Filter Algebra and Boost Property Tests
// Description: Property tests for targeting-filter construction and boost
//   clamping across wide input ranges.
// Purpose: Detect panics and invariant violations the fixed-example unit
//   tests in targeting.rs and boost.rs cannot cover.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeMap;

use proptest::prelude::*;
use sponsormatch_core::boost::compute_boost;
use sponsormatch_core::boost::BOOST_FACTOR_MAX;
use sponsormatch_core::boost::BOOST_FACTOR_MIN;
use sponsormatch_core::identifiers::AdvertiserId;
use sponsormatch_core::identifiers::CampaignId;
use sponsormatch_core::identifiers::CreativeId;
use sponsormatch_core::model::CreativeRecord;
use sponsormatch_core::model::MatchConstraints;
use sponsormatch_core::model::PacingMode;
use sponsormatch_core::targeting::TargetingEngine;

fn word_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn words_strategy(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(word_strategy(), 0..max_len)
}

fn creative_with_topics(topics: Vec<String>, title: String, body: String) -> CreativeRecord {
    CreativeRecord {
        creative_id: CreativeId::new("c1"),
        campaign_id: CampaignId::new("camp1"),
        advertiser_id: AdvertiserId::new("adv1"),
        title,
        body,
        cta_text: "Go".into(),
        landing_url: "https://example.com".into(),
        campaign_name: "Campaign".into(),
        description: None,
        updated_at: None,
        topics,
        locales: vec![],
        verticals: vec![],
        audience_segments: vec![],
        context_keywords: vec![],
        blocked_keywords: vec![],
        sensitive: false,
        age_restricted: false,
        brand_safety_tier: None,
        start_at: None,
        end_at: None,
        total_budget: None,
        daily_budget: None,
        currency: None,
        pacing_mode: PacingMode::Even,
        cpm: 1.0,
        target_engagement_rate: None,
        enabled: true,
    }
}

proptest! {
    /// `build_filter` never panics over arbitrary constraint combinations,
    /// and it is empty iff every constraint list field is empty and locale
    /// is unset.
    #[test]
    fn build_filter_never_panics_and_emptiness_matches_inputs(
        topics in words_strategy(4),
        verticals in words_strategy(4),
        audience_segments in words_strategy(4),
        keywords in words_strategy(4),
        locale in prop::option::of(word_strategy()),
    ) {
        let all_inputs_empty = topics.is_empty()
            && verticals.is_empty()
            && audience_segments.is_empty()
            && keywords.is_empty()
            && locale.as_ref().is_none_or(String::is_empty);

        let constraints = MatchConstraints {
            topics,
            verticals,
            audience_segments,
            keywords,
            locale,
            ..Default::default()
        };
        let filter = TargetingEngine::build_filter(&constraints);
        prop_assert_eq!(filter.is_empty(), all_inputs_empty);
        prop_assert!(filter.must_not.is_empty());
    }

    /// Exclusion lists always produce exactly one `not_in` predicate each,
    /// regardless of list contents, and never a `must` predicate.
    #[test]
    fn exclusions_always_produce_not_in_predicates(
        advertiser_ids in words_strategy(4),
        campaign_ids in words_strategy(4),
        creative_ids in words_strategy(4),
    ) {
        let expected_count = usize::from(!advertiser_ids.is_empty())
            + usize::from(!campaign_ids.is_empty())
            + usize::from(!creative_ids.is_empty());
        let constraints = MatchConstraints {
            exclude_advertiser_ids: advertiser_ids,
            exclude_campaign_ids: campaign_ids,
            exclude_creative_ids: creative_ids,
            ..Default::default()
        };
        let filter = TargetingEngine::build_filter(&constraints);
        prop_assert_eq!(filter.must_not.len(), expected_count);
        prop_assert!(filter.must.is_empty());
        for predicate in &filter.must_not {
            prop_assert_eq!(predicate.op, sponsormatch_core::filters::FilterOp::NotIn);
        }
    }

    /// `compute_boost` never returns a value outside `[BOOST_FACTOR_MIN, BOOST_FACTOR_MAX]`
    /// and is exactly `1.0` when no keyword in the map matches the creative.
    #[test]
    fn compute_boost_stays_in_bounds(
        topics in words_strategy(3),
        title in "[a-z ]{0,40}",
        body in "[a-z ]{0,40}",
        boost_keys in words_strategy(5),
        boost_factor in -10.0_f64..10.0_f64,
    ) {
        let creative = creative_with_topics(topics.clone(), title.clone(), body.clone());
        let boost_map: BTreeMap<String, f64> =
            boost_keys.iter().map(|key| (key.clone(), boost_factor)).collect();
        let boost = compute_boost(&creative, &boost_map);
        prop_assert!((BOOST_FACTOR_MIN..=BOOST_FACTOR_MAX).contains(&boost) || boost == 1.0);

        let haystack = format!("{title} {body} {}", topics.join(" ")).to_lowercase();
        let any_match = boost_keys.iter().any(|key| haystack.contains(&key.to_lowercase()));
        if !any_match {
            prop_assert_eq!(boost, 1.0);
        }
    }
}
