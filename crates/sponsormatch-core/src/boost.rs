// crates/sponsormatch-core/src/boost.rs
// ============================================================================
// Module: Boost
// Description: Caller-supplied keyword boosts applied to a candidate's final
//   score.
// Purpose: Let a request nudge ranking toward contextually relevant
//   creatives without letting a boost dominate the similarity score.
// Dependencies: sponsormatch-core::model
// ============================================================================

//! ## Overview
//! Boost factors are clamped to `[0.1, 2.0]` before use. A creative's boost
//! is the maximum of its applicable factors, never the product: multiple
//! matching keywords do not compound.

use std::collections::BTreeMap;

use crate::model::CreativeRecord;

/// Lower and upper bound a caller-supplied boost factor is clamped to.
pub const BOOST_FACTOR_MIN: f64 = 0.1;
/// See [`BOOST_FACTOR_MIN`].
pub const BOOST_FACTOR_MAX: f64 = 2.0;

/// Computes the boost factor applicable to `creative` given the request's
/// boost map. Creatives with no applicable keyword receive `1.0`.
#[must_use]
pub fn compute_boost(creative: &CreativeRecord, boost_map: &BTreeMap<String, f64>) -> f64 {
    let title = creative.title.to_lowercase();
    let body = creative.body.to_lowercase();
    let topics: Vec<String> = creative.topics.iter().map(|topic| topic.to_lowercase()).collect();

    let applicable: Vec<f64> = boost_map
        .iter()
        .filter_map(|(keyword, factor)| {
            let keyword = keyword.to_lowercase();
            let applies = title.contains(&keyword) || body.contains(&keyword) || topics.contains(&keyword);
            applies.then(|| factor.clamp(BOOST_FACTOR_MIN, BOOST_FACTOR_MAX))
        })
        .collect();

    applicable.into_iter().fold(None, |max, factor| Some(max.map_or(factor, |current: f64| current.max(factor))))
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::AdvertiserId;
    use crate::identifiers::CampaignId;
    use crate::identifiers::CreativeId;
    use crate::model::PacingMode;

    fn creative() -> CreativeRecord {
        CreativeRecord {
            creative_id: CreativeId::new("c1"),
            campaign_id: CampaignId::new("camp1"),
            advertiser_id: AdvertiserId::new("adv1"),
            title: "Learn Python fast".into(),
            body: "A great course".into(),
            cta_text: "Go".into(),
            landing_url: "https://example.com".into(),
            campaign_name: "Campaign".into(),
            description: None,
            updated_at: None,
            topics: vec!["python".into()],
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

    #[test]
    fn no_matching_keyword_yields_baseline_boost() {
        let boost_map = BTreeMap::from([("golf".to_string(), 1.5)]);
        assert_eq!(compute_boost(&creative(), &boost_map), 1.0);
    }

    #[test]
    fn matching_topic_applies_boost() {
        let boost_map = BTreeMap::from([("python".to_string(), 1.5)]);
        assert_eq!(compute_boost(&creative(), &boost_map), 1.5);
    }

    #[test]
    fn matching_title_substring_applies_boost() {
        let boost_map = BTreeMap::from([("learn".to_string(), 1.3)]);
        assert_eq!(compute_boost(&creative(), &boost_map), 1.3);
    }

    #[test]
    fn multiple_matches_take_the_maximum_not_the_product() {
        let boost_map =
            BTreeMap::from([("python".to_string(), 1.5), ("learn".to_string(), 1.8)]);
        assert_eq!(compute_boost(&creative(), &boost_map), 1.8);
    }

    #[test]
    fn factor_is_clamped_to_bounds() {
        let boost_map = BTreeMap::from([("python".to_string(), 10.0)]);
        assert_eq!(compute_boost(&creative(), &boost_map), BOOST_FACTOR_MAX);

        let boost_map = BTreeMap::from([("python".to_string(), 0.0)]);
        assert_eq!(compute_boost(&creative(), &boost_map), BOOST_FACTOR_MIN);
    }
}
