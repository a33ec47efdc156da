// crates/sponsormatch-providers/src/inprocess_index.rs
// ============================================================================
// Module: In-Process Vector Index
// Description: A brute-force VectorIndex adapter over an in-memory point set.
// Purpose: Give a single-node deployment or a test a working VectorIndex
//   without a network dependency.
// Dependencies: sponsormatch-core
// ============================================================================

//! ## Overview
//! Every point lives in one `Mutex`-guarded map, keyed by [`CreativeId`].
//! `query` scores every enabled, filter-matching point by cosine similarity
//! and returns the top `k`. Unlike a query-language-translating adapter, this
//! one evaluates [`FilterOp::AllOf`] directly against the stored payload, so
//! it expresses true all-of semantics rather than degrading to any-of.
//!
//! Invariants:
//! - `query` never returns a point with `enabled == false`, regardless of
//!   what the caller's filter expresses.
//! - Scoring is a pure function of the stored vectors; insertion order does
//!   not affect ranking.

use std::collections::HashMap;
use std::sync::Mutex;

use sponsormatch_core::error::MatchError;
use sponsormatch_core::filters::FieldFilter;
use sponsormatch_core::filters::FilterOp;
use sponsormatch_core::filters::VectorFilter;
use sponsormatch_core::identifiers::CreativeId;
use sponsormatch_core::interfaces::AttributeFilter;
use sponsormatch_core::interfaces::CollectionHandle;
use sponsormatch_core::interfaces::CollectionInfo;
use sponsormatch_core::interfaces::VectorIndex;
use sponsormatch_core::model::CreativeRecord;
use sponsormatch_core::model::VectorHit;

#[derive(Debug, Clone)]
struct CollectionMeta {
    dimension: usize,
    model_id: String,
    schema_version: u32,
}

struct Inner {
    points: HashMap<CreativeId, (Vec<f32>, CreativeRecord)>,
    meta: Option<CollectionMeta>,
}

/// Brute-force, in-process [`VectorIndex`].
///
/// # Invariants
/// - `name` is fixed at construction and returned verbatim from
///   `collection_info`.
pub struct InProcessVectorIndex {
    name: String,
    inner: Mutex<Inner>,
}

impl InProcessVectorIndex {
    /// Creates an empty index under `name`, with no collection yet ensured.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), inner: Mutex::new(Inner { points: HashMap::new(), meta: None }) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl VectorIndex for InProcessVectorIndex {
    fn ensure_collection(
        &self,
        dimension: usize,
        model_id: &str,
        schema_version: u32,
    ) -> Result<CollectionHandle, MatchError> {
        let mut inner = self.lock();
        let created = inner.meta.is_none();
        inner.meta =
            Some(CollectionMeta { dimension, model_id: model_id.to_string(), schema_version });
        Ok(CollectionHandle {
            name: self.name.clone(),
            created,
            dimension,
            model_id: model_id.to_string(),
            schema_version,
        })
    }

    fn collection_info(&self) -> Result<CollectionInfo, MatchError> {
        let inner = self.lock();
        let meta = inner
            .meta
            .as_ref()
            .ok_or_else(|| MatchError::NotFound(format!("collection {} not initialized", self.name)))?;
        let points_count = u64::try_from(inner.points.len())
            .map_err(|_| MatchError::Internal("point count overflowed u64".into()))?;
        Ok(CollectionInfo {
            name: self.name.clone(),
            dimension: meta.dimension,
            model_id: meta.model_id.clone(),
            schema_version: meta.schema_version,
            points_count,
            indexed_vectors_count: points_count,
            status: "green".to_string(),
        })
    }

    fn delete_collection(&self) -> Result<(), MatchError> {
        let mut inner = self.lock();
        inner.points.clear();
        inner.meta = None;
        Ok(())
    }

    fn upsert(&self, items: &[(Vec<f32>, CreativeRecord)]) -> Result<(), MatchError> {
        let mut inner = self.lock();
        for (vector, record) in items {
            inner.points.insert(record.creative_id.clone(), (vector.clone(), record.clone()));
        }
        Ok(())
    }

    fn delete(&self, creative_id: &CreativeId) -> Result<(), MatchError> {
        let mut inner = self.lock();
        inner.points.remove(creative_id);
        Ok(())
    }

    fn get(&self, creative_id: &CreativeId) -> Result<Option<CreativeRecord>, MatchError> {
        let inner = self.lock();
        Ok(inner.points.get(creative_id).map(|(_, record)| record.clone()))
    }

    fn query(&self, vector: &[f32], filter: &VectorFilter, top_k: u32) -> Result<Vec<VectorHit>, MatchError> {
        let inner = self.lock();
        let mut scored: Vec<(f64, CreativeRecord)> = inner
            .points
            .values()
            .filter(|(_, record)| record.enabled)
            .filter(|(_, record)| matches_filter(record, filter))
            .filter_map(|(stored_vector, record)| {
                cosine_similarity(vector, stored_vector).map(|score| (score, record.clone()))
            })
            .collect();

        scored.sort_by(|(score_a, record_a), (score_b, record_b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| record_a.creative_id.cmp(&record_b.creative_id))
        });

        let top_k = usize::try_from(top_k).unwrap_or(usize::MAX);
        Ok(scored.into_iter().take(top_k).map(|(score, payload)| VectorHit { payload, score }).collect())
    }

    fn bulk_disable(&self, filter: &AttributeFilter) -> Result<u64, MatchError> {
        let mut inner = self.lock();
        let mut updated = 0_u64;
        for (vector, record) in inner.points.values_mut() {
            let _ = vector;
            if record.enabled && matches_attribute_filter(record, filter) {
                record.enabled = false;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }
    Some(dot / (norm_a * norm_b))
}

/// Returns the catalog values a named field carries on `record`, for filter evaluation.
fn field_values(record: &CreativeRecord, field: &str) -> Vec<String> {
    match field {
        "topics" => record.topics.clone(),
        "verticals" => record.verticals.clone(),
        "audience_segments" => record.audience_segments.clone(),
        "keywords" | "context_keywords" => record.context_keywords.clone(),
        "locale" | "locales" => record.locales.clone(),
        "advertiser_id" => vec![record.advertiser_id.as_str().to_string()],
        "campaign_id" => vec![record.campaign_id.as_str().to_string()],
        "creative_id" => vec![record.creative_id.as_str().to_string()],
        _ => Vec::new(),
    }
}

fn predicate_holds(record: &CreativeRecord, predicate: &FieldFilter) -> bool {
    let values = field_values(record, &predicate.field);
    let operands = predicate.value.as_slice();
    match predicate.op {
        FilterOp::Equals => operands.first().is_some_and(|expected| values.iter().any(|v| v == expected)),
        FilterOp::AnyOf => operands.iter().any(|expected| values.iter().any(|v| v == expected)),
        FilterOp::AllOf => operands.iter().all(|expected| values.iter().any(|v| v == expected)),
        FilterOp::NotEquals => !operands.first().is_some_and(|expected| values.iter().any(|v| v == expected)),
        FilterOp::NotIn => !operands.iter().any(|expected| values.iter().any(|v| v == expected)),
    }
}

fn matches_filter(record: &CreativeRecord, filter: &VectorFilter) -> bool {
    filter.must.iter().all(|predicate| predicate_holds(record, predicate))
        && filter.must_not.iter().all(|predicate| !predicate_holds(record, predicate))
}

fn matches_attribute_filter(record: &CreativeRecord, filter: &AttributeFilter) -> bool {
    filter.fields.iter().all(|(field, acceptable)| {
        let values = field_values(record, field);
        acceptable.iter().any(|expected| values.iter().any(|v| v == expected))
    })
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        reason = "Test-only setup uses expect for clarity."
    )]

    use super::*;
    use sponsormatch_core::identifiers::AdvertiserId;
    use sponsormatch_core::identifiers::CampaignId;
    use sponsormatch_core::model::PacingMode;

    fn record(id: &str, topics: Vec<&str>, enabled: bool) -> CreativeRecord {
        CreativeRecord {
            creative_id: CreativeId::new(id),
            campaign_id: CampaignId::new("camp1"),
            advertiser_id: AdvertiserId::new("adv1"),
            title: "Title".into(),
            body: "Body".into(),
            cta_text: "Go".into(),
            landing_url: "https://example.com".into(),
            campaign_name: "Campaign".into(),
            description: None,
            updated_at: None,
            topics: topics.into_iter().map(String::from).collect(),
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
            enabled,
        }
    }

    #[test]
    fn query_excludes_disabled_regardless_of_filter() {
        let index = InProcessVectorIndex::new("test");
        index.ensure_collection(2, "model", 1).expect("ensure");
        index
            .upsert(&[
                (vec![1.0, 0.0], record("c1", vec!["sports"], true)),
                (vec![1.0, 0.0], record("c2", vec!["sports"], false)),
            ])
            .expect("upsert");
        let hits = index.query(&[1.0, 0.0], &VectorFilter::default(), 10).expect("query");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload.creative_id, CreativeId::new("c1"));
    }

    #[test]
    fn all_of_requires_every_listed_value() {
        let index = InProcessVectorIndex::new("test");
        index.ensure_collection(2, "model", 1).expect("ensure");
        index
            .upsert(&[
                (vec![1.0, 0.0], record("c1", vec!["sports", "finance"], true)),
                (vec![1.0, 0.0], record("c2", vec!["sports"], true)),
            ])
            .expect("upsert");
        let filter = VectorFilter {
            must: vec![FieldFilter::all_of("topics", vec!["sports".into(), "finance".into()])],
            must_not: vec![],
        };
        let hits = index.query(&[1.0, 0.0], &filter, 10).expect("query");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload.creative_id, CreativeId::new("c1"));
    }

    #[test]
    fn top_k_limits_result_count() {
        let index = InProcessVectorIndex::new("test");
        index.ensure_collection(2, "model", 1).expect("ensure");
        index
            .upsert(&[
                (vec![1.0, 0.0], record("c1", vec![], true)),
                (vec![0.9, 0.1], record("c2", vec![], true)),
                (vec![0.8, 0.2], record("c3", vec![], true)),
            ])
            .expect("upsert");
        let hits = index.query(&[1.0, 0.0], &VectorFilter::default(), 2).expect("query");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload.creative_id, CreativeId::new("c1"));
    }

    #[test]
    fn bulk_disable_updates_matching_records_only() {
        let index = InProcessVectorIndex::new("test");
        index.ensure_collection(2, "model", 1).expect("ensure");
        index
            .upsert(&[
                (vec![1.0, 0.0], record("c1", vec!["sports"], true)),
                (vec![1.0, 0.0], record("c2", vec!["finance"], true)),
            ])
            .expect("upsert");
        let filter = AttributeFilter {
            fields: std::collections::BTreeMap::from([("topics".to_string(), vec!["sports".to_string()])]),
        };
        let updated = index.bulk_disable(&filter).expect("bulk_disable");
        assert_eq!(updated, 1);
        assert!(!index.get(&CreativeId::new("c1")).expect("get").expect("present").enabled);
        assert!(index.get(&CreativeId::new("c2")).expect("get").expect("present").enabled);
    }

    #[test]
    fn collection_info_before_ensure_is_not_found() {
        let index = InProcessVectorIndex::new("test");
        assert!(index.collection_info().is_err());
    }
}
