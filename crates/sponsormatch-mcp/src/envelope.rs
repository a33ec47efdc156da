// crates/sponsormatch-mcp/src/envelope.rs
// ============================================================================
// Module: Response Envelope
// Description: Field-level allowlisting of every value the tool boundary
//   returns.
// Purpose: Keep a field added to an internal struct from silently becoming
//   caller-visible; the allowlist is the contract, not the struct shape.
// Dependencies: serde, serde_json, sponsormatch-core
// ============================================================================

//! ## Overview
//! Every shape function round-trips its input through [`serde_json::to_value`]
//! and then keeps only the keys in its allowlist. Unknown keys are stripped,
//! never passed through.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use sponsormatch_core::interfaces::CollectionHandle;
use sponsormatch_core::interfaces::CollectionInfo;
use sponsormatch_core::model::AuditTrace;
use sponsormatch_core::model::CreativeRecord;
use sponsormatch_core::model::MatchResponse;

/// Allowed top-level keys of a match response envelope.
pub const MATCH_RESPONSE_KEYS: [&str; 5] = ["candidates", "request_id", "placement", "warnings", "constraint_impact"];

/// Allowed keys of each candidate within a match response envelope.
pub const CANDIDATE_KEYS: [&str; 13] = [
    "creative_id",
    "campaign_id",
    "advertiser_id",
    "campaign_name",
    "title",
    "body",
    "cta_text",
    "landing_url",
    "score",
    "match_id",
    "pacing_weight",
    "pacing_reason",
    "boost_applied",
];

/// Allowed keys of a `collection_info` / `ensure_collection` envelope.
pub const COLLECTION_INFO_KEYS: [&str; 7] =
    ["name", "dimension", "model_id", "schema_version", "points_count", "indexed_vectors_count", "status"];

/// Allowed keys of an `ensure_collection` envelope.
pub const COLLECTION_HANDLE_KEYS: [&str; 5] = ["name", "created", "dimension", "model_id", "schema_version"];

/// Allowed keys of a `get_creative` envelope.
pub const CREATIVE_KEYS: [&str; 12] = [
    "creative_id",
    "campaign_id",
    "advertiser_id",
    "title",
    "body",
    "cta_text",
    "landing_url",
    "topics",
    "locales",
    "verticals",
    "blocked_keywords",
    "enabled",
];

fn to_allowlisted_object(value: Value, allowlist: &[&str]) -> Value {
    let Value::Object(map) = value else {
        return Value::Null;
    };
    let allowed: BTreeSet<&str> = allowlist.iter().copied().collect();
    let filtered: Map<String, Value> =
        map.into_iter().filter(|(key, _)| allowed.contains(key.as_str())).collect();
    Value::Object(filtered)
}

fn to_value(value: &impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Shapes a match response into its tool-boundary envelope: top-level keys
/// per [`MATCH_RESPONSE_KEYS`], each candidate's keys per [`CANDIDATE_KEYS`].
#[must_use]
pub fn shape_match_response(response: &MatchResponse) -> Value {
    let mut shaped = to_allowlisted_object(to_value(response), &MATCH_RESPONSE_KEYS);
    if let Value::Object(map) = &mut shaped {
        if let Some(Value::Array(candidates)) = map.get_mut("candidates") {
            for candidate in candidates.iter_mut() {
                *candidate = to_allowlisted_object(candidate.take(), &CANDIDATE_KEYS);
            }
        }
    }
    shaped
}

/// Shapes an audit trace for `ads_explain`. The trace's shape is already
/// entirely internal-facing (it is never returned from `ads_match`), so no
/// key is stripped; this function exists so a future field addition to
/// [`AuditTrace`] is a deliberate choice at this boundary, not a silent leak.
#[must_use]
pub fn shape_audit_trace(trace: &AuditTrace) -> Value {
    to_value(trace)
}

/// Shapes a `collection_info` result.
#[must_use]
pub fn shape_collection_info(info: &CollectionInfo) -> Value {
    to_allowlisted_object(to_value(info), &COLLECTION_INFO_KEYS)
}

/// Shapes an `ensure_collection` result.
#[must_use]
pub fn shape_collection_handle(handle: &CollectionHandle) -> Value {
    to_allowlisted_object(to_value(handle), &COLLECTION_HANDLE_KEYS)
}

/// Shapes a `get_creative` result. Returns `null` for a missing creative.
#[must_use]
pub fn shape_creative(creative: Option<&CreativeRecord>) -> Value {
    match creative {
        Some(creative) => to_allowlisted_object(to_value(creative), &CREATIVE_KEYS),
        None => Value::Null,
    }
}
