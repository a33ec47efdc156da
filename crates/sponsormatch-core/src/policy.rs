// crates/sponsormatch-core/src/policy.rs
// ============================================================================
// Module: Policy Engine
// Description: Post-retrieval eligibility check against a request's
//   constraints and context.
// Purpose: Decide whether a retrieved creative may be shown, and produce a
//   stable reason string for audit, in a fixed evaluation order.
// Dependencies: sponsormatch-core::model
// ============================================================================

//! ## Overview
//! `evaluate` never throws on a malformed payload: a payload missing a field
//! is treated as if the field carried its default (`enabled = true`, flags
//! `false`, lists empty, schedule endpoints unset). The index is the
//! authority; this engine must be robust to whatever it returns.
//!
//! Invariants:
//! - Rules are evaluated in a fixed order; the first violated rule wins.
//! - The blocked-keyword test tokenizes the request's *original* (not
//!   normalized) context text.

use std::collections::BTreeSet;

use time::OffsetDateTime;

use crate::model::CreativeRecord;
use crate::model::MatchConstraints;

/// The outcome of evaluating one creative against one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    /// Whether the creative may be shown.
    pub allowed: bool,
    /// `allowed` or `denied: <rule>`, per the fixed evaluation order.
    pub reason: String,
}

impl PolicyDecision {
    fn allowed() -> Self {
        Self { allowed: true, reason: "allowed".to_string() }
    }

    fn denied(rule: &str) -> Self {
        Self { allowed: false, reason: format!("denied: {rule}") }
    }
}

/// Post-retrieval eligibility engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolicyEngine;

impl PolicyEngine {
    /// Evaluates `creative` against `constraints` and the request's original
    /// (pre-normalization) context text, at wall-clock time `now`.
    ///
    /// Rule order (first failure wins):
    /// 1. `enabled == false`
    /// 2. `age_restricted && !age_restricted_ok`
    /// 3. `sensitive && !sensitive_ok`
    /// 4. blocked-keyword intersection with the context
    /// 5. schedule inactive
    /// 6. otherwise, allowed
    #[must_use]
    pub fn evaluate(
        creative: &CreativeRecord,
        constraints: &MatchConstraints,
        raw_context_text: &str,
        now: OffsetDateTime,
    ) -> PolicyDecision {
        if !creative.enabled {
            return PolicyDecision::denied("disabled");
        }
        if creative.age_restricted && !constraints.age_restricted_ok {
            return PolicyDecision::denied("age_restricted");
        }
        if creative.sensitive && !constraints.sensitive_ok {
            return PolicyDecision::denied("sensitive");
        }
        if blocked_keywords_intersect(&creative.blocked_keywords, raw_context_text) {
            return PolicyDecision::denied("blocked_keywords");
        }
        if !schedule_active(creative.start_at, creative.end_at, now) {
            return PolicyDecision::denied("schedule_inactive");
        }
        PolicyDecision::allowed()
    }
}

/// Splits `text` on whitespace and lower-cases each token into a set.
fn tokenize_context(text: &str) -> BTreeSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// True if any blocked keyword is an exact token or a substring of any token.
fn blocked_keywords_intersect(blocked_keywords: &[String], raw_context_text: &str) -> bool {
    if blocked_keywords.is_empty() {
        return false;
    }
    let tokens = tokenize_context(raw_context_text);
    blocked_keywords.iter().any(|keyword| {
        let keyword = keyword.to_lowercase();
        tokens.contains(&keyword) || tokens.iter().any(|token| token.contains(&keyword))
    })
}

/// True iff `start_at <= now <= end_at`; missing endpoints are unbounded.
fn schedule_active(
    start_at: Option<OffsetDateTime>,
    end_at: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> bool {
    if let Some(start_at) = start_at {
        if now < start_at {
            return false;
        }
    }
    if let Some(end_at) = end_at {
        if now > end_at {
            return false;
        }
    }
    true
}
