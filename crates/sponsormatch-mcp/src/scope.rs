// crates/sponsormatch-mcp/src/scope.rs
// ============================================================================
// Module: Tool Scope
// Description: The two visibility tiers a tool call is gated by.
// Purpose: Separate the read-only match/explain surface from the
//   administrative catalog-mutation surface, outside the core itself.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Every tool name is fixed to exactly one [`ToolScope`]. A caller presents a
//! scope at dispatch time; the router rejects a call whose tool requires a
//! higher scope than the caller holds with [`MatchError::PermissionDenied`].
//!
//! [`MatchError::PermissionDenied`]: sponsormatch_core::error::MatchError::PermissionDenied

/// The visibility tier a tool call is gated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolScope {
    /// The data-plane surface: `ads_match`, `ads_explain`, `ads_health`, `ads_capabilities`.
    ReadOnly,
    /// The control-plane surface: catalog mutation and collection administration.
    Administrative,
}

/// Data-plane (read-only) tool names.
pub const DATA_PLANE_TOOLS: [&str; 4] = ["ads_match", "ads_explain", "ads_health", "ads_capabilities"];

/// Control-plane (administrative) tool names.
pub const ADMIN_TOOLS: [&str; 6] =
    ["ensure_collection", "collection_info", "upsert_batch", "delete_creative", "bulk_disable", "get_creative"];

/// Returns the scope a tool name requires, or `None` if the name is not a
/// recognized tool at all.
#[must_use]
pub fn required_scope(tool: &str) -> Option<ToolScope> {
    if DATA_PLANE_TOOLS.contains(&tool) {
        Some(ToolScope::ReadOnly)
    } else if ADMIN_TOOLS.contains(&tool) {
        Some(ToolScope::Administrative)
    } else {
        None
    }
}

/// Returns true if a caller holding `held` may invoke a tool requiring `required`.
#[must_use]
pub fn satisfies(held: ToolScope, required: ToolScope) -> bool {
    matches!((held, required), (ToolScope::Administrative, _) | (ToolScope::ReadOnly, ToolScope::ReadOnly))
}
