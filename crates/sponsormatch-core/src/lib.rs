// crates/sponsormatch-core/src/lib.rs
// ============================================================================
// Module: SponsorMatch Core
// Description: The contextual sponsorship-matching engine: data model,
//   capability interfaces, and the match pipeline itself.
// Purpose: Every adapter crate and the composition root depend on this crate
//   alone; it has no dependency on any concrete transport or storage engine.
// Dependencies: serde, serde_json, sha2, thiserror, time, tracing, uuid
// ============================================================================

//! ## Overview
//! `sponsormatch-core` is the transport- and storage-agnostic heart of the
//! system: identifiers, the data model, the filter algebra, the policy and
//! pacing and boost engines, the bounded caches and audit trace store, the
//! capability traits an adapter must implement, and the [`match_service::MatchService`]
//! orchestrator that ties them together.
//!
//! Nothing in this crate talks to a network or a filesystem. Concrete
//! adapters (an embedding provider, a vector index, an analytics store) live
//! in sibling crates and are wired in at a composition root.

pub mod audit;
pub mod boost;
pub mod cache;
pub mod error;
pub mod filters;
pub mod identifiers;
pub mod interfaces;
pub mod match_service;
pub mod model;
pub mod pacing;
pub mod policy;
pub mod targeting;
