// crates/sponsormatch-config/src/lib.rs
// ============================================================================
// Module: SponsorMatch Config
// Description: Typed TOML configuration model and load-time validation.
// Purpose: Give the composition root one validated, fail-closed source of
//   truth for plane selection, retrieval ceilings, and store location.
// Dependencies: sponsormatch-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! A `SponsorMatchConfig` is loaded from a TOML file and validated in one
//! pass before the composition root wires any adapter. Configuration errors
//! are reported at startup, never discovered mid-request: there is no hot
//! reconfiguration path (`spec.md` §1 Non-goals), so a deployment restarts
//! to pick up a changed file.
//!
//! The bounded-capacity invariants on the embedding cache, result cache, and
//! audit-trace store (`sponsormatch_core::cache`, `sponsormatch_core::audit`)
//! are fixed by the specification, not configurable here — exposing them as
//! knobs would let a deployment violate a testable property (the audit store
//! MUST hold at most 10,000 entries). What IS configurable is which planes
//! back the three capability traits, and the ceilings and timeouts a
//! deployment tunes per environment.

pub mod config;

pub use config::AnalyticsPlaneConfig;
pub use config::CatalogConfig;
pub use config::ConfigError;
pub use config::EmbeddingPlaneConfig;
pub use config::ServiceConfig;
pub use config::SponsorMatchConfig;
