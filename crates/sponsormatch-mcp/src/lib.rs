// crates/sponsormatch-mcp/src/lib.rs
// ============================================================================
// Module: SponsorMatch Tool Surface
// Description: The tool-dispatch boundary: scope gating, response envelope
//   allowlisting, and the router that ties a request to the core's match
//   pipeline or its administrative catalog operations.
// Purpose: Everything a transport (stdio, HTTP, whatever an MCP host speaks)
//   needs to expose the core safely, with nothing transport-specific in it.
// Dependencies: sponsormatch-core, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! This crate owns no network listener and speaks no wire protocol; it is
//! the part of the original system's MCP tool surface that is pure logic:
//! which tool names exist and at what scope ([`scope`]), what a result looks
//! like once only its allowlisted keys survive ([`envelope`]), and how a
//! tool call is matched to a handler ([`router`]). A composition root (the
//! `sponsormatch-cli` crate) wires an actual transport on top.

pub mod envelope;
pub mod router;
pub mod scope;

pub use router::ToolRouter;
pub use scope::ToolScope;
